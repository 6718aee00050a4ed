use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use apscron_admin::{
    api::{AdminApi, HttpAdminApi},
    catalog::JobCatalog,
    config::{self, AdminConfig},
    constants,
    controller::{
        list::ListController,
        submission::{SubmissionController, SubmitMode, SubmitOutcome},
    },
    filter::FilterSet,
    form::{job::JobBuffer, trigger::TriggerKind, user::UserBuffer, EditBuffer},
    notify::{Navigator, Notifier, TracingNavigator, TracingNotifier},
    session::Session,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apscron-admin", about = "Administer jobs and users of an APScron service")]
struct Cli {
    /// Configuration file, without extension.
    #[arg(long, default_value = constants::DEFAULT_CONF)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Job(JobCommand),
    #[command(subcommand)]
    User(UserCommand),
    /// List a resource, optionally filtered with `key=value` pairs.
    List {
        #[arg(value_enum)]
        target: ListTarget,
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Subcommand)]
enum JobCommand {
    /// Submit a job edit buffer read from a JSON file.
    Submit {
        file: PathBuf,
        #[arg(long)]
        update: bool,
    },
    /// Show the catalog descriptions for a module and trigger.
    Describe {
        #[arg(long, default_value = "")]
        module: String,
        #[arg(long, default_value = "")]
        trigger: String,
    },
    /// Pause a running job, or resume a paused one.
    Pause { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Submit a user edit buffer read from a JSON file.
    Submit {
        file: PathBuf,
        #[arg(long)]
        update: bool,
    },
    Delete { id: String },
}

#[derive(ValueEnum, Clone, Copy)]
enum ListTarget {
    Jobs,
    Users,
    JobLog,
    UserLog,
    ErrorLog,
}

struct AppContext {
    conf: AdminConfig,
    api: Arc<dyn AdminApi>,
    submission: SubmissionController,
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let conf = config::init(&cli.config).expect("failed to load configuration");

    let session = Session::new(conf.token.clone(), None);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let navigator: Arc<dyn Navigator> = Arc::new(TracingNavigator);
    let api: Arc<dyn AdminApi> = Arc::new(HttpAdminApi::new(
        &conf,
        &session,
        notifier.clone(),
        navigator.clone(),
    ));
    let ctx = AppContext {
        submission: SubmissionController::new(&conf, api.clone(), notifier, navigator),
        api,
        conf,
    };

    if let Err(e) = run(&ctx, cli.command).await {
        error!(?e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    let routes = &ctx.conf.api_routes;
    match command {
        Command::Job(JobCommand::Submit { file, update }) => {
            let buffer: JobBuffer = read_buffer(&file)?;
            submit(ctx, &buffer, update).await
        }
        Command::Job(JobCommand::Describe { module, trigger }) => {
            let catalog = ctx.api.job_catalog(&routes.job_common_data).await?;
            describe(&catalog, &module, &trigger);
            Ok(())
        }
        Command::Job(JobCommand::Pause { id }) => {
            ctx.api.pause_job(&routes.pause_job, &id).await?;
            Ok(())
        }
        Command::Job(JobCommand::Delete { id }) => {
            ctx.api.delete(&routes.job, &id).await?;
            Ok(())
        }
        Command::User(UserCommand::Submit { file, update }) => {
            let buffer: UserBuffer = read_buffer(&file)?;
            submit(ctx, &buffer, update).await
        }
        Command::User(UserCommand::Delete { id }) => {
            ctx.api.delete(&routes.user, &id).await?;
            Ok(())
        }
        Command::List {
            target,
            filters,
            page,
        } => list(ctx, target, &filters, page).await,
    }
}

fn read_buffer<B: DeserializeOwned>(file: &PathBuf) -> Result<B> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not an edit buffer", file.display()))
}

async fn submit<B: EditBuffer + Sync>(ctx: &AppContext, buffer: &B, update: bool) -> Result<()> {
    match ctx
        .submission
        .submit(buffer, SubmitMode::from_is_update(update))
        .await?
    {
        SubmitOutcome::Submitted { response, .. } => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        SubmitOutcome::Ignored => bail!("a submission is already in progress"),
    }
}

fn describe(catalog: &JobCatalog, module: &str, trigger: &str) {
    if !module.is_empty() {
        println!(
            "{}: {}",
            module,
            catalog.module_description(module).unwrap_or_default()
        );
    }
    if !trigger.is_empty() {
        println!(
            "{}: {}",
            trigger,
            catalog.trigger_description(trigger).unwrap_or_default()
        );
        if let Some(kind) = TriggerKind::from_tag(trigger) {
            println!("fields: {}", kind.fields().join(", "));
        }
    }
    if module.is_empty() && trigger.is_empty() {
        for job in &catalog.available_jobs {
            println!("module  {:<20} {}", job.name, job.label);
        }
        for (kind, info) in catalog.supported_triggers() {
            println!("trigger {:<20} {}", kind, info.label);
        }
    }
}

async fn list(ctx: &AppContext, target: ListTarget, raw_filters: &[String], page: u32) -> Result<()> {
    let routes = &ctx.conf.api_routes;
    let endpoint = match target {
        ListTarget::Jobs => &routes.jobs,
        ListTarget::Users => &routes.users,
        ListTarget::JobLog => &routes.job_log,
        ListTarget::UserLog => &routes.user_log,
        ListTarget::ErrorLog => &routes.error_log,
    };

    let mut list = ListController::new(&ctx.conf, ctx.api.clone(), endpoint.as_str(), FilterSet::default());
    list.load().await?;

    for raw in raw_filters {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("filter `{}` is not KEY=VALUE", raw))?;
        let definition = list
            .filters()
            .get(key)
            .with_context(|| format!("{} has no filter `{}`", endpoint, key))?;
        let value = definition.parse_value(value)?;
        list.set_filter(key, value)?;
    }
    if page > 1 {
        list.set_page(page);
    }
    list.settle().await?;

    info!(query = ?list.query(), "Listed");
    for item in list.items() {
        println!("{}", item);
    }
    if let Some(p) = list.pagination() {
        println!("page {}/{} ({} items)", p.page, p.pages(), p.total_items);
    }
    Ok(())
}
