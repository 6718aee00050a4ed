use std::time::Duration;

use crate::constants::{APP_NAME, DEFAULT_NAVIGATION_DELAY_MS, DEFAULT_PAGE_PARAMETER};

use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub name: String,
    pub api_url: String,
    pub token: Option<String>,
    pub navigation_delay: Duration,
    pub page_parameter: String,
    pub api_routes: ApiRoutes,
    pub front_routes: FrontRoutes,
}

/// Service endpoints. Item routes (`user`, `job`, `pause_job`) are prefixes the
/// record id is appended to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiRoutes {
    pub login: String,
    pub logout: String,
    pub users: String,
    pub user: String,
    pub jobs: String,
    pub job: String,
    pub pause_job: String,
    pub job_log: String,
    pub user_log: String,
    pub error_log: String,
    pub job_common_data: String,
    pub user_common_data: String,
}

impl Default for ApiRoutes {
    fn default() -> Self {
        ApiRoutes {
            login: "/auth/login".to_string(),
            logout: "/auth/logout".to_string(),
            users: "/users".to_string(),
            user: "/users/".to_string(),
            jobs: "/jobs".to_string(),
            job: "/jobs/".to_string(),
            pause_job: "/jobs/pause/".to_string(),
            job_log: "/logs/jobs".to_string(),
            user_log: "/logs/users".to_string(),
            error_log: "/logs/errors".to_string(),
            job_common_data: "/jobs_common_data".to_string(),
            user_common_data: "/users_common_data".to_string(),
        }
    }
}

/// Views the navigator can be sent to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrontRoutes {
    pub login: String,
    pub users: String,
    pub add_user: String,
    pub user: String,
    pub jobs: String,
    pub add_job: String,
    pub job: String,
    pub job_log: String,
    pub user_log: String,
    pub error_log: String,
    pub error: String,
}

impl Default for FrontRoutes {
    fn default() -> Self {
        FrontRoutes {
            login: "/front/login".to_string(),
            users: "/front/users".to_string(),
            add_user: "/front/users/add".to_string(),
            user: "/front/users/".to_string(),
            jobs: "/front/jobs".to_string(),
            add_job: "/front/jobs/add".to_string(),
            job: "/front/jobs/".to_string(),
            job_log: "/front/logs/jobs".to_string(),
            user_log: "/front/logs/users".to_string(),
            error_log: "/front/logs/errors".to_string(),
            error: "/front/error".to_string(),
        }
    }
}

#[derive(Deserialize, Clone)]
struct ConfFileSettings {
    name: String,
    api_url: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default = "default_navigation_delay_ms")]
    navigation_delay_ms: u64,
    #[serde(default = "default_page_parameter")]
    page_parameter: String,
    #[serde(default)]
    api_routes: ApiRoutes,
    #[serde(default)]
    front_routes: FrontRoutes,
}

fn default_navigation_delay_ms() -> u64 {
    DEFAULT_NAVIGATION_DELAY_MS
}

fn default_page_parameter() -> String {
    DEFAULT_PAGE_PARAMETER.to_string()
}

impl AdminConfig {
    /// Default routes against `api_url`, no token.
    pub fn for_api_url(api_url: impl Into<String>) -> Self {
        AdminConfig {
            name: "apscron-admin".to_string(),
            api_url: api_url.into(),
            token: None,
            navigation_delay: Duration::from_millis(DEFAULT_NAVIGATION_DELAY_MS),
            page_parameter: DEFAULT_PAGE_PARAMETER.to_string(),
            api_routes: ApiRoutes::default(),
            front_routes: FrontRoutes::default(),
        }
    }
}

pub fn init(file: &str) -> Result<AdminConfig> {
    let conf_file_settings = Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(config::Environment::with_prefix(APP_NAME).separator("__"))
        .build()?
        .try_deserialize::<ConfFileSettings>()?;

    Ok(AdminConfig {
        name: conf_file_settings.name,
        api_url: conf_file_settings.api_url.trim_end_matches('/').to_string(),
        token: conf_file_settings.token.filter(|t| !t.is_empty()),
        navigation_delay: Duration::from_millis(conf_file_settings.navigation_delay_ms),
        page_parameter: conf_file_settings.page_parameter,
        api_routes: conf_file_settings.api_routes,
        front_routes: conf_file_settings.front_routes,
    })
}
