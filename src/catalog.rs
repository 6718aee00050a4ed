use serde::{Deserialize, Serialize};

use crate::form::trigger::TriggerKind;

/// A job module the service can schedule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AvailableJob {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub job_doc: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobTriggerInfo {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub label: String,
    pub description: String,
}

/// Ordered catalogs backing the job form's module and trigger selects.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct JobCatalog {
    #[serde(default)]
    pub available_jobs: Vec<AvailableJob>,
    #[serde(default)]
    pub job_triggers: Vec<JobTriggerInfo>,
}

impl JobCatalog {
    pub fn module_description(&self, module: &str) -> Option<&str> {
        module_description(&self.available_jobs, module)
    }

    pub fn trigger_description(&self, tag: &str) -> Option<&str> {
        trigger_description(&self.job_triggers, tag)
    }

    /// Triggers offered by the catalog that this crate knows how to build.
    pub fn supported_triggers(&self) -> impl Iterator<Item = (TriggerKind, &JobTriggerInfo)> {
        self.job_triggers
            .iter()
            .filter_map(|t| TriggerKind::from_tag(&t.name).map(|k| (k, t)))
    }
}

pub fn module_description<'a>(available_jobs: &'a [AvailableJob], module: &str) -> Option<&'a str> {
    available_jobs
        .iter()
        .find(|j| j.name == module)
        .and_then(|j| j.job_doc.as_deref())
}

pub fn trigger_description<'a>(job_triggers: &'a [JobTriggerInfo], tag: &str) -> Option<&'a str> {
    job_triggers
        .iter()
        .find(|t| t.name == tag)
        .map(|t| t.description.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> JobCatalog {
        serde_json::from_str(
            r#"{
                "available_jobs": [
                    {"name": "test_job", "label": "Test Job", "job_doc": "Sleeps, then logs."},
                    {"name": "monitor_sockets", "label": "Monitor sockets", "job_doc": null}
                ],
                "job_triggers": [
                    {"id": 1, "name": "cron", "label": "Cron", "description": "Like UNIX cron."},
                    {"id": 2, "name": "date", "label": "Date", "description": "Runs once."},
                    {"id": 4, "name": "calendar", "label": "Calendar", "description": "Unsupported."}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn looks_up_descriptions_by_key() {
        let catalog = catalog();

        assert_eq!(catalog.trigger_description("cron"), Some("Like UNIX cron."));
        assert_eq!(catalog.module_description("test_job"), Some("Sleeps, then logs."));
    }

    #[test]
    fn unknown_or_unselected_keys_have_no_description() {
        let catalog = catalog();

        assert_eq!(catalog.trigger_description(""), None);
        assert_eq!(catalog.trigger_description("interval"), None);
        assert_eq!(catalog.module_description("missing"), None);
        assert_eq!(catalog.module_description("monitor_sockets"), None);
        assert_eq!(catalog.module_description("").unwrap_or_default(), "");
    }

    #[test]
    fn supported_triggers_skip_unknown_tags() {
        let catalog = catalog();
        let kinds: Vec<TriggerKind> = catalog.supported_triggers().map(|(k, _)| k).collect();

        assert_eq!(kinds, vec![TriggerKind::Cron, TriggerKind::Date]);
    }
}
