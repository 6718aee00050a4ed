use std::fmt;

use serde::{Deserialize, Serialize};

/// Which schedule shape a job uses. The tag strings are the service's trigger names.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Date,
    Interval,
    Cron,
}

const DATE_FIELDS: &[&str] = &["run_date"];
const INTERVAL_FIELDS: &[&str] = &[
    "weeks",
    "days",
    "hours",
    "minutes",
    "seconds",
    "start_date",
    "end_date",
];
const CRON_FIELDS: &[&str] = &[
    "year",
    "month",
    "day",
    "day_of_week",
    "hour",
    "minute",
    "second",
    "start_date",
    "end_date",
];

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [TriggerKind::Date, TriggerKind::Interval, TriggerKind::Cron];

    /// `None` for an empty or unknown tag, i.e. no field group is active.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "date" => Some(TriggerKind::Date),
            "interval" => Some(TriggerKind::Interval),
            "cron" => Some(TriggerKind::Cron),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TriggerKind::Date => "date",
            TriggerKind::Interval => "interval",
            TriggerKind::Cron => "cron",
        }
    }

    /// Buffer fields that belong to this variant.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            TriggerKind::Date => DATE_FIELDS,
            TriggerKind::Interval => INTERVAL_FIELDS,
            TriggerKind::Cron => CRON_FIELDS,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

/// A job schedule narrowed to its active variant. Serializes flat, as
/// `{"trigger": "<tag>", ...variant fields}`, which is how the service reads it.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "trigger", rename_all = "lowercase")]
pub enum Trigger {
    Date(DateTrigger),
    Interval(IntervalTrigger),
    Cron(CronTrigger),
}

/// Runs once. An empty run date means "run immediately".
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct DateTrigger {
    pub run_date: Option<String>,
}

/// Inclusive earliest/latest dates the job may fire on.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct TriggerBounds {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Repeats every `weeks + days + ... + seconds`. Values are digit strings, which is
/// what the service's `isdigit()` check accepts.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct IntervalTrigger {
    pub weeks: String,
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    #[serde(flatten)]
    pub bounds: TriggerBounds,
}

/// Cron-style constraints. An empty field means "any".
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct CronTrigger {
    pub year: String,
    pub month: String,
    pub day: String,
    pub day_of_week: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
    #[serde(flatten)]
    pub bounds: TriggerBounds,
}
