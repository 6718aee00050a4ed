use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::trigger::{
    CronTrigger, DateTrigger, IntervalTrigger, Trigger, TriggerBounds, TriggerKind,
};
use super::{json_source, lenient_string, EditBuffer};
use crate::config::{ApiRoutes, FrontRoutes};
use crate::controller::error::FormError;

/// The job form's edit buffer. It is flat like the form: fields of every trigger
/// variant may be populated at once, and only the selected one is submitted.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JobBuffer {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "json_source")]
    pub kwargs: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub trigger: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub run_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub weeks: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub days: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hours: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub minutes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub seconds: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub day_of_week: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hour: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub minute: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub second: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
}

/// What a job payload carries besides its kwargs and trigger.
#[derive(Serialize)]
struct JobCommon<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    name: &'a str,
    module: &'a str,
}

impl JobBuffer {
    pub fn trigger_kind(&self) -> Option<TriggerKind> {
        TriggerKind::from_tag(&self.trigger)
    }

    pub fn select_trigger(&mut self, kind: TriggerKind) {
        self.trigger = kind.tag().to_string();
    }

    /// Narrows the flat buffer to the selected trigger variant.
    pub fn trigger(&self) -> Result<Trigger, FormError> {
        let kind = self.trigger_kind().ok_or_else(|| {
            FormError::Validation(format!("unknown job trigger '{}'", self.trigger))
        })?;

        Ok(match kind {
            TriggerKind::Date => Trigger::Date(DateTrigger {
                run_date: self.run_date.clone(),
            }),
            TriggerKind::Interval => Trigger::Interval(IntervalTrigger {
                weeks: interval_field("weeks", &self.weeks)?,
                days: interval_field("days", &self.days)?,
                hours: interval_field("hours", &self.hours)?,
                minutes: interval_field("minutes", &self.minutes)?,
                seconds: interval_field("seconds", &self.seconds)?,
                bounds: self.bounds(),
            }),
            TriggerKind::Cron => Trigger::Cron(CronTrigger {
                year: self.year.clone().unwrap_or_default(),
                month: self.month.clone().unwrap_or_default(),
                day: self.day.clone().unwrap_or_default(),
                day_of_week: self.day_of_week.clone().unwrap_or_default(),
                hour: self.hour.clone().unwrap_or_default(),
                minute: self.minute.clone().unwrap_or_default(),
                second: self.second.clone().unwrap_or_default(),
                bounds: self.bounds(),
            }),
        })
    }

    fn bounds(&self) -> TriggerBounds {
        TriggerBounds {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

/// Digits go out exactly as typed; a blank value means 0.
fn interval_field(name: &str, value: &Option<String>) -> Result<String, FormError> {
    match value.as_deref() {
        None => Ok("0".to_string()),
        Some(v) if v.trim().is_empty() => Ok("0".to_string()),
        Some(v) if v.bytes().all(|b| b.is_ascii_digit()) => Ok(v.to_string()),
        Some(v) => Err(FormError::Validation(format!(
            "{} must be a non-negative integer, got '{}'",
            name, v
        ))),
    }
}

impl EditBuffer for JobBuffer {
    const JSON_FIELD: &'static str = "kwargs";

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn kind(&self) -> String {
        String::from("job")
    }

    fn json_source(&self) -> &str {
        &self.kwargs
    }

    fn payload_fields(&self) -> Result<Map<String, Value>, FormError> {
        let common = JobCommon {
            id: self.id.as_deref(),
            name: &self.name,
            module: &self.module,
        };
        let mut fields = into_object(serde_json::to_value(common))?;
        fields.extend(into_object(serde_json::to_value(self.trigger()?))?);
        Ok(fields)
    }

    fn collection_route(routes: &ApiRoutes) -> &str {
        &routes.jobs
    }

    fn item_route(routes: &ApiRoutes) -> &str {
        &routes.job
    }

    fn list_view(routes: &FrontRoutes) -> &str {
        &routes.jobs
    }
}

pub(crate) fn into_object(
    value: Result<Value, serde_json::Error>,
) -> Result<Map<String, Value>, FormError> {
    match value {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FormError::Validation(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(FormError::Validation(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interval_job() -> JobBuffer {
        JobBuffer {
            name: "job1".to_string(),
            kwargs: r#"{"x":1}"#.to_string(),
            module: "m".to_string(),
            trigger: "interval".to_string(),
            weeks: Some("1".to_string()),
            days: Some("0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn hydrates_from_fetched_record() {
        let buffer: JobBuffer = serde_json::from_value(json!({
            "id": "test_job__2024_01_01_00_00_00_000000",
            "name": "nightly",
            "kwargs": {"x": 1},
            "module": "test_job",
            "next_run_time": "2024-01-02 00:00:00",
            "days": 1,
            "seconds": 30,
            "start_date": null,
            "end_date": null,
            "trigger": "interval"
        }))
        .unwrap();

        assert_eq!(buffer.id.as_deref(), Some("test_job__2024_01_01_00_00_00_000000"));
        assert_eq!(buffer.kwargs, r#"{"x":1}"#);
        assert_eq!(buffer.days.as_deref(), Some("1"));
        assert_eq!(buffer.seconds.as_deref(), Some("30"));
        assert_eq!(buffer.trigger_kind(), Some(TriggerKind::Interval));
    }

    #[test]
    fn empty_interval_fields_default_to_zero() {
        let mut buffer = interval_job();
        buffer.days = Some("".to_string());

        match buffer.trigger().unwrap() {
            Trigger::Interval(t) => {
                assert_eq!(t.weeks, "1");
                assert_eq!(t.days, "0");
                assert_eq!(t.seconds, "0");
            }
            other => panic!("unexpected trigger {:?}", other),
        }
    }

    #[test]
    fn negative_interval_is_rejected() {
        let mut buffer = interval_job();
        buffer.hours = Some("-2".to_string());

        let err = buffer.trigger().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("hours"));
    }

    #[test]
    fn missing_trigger_is_rejected() {
        let mut buffer = interval_job();
        buffer.trigger.clear();

        assert!(buffer.trigger().unwrap_err().is_validation());
    }

    #[test]
    fn payload_fields_carry_only_the_active_variant() {
        let mut buffer = interval_job();
        buffer.hour = Some("5".to_string());
        buffer.run_date = Some("2024-01-01 00:00:00".to_string());

        let fields = buffer.payload_fields().unwrap();

        assert_eq!(fields["trigger"], json!("interval"));
        assert_eq!(fields["weeks"], json!("1"));
        assert!(!fields.contains_key("hour"));
        assert!(!fields.contains_key("run_date"));
        assert!(!fields.contains_key("kwargs"));
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn selecting_a_trigger_switches_the_active_group() {
        let mut buffer = interval_job();
        buffer.select_trigger(TriggerKind::Date);

        assert_eq!(buffer.trigger, "date");
        assert!(matches!(buffer.trigger().unwrap(), Trigger::Date(_)));
    }

    #[test]
    fn typed_values_are_copied_verbatim() {
        let mut buffer = interval_job();
        buffer.weeks = Some("01".to_string());
        buffer.start_date = Some("".to_string());

        let fields = buffer.payload_fields().unwrap();

        assert_eq!(fields["weeks"], json!("01"));
        assert_eq!(fields["start_date"], json!(""));
        assert_eq!(fields["end_date"], json!(null));
    }
}
