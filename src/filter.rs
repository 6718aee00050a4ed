//! List-view filters and their flattening into query parameters.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the two ends of a serialized date range.
pub const RANGE_SEPARATOR: &str = " - ";
pub const SELECT_SEPARATOR: &str = ",";

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("no filter named `{0}`")]
    UnknownFilter(String),
    #[error("filter `{key}` expects a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("filter `{key}` has no option `{id}`")]
    UnknownOption { key: String, id: String },
    #[error("filter `{key}` expects `<start> - <end>`")]
    MalformedRange { key: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum OptionId {
    Int(i64),
    Text(String),
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Int(i) => write!(f, "{}", i),
            OptionId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SelectOption {
    pub id: OptionId,
    pub label: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        DateRange {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    fn bounds(&self) -> Option<(&str, &str)> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => Some((s, e)),
            _ => None,
        }
    }
}

/// Type and live value of one filter. The service sends `value: null` for an unset
/// filter of any type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterInput {
    Daterange {
        #[serde(default)]
        value: Option<DateRange>,
    },
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default)]
        value: Option<Vec<SelectOption>>,
    },
    Text {
        #[serde(default)]
        value: Option<String>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterDefinition {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub input: FilterInput,
}

/// A value a view can assign to a filter.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Range(DateRange),
    Selected(Vec<SelectOption>),
    Text(String),
    Clear,
}

impl FilterDefinition {
    pub fn type_name(&self) -> &'static str {
        input_type_name(&self.input)
    }

    pub fn set_value(&mut self, value: FilterValue) -> Result<(), FilterError> {
        match (&mut self.input, value) {
            (FilterInput::Daterange { value }, FilterValue::Clear) => *value = None,
            (FilterInput::Select { value, .. }, FilterValue::Clear) => *value = None,
            (FilterInput::Text { value }, FilterValue::Clear) => *value = None,
            (FilterInput::Daterange { value }, FilterValue::Range(r)) => *value = Some(r),
            (FilterInput::Select { value, .. }, FilterValue::Selected(s)) => *value = Some(s),
            (FilterInput::Text { value }, FilterValue::Text(t)) => *value = Some(t),
            (input, _) => {
                return Err(FilterError::TypeMismatch {
                    key: self.key.clone(),
                    expected: input_type_name(input),
                })
            }
        }
        Ok(())
    }

    /// Reads a value typed on a command line: text as-is, select as comma separated
    /// option ids, daterange as `<start> - <end>`. Empty input clears the filter.
    pub fn parse_value(&self, raw: &str) -> Result<FilterValue, FilterError> {
        if raw.is_empty() {
            return Ok(FilterValue::Clear);
        }
        match &self.input {
            FilterInput::Text { .. } => Ok(FilterValue::Text(raw.to_string())),
            FilterInput::Daterange { .. } => raw
                .split_once(RANGE_SEPARATOR)
                .map(|(s, e)| FilterValue::Range(DateRange::new(s.trim(), e.trim())))
                .ok_or_else(|| FilterError::MalformedRange {
                    key: self.key.clone(),
                }),
            FilterInput::Select { options, .. } => raw
                .split(SELECT_SEPARATOR)
                .map(str::trim)
                .map(|id| {
                    options
                        .iter()
                        .find(|o| o.id.to_string() == id)
                        .cloned()
                        .ok_or_else(|| FilterError::UnknownOption {
                            key: self.key.clone(),
                            id: id.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::Selected),
        }
    }

    /// The query-string form of the current value, or `None` when it is empty.
    pub fn adapted_value(&self) -> Option<String> {
        match &self.input {
            FilterInput::Daterange { value } => value
                .as_ref()
                .and_then(DateRange::bounds)
                .map(|(start, end)| format!("{}{}{}", start, RANGE_SEPARATOR, end)),
            FilterInput::Select { value, .. } => value
                .as_ref()
                .filter(|selected| !selected.is_empty())
                .map(|selected| {
                    selected
                        .iter()
                        .map(|o| o.id.to_string())
                        .collect::<Vec<_>>()
                        .join(SELECT_SEPARATOR)
                }),
            FilterInput::Text { value } => value
                .as_ref()
                .filter(|text| !text.trim().is_empty())
                .cloned(),
        }
    }
}

fn input_type_name(input: &FilterInput) -> &'static str {
    match input {
        FilterInput::Daterange { .. } => "daterange",
        FilterInput::Select { .. } => "select",
        FilterInput::Text { .. } => "text",
    }
}

/// A list view's filters in display order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct FilterSet(pub IndexMap<String, FilterDefinition>);

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: FilterValue) -> Result<(), FilterError> {
        self.0
            .get_mut(key)
            .ok_or_else(|| FilterError::UnknownFilter(key.to_string()))?
            .set_value(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterDefinition)> {
        self.0.iter()
    }
}

/// Filter key to query value, only for filters that currently hold a value.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct AdaptedFilters(pub IndexMap<String, String>);

impl AdaptedFilters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Recomputes the whole query map from the filters' current values.
pub fn adapt(filters: &FilterSet) -> AdaptedFilters {
    AdaptedFilters(
        filters
            .iter()
            .filter_map(|(key, def)| def.adapted_value().map(|v| (key.clone(), v)))
            .collect(),
    )
}
