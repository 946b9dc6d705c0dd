//! Metric samples handed to the check evaluator.
//!
//! A [`Metric`] mirrors a Telegraf-style measurement: a name, string tags,
//! typed fields and a timestamp. Field values are read through
//! [`Metric::numeric_field`], which either yields an `f64` or a
//! [`CoreError::Classification`] describing why it could not.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Timestamp, UnixSeconds};

/// A single field value of a metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Numeric view of the value; `None` for booleans and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Bool(_) | FieldValue::Str(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::UInt(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// An immutable metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
    timestamp: Timestamp,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            name: name.into(),
            tags,
            fields,
            timestamp,
        }
    }

    /// Start an empty sample stamped with the current time.
    ///
    /// Mostly useful together with [`with_tag`](Self::with_tag) and
    /// [`with_field`](Self::with_field) when assembling samples by hand.
    pub fn now(name: impl Into<String>) -> Self {
        Self::new(name, BTreeMap::new(), BTreeMap::new(), Utc::now())
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn unix_seconds(&self) -> UnixSeconds {
        self.timestamp.timestamp()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Read a field as a finite `f64`.
    ///
    /// Fails with [`CoreError::Classification`] when the field is absent,
    /// holds a non-numeric value, or is NaN/infinite.
    pub fn numeric_field(&self, key: &str) -> Result<f64, CoreError> {
        let value = self.fields.get(key).ok_or_else(|| {
            CoreError::Classification(format!("{}: missing field '{key}'", self.name))
        })?;

        let number = value.as_f64().ok_or_else(|| {
            CoreError::Classification(format!(
                "{}: field '{key}' is {}, expected a number",
                self.name,
                value.type_name()
            ))
        })?;

        if !number.is_finite() {
            return Err(CoreError::Classification(format!(
                "{}: field '{key}' is not finite ({number})",
                self.name
            )));
        }

        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample() -> Metric {
        Metric::now("system")
            .with_tag("host", "web-1")
            .with_field("load1", 1.5)
            .with_field("n_cpus", 8_i64)
            .with_field("uptime_format", "3 days")
            .with_field("healthy", true)
    }

    #[test]
    fn numeric_field_reads_floats_and_integers() {
        let m = sample();
        assert_eq!(m.numeric_field("load1").unwrap(), 1.5);
        assert_eq!(m.numeric_field("n_cpus").unwrap(), 8.0);
    }

    #[test]
    fn numeric_field_rejects_missing_field() {
        let err = sample().numeric_field("load5").unwrap_err();
        assert_matches!(err, CoreError::Classification(msg) if msg.contains("missing field 'load5'"));
    }

    #[test]
    fn numeric_field_rejects_strings_and_bools() {
        assert_matches!(
            sample().numeric_field("uptime_format"),
            Err(CoreError::Classification(_))
        );
        assert_matches!(
            sample().numeric_field("healthy"),
            Err(CoreError::Classification(_))
        );
    }

    #[test]
    fn numeric_field_rejects_nan() {
        let m = Metric::now("mem").with_field("used_percent", f64::NAN);
        assert_matches!(
            m.numeric_field("used_percent"),
            Err(CoreError::Classification(_))
        );
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "name": "system",
            "tags": {"host": "h"},
            "fields": {"load1": 1.62, "n_users": 3, "uptime_format": "1 day"},
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;

        let m: Metric = serde_json::from_str(json).expect("metric JSON should parse");
        assert_eq!(m.name(), "system");
        assert_eq!(m.tag("host"), Some("h"));
        assert_eq!(m.field("load1"), Some(&FieldValue::Float(1.62)));
        assert_eq!(m.field("n_users"), Some(&FieldValue::Int(3)));
        assert_eq!(m.unix_seconds(), 1_714_564_800);
    }
}
