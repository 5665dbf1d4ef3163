use crate::error::{
    ClientError,
    Result,
};
use std::{
    collections::BTreeMap,
    fmt,
};

pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Text(_) => None,
        }
    }

    pub(crate) fn from_number(number: &serde_json::Number) -> Self {
        match number.as_i64() {
            Some(v) => MetricValue::Integer(v),
            None => MetricValue::Float(number.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Integer(value as i64)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        MetricValue::Integer(value as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// One named, labeled measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    name: String,
    value: MetricValue,
    labels: Labels,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClientError::EmptyMetricName);
        }
        Ok(Self {
            name,
            value: value.into(),
            labels: Labels::new(),
        })
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    /// Adds `labels` without overriding labels that are already set.
    pub fn with_labels<'a>(mut self, labels: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (name, value) in labels {
            self.labels.entry(name.clone()).or_insert_with(|| value.clone());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v:?}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{{{labels}}}")?;
        }
        write!(f, " {}", self.value)
    }
}
