//! Renders metric records in the Prometheus/OpenMetrics text format.

use prometheus_client::{
    encoding::text::encode,
    metrics::{
        family::Family,
        gauge::Gauge,
    },
    registry::Registry,
};
use se_exporter_client::{
    MetricRecord,
    MetricValue,
};
use std::{
    collections::{
        BTreeMap,
        HashSet,
    },
    sync::atomic::AtomicU64,
};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

type LabelSet = Vec<(String, String)>;
type GaugeFamily = Family<LabelSet, Gauge<f64, AtomicU64>>;

/// Every record becomes a gauge `<prefix>_<name>`. Text values are exposed info-style: the gauge
/// is 1 and the text goes into a `value` label.
///
/// Two records for the same series keep the first value.
pub fn render(records: &[MetricRecord], prefix: &str) -> Result<String, std::fmt::Error> {
    let mut registry = if prefix.is_empty() {
        Registry::default()
    } else {
        Registry::with_prefix(sanitize(prefix))
    };

    let mut families = BTreeMap::<String, GaugeFamily>::new();
    let mut series = HashSet::<(String, LabelSet)>::new();
    for record in records {
        let name = sanitize(record.name());
        let mut labels: LabelSet = record
            .labels()
            .iter()
            .map(|(name, value)| (sanitize(name), escape_label_value(value)))
            .collect();

        let value = match record.value() {
            MetricValue::Text(text) => {
                labels.push(("value".to_string(), escape_label_value(text)));
                1.0
            }
            numeric => numeric.as_f64().unwrap_or(f64::NAN),
        };

        if !series.insert((name.clone(), labels.clone())) {
            warn!(metric = %name, ?labels, dropped = %record.value(), "series reported twice, keeping the first value");
            continue;
        }

        families.entry(name).or_default().get_or_create(&labels).set(value);
    }

    for (name, family) in families {
        let help = format!("{name} reported by the Space Engineers remote API");
        registry.register(name, help, family);
    }

    let mut out = String::new();
    encode(&mut out, &registry)?;
    Ok(out)
}

/// The encoder writes label values verbatim between double quotes.
fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Metric and label names may only contain `[a-zA-Z0-9_]` and must not start with a digit.
fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
