//! Shapes one normalized API payload into metric records.
//!
//! Only single-key objects are mapped. The API answers every `session/*` and `admin/*` resource
//! with exactly one key holding a list, and the collector splits the `server` resource into
//! single-key payloads before mapping it.

use crate::{
    normalize::normalize_key,
    record::{
        MetricRecord,
        MetricValue,
    },
};
use serde_json::{
    Map,
    Value,
};

pub const PLAYERS_KEY: &str = "players";
pub const PLAYER_PING_METRIC: &str = "player_ping";

/// Maps `payload` (already normalized) into records. `resource` is only used for logging.
pub fn map_response(resource: &str, payload: &Value) -> Vec<MetricRecord> {
    let Value::Object(map) = payload else {
        warn!(resource, kind = value_kind(payload), "unhandled payload, expected an object");
        return Vec::new();
    };

    let mut entries = map.iter();
    let (name, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => {
            debug!(resource, "empty payload");
            return Vec::new();
        }
        (Some(_), Some(_)) => {
            warn!(resource, keys = ?map.keys().collect::<Vec<_>>(), "unhandled metrics received");
            return Vec::new();
        }
    };

    match value {
        Value::Array(items) if name == PLAYERS_KEY && !items.is_empty() => map_players(items),
        Value::Array(items) => single(name, items.len()),
        Value::Bool(flag) => single(name, *flag),
        Value::Number(number) => single(name, MetricValue::from_number(number)),
        Value::String(text) => single(name, text.as_str()),
        Value::Null | Value::Object(_) => {
            debug!(resource, name, kind = value_kind(value), "skipping value without a metric");
            Vec::new()
        }
    }
}

fn single(name: &str, value: impl Into<MetricValue>) -> Vec<MetricRecord> {
    match MetricRecord::new(name, value) {
        Ok(record) => vec![record],
        Err(err) => {
            debug!(%err, "dropping metric");
            Vec::new()
        }
    }
}

fn map_players(players: &[Value]) -> Vec<MetricRecord> {
    players
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|player| {
            let ping = match field(player, "ping") {
                Some(Value::Number(ping)) if ping.as_f64().is_some_and(|p| p > 0.0) => ping,
                _ => return None,
            };
            let record = MetricRecord::new(PLAYER_PING_METRIC, MetricValue::from_number(ping))
                .ok()?
                .with_label("player_name", text(field(player, "display_name")))
                .with_label("player_id", text(field(player, "steam_id")))
                .with_label("faction", text(field(player, "faction_name")));
            Some(record)
        })
        .collect()
}

/// Looks up `name`, falling back to comparing normalized keys so raw player entries work too.
fn field<'a>(entry: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    entry.get(name).or_else(|| {
        entry
            .iter()
            .find(|(key, _)| normalize_key(key) == name)
            .map(|(_, value)| value)
    })
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
