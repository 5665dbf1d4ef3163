use crate::{
    credentials::Credentials,
    error::{
        ClientError,
        Result,
    },
    fetcher::ResourceFetcher,
    mapper::map_response,
    record::{
        Labels,
        MetricRecord,
    },
};
use serde_json::{
    Map,
    Value,
};
use std::time::Instant;

/// Resource that carries the server identity, fetched first in every cycle.
pub const BASE_RESOURCE: &str = "server";

pub const DEFAULT_RESOURCES: [&str; 8] = [
    "session/players",
    "session/planets",
    "session/characters",
    "session/grids",
    "session/asteroids",
    "session/floatingObjects",
    "admin/bannedPlayers",
    "admin/kickedPlayers",
];

pub const DEFAULT_IDENTITY_FIELDS: [&str; 2] = ["server_name", "world_name"];

pub const DEFAULT_EXCLUDED_FIELDS: [&str; 2] = ["game", "server_id"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// One resource after the other.
    #[default]
    Sequential,
    /// All non-base resources at once.
    Concurrent,
}

impl CollectMode {
    pub fn from_run_async(run_async: bool) -> Self {
        if run_async {
            CollectMode::Concurrent
        } else {
            CollectMode::Sequential
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    pub mode: CollectMode,
    /// Resources fetched after the base resource.
    pub resources: Vec<String>,
    /// Base resource fields turned into labels for every metric.
    pub identity_fields: Vec<String>,
    /// Base resource fields that are neither labels nor metrics.
    pub excluded_fields: Vec<String>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            mode: CollectMode::default(),
            resources: DEFAULT_RESOURCES.iter().map(ToString::to_string).collect(),
            identity_fields: DEFAULT_IDENTITY_FIELDS.iter().map(ToString::to_string).collect(),
            excluded_fields: DEFAULT_EXCLUDED_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Labels identifying the server, attached to every metric of one collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerLabels(Labels);

impl ServerLabels {
    /// `server_name: "Alpha Station"` becomes `server="alpha station"`.
    pub fn from_base(base: &Map<String, Value>, identity_fields: &[String]) -> Self {
        let labels = base
            .iter()
            .filter(|(key, _)| identity_fields.contains(key))
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.to_lowercase(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                let name = key.strip_suffix("_name").unwrap_or(key);
                Some((name.to_string(), value))
            })
            .collect();
        Self(labels)
    }

    pub fn labels(&self) -> &Labels {
        &self.0
    }

    fn attach(&self, records: Vec<MetricRecord>) -> Vec<MetricRecord> {
        records.into_iter().map(|record| record.with_labels(&self.0)).collect()
    }
}

/// Runs collection cycles against one server.
#[derive(Debug)]
pub struct MetricsCollector {
    fetcher: ResourceFetcher,
    options: CollectorOptions,
}

impl MetricsCollector {
    pub fn new(credentials: Credentials, options: CollectorOptions) -> Result<Self> {
        Ok(Self::with_fetcher(ResourceFetcher::new(credentials)?, options))
    }

    pub fn with_fetcher(fetcher: ResourceFetcher, options: CollectorOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &ResourceFetcher {
        &self.fetcher
    }

    /// Runs one cycle in the configured [`CollectMode`].
    ///
    /// Fails only when the base resource can't be fetched. Other failing resources are logged
    /// and contribute no metrics.
    #[instrument(level = "debug", skip(self), fields(mode = ?self.options.mode))]
    pub async fn collect(&self) -> Result<Vec<MetricRecord>> {
        let start = Instant::now();
        let base = self.fetcher.fetch_normalized(BASE_RESOURCE).await?;
        let (labels, base_records) = self.base_records(&base);

        let results: Vec<(&str, Result<Value>)> = match self.options.mode {
            CollectMode::Sequential => {
                let mut results = Vec::with_capacity(self.options.resources.len());
                for resource in &self.options.resources {
                    results.push((resource.as_str(), self.fetcher.fetch_normalized(resource).await));
                }
                results
            }
            CollectMode::Concurrent => {
                futures::future::join_all(self.options.resources.iter().map(|resource| async move {
                    (resource.as_str(), self.fetcher.fetch_normalized(resource).await)
                }))
                .await
            }
        };

        Ok(self.finish(start, &labels, base_records, results))
    }

    /// Blocking cycle. Concurrent mode fetches every resource on its own scoped thread.
    ///
    /// Must not be called from within an async runtime.
    #[instrument(level = "debug", skip(self), fields(mode = ?self.options.mode))]
    pub fn collect_blocking(&self) -> Result<Vec<MetricRecord>> {
        let start = Instant::now();
        let base = self.fetcher.fetch_normalized_blocking(BASE_RESOURCE)?;
        let (labels, base_records) = self.base_records(&base);

        let results: Vec<(&str, Result<Value>)> = match self.options.mode {
            CollectMode::Sequential => self
                .options
                .resources
                .iter()
                .map(|resource| (resource.as_str(), self.fetcher.fetch_normalized_blocking(resource)))
                .collect(),
            CollectMode::Concurrent => std::thread::scope(|scope| {
                let handles: Vec<_> = self
                    .options
                    .resources
                    .iter()
                    .map(|resource| {
                        (
                            resource.as_str(),
                            scope.spawn(move || self.fetcher.fetch_normalized_blocking(resource)),
                        )
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(resource, handle)| {
                        let result = handle.join().unwrap_or_else(|_| {
                            Err(ClientError::Blocking {
                                resource: resource.to_string(),
                                reason: "fetch thread panicked".to_string(),
                            })
                        });
                        (resource, result)
                    })
                    .collect()
            }),
        };

        Ok(self.finish(start, &labels, base_records, results))
    }

    fn base_records(&self, base: &Value) -> (ServerLabels, Vec<MetricRecord>) {
        let Value::Object(base) = base else {
            warn!(resource = BASE_RESOURCE, "server payload is not an object, no server labels");
            return (ServerLabels::default(), Vec::new());
        };

        let labels = ServerLabels::from_base(base, &self.options.identity_fields);
        debug!(labels = ?labels.labels(), "server labels");

        let records = base
            .iter()
            .filter(|(key, _)| !self.options.identity_fields.contains(key) && !self.options.excluded_fields.contains(key))
            .flat_map(|(key, value)| {
                let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
                labels.attach(map_response(BASE_RESOURCE, &single))
            })
            .collect();

        (labels, records)
    }

    fn finish(
        &self,
        start: Instant,
        labels: &ServerLabels,
        base_records: Vec<MetricRecord>,
        results: Vec<(&str, Result<Value>)>,
    ) -> Vec<MetricRecord> {
        let mut failed = 0;
        let mut records = base_records;

        for (resource, result) in results {
            match result {
                Ok(payload) => records.extend(labels.attach(map_response(resource, &payload))),
                Err(err) => {
                    failed += 1;
                    warn!(resource, %err, "skipping resource");
                }
            }
        }

        let records = dedup(records);
        info!(
            records = records.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "collection cycle done"
        );
        records
    }
}

/// Drops exact duplicates, keeping the first occurrence.
fn dedup(records: Vec<MetricRecord>) -> Vec<MetricRecord> {
    let mut unique: Vec<MetricRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.contains(&record) {
            unique.push(record);
        }
    }
    unique
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::normalize::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collector() -> MetricsCollector {
        let creds = Credentials::new("localhost", None, Some("c2VjcmV0LWtleQ==")).unwrap();
        MetricsCollector::new(creds, CollectorOptions::default()).unwrap()
    }

    #[test]
    fn server_labels_strip_suffix_and_lowercase() {
        let base = normalize(json!({"ServerName": "Alpha Station", "WorldName": "Star System", "Game": "SE"}));
        let labels = ServerLabels::from_base(base.as_object().unwrap(), &CollectorOptions::default().identity_fields);
        assert_eq!(
            labels.labels(),
            &Labels::from([
                ("server".to_string(), "alpha station".to_string()),
                ("world".to_string(), "star system".to_string()),
            ])
        );
    }

    #[test]
    fn base_fields_become_labeled_metrics() {
        let base = normalize(json!({
            "Game": "SE",
            "ServerId": 11,
            "ServerName": "Alpha",
            "WorldName": "Sol",
            "IsReady": true,
            "Players": 4,
            "SimSpeed": 0.9,
        }));
        let (labels, records) = collector().base_records(&base);
        assert_eq!(labels.labels().len(), 2);

        let mut names: Vec<_> = records.iter().map(|r| r.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["is_ready", "players", "sim_speed"]);
        assert!(records.iter().all(|r| r.labels() == labels.labels()));
    }

    #[test]
    fn non_object_base_yields_nothing() {
        let (labels, records) = collector().base_records(&json!("<html></html>"));
        assert_eq!(labels, ServerLabels::default());
        assert!(records.is_empty());
    }

    #[test]
    fn dedup_keeps_first() {
        let a = MetricRecord::new("grids", 3usize).unwrap();
        let b = MetricRecord::new("grids", 4usize).unwrap();
        let c = a.clone().with_label("server", "x");
        assert_eq!(dedup(vec![a.clone(), b.clone(), a.clone(), c.clone()]), vec![a, b, c]);
    }

    #[test]
    fn failed_resources_are_skipped() {
        let collector = collector();
        let labels = ServerLabels(Labels::from([("server".to_string(), "alpha".to_string())]));
        let err = ClientError::MissingToken;
        let records = collector.finish(
            Instant::now(),
            &labels,
            Vec::new(),
            vec![
                ("session/grids", Ok(json!({"grids": [1, 2]}))),
                ("session/planets", Err(err)),
            ],
        );
        assert_eq!(
            records,
            vec![MetricRecord::new("grids", 2usize).unwrap().with_label("server", "alpha")]
        );
    }

    #[test]
    fn mode_from_flag() {
        assert_eq!(CollectMode::from_run_async(true), CollectMode::Concurrent);
        assert_eq!(CollectMode::from_run_async(false), CollectMode::Sequential);
    }
}
