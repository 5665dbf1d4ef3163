//! Client for the Space Engineers dedicated server remote API ("VRage Remote API").
//!
//! Requests are signed by [`RequestSigner`], sent by [`ResourceFetcher`], their keys rewritten by
//! [`normalize`] and shaped into [`MetricRecord`]s by [`map_response`]. [`MetricsCollector`] runs
//! the whole pipeline for every configured resource.

#[macro_use]
extern crate tracing;

mod collector;
mod credentials;
mod error;
mod fetcher;
mod mapper;
mod normalize;
mod record;
mod signer;

pub use collector::{
    CollectMode,
    CollectorOptions,
    MetricsCollector,
    ServerLabels,
    BASE_RESOURCE,
    DEFAULT_EXCLUDED_FIELDS,
    DEFAULT_IDENTITY_FIELDS,
    DEFAULT_RESOURCES,
};
pub use credentials::{
    Credentials,
    DEFAULT_PORT,
};
pub use error::{
    ClientError,
    Result,
};
pub use fetcher::{
    RawPayload,
    ResourceFetcher,
    BASE_PATH,
    REQUEST_TIMEOUT,
};
pub use mapper::{
    map_response,
    PLAYERS_KEY,
    PLAYER_PING_METRIC,
};
pub use normalize::{
    normalize,
    normalize_key,
};
pub use record::{
    Labels,
    MetricRecord,
    MetricValue,
};
pub use signer::{
    http_date,
    RequestContext,
    RequestSigner,
};
