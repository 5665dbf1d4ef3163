use reqwest::StatusCode;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Host is empty or has a bad format: {0:?}")]
    InvalidHost(String),
    #[error("Remote API key can't be empty")]
    MissingToken,
    #[error("Remote API key is not valid base64: {0}")]
    MalformedToken(#[from] base64::DecodeError),
    #[error("Remote API key can't be used as a signing key: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),
    #[error("Metric name can't be empty")]
    EmptyMetricName,
    #[error("HTTP client could not be built: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("Request for {resource} failed: {source}")]
    Http {
        resource: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request for {resource} returned status {status}")]
    Status { resource: String, status: StatusCode },
    #[error("Blocking request for {resource} could not run: {reason}")]
    Blocking { resource: String, reason: String },
}

impl ClientError {
    pub(crate) fn http(resource: impl ToString, source: reqwest::Error) -> Self {
        match source.status() {
            Some(status) => Self::Status {
                resource: resource.to_string(),
                status,
            },
            None => Self::Http {
                resource: resource.to_string(),
                source,
            },
        }
    }
}
