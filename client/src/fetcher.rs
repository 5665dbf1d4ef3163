use crate::{
    credentials::Credentials,
    error::{
        ClientError,
        Result,
    },
    normalize::normalize,
    signer::{
        RequestContext,
        RequestSigner,
    },
};
use reqwest::header::{
    AUTHORIZATION,
    DATE,
};
use serde_json::Value;
use std::{
    sync::OnceLock,
    time::Duration,
};

pub const BASE_PATH: &str = "/vrageremote/v1";

/// Connect and read bound for every request, in both the async and the blocking form.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Json(Value),
    /// The body was not valid JSON, e.g. an HTML error page.
    Text(String),
}

impl RawPayload {
    fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(json) => RawPayload::Json(json),
            Err(err) => {
                debug!(%err, "response body is not JSON");
                RawPayload::Text(body)
            }
        }
    }

    /// The `data` member of a `{"data": ...}` envelope. Text bodies are passed on as a JSON
    /// string, which the mapper treats as unmapped.
    pub fn into_data(self) -> Value {
        match self {
            RawPayload::Json(Value::Object(mut envelope)) => envelope.remove("data").unwrap_or(Value::Null),
            RawPayload::Json(_) => Value::Null,
            RawPayload::Text(text) => Value::String(text),
        }
    }
}

/// Issues signed GET requests against the remote API.
#[derive(Debug)]
pub struct ResourceFetcher {
    credentials: Credentials,
    signer: RequestSigner,
    client: reqwest::Client,
    blocking: OnceLock<reqwest::blocking::Client>,
}

impl ResourceFetcher {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let signer = RequestSigner::new(&credentials)?;
        Self::with_signer(credentials, signer)
    }

    pub fn with_signer(credentials: Credentials, signer: RequestSigner) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;

        debug!(origin = credentials.origin(), "remote API client ready");

        Ok(Self {
            credentials,
            signer,
            client,
            blocking: OnceLock::new(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Url and signature for one request to `resource`, e.g. `session/players`.
    fn prepare(&self, resource: &str) -> (String, RequestContext) {
        let path = if resource.starts_with('/') {
            resource.to_string()
        } else {
            format!("/{resource}")
        };
        let full_path = format!("{BASE_PATH}{path}");
        let url = format!("{}{full_path}", self.credentials.origin());
        (url, self.signer.sign(&full_path))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, resource: &str) -> Result<RawPayload> {
        let (url, context) = self.prepare(resource);

        let response = self
            .client
            .get(&url)
            .header(DATE, &context.date)
            .header(AUTHORIZATION, context.authorization())
            .send()
            .await
            .map_err(|err| ClientError::http(resource, err))?;

        debug!(url, status = %response.status(), "request done");

        let body = response
            .error_for_status()
            .map_err(|err| ClientError::http(resource, err))?
            .text()
            .await
            .map_err(|err| ClientError::http(resource, err))?;

        Ok(RawPayload::from_body(body))
    }

    /// Same as [`Self::fetch`] but blocks the calling thread. Must not be called from within an
    /// async runtime.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch_blocking(&self, resource: &str) -> Result<RawPayload> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ClientError::Blocking {
                resource: resource.to_string(),
                reason: "called from within an async runtime".to_string(),
            });
        }

        let client = self.blocking_client()?;
        let (url, context) = self.prepare(resource);

        let response = client
            .get(&url)
            .header(DATE, &context.date)
            .header(AUTHORIZATION, context.authorization())
            .send()
            .map_err(|err| ClientError::http(resource, err))?;

        debug!(url, status = %response.status(), "request done");

        let body = response
            .error_for_status()
            .map_err(|err| ClientError::http(resource, err))?
            .text()
            .map_err(|err| ClientError::http(resource, err))?;

        Ok(RawPayload::from_body(body))
    }

    /// Fetches `resource` and returns its normalized `data` member.
    pub async fn fetch_normalized(&self, resource: &str) -> Result<Value> {
        Ok(normalize(self.fetch(resource).await?.into_data()))
    }

    pub fn fetch_normalized_blocking(&self, resource: &str) -> Result<Value> {
        Ok(normalize(self.fetch_blocking(resource)?.into_data()))
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn fetcher() -> ResourceFetcher {
        let creds = Credentials::new("se.example.com", Some(8080), Some("c2VjcmV0LWtleQ==")).unwrap();
        let signer = RequestSigner::with_seed(&creds, 100).unwrap();
        ResourceFetcher::with_signer(creds, signer).unwrap()
    }

    #[test]
    fn builds_urls_and_signs_full_path() {
        let fetcher = fetcher();

        let (url, context) = fetcher.prepare("session/players");
        assert_eq!(url, "http://se.example.com:8080/vrageremote/v1/session/players");
        assert_eq!(context.resource_path, "/vrageremote/v1/session/players");
        assert_eq!(context.nonce, 100);

        let (url, context) = fetcher.prepare("/server");
        assert_eq!(url, "http://se.example.com:8080/vrageremote/v1/server");
        assert_eq!(context.nonce, 101);
    }

    #[test]
    fn extracts_data_envelope() {
        let payload = RawPayload::from_body(r#"{"data": {"Grids": []}, "meta": {}}"#.to_string());
        assert_eq!(payload.into_data(), json!({"Grids": []}));

        let payload = RawPayload::from_body(r#"{"nodata": 1}"#.to_string());
        assert_eq!(payload.into_data(), Value::Null);
    }

    #[test]
    fn falls_back_to_text() {
        let payload = RawPayload::from_body("<html>Bad Gateway</html>".to_string());
        assert_eq!(payload, RawPayload::Text("<html>Bad Gateway</html>".to_string()));
        assert_eq!(payload.into_data(), json!("<html>Bad Gateway</html>"));
    }

    #[tokio::test]
    async fn blocking_fetch_refuses_async_context() {
        let err = fetcher().fetch_blocking("server").unwrap_err();
        assert!(matches!(err, ClientError::Blocking { .. }));
    }
}
