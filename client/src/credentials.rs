use crate::error::{
    ClientError,
    Result,
};
use base64::{
    prelude::BASE64_STANDARD,
    Engine as _,
};
use std::fmt;
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;

/// Address and secret of one remote API. Validated on construction, immutable afterwards.
#[derive(Clone)]
pub struct Credentials {
    scheme: String,
    host: String,
    port: u16,
    secret: Vec<u8>,
}

impl Credentials {
    /// `host` may be given with or without a scheme, `http://` is assumed when it's missing.
    /// A port written in `host` wins over `port`, which wins over [`DEFAULT_PORT`].
    /// `token` is the base64 key shown in the dedicated server's remote API settings.
    pub fn new(host: impl AsRef<str>, port: Option<u16>, token: Option<&str>) -> Result<Self> {
        let host = host.as_ref().trim();
        let url = parse_host(host)?;
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(ClientError::MissingToken)?;
        let secret = BASE64_STANDARD.decode(token)?;

        let host_str = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ClientError::InvalidHost(host.to_string()))?;

        let port = port.filter(|p| *p != 0);
        if let (Some(in_host), Some(given)) = (url.port(), port) {
            if in_host != given {
                debug!(host, port = given, "using the port given in the host");
            }
        }

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host_str.to_string(),
            port: url.port().or(port).unwrap_or(DEFAULT_PORT),
            secret,
        })
    }

    /// `<scheme>://<host>:<port>`
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

// The secret never ends up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("origin", &self.origin())
            .field("secret", &"***")
            .finish()
    }
}

fn parse_host(host: &str) -> Result<Url> {
    if host.is_empty() {
        return Err(ClientError::InvalidHost(host.to_string()));
    }

    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };

    let url = Url::parse(&with_scheme).map_err(|_| ClientError::InvalidHost(host.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ClientError::InvalidHost(host.to_string())),
    }
}
