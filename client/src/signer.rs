//! Request signing for the VRage Remote API.
//!
//! Every request carries a `Date` header and an `Authorization` header of the form
//! `<nonce>:<base64(hmac_sha1(key, "<path>\r\n<nonce>\r\n<date>\r\n"))>`. The server rejects
//! nonces it has already seen, so the nonce sequence has to keep growing for the lifetime of a
//! client, including across restarts.

use crate::{
    credentials::Credentials,
    error::Result,
};
use base64::{
    prelude::BASE64_STANDARD,
    Engine as _,
};
use chrono::{
    DateTime,
    Utc,
};
use hmac::{
    Hmac,
    Mac,
};
use rand::Rng as _;
use sha1::Sha1;
use std::{
    fmt,
    sync::Mutex,
};

type HmacSha1 = Hmac<Sha1>;

/// Everything that went into signing one request. Never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub resource_path: String,
    pub nonce: u64,
    pub date: String,
    pub signature: String,
}

impl RequestContext {
    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.nonce, self.signature)
    }
}

pub struct RequestSigner {
    mac: HmacSha1,
    nonce: Mutex<u64>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner").field("nonce", &self.nonce).finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let factor: u64 = rand::thread_rng().gen_range(10..=100);
        let seed = (Utc::now().timestamp().max(0) as u64).saturating_mul(factor);
        Self::with_seed(credentials, seed)
    }

    pub fn with_seed(credentials: &Credentials, seed: u64) -> Result<Self> {
        Ok(Self {
            mac: HmacSha1::new_from_slice(credentials.secret())?,
            nonce: Mutex::new(seed),
        })
    }

    /// Signs a request for `resource_path` (the full path, e.g. `/vrageremote/v1/server`) with
    /// the current time and the next nonce.
    pub fn sign(&self, resource_path: &str) -> RequestContext {
        let date = http_date(Utc::now());
        let nonce = self.next_nonce();
        self.sign_with(resource_path, nonce, date)
    }

    /// Deterministic signing with an explicit nonce and date.
    pub fn sign_with(&self, resource_path: &str, nonce: u64, date: String) -> RequestContext {
        let message = format!("{resource_path}\r\n{nonce}\r\n{date}\r\n");
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

        RequestContext {
            resource_path: resource_path.to_string(),
            nonce,
            date,
            signature,
        }
    }

    pub(crate) fn next_nonce(&self) -> u64 {
        // A poisoned lock still holds a valid counter.
        let mut nonce = self.nonce.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *nonce;
        *nonce += 1;
        current
    }
}

/// RFC 1123 date in GMT, as used by the HTTP `Date` header.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
