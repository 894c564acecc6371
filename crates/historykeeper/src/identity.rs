use std::time::Duration;

use anyhow::Context as _;

/// Request timeout for each lookup.
pub const LOOKUP_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

pub const FALLBACK_IP: &str = "127.0.0.1";
pub const FALLBACK_HOSTNAME: &str = "localhost";

/// How this machine appears from the public internet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIdentity {
    pub ip_address: String,
    pub hostname: String,
}

impl PublicIdentity {
    /// Loopback values used whenever the lookup service cannot be reached.
    pub fn fallback() -> Self {
        Self {
            ip_address: FALLBACK_IP.to_string(),
            hostname: FALLBACK_HOSTNAME.to_string(),
        }
    }
}

/// Resolves the public IP and hostname against an ipinfo-style service that
/// answers `GET /ip` and `GET /hostname` with the bare value as the body.
pub struct IdentityResolver {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityResolver {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (e.g.,
    /// invalid TLS config).
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("could not build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up both values. Any failure is logged and both fields fall back
    /// to [`PublicIdentity::fallback`]; this never fails.
    pub async fn resolve(&self) -> PublicIdentity {
        match self.fetch().await {
            Ok(identity) => {
                tracing::debug!(
                    ip = %identity.ip_address,
                    hostname = %identity.hostname,
                    "fetched public identity"
                );
                identity
            }
            Err(e) => {
                tracing::error!("error fetching public IP and hostname: {e:#}");
                PublicIdentity::fallback()
            }
        }
    }

    async fn fetch(&self) -> anyhow::Result<PublicIdentity> {
        let ip_address = self.get_text("ip").await?;
        let hostname = self.get_text("hostname").await?;
        Ok(PublicIdentity {
            ip_address,
            hostname,
        })
    }

    async fn get_text(&self, path: &str) -> anyhow::Result<String> {
        let url = format!("{}/{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("{url} returned HTTP {status}");
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("could not read body from {url}"))?;
        let value = body.trim();
        if value.is_empty() {
            anyhow::bail!("{url} returned an empty body");
        }
        Ok(value.to_string())
    }
}
