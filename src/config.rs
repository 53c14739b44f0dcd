use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::variant::Variant;

/// Applied to every request sent to the controller.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a [`Session`](crate::Session) needs to talk to one controller.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    base_url: String,
    host: String,
    pub variant: Variant,
    pub timeout: Duration,
}

impl UpdaterConfig {
    /// Validates `ipmi_url` and strips a single trailing slash.
    pub fn new(ipmi_url: &str, variant: Variant) -> Result<Self> {
        let parsed = Url::parse(ipmi_url).map_err(|e| Error::invalid_url(ipmi_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_url(
                ipmi_url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        let Some(host) = parsed.host_str() else {
            return Err(Error::invalid_url(ipmi_url, "no host"));
        };
        let base_url = ipmi_url.strip_suffix('/').unwrap_or(ipmi_url).to_string();
        Ok(Self {
            base_url,
            host: host.to_string(),
            variant,
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
