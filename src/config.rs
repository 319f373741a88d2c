//! Configuration types for talking to the meeting-minutes backend.
//!
//! Connection and polling knobs live in [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Print pagination has its own small
//! [`PageGeometry`] because it is a pure function of the document and never
//! touches the network.

use crate::error::MinutesError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend URL used when neither the builder nor the CLI supplies one.
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Configuration for an [`crate::client::ApiClient`] and the task poller.
///
/// # Example
/// ```rust
/// use meeting_minutes::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://minutes.example.org")
///     .poll_interval_ms(3000)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://minutes.example.org");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend root, without the `/api/v2` prefix. Default: `http://localhost:8001`.
    pub base_url: String,

    /// Delay between two task-status requests. Default: 3000 ms.
    ///
    /// The first request is sent immediately; the delay applies between
    /// consecutive ticks only.
    pub poll_interval_ms: u64,

    /// Timeout for ordinary JSON requests, in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Timeout for the recording upload and the minutes download, in seconds.
    /// Default: 600.
    ///
    /// Recordings of long meetings run to hundreds of megabytes.
    pub transfer_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: 3000,
            request_timeout_secs: 30,
            transfer_timeout_secs: 600,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn transfer_timeout_secs(mut self, secs: u64) -> Self {
        self.config.transfer_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, MinutesError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(MinutesError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Pagination geometry ──────────────────────────────────────────────────

/// Print geometry used to derive how many markdown lines fit on one page.
///
/// The defaults describe a 1000 px tall sheet with 32 px of padding and a
/// 24 px line box, which gives 40 lines per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Sheet height in pixels. Default: 1000.
    pub page_height: u32,
    /// Vertical padding subtracted from the sheet height. Default: 32.
    pub padding: u32,
    /// Height of one rendered line. Default: 24.
    pub line_height: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_height: 1000,
            padding: 32,
            line_height: 24,
        }
    }
}

impl PageGeometry {
    /// Number of lines that fit on one page; never below 1.
    pub fn lines_per_page(&self) -> usize {
        let available = self.page_height.saturating_sub(self.padding);
        let per_page = available / self.line_height.max(1);
        (per_page as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_gives_forty_lines() {
        assert_eq!(PageGeometry::default().lines_per_page(), 40);
    }

    #[test]
    fn degenerate_geometry_still_yields_one_line() {
        let g = PageGeometry {
            page_height: 10,
            padding: 32,
            line_height: 0,
        };
        assert_eq!(g.lines_per_page(), 1);
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = ClientConfig::builder()
            .base_url("http://backend:8001/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://backend:8001");
    }

    #[test]
    fn builder_rejects_non_http_url() {
        let err = ClientConfig::builder()
            .base_url("ftp://backend")
            .build()
            .unwrap_err();
        assert!(matches!(err, MinutesError::InvalidConfig(_)));
    }

    #[test]
    fn default_poll_interval_is_three_seconds() {
        assert_eq!(
            ClientConfig::default().poll_interval(),
            Duration::from_millis(3000)
        );
    }
}
