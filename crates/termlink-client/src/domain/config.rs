//! Client configuration.
//!
//! [`ClientConfig`] holds every endpoint, timing, and proxy setting the input
//! path reads.  It is loaded from a TOML file; every field has a default, so
//! an empty file (or no file at all) gives a working local setup.
//!
//! ```toml
//! [endpoints]
//! ws_base_url = "ws://127.0.0.1:7681"
//! http_base_url = "http://127.0.0.1:7681"
//! fallback_timeout_ms = 5000
//!
//! [timing]
//! double_escape_window_ms = 500
//! blur_grace_ms = 50
//!
//! [proxy]
//! device_class = "desktop"
//! anchor = { left_px = 8, bottom_px = 8 }
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when absent, so older config files keep loading when new
//! fields are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use termlink_core::DeviceClass;

/// Error type for loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Where the two transports connect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// Base URL of the persistent channel; the session path is appended.
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
    /// Base URL of the fallback input endpoint.
    #[serde(default = "default_http_base_url")]
    pub http_base_url: String,
    /// Whole-request timeout for one fallback call.
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,
    /// Pause between persistent-channel reconnect attempts.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Frames the persistent channel may queue before refusing input.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

/// Timer settings for the input state machines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_double_escape_window_ms")]
    pub double_escape_window_ms: u64,
    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,
    #[serde(default = "default_reposition_delay_ms")]
    pub reposition_delay_ms: u64,
    /// Together with `attach_max_retries`, bounds the wait for the proxy
    /// container to report ready.
    #[serde(default = "default_attach_retry_interval_ms")]
    pub attach_retry_interval_ms: u64,
    #[serde(default = "default_attach_max_retries")]
    pub attach_max_retries: u32,
}

/// Composition proxy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub device_class: DeviceClass,
    #[serde(default)]
    pub anchor: Anchor,
}

/// Fixed screen position of the composition proxy, in CSS pixels from the
/// bottom-left corner of the terminal view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Anchor {
    #[serde(default = "default_anchor_inset")]
    pub left_px: u32,
    #[serde(default = "default_anchor_inset")]
    pub bottom_px: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_ws_base_url() -> String {
    "ws://127.0.0.1:7681".to_string()
}
fn default_http_base_url() -> String {
    "http://127.0.0.1:7681".to_string()
}
fn default_fallback_timeout_ms() -> u64 {
    5_000
}
fn default_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_outbound_buffer() -> usize {
    64
}
fn default_double_escape_window_ms() -> u64 {
    500
}
fn default_blur_grace_ms() -> u64 {
    50
}
fn default_reposition_delay_ms() -> u64 {
    50
}
fn default_attach_retry_interval_ms() -> u64 {
    100
}
fn default_attach_max_retries() -> u32 {
    10
}
fn default_anchor_inset() -> u32 {
    8
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ws_base_url: default_ws_base_url(),
            http_base_url: default_http_base_url(),
            fallback_timeout_ms: default_fallback_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            double_escape_window_ms: default_double_escape_window_ms(),
            blur_grace_ms: default_blur_grace_ms(),
            reposition_delay_ms: default_reposition_delay_ms(),
            attach_retry_interval_ms: default_attach_retry_interval_ms(),
            attach_max_retries: default_attach_max_retries(),
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self {
            left_px: default_anchor_inset(),
            bottom_px: default_anchor_inset(),
        }
    }
}

// ── Duration accessors ────────────────────────────────────────────────────────

impl EndpointConfig {
    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl TimingConfig {
    pub fn double_escape_window(&self) -> Duration {
        Duration::from_millis(self.double_escape_window_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }

    pub fn reposition_delay(&self) -> Duration {
        Duration::from_millis(self.reposition_delay_ms)
    }

    /// Longest wait for the proxy container: `interval × retries`.
    pub fn attach_timeout(&self) -> Duration {
        Duration::from_millis(self.attach_retry_interval_ms)
            .saturating_mul(self.attach_max_retries)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: ClientConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads a config file, returning the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system errors other than "not
    /// found", plus anything [`ClientConfig::from_toml_str`] returns.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Rejects values the transports cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ws = &self.endpoints.ws_base_url;
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoints.ws_base_url must start with ws:// or wss://, got '{ws}'"
            )));
        }
        let http = &self.endpoints.http_base_url;
        if !(http.starts_with("http://") || http.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoints.http_base_url must start with http:// or https://, got '{http}'"
            )));
        }
        if self.endpoints.outbound_buffer == 0 {
            return Err(ConfigError::Invalid(
                "endpoints.outbound_buffer must be at least 1".to_string(),
            ));
        }
        if self.endpoints.fallback_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "endpoints.fallback_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
