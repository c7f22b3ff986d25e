//! Configuration for the HTTP sinks.
use std::{env, time::Duration};
use url::Url;

use crate::{
    error::{Error, Result},
    http::{self, DEFAULT_URL},
};
#[cfg(any(feature = "blocking", feature = "tokio"))]
use crate::Emitter;

#[cfg(feature = "tokio")]
use crate::http_async::BatchSink;
#[cfg(feature = "blocking")]
use crate::http_blocking::HttpSink;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Resolved settings, see [`Builder`].
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) write_key: String,
    pub(crate) url: Url,
    pub(crate) timeout: Duration,
    pub(crate) batch_size: usize,
    pub(crate) flush_interval: Duration,
}

impl Config {
    /// Base URL of the tracking API. Always ends with a slash.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}

/// This builder is used to configure an emitter backed by the tracking API.
///
/// # Examples
/// ```no_run
/// use campus_analytics::{Builder, Error};
///
/// fn main() -> Result<(), Error> {
///     // Read the write key (and optionally the URL) from SEGMENT_WRITE_KEY
///     // and SEGMENT_URL.
///     let emitter = Builder::new().build_blocking()?;
///
///     // Set all options explicitly and ignore the environment.
///     let emitter = Builder::new()
///         .no_env()
///         .with_write_key("my-write-key")
///         .with_url("https://events.eu1.segmentapis.com")
///         .build_blocking()?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    env_fallback: bool,
    write_key: Option<String>,
    url: Option<String>,
    timeout: Option<Duration>,
    batch_size: Option<usize>,
    flush_interval: Option<Duration>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            env_fallback: true,
            write_key: None,
            url: None,
            timeout: None,
            batch_size: None,
            flush_interval: None,
        }
    }

    /// Don't fall back to environment variables.
    pub fn no_env(mut self) -> Self {
        self.env_fallback = false;
        self
    }

    /// Set the write key. If this is not set, the key will be read from the
    /// environment variable `SEGMENT_WRITE_KEY`.
    pub fn with_write_key<S: Into<String>>(mut self, write_key: S) -> Self {
        self.write_key = Some(write_key.into());
        self
    }

    /// Set the base URL, e.g. for a regional endpoint or a proxy. If this is
    /// not set, `SEGMENT_URL` is tried before the hosted API.
    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Request timeout, 10 seconds by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Most messages per batch for [`Builder::build_batched`], 100 by default.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Longest time a message waits for its batch to fill up, 5 seconds by
    /// default.
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = Some(flush_interval);
        self
    }

    /// Resolve the settings.
    pub fn config(self) -> Result<Config> {
        let env_fallback = self.env_fallback;

        let mut write_key = self.write_key.unwrap_or_default();
        if write_key.is_empty() && env_fallback {
            write_key = env::var("SEGMENT_WRITE_KEY").unwrap_or_default();
        }
        if write_key.is_empty() {
            return Err(Error::MissingWriteKey);
        }
        http::validate_write_key(&write_key)?;

        let mut url = self.url.unwrap_or_default();
        if url.is_empty() && env_fallback {
            url = env::var("SEGMENT_URL").unwrap_or_default();
        }
        if url.is_empty() {
            url = DEFAULT_URL.to_string();
        }
        let mut url = Url::parse(&url).map_err(Error::InvalidUrl)?;
        // Relative joins replace the last segment unless the path is a directory.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Config {
            write_key,
            url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            flush_interval: self.flush_interval.unwrap_or(DEFAULT_FLUSH_INTERVAL),
        })
    }

    /// Build an emitter that posts every call before returning.
    #[cfg(feature = "blocking")]
    pub fn build_blocking(self) -> Result<Emitter<HttpSink>> {
        Ok(Emitter::new(HttpSink::new(&self.config()?)))
    }

    /// Build an emitter that queues calls and posts them in batches from a
    /// background task. Must be called from within a tokio runtime.
    #[cfg(feature = "tokio")]
    pub fn build_batched(self) -> Result<Emitter<BatchSink>> {
        Ok(Emitter::new(BatchSink::new(&self.config()?)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_write_key() {
        match Builder::new().no_env().config() {
            Err(Error::MissingWriteKey) => {}
            res => panic!("Expected missing write key error, got {:?}", res),
        }
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Builder::new().no_env().with_write_key("wk").config()?;
        assert_eq!(config.url().as_str(), "https://api.segment.io/");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.flush_interval(), DEFAULT_FLUSH_INTERVAL);
        Ok(())
    }

    #[test]
    fn test_url_with_path_gets_trailing_slash() -> Result<()> {
        let config = Builder::new()
            .no_env()
            .with_write_key("wk")
            .with_url("https://proxy.example.com/segment")
            .config()?;
        assert_eq!(
            config.url().join("v1/track").map_err(Error::InvalidUrl)?.as_str(),
            "https://proxy.example.com/segment/v1/track"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_url() {
        let res = Builder::new()
            .no_env()
            .with_write_key("wk")
            .with_url("not a url")
            .config();
        assert!(matches!(res, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() -> Result<()> {
        let config = Builder::new()
            .no_env()
            .with_write_key("wk")
            .with_batch_size(0)
            .config()?;
        assert_eq!(config.batch_size(), 1);
        Ok(())
    }
}
