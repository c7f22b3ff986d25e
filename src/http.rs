use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

pub(crate) static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// The hosted tracking API.
pub(crate) static DEFAULT_URL: &str = "https://api.segment.io";

#[cfg_attr(not(feature = "tokio"), allow(dead_code))]
pub(crate) static BATCH_PATH: &str = "v1/batch";

/// Basic auth header value: the write key is the user name, the password is
/// empty.
pub(crate) fn authorization(write_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{write_key}:")))
}

/// Write keys go into a header, so whitespace and control characters are out.
pub(crate) fn validate_write_key(write_key: &str) -> Result<()> {
    if write_key
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(Error::InvalidWriteKey);
    }
    Ok(())
}
