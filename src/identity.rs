//! Derive stable user ids from email addresses.
//!
//! The id is a 32-bit polynomial rolling hash (multiplier 31) over the
//! normalized address. It is not cryptographic and collisions are possible;
//! it only has to be the same on every device the person logs in from.
//!
//! # Examples
//! ```
//! use campus_analytics::identity;
//!
//! let id = identity::resolve("Jane.Doe@Example.com ");
//! assert_eq!(id, identity::resolve("jane.doe@example.com"));
//! assert_eq!(id.as_str(), "user_4396f837");
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain used for institution-issued student addresses.
pub static DEFAULT_INSTITUTION_DOMAIN: &str = "student.iu.org";

static PREFIX: &str = "user_";

/// An identity token, usually `user_` followed by lowercase hex.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity and returns the token.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&Identity> for Identity {
    fn from(id: &Identity) -> Self {
        id.clone()
    }
}

impl From<Identity> for serde_json::Value {
    fn from(id: Identity) -> Self {
        serde_json::Value::String(id.0)
    }
}

/// Lower-cases and trims an email address.
///
/// Trimming follows browser `String.prototype.trim`, so a byte order mark or
/// an ideographic space is stripped but U+0085 is not.
pub fn normalize(email: &str) -> String {
    email.to_lowercase().trim_matches(is_ecma_whitespace).to_string()
}

/// ECMAScript `WhiteSpace` and `LineTerminator` code points.
fn is_ecma_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{b}'
            | '\u{c}'
            | '\r'
            | ' '
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

/// Derives the identity token for an email address.
///
/// Any casing or surrounding whitespace variation of the same address yields
/// the same token. Never fails: the empty string resolves to `user_0`.
pub fn resolve(email: &str) -> Identity {
    let hash = normalize(email)
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        });
    Identity(format!("{PREFIX}{:x}", hash.unsigned_abs()))
}

/// Builds the institution-issued address for a personal one by keeping the
/// local part and swapping the domain.
pub fn institution_email(personal: &str, domain: &str) -> String {
    let local = personal
        .split_once('@')
        .map_or(personal, |(local, _)| local);
    format!("{local}@{domain}")
}
