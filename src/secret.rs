//! Redacting wrapper for the API key.
//!
//! `Debug` and `Display` never print the value and the buffer is zeroed on
//! drop. Call `expose` only where the raw key has to leave the process.

use std::convert::Infallible;
use std::fmt;
use zeroize::Zeroize;

pub const REDACTED: &str = "[REDACTED]";

pub struct Secret<T: Zeroize> {
    inner: T,
}

pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn expose(&self) -> &T {
        &self.inner
    }
}

impl SecretString {
    /// Trimmed key, or `None` when nothing but whitespace was given.
    pub fn non_blank(raw: &str) -> Option<Self> {
        let key = raw.trim();
        (!key.is_empty()).then(|| Self::new(key.to_string()))
    }
}

/// clap value parser for `--api-key`.
pub fn parse_secret(raw: &str) -> Result<SecretString, Infallible> {
    Ok(Secret::new(raw.to_string()))
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}
