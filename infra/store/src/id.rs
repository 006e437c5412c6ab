use crate::error::StoreError;
use std::fmt;
use std::str::FromStr;

/// Longest accepted session id, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 256;

/// A validated session identifier.
///
/// Ids are opaque to the store but restricted to ASCII alphanumerics, `-` and `,`,
/// so an id can never name a path outside the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Validates `id` and wraps it.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidSessionId`] if the id is empty, longer than
    /// [`MAX_SESSION_ID_LEN`] or contains other characters than `[A-Za-z0-9,-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, StoreError> {
        let id = id.into();

        if id.is_empty() {
            return Err(StoreError::InvalidSessionId {
                message: "EMPTY".into(),
                context: Some("Session id cannot be empty".into()),
            });
        }

        if id.len() > MAX_SESSION_ID_LEN {
            return Err(StoreError::InvalidSessionId {
                message: format!("{} bytes", id.len()).into(),
                context: Some(format!("Session id exceeds {MAX_SESSION_ID_LEN} bytes").into()),
            });
        }

        if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b',') {
            return Err(StoreError::InvalidSessionId {
                message: id.into(),
                context: Some("Session id contains illegal characters".into()),
            });
        }

        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, StoreError> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, StoreError> {
        Self::new(value)
    }
}

impl FromStr for SessionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        Self::new(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_php_style_ids() {
        assert!(SessionId::new("abc").is_ok());
        assert!(SessionId::new("9f8e7d6c5b4a-3210,xyz").is_ok());
        assert!(SessionId::new("a".repeat(MAX_SESSION_ID_LEN)).is_ok());
    }

    #[test]
    fn rejects_empty_long_and_traversal_ids() {
        for bad in ["", "../etc/passwd", "a/b", "a b", "sess.ion", "ünï"] {
            assert!(
                matches!(SessionId::new(bad), Err(StoreError::InvalidSessionId { .. })),
                "{bad:?} must be rejected"
            );
        }
        assert!(SessionId::new("a".repeat(MAX_SESSION_ID_LEN + 1)).is_err());
    }

    #[test]
    fn parses_and_displays() {
        let id: SessionId = "abc-123".parse().unwrap();
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }
}
