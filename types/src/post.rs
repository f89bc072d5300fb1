//! Social post identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FaucetError;

/// The numeric id of a public social post (the `status/<digits>` path segment).
///
/// A post may back at most one successful claim; the id is the key of the
/// replay guard.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(String);

impl PostId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, FaucetError> {
        let s = raw.into();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FaucetError::InvalidPostId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PostId {
    type Error = FaucetError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<PostId> for String {
    fn from(id: PostId) -> Self {
        id.0
    }
}
