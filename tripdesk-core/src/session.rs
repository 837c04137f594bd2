use serde::{Deserialize, Serialize};

/// Opaque session token identifying the acting customer or agent.
///
/// The token is a bare bearer value: whoever presents it owns the entities
/// scoped to it. There is no cryptographic binding, matching the cookie
/// trust model this system inherits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Identity assigned to requests carrying no token at all.
    pub fn anonymous() -> Self {
        Self("anon".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
