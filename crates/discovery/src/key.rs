use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-insensitive identity of a declared class or interface.
///
/// Namespace qualifiers are dropped, so `\App\Http\Request`, `Request` and
/// `REQUEST` all share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassKey(String);

impl ClassKey {
    pub fn new(name: &str) -> Self {
        Self(short_name(name).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Strips surrounding whitespace and any namespace qualifier from a name.
pub fn short_name(name: &str) -> &str {
    let name = name.trim();
    name.rsplit('\\').next().unwrap_or(name)
}
