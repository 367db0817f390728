use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Case-insensitive identifier of a room, aperture or shade.
///
/// Keeps the spelling it was created with for display, but compares and
/// hashes on the lowercase form so that geometry and simulation outputs
/// join regardless of how the simulation engine cased its keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier {
    name: String,
    key: String,
}

impl Identifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            key: name.to_lowercase(),
        }
    }

    /// Identifier as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Normalized (lowercase) join key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.name
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
