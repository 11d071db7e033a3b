#[cfg(test)]
#[path = "tests/address.rs"]
mod tests;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A player's ledger address in canonical (lowercase) form.
///
/// Every constructor normalizes, so two spellings of the same address can
/// never produce two distinct map keys.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String", into = "String")]
pub struct PlayerAddress(String);

#[derive(Clone, Copy, Debug, Error)]
#[error("Invalid player address: {0}")]
pub struct InvalidAddress(&'static str);

impl PlayerAddress {
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PlayerAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(InvalidAddress("address must not be empty"));
        }

        Ok(Self::new(s))
    }
}

impl fmt::Display for PlayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for PlayerAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PlayerAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PlayerAddress> for String {
    fn from(address: PlayerAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for PlayerAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
