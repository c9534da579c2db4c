//! Digital Twin Model Identifiers and the repository path convention.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DTMI_PATTERN: &str =
    r"^dtmi:[A-Za-z](?:[A-Za-z0-9_]*[A-Za-z0-9])?(?::[A-Za-z](?:[A-Za-z0-9_]*[A-Za-z0-9])?)*;[1-9][0-9]{0,8}$";

const MODEL_EXTENSION: &str = ".json";
const EXPANDED_EXTENSION: &str = ".expanded.json";

/// Identifier validation error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DtmiError {
    #[error("Invalid DTMI: '{value}'")]
    Invalid { value: String },
}

fn dtmi_regex() -> &'static Regex {
    static DTMI_REGEX: OnceLock<Regex> = OnceLock::new();
    DTMI_REGEX.get_or_init(|| Regex::new(DTMI_PATTERN).expect("DTMI pattern is a valid regex"))
}

/// Returns true if `value` is a well-formed repository DTMI.
pub fn is_valid_dtmi(value: &str) -> bool {
    dtmi_regex().is_match(value)
}

/// A validated Digital Twin Model Identifier, e.g. `dtmi:com:example:Thermostat;1`.
///
/// Equality is exact and case-sensitive; only the derived repository paths
/// are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dtmi(String);

impl Dtmi {
    /// Validate and wrap an identifier.
    pub fn parse(value: &str) -> Result<Self, DtmiError> {
        if is_valid_dtmi(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(DtmiError::Invalid {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Repository-relative path of the model document.
    ///
    /// `dtmi:com:example:Thermostat;1` maps to `dtmi/com/example/thermostat-1.json`,
    /// or `dtmi/com/example/thermostat-1.expanded.json` when `expanded` is set.
    pub fn relative_path(&self, expanded: bool) -> String {
        let stem = self.0.to_lowercase().replace(':', "/").replace(';', "-");
        let extension = if expanded {
            EXPANDED_EXTENSION
        } else {
            MODEL_EXTENSION
        };
        format!("{}{}", stem, extension)
    }

    /// Relative path prefixed with a repository base (URL or directory string).
    pub fn qualified_path(&self, base: &str, expanded: bool) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.relative_path(expanded)
        )
    }
}

impl fmt::Display for Dtmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Dtmi {
    type Err = DtmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dtmi {
    type Error = DtmiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_dtmi(&value) {
            Ok(Self(value))
        } else {
            Err(DtmiError::Invalid { value })
        }
    }
}

impl From<Dtmi> for String {
    fn from(dtmi: Dtmi) -> Self {
        dtmi.0
    }
}

impl AsRef<str> for Dtmi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Dtmi {
    fn borrow(&self) -> &str {
        &self.0
    }
}
