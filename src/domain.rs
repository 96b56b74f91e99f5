use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KimQueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Fcc,
    Bcc,
    Sc,
    Diamond,
    Hcp,
}

impl Structure {
    pub const ALL: [Structure; 5] = [
        Structure::Fcc,
        Structure::Bcc,
        Structure::Sc,
        Structure::Diamond,
        Structure::Hcp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Structure::Fcc => "fcc",
            Structure::Bcc => "bcc",
            Structure::Sc => "sc",
            Structure::Diamond => "diamond",
            Structure::Hcp => "hcp",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Structure {
    type Err = KimQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Structure::ALL
            .into_iter()
            .find(|structure| structure.as_str() == trimmed)
            .ok_or_else(|| KimQueryError::InvalidStructure(value.to_string()))
    }
}

/// Chemical species symbol such as `Al` or `C`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementSymbol(String);

impl ElementSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ElementSymbol {
    type Err = KimQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let mut chars = trimmed.chars();
        let is_valid = match (chars.next(), chars.next(), chars.next()) {
            (Some(first), None, None) => first.is_ascii_uppercase(),
            (Some(first), Some(second), None) => {
                first.is_ascii_uppercase() && second.is_ascii_lowercase()
            }
            _ => false,
        };
        if !is_valid {
            return Err(KimQueryError::InvalidElement(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// A model selector. Either a literal model identifier or a regular
/// expression; both must match the whole identifier.
#[derive(Debug, Clone)]
pub struct ModelPattern {
    source: String,
    regex: Regex,
}

impl ModelPattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, model: &str) -> bool {
        self.regex.is_match(model)
    }
}

impl PartialEq for ModelPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ModelPattern {}

impl fmt::Display for ModelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for ModelPattern {
    type Err = KimQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let source = value.trim().to_string();
        if source.is_empty() {
            return Err(KimQueryError::InvalidModel(value.to_string()));
        }
        let regex = full_match(&source)
            .map_err(|err| KimQueryError::InvalidModel(format!("{value}: {err}")))?;
        Ok(Self { source, regex })
    }
}

/// Compiles `pattern` so that it only matches an entire input string.
pub fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

/// Either every key, or only the listed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(Vec<T>),
}

impl<T> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}
