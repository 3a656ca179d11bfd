//! Resource identifiers
//!
//! A resource is addressed by an optional library and a name, written as `library:name` or
//! a bare `name`. The name `*` is a wildcard that stands for every resource of its library.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, identifier};

/// Wildcard name matching every resource of a library
pub const WILDCARD: &str = "*";

/// Separator between bundle members in a serialized member list
pub const MEMBER_DELIMITER: char = '|';

/// Immutable `{library, name}` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentifier {
    library: Option<String>,
    name: String,
}

impl ResourceIdentifier {
    /// Create an identifier, validating both parts
    pub fn new(library: Option<&str>, name: &str) -> Result<Self> {
        let input = match library {
            Some(library) => format!("{library}:{name}"),
            None => name.to_string(),
        };

        if let Some(library) = library {
            if library.is_empty() {
                return Err(identifier::invalid(input, "library must not be empty"));
            }
            if library.contains(':') || library.contains(MEMBER_DELIMITER) {
                return Err(identifier::invalid(
                    input,
                    "library must not contain ':' or '|'",
                ));
            }
        }

        if name.is_empty() {
            return Err(identifier::invalid(input, "name must not be empty"));
        }
        if name.contains([MEMBER_DELIMITER, '?', '#']) {
            return Err(identifier::invalid(
                input,
                "name must not contain '|', '?' or '#'",
            ));
        }
        if name != WILDCARD && name.contains('*') {
            return Err(identifier::invalid(
                input,
                "wildcard '*' is only allowed as the entire name",
            ));
        }

        Ok(Self {
            library: library.map(str::to_string),
            name: name.to_string(),
        })
    }

    /// Parse the compact `library:name` form
    ///
    /// Splits on the first `:` and drops any query string or fragment from the name.
    pub fn parse(input: &str) -> Result<Self> {
        let (library, name) = match input.split_once(':') {
            Some((library, name)) => (Some(library), name),
            None => (None, input),
        };
        let name = name.split(['?', '#']).next().unwrap_or_default();
        Self::new(library, name)
    }

    /// The wildcard identifier `{library, "*"}` for a library
    pub fn wildcard(library: &str) -> Result<Self> {
        Self::new(Some(library), WILDCARD)
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    /// Returns the same name under another library
    pub fn with_library(&self, library: Option<&str>) -> Result<Self> {
        Self::new(library, &self.name)
    }

    /// True when `other` is the wildcard entry for this identifier's library
    pub fn matches_wildcard(&self, other: &ResourceIdentifier) -> bool {
        other.is_wildcard() && other.library == self.library
    }

    /// File extension of the name, without the dot
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.name.rsplit('/').next().unwrap_or(&self.name);
        file_name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library {
            Some(library) => write!(f, "{}:{}", library, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ResourceIdentifier {
    type Err = crate::error::CombresError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceIdentifier {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceIdentifier {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A set of identifiers where wildcard entries match whole libraries
///
/// Used for the exclusion and suppression lists.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    entries: std::collections::HashSet<ResourceIdentifier>,
}

impl IdentifierSet {
    pub fn new(entries: impl IntoIterator<Item = ResourceIdentifier>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &ResourceIdentifier) -> bool {
        if self.entries.contains(id) {
            return true;
        }
        match id.library() {
            Some(library) => ResourceIdentifier::wildcard(library)
                .map(|wildcard| self.entries.contains(&wildcard))
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
