// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Identifier newtypes
//!
//! Every identifier that crosses a crate boundary is wrapped in a newtype that is
//! valid by construction: it holds at least one non-whitespace character and is
//! stored trimmed. Deserialization goes through the same validation, so an empty
//! id coming from the indexer or the local store is rejected at the edge.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Compile regex once at startup - safe because pattern is static
static CATEGORY_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("category code regex is valid"));

/// Errors raised while constructing identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The raw value was empty or whitespace only
    #[error("{kind} cannot be empty")]
    Empty {
        /// Identifier kind, used in the message
        kind: &'static str,
    },

    /// The raw value contained characters outside the allowed set
    #[error("{kind} '{value}' contains invalid characters")]
    InvalidCharacters {
        /// Identifier kind, used in the message
        kind: &'static str,
        /// Offending value
        value: String,
    },
}

fn non_empty(kind: &'static str, value: String) -> Result<Box<str>, IdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if trimmed.len() == value.len() {
        Ok(value.into_boxed_str())
    } else {
        Ok(Box::from(trimmed))
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Box<str>);

        impl $name {
            /// Create a new identifier, rejecting empty or whitespace-only values
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                non_empty($kind, value.into()).map(Self)
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.into_string()
            }
        }
    };
}

string_id!(
    /// Blockchain identifier of a single NFT, as reported by the indexer
    NftId,
    "NFT id"
);

string_id!(
    /// Identifier of a user taking part in a distribution
    UserId,
    "user id"
);

string_id!(
    /// Identifier under which the local store persists a category
    CategoryId,
    "category id"
);

string_id!(
    /// Identifier of a serie, the batch an NFT was minted in
    ///
    /// The value `"0"` is reserved by the indexer for NFTs minted outside any serie.
    SerieId,
    "serie id"
);

impl SerieId {
    /// Raw value the indexer uses for NFTs that belong to no serie
    pub const STANDALONE: &'static str = "0";

    /// Serie id of a standalone NFT
    pub fn standalone() -> Self {
        Self(Box::from(Self::STANDALONE))
    }

    /// Whether this id marks an NFT minted outside any serie
    pub fn is_standalone(&self) -> bool {
        &*self.0 == Self::STANDALONE
    }
}

impl Default for SerieId {
    fn default() -> Self {
        Self::standalone()
    }
}

/// Human-facing category code, such as `art` or `photo-2024`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(Box<str>);

impl CategoryCode {
    /// Create a new category code
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or contains characters other than
    /// ASCII alphanumerics, `_` and `-`
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = non_empty("category code", value.into())?;
        if !CATEGORY_CODE_REGEX.is_match(&value) {
            return Err(IdError::InvalidCharacters {
                kind: "category code",
                value: value.into_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CategoryCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryCode> for String {
    fn from(value: CategoryCode) -> Self {
        value.0.into_string()
    }
}
