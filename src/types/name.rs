use std::{borrow::Borrow, str::FromStr};

use arcstr::ArcStr;
use derive_more::{Display, Error};

/// A validated GraphQL name.
///
/// Type, field, and argument names must all match `/^[_a-zA-Z][_a-zA-Z0-9]*$/`.
/// Declarations carrying anything else are rejected when they are submitted,
/// before any assembly takes place.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Name(ArcStr);

impl Name {
    /// Checks whether `input` is a valid name.
    pub fn is_valid(input: &str) -> bool {
        let mut chars = input.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return false;
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Name> for ArcStr {
    fn from(name: Name) -> Self {
        name.0
    }
}

/// Error of parsing an invalid [`Name`].
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("names must match /^[_a-zA-Z][_a-zA-Z0-9]*$/, but `{_0}` does not")]
pub struct NameParseError(#[error(not(source))] pub String);

impl FromStr for Name {
    type Err = NameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.into()))
        } else {
            Err(NameParseError(s.into()))
        }
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}
