use std::borrow::Cow;
use std::fmt;

use crate::error::{RegistryError, RegistryResult};

/// Identifies the type a parameter converts to.
///
/// Tags are compared case-sensitively. `string` is handled by the pipeline
/// itself; every other tag needs a registered converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    /// Plain text, passed through unconverted.
    pub const STRING: TypeTag = TypeTag(Cow::Borrowed("string"));
    /// Numbers.
    pub const NUMBER: TypeTag = TypeTag(Cow::Borrowed("number"));
    /// Platform users.
    pub const USER: TypeTag = TypeTag(Cow::Borrowed("user"));

    /// Creates a tag for a custom type.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeTag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

/// A declared positional parameter of a text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    type_tag: TypeTag,
    optional: bool,
    rest: bool,
}

impl Parameter {
    /// A parameter that must be supplied.
    pub fn required(type_tag: impl Into<TypeTag>) -> Self {
        Self {
            type_tag: type_tag.into(),
            optional: false,
            rest: false,
        }
    }

    /// A parameter that may be omitted.
    pub fn optional(type_tag: impl Into<TypeTag>) -> Self {
        Self {
            type_tag: type_tag.into(),
            optional: true,
            rest: false,
        }
    }

    /// A string parameter consuming every remaining token.
    ///
    /// With no tokens left it still receives a value: the empty string.
    pub fn rest() -> Self {
        Self {
            type_tag: TypeTag::STRING,
            optional: true,
            rest: true,
        }
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_rest(&self) -> bool {
        self.rest
    }
}

/// Enforces parameter ordering: a rest parameter comes last, and nothing
/// required follows something optional.
pub(crate) fn validate_parameters(command: &str, params: &[Parameter]) -> RegistryResult<()> {
    let mut seen_optional = false;

    for (index, param) in params.iter().enumerate() {
        if param.rest && index + 1 != params.len() {
            return Err(RegistryError::invalid_parameters(
                command,
                format!("rest parameter at position {index} is not last"),
            ));
        }
        if seen_optional && !param.optional {
            return Err(RegistryError::invalid_parameters(
                command,
                format!("required parameter at position {index} follows an optional one"),
            ));
        }
        seen_optional |= param.optional;
    }

    Ok(())
}
