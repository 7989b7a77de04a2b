//! Error types for the Herald framework.
//!
//! Two families live here:
//!
//! - [`DispatchError`] - everything that can go wrong while handling one
//!   event after its command was resolved. These are never returned to the
//!   platform; dispatchers publish them on the
//!   [`ErrorChannel`](crate::channel::ErrorChannel).
//! - [`RegistryError`] - registration-time failures, returned directly to the
//!   code building the registry.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use herald_core::{BoxError, PermissionSet, SharedError};

use crate::command::TypeTag;

// =============================================================================
// Dispatch errors
// =============================================================================

/// A classified failure of a single dispatch.
///
/// Every failure after command resolution maps to exactly one variant.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The command is restricted to owners and the actor is not one.
    #[error("command is restricted to bot owners")]
    OwnerOnly,

    /// The bot lacks permissions required by the command.
    #[error("bot is missing permissions: {required}")]
    MissingClientPermissions {
        /// The permissions the command requires of the bot.
        required: PermissionSet,
    },

    /// The invoking user lacks permissions required by the command.
    #[error("user is missing permissions: {required}")]
    MissingUserPermissions {
        /// The permissions the command requires of the user.
        required: PermissionSet,
    },

    /// A registered check returned `false`.
    #[error("a command check failed")]
    CheckFailed,

    /// A required parameter had no corresponding token.
    #[error("missing argument at position {index}")]
    MissingArgument {
        /// Zero-based parameter index.
        index: usize,
    },

    /// No converter is registered for a parameter's type tag.
    #[error("no converter registered for type '{type_tag}'")]
    NoConverter {
        /// The unconvertible type tag.
        type_tag: TypeTag,
    },

    /// A converter produced no usable value.
    #[error("argument at position {index} could not be converted")]
    ConversionFailed {
        /// Zero-based parameter index.
        index: usize,
    },

    /// A converter returned an error.
    #[error("converter for argument at position {index} failed: {source}")]
    ConversionError {
        /// Zero-based parameter index.
        index: usize,
        /// The converter's original error.
        source: SharedError,
    },

    /// The handler returned an error or panicked.
    #[error("command handler failed: {source}")]
    ExecutionError {
        /// The handler's original error.
        source: SharedError,
    },
}

impl DispatchError {
    /// Creates a conversion error from a converter's boxed error.
    pub fn conversion(index: usize, source: BoxError) -> Self {
        Self::ConversionError {
            index,
            source: Arc::from(source),
        }
    }

    /// Creates an execution error from a handler's boxed error.
    pub fn execution(source: BoxError) -> Self {
        Self::ExecutionError {
            source: Arc::from(source),
        }
    }

    /// Returns the taxonomy entry of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OwnerOnly => ErrorKind::OwnerOnly,
            Self::MissingClientPermissions { .. } => ErrorKind::MissingClientPermissions,
            Self::MissingUserPermissions { .. } => ErrorKind::MissingUserPermissions,
            Self::CheckFailed => ErrorKind::CheckFailed,
            Self::MissingArgument { .. } => ErrorKind::MissingArgument,
            Self::NoConverter { .. } => ErrorKind::NoConverter,
            Self::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            Self::ConversionError { .. } => ErrorKind::ConversionError,
            Self::ExecutionError { .. } => ErrorKind::ExecutionError,
        }
    }
}

/// The fieldless taxonomy of [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OwnerOnly,
    MissingClientPermissions,
    MissingUserPermissions,
    CheckFailed,
    MissingArgument,
    NoConverter,
    ConversionFailed,
    ConversionError,
    ExecutionError,
}

impl ErrorKind {
    /// Returns the snake_case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OwnerOnly => "owner_only",
            Self::MissingClientPermissions => "missing_client_permissions",
            Self::MissingUserPermissions => "missing_user_permissions",
            Self::CheckFailed => "check_failed",
            Self::MissingArgument => "missing_argument",
            Self::NoConverter => "no_converter",
            Self::ConversionFailed => "conversion_failed",
            Self::ConversionError => "conversion_error",
            Self::ExecutionError => "execution_error",
        }
    }

    /// Returns `true` for failures caused by the invoking user rather than
    /// by the bot's code.
    pub fn is_user_facing(self) -> bool {
        matches!(
            self,
            Self::OwnerOnly
                | Self::MissingClientPermissions
                | Self::MissingUserPermissions
                | Self::CheckFailed
                | Self::MissingArgument
                | Self::ConversionFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned in place of a handler error when the handler panicked.
#[derive(Debug, Clone, Error)]
#[error("handler panicked")]
pub struct HandlerPanicked;

/// Result type for dispatch stages.
pub type DispatchResult<T> = Result<T, DispatchError>;

// =============================================================================
// Registry errors
// =============================================================================

/// Errors that can occur while populating a [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command name collides with an existing name or alias.
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    /// An alias collides with an existing name or alias.
    #[error("alias '{alias}' of command '{command}' is already registered")]
    DuplicateAlias {
        /// The command declaring the alias.
        command: String,
        /// The colliding alias.
        alias: String,
    },

    /// A slash command with this name already exists.
    #[error("slash command '{0}' is already registered")]
    DuplicateSlashCommand(String),

    /// A converter for this type tag already exists.
    #[error("a converter for type '{0}' is already registered")]
    DuplicateConverter(TypeTag),

    /// The type tag is handled by the pipeline itself.
    #[error("type '{0}' is built in and cannot have a converter")]
    ReservedTypeTag(TypeTag),

    /// A module with this name was already initialised.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    /// The referenced command does not exist.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The parameter list violates ordering rules.
    #[error("invalid parameters for command '{command}': {reason}")]
    InvalidParameters {
        /// The offending command.
        command: String,
        /// What is wrong with the list.
        reason: String,
    },
}

impl RegistryError {
    /// Creates an invalid-parameters error.
    pub fn invalid_parameters(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
