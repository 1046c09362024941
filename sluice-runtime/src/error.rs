//! Error types for element resolution and invocation.

use crate::lifecycle::InvocationState;
use thiserror::Error;

/// Result type for runtime operations.
pub type ElementResult<T> = Result<T, ElementError>;

/// Broad class of an [`ElementError`], used by the surrounding engine to
/// decide between fixing configuration, retrying an invocation, or
/// dead-lettering a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised before any remote side effect.
    Configuration,
    /// Resource acquisition or remote setup failed during `invoke`.
    Invocation,
    /// A single event could not be processed.
    Event,
    /// Releasing resources during `detach` failed.
    Detach,
    /// The operation is not valid in the current lifecycle state.
    State,
}

/// Errors reported by a remote-system client.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("client closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors that can occur while resolving, invoking, or running an element.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("missing required parameter '{option_id}'")]
    MissingParameter { option_id: String },

    #[error("parameter '{option_id}' is not a valid {expected}: {detail}")]
    InvalidParameter {
        option_id: String,
        expected: &'static str,
        detail: String,
    },

    #[error("option '{option_id}' is not declared by element '{element_id}'")]
    UndeclaredOption {
        element_id: String,
        option_id: String,
    },

    #[error("mapping '{option_id}' references unknown field '{selector}'")]
    UnresolvedMapping { option_id: String, selector: String },

    #[error("mapping '{option_id}' selects '{selector}', which is not a {requirement} property")]
    RequirementNotMet {
        option_id: String,
        selector: String,
        requirement: String,
    },

    #[error("flattened field '{0}' appears more than once")]
    DuplicateField(String),

    #[error("no data format definition registered")]
    MissingDataFormat,

    #[error("acquiring a client for '{key}' timed out after {waited_ms}ms")]
    AcquireTimeout { key: String, waited_ms: u64 },

    #[error("client pool is closed")]
    PoolClosed,

    #[error("connecting client for '{key}' failed: {source}")]
    Connect {
        key: String,
        #[source]
        source: RemoteError,
    },

    #[error("creating {structure} '{name}' failed: {source}")]
    Setup {
        structure: &'static str,
        name: String,
        #[source]
        source: RemoteError,
    },

    #[error("event has no value at '{selector}'")]
    SelectorMiss { selector: String },

    #[error("malformed event payload: {0}")]
    MalformedEvent(String),

    #[error("write to '{collection}' failed: {source}")]
    Write {
        collection: String,
        #[source]
        source: RemoteError,
    },

    /// The record was stored; only the follow-up release failed.
    #[error("record written to '{collection}' but releasing the collection failed: {source}")]
    ReleaseAfterWrite {
        collection: String,
        #[source]
        source: RemoteError,
    },

    #[error("releasing resources failed: {0}")]
    Release(#[source] RemoteError),

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: InvocationState,
    },
}

impl ElementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::UndeclaredOption { .. }
            | Self::UnresolvedMapping { .. }
            | Self::RequirementNotMet { .. }
            | Self::DuplicateField(_)
            | Self::MissingDataFormat => ErrorKind::Configuration,
            Self::AcquireTimeout { .. }
            | Self::PoolClosed
            | Self::Connect { .. }
            | Self::Setup { .. } => ErrorKind::Invocation,
            Self::SelectorMiss { .. }
            | Self::MalformedEvent(_)
            | Self::Write { .. }
            | Self::ReleaseAfterWrite { .. } => ErrorKind::Event,
            Self::Release(_) => ErrorKind::Detach,
            Self::InvalidState { .. } => ErrorKind::State,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Whether the event's record reached the remote system despite the error.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::ReleaseAfterWrite { .. })
    }
}

