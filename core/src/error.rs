//! Error taxonomy for the network service.
//!
//! # Design
//! `NetworkError` is a closed set. Every failure produced below the
//! executor's public boundary is converted into one of these variants at the
//! site that produced it; nothing crosses the boundary untyped. Underlying
//! errors are captured as display text so values stay `Clone + Eq` and can
//! be compared directly in tests.
//!
//! `coerce` is the single mapping policy for arbitrary errors: an existing
//! `NetworkError` passes through unchanged, recognisable transport errors
//! become `Transport`, and everything else becomes `Unknown`.

use std::error::Error as StdError;
use std::fmt::Display;

use bytes::Bytes;
use thiserror::Error;

use crate::status::{self, StatusClass};

/// Why a request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum TransportErrorKind {
    /// The caller cancelled the request, before or after dispatch.
    #[error("request was cancelled")]
    Cancelled,

    /// The transport's configured timeout elapsed.
    #[error("request timed out")]
    TimedOut,

    /// DNS resolution, connect, or an established connection failed.
    #[error("connection failed")]
    ConnectionFailed,

    /// Any other transport-level failure, described by the transport.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportErrorKind {
    /// Map an I/O error to a transport kind, if it describes connectivity.
    pub fn from_io(err: &std::io::Error) -> Option<Self> {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::TimedOut => Some(Self::TimedOut),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::AddrNotAvailable => Some(Self::ConnectionFailed),
            _ => None,
        }
    }
}

impl From<&reqwest::Error> for TransportErrorKind {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut
        } else if err.is_connect() {
            Self::ConnectionFailed
        } else {
            Self::Other(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TransportErrorKind {
    fn from(err: reqwest::Error) -> Self {
        Self::from(&err)
    }
}

/// Every way a call through the network service can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The request could not be turned into a dispatchable transport request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request body could not be serialized; nothing was sent.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// No response was received.
    #[error(transparent)]
    Transport(TransportErrorKind),

    /// A response arrived but its status is not in the success range.
    #[error("HTTP {status}{}", reason_suffix(.status))]
    Http {
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    },

    /// The success body could not be decoded into the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// An error that matched no other category.
    #[error("{description}")]
    Unknown { description: String },
}

fn reason_suffix(status: &u16) -> String {
    match canonical_reason(*status) {
        Some(reason) => format!(" {reason}"),
        None => String::new(),
    }
}

fn canonical_reason(status: u16) -> Option<&'static str> {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
}

impl NetworkError {
    pub fn cancelled() -> Self {
        Self::Transport(TransportErrorKind::Cancelled)
    }

    /// Build the `Unknown` case from anything displayable.
    pub fn unknown(error: impl Display) -> Self {
        Self::Unknown {
            description: error.to_string(),
        }
    }

    pub fn encode(error: impl Display) -> Self {
        Self::Encode(error.to_string())
    }

    pub fn decode(error: impl Display) -> Self {
        Self::Decode(error.to_string())
    }

    /// Coerce an arbitrary error into the taxonomy.
    ///
    /// Idempotent: coercing a boxed `NetworkError` returns it unchanged.
    pub fn coerce(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        let error = match error.downcast::<NetworkError>() {
            Ok(err) => return *err,
            Err(error) => error,
        };
        let error = match error.downcast::<TransportErrorKind>() {
            Ok(kind) => return Self::Transport(*kind),
            Err(error) => error,
        };
        let error = match error.downcast::<reqwest::Error>() {
            Ok(err) => return Self::Transport(TransportErrorKind::from(&*err)),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(err) => match TransportErrorKind::from_io(&err) {
                Some(kind) => Self::Transport(kind),
                None => Self::unknown(err),
            },
            Err(error) => Self::unknown(error),
        }
    }

    /// True when the caller's own cancellation ended the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(TransportErrorKind::Cancelled))
    }

    /// Status code of an `Http` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Class of the status code of an `Http` failure.
    pub fn status_class(&self) -> Option<StatusClass> {
        self.status().map(|code| status::classify(code.into()))
    }

    /// Canonical reason phrase of an `Http` failure, when the code has one.
    pub fn reason_phrase(&self) -> Option<&'static str> {
        self.status().and_then(canonical_reason)
    }
}

impl From<TransportErrorKind> for NetworkError {
    fn from(kind: TransportErrorKind) -> Self {
        Self::Transport(kind)
    }
}

/// Applies [`NetworkError::coerce`] to the error side of a `Result`.
pub trait MapToNetworkError<T> {
    fn map_to_network_error(self) -> Result<T, NetworkError>;
}

impl<T, E> MapToNetworkError<T> for Result<T, E>
where
    E: Into<Box<dyn StdError + Send + Sync + 'static>>,
{
    fn map_to_network_error(self) -> Result<T, NetworkError> {
        self.map_err(|err| NetworkError::coerce(err.into()))
    }
}
