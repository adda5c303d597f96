//! Canned outcomes for the mock executor.

use std::error::Error as StdError;
use std::time::Duration;

use bytes::Bytes;
use network_service::client::encode_body;
use network_service::{Encoder, NetworkError, TopLevelEncodable};
use serde::Serialize;

/// One queued outcome, optionally repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutput {
    /// A successful response body.
    Success(Bytes),
    /// A failure, already mapped into the error taxonomy.
    Failure(NetworkError),
    /// Yields `output` for the next `count` calls, then leaves the queue.
    Repeat { output: Box<MockOutput>, count: usize },
    /// Yields `output` for every call; never leaves the queue.
    RepeatInfinite(Box<MockOutput>),
}

impl MockOutput {
    pub fn bytes(body: impl Into<Bytes>) -> Self {
        Self::Success(body.into())
    }

    pub fn failure(error: NetworkError) -> Self {
        Self::Failure(error)
    }

    /// A failure built from any error, mapped with [`NetworkError::coerce`].
    pub fn from_error<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self::Failure(NetworkError::coerce(error.into()))
    }

    /// `value` encoded with `encoder`. An encode failure becomes a queued
    /// `Encode` failure.
    pub fn codable<T, E>(value: &T, encoder: E) -> Self
    where
        T: Serialize + ?Sized,
        E: Encoder,
    {
        match encode_body(&encoder, value) {
            Ok(body) => Self::Success(body),
            Err(err) => Self::Failure(err),
        }
    }

    /// `value` encoded with its default encoder.
    pub fn encodable<T: TopLevelEncodable>(value: &T) -> Self {
        Self::codable(value, T::encoder())
    }

    /// Repeat this output for `count` calls. A count of zero behaves as one.
    pub fn repeat(self, count: usize) -> Self {
        Self::Repeat {
            output: Box::new(self),
            count: count.max(1),
        }
    }

    pub fn repeat_infinite(self) -> Self {
        Self::RepeatInfinite(Box::new(self))
    }

    /// The outcome a call receives when this entry is at the head.
    pub fn output(&self) -> Result<Bytes, NetworkError> {
        match self {
            Self::Success(body) => Ok(body.clone()),
            Self::Failure(err) => Err(err.clone()),
            Self::Repeat { output, .. } | Self::RepeatInfinite(output) => output.output(),
        }
    }

    /// What is left at the head of the queue after this entry is consumed once.
    pub(crate) fn after_use(self) -> Option<Self> {
        match self {
            Self::Repeat { output, count } if count > 1 => Some(Self::Repeat {
                output,
                count: count - 1,
            }),
            infinite @ Self::RepeatInfinite(_) => Some(infinite),
            _ => None,
        }
    }
}

impl From<Bytes> for MockOutput {
    fn from(body: Bytes) -> Self {
        Self::Success(body)
    }
}

impl From<NetworkError> for MockOutput {
    fn from(error: NetworkError) -> Self {
        Self::Failure(error)
    }
}

/// How long the mock waits before answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delay {
    #[default]
    None,
    Fixed(Duration),
    /// Never answers on its own; the caller has to cancel.
    Infinite,
}

impl Delay {
    pub fn seconds(seconds: u64) -> Self {
        Self::Fixed(Duration::from_secs(seconds))
    }

    pub fn millis(millis: u64) -> Self {
        Self::Fixed(Duration::from_millis(millis))
    }
}
