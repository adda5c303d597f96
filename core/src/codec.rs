//! Body codecs.
//!
//! # Design
//! An `Encoder` turns any serializable value into a byte payload; a `Decoder`
//! turns a byte payload into any deserializable value. Both are plain values
//! passed per call.
//!
//! A payload type can name its default codec by implementing
//! `TopLevelEncodable` / `TopLevelDecodable`, which lets the convenience
//! methods look the codec up from the type instead of taking it as an
//! argument. `Vec`, `HashSet` and `BTreeSet` forward to their element type.
//!
//! Codec failures are reported as `NetworkError::Encode` / `Decode` by the
//! callers in `client`; they never escape as anything else.

use std::collections::{BTreeSet, HashSet};
use std::error::Error as StdError;
use std::hash::Hash;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Produces a byte payload from a value.
pub trait Encoder: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Self::Error>;
}

/// Consumes a byte payload into a value.
pub trait Decoder: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error>;
}

impl<E: Encoder> Encoder for &E {
    type Error = E::Error;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Self::Error> {
        (**self).encode(value)
    }
}

impl<D: Decoder> Decoder for &D {
    type Error = D::Error;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        (**self).decode(bytes)
    }
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Encoder for JsonEncoder {
    type Error = serde_json::Error;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Self::Error> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(Bytes::from(bytes))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    type Error = serde_json::Error;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Associates a default encoder with a type.
pub trait TopLevelEncodable: Serialize {
    type Encoder: Encoder;

    fn encoder() -> Self::Encoder;
}

/// Associates a default decoder with a type.
pub trait TopLevelDecodable: DeserializeOwned {
    type Decoder: Decoder;

    fn decoder() -> Self::Decoder;
}

/// Both directions. Implemented automatically.
pub trait TopLevelCodable: TopLevelEncodable + TopLevelDecodable {}

impl<T: TopLevelEncodable + TopLevelDecodable> TopLevelCodable for T {}

impl<T: TopLevelEncodable> TopLevelEncodable for Vec<T> {
    type Encoder = T::Encoder;

    fn encoder() -> Self::Encoder {
        T::encoder()
    }
}

impl<T: TopLevelDecodable> TopLevelDecodable for Vec<T> {
    type Decoder = T::Decoder;

    fn decoder() -> Self::Decoder {
        T::decoder()
    }
}

impl<T: TopLevelEncodable> TopLevelEncodable for HashSet<T> {
    type Encoder = T::Encoder;

    fn encoder() -> Self::Encoder {
        T::encoder()
    }
}

impl<T: TopLevelDecodable + Eq + Hash> TopLevelDecodable for HashSet<T> {
    type Decoder = T::Decoder;

    fn decoder() -> Self::Decoder {
        T::decoder()
    }
}

impl<T: TopLevelEncodable> TopLevelEncodable for BTreeSet<T> {
    type Encoder = T::Encoder;

    fn encoder() -> Self::Encoder {
        T::encoder()
    }
}

impl<T: TopLevelDecodable + Ord> TopLevelDecodable for BTreeSet<T> {
    type Decoder = T::Decoder;

    fn decoder() -> Self::Decoder {
        T::decoder()
    }
}
