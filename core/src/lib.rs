//! Typed, cancellable HTTP client.
//!
//! # Overview
//! Callers describe a request (`Request`), hand it to something implementing
//! [`NetworkClient`], and get back either the raw success body or a value
//! decoded with a pluggable codec. [`NetworkService`] executes requests over
//! a [`transport::Transport`]; the companion `network-service-test-helper`
//! crate provides a scripted mock implementing the same trait.
//!
//! # Design
//! - `NetworkClient` has one required method, `start`. Typed variants and the
//!   GET/POST/PUT/DELETE conveniences are provided methods layered on top.
//! - Only 2xx responses succeed. Anything else is `NetworkError::Http` with
//!   the status, headers and body preserved, and is never decoded.
//! - Cancellation is ambient: run calls inside
//!   [`cancel::with_cancellation`] and cancel the token. Dropping a call's
//!   future cancels its in-flight transport work too.
//! - The service is stateless between calls; concurrent calls are
//!   independent and no request is ever retried.

pub mod cancel;
pub mod client;
pub mod codec;
pub mod error;
pub mod http;
mod inflight;
pub mod service;
pub mod status;
pub mod transport;

pub use client::NetworkClient;
pub use codec::{
    Decoder, Encoder, JsonDecoder, JsonEncoder, TopLevelCodable, TopLevelDecodable,
    TopLevelEncodable,
};
pub use error::{MapToNetworkError, NetworkError, TransportErrorKind};
pub use http::{ContentType, Header, HttpMethod, HttpResponse, Request};
pub use service::NetworkService;
pub use status::StatusClass;
pub use tokio_util::sync::CancellationToken;
