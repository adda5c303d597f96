//! The client interface: `start` plus typed and per-verb conveniences.
//!
//! # Design
//! `NetworkClient` has exactly one required method, `start`, which issues a
//! request and yields the raw success body. Every other method is provided
//! and reduces to building a `Request`, optionally encoding a body first,
//! calling `start`, and optionally decoding the result. Implementors (the
//! real `NetworkService`, the test helper's mock) therefore share all of the
//! request-building and codec logic.
//!
//! Call shapes per verb:
//!
//! | verb         | raw    | explicit codec                   | default codec                  |
//! |--------------|--------|----------------------------------|--------------------------------|
//! | GET / DELETE | `get`  | `get_with`                       | `get_decoded`                  |
//! | POST / PUT   | `post` | `post_encoding`, `post_with`,    | `post_encodable`,              |
//! |              |        | `post_encoding_with`             | `post_decoded`, `post_codable` |
//!
//! Bodies are encoded before anything is dispatched; an encode failure
//! returns `NetworkError::Encode` without touching the transport.

use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Decoder, Encoder, TopLevelDecodable, TopLevelEncodable};
use crate::error::NetworkError;
use crate::http::{Header, HttpMethod, Request};

/// Decode a success body, reporting failure as `NetworkError::Decode`.
pub fn decode_body<T, D>(decoder: &D, bytes: &[u8]) -> Result<T, NetworkError>
where
    T: DeserializeOwned,
    D: Decoder,
{
    decoder.decode(bytes).map_err(|e| {
        tracing::debug!(error = %e, len = bytes.len(), "response body failed to decode");
        NetworkError::decode(e)
    })
}

/// Encode a request body, reporting failure as `NetworkError::Encode`.
pub fn encode_body<B, E>(encoder: &E, value: &B) -> Result<Bytes, NetworkError>
where
    B: Serialize + ?Sized,
    E: Encoder,
{
    encoder.encode(value).map_err(|e| {
        tracing::debug!(error = %e, "request body failed to encode");
        NetworkError::encode(e)
    })
}

fn build(method: HttpMethod, url: &str, headers: &[Header], body: Option<Bytes>) -> Request {
    Request {
        method,
        url: url.to_string(),
        headers: headers.to_vec(),
        body,
    }
}

/// Issues HTTP requests and returns typed results.
///
/// All methods are cancellable through the ambient scope installed by
/// [`crate::cancel::with_cancellation`], and by dropping the future.
pub trait NetworkClient: Send + Sync {
    /// Issue `request` and return the body of a successful response.
    fn start(&self, request: &Request) -> impl Future<Output = Result<Bytes, NetworkError>> + Send;

    /// Issue `request` and decode the success body with `decoder`.
    fn start_with<T, D>(
        &self,
        request: &Request,
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        async move {
            let bytes = self.start(request).await?;
            decode_body(&decoder, &bytes)
        }
    }

    /// Issue `request` and decode the success body with `T`'s default decoder.
    fn start_decoded<T>(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: TopLevelDecodable,
    {
        self.start_with(request, T::decoder())
    }

    // GET

    fn get(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        let request = build(HttpMethod::Get, url, headers, None);
        async move { self.start(&request).await }
    }

    fn get_with<T, D>(
        &self,
        url: &str,
        headers: &[Header],
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        let request = build(HttpMethod::Get, url, headers, None);
        async move { self.start_with(&request, decoder).await }
    }

    fn get_decoded<T>(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: TopLevelDecodable,
    {
        self.get_with(url, headers, T::decoder())
    }

    // DELETE

    fn delete(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        let request = build(HttpMethod::Delete, url, headers, None);
        async move { self.start(&request).await }
    }

    fn delete_with<T, D>(
        &self,
        url: &str,
        headers: &[Header],
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        let request = build(HttpMethod::Delete, url, headers, None);
        async move { self.start_with(&request, decoder).await }
    }

    fn delete_decoded<T>(
        &self,
        url: &str,
        headers: &[Header],
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: TopLevelDecodable,
    {
        self.delete_with(url, headers, T::decoder())
    }

    // POST

    /// POST a raw body.
    fn post(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        let request = build(HttpMethod::Post, url, headers, Some(body));
        async move { self.start(&request).await }
    }

    /// POST `value` encoded with `encoder`; raw response.
    fn post_encoding<B, E>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
        encoder: E,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send
    where
        B: Serialize + ?Sized,
        E: Encoder,
    {
        let request = encode_body(&encoder, value)
            .map(|body| build(HttpMethod::Post, url, headers, Some(body)));
        async move { self.start(&request?).await }
    }

    /// POST `value` encoded with its default encoder; raw response.
    fn post_encodable<B>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send
    where
        B: TopLevelEncodable,
    {
        self.post_encoding(url, headers, value, B::encoder())
    }

    /// POST a raw body; decode the response with `decoder`.
    fn post_with<T, D>(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        let request = build(HttpMethod::Post, url, headers, Some(body));
        async move { self.start_with(&request, decoder).await }
    }

    /// POST a raw body; decode the response with `T`'s default decoder.
    fn post_decoded<T>(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: TopLevelDecodable,
    {
        self.post_with(url, headers, body, T::decoder())
    }

    /// POST `value` encoded with `encoder`; decode the response with `decoder`.
    fn post_encoding_with<B, T, E, D>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
        encoder: E,
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        E: Encoder,
        D: Decoder,
    {
        let request = encode_body(&encoder, value)
            .map(|body| build(HttpMethod::Post, url, headers, Some(body)));
        async move { self.start_with(&request?, decoder).await }
    }

    /// POST `value` and decode the response, both with default codecs.
    fn post_codable<B, T>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        B: TopLevelEncodable,
        T: TopLevelDecodable,
    {
        self.post_encoding_with(url, headers, value, B::encoder(), T::decoder())
    }

    // PUT

    fn put(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        let request = build(HttpMethod::Put, url, headers, Some(body));
        async move { self.start(&request).await }
    }

    fn put_encoding<B, E>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
        encoder: E,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send
    where
        B: Serialize + ?Sized,
        E: Encoder,
    {
        let request = encode_body(&encoder, value)
            .map(|body| build(HttpMethod::Put, url, headers, Some(body)));
        async move { self.start(&request?).await }
    }

    fn put_encodable<B>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
    ) -> impl Future<Output = Result<Bytes, NetworkError>> + Send
    where
        B: TopLevelEncodable,
    {
        self.put_encoding(url, headers, value, B::encoder())
    }

    fn put_with<T, D>(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        let request = build(HttpMethod::Put, url, headers, Some(body));
        async move { self.start_with(&request, decoder).await }
    }

    fn put_decoded<T>(
        &self,
        url: &str,
        headers: &[Header],
        body: Bytes,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        T: TopLevelDecodable,
    {
        self.put_with(url, headers, body, T::decoder())
    }

    fn put_encoding_with<B, T, E, D>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
        encoder: E,
        decoder: D,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        E: Encoder,
        D: Decoder,
    {
        let request = encode_body(&encoder, value)
            .map(|body| build(HttpMethod::Put, url, headers, Some(body)));
        async move { self.start_with(&request?, decoder).await }
    }

    fn put_codable<B, T>(
        &self,
        url: &str,
        headers: &[Header],
        value: &B,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send
    where
        B: TopLevelEncodable,
        T: TopLevelDecodable,
    {
        self.put_encoding_with(url, headers, value, B::encoder(), T::decoder())
    }
}

impl<C: NetworkClient + ?Sized> NetworkClient for &C {
    fn start(&self, request: &Request) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        (**self).start(request)
    }
}

impl<C: NetworkClient + ?Sized> NetworkClient for std::sync::Arc<C> {
    fn start(&self, request: &Request) -> impl Future<Output = Result<Bytes, NetworkError>> + Send {
        (**self).start(request)
    }
}
