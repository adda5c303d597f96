//! HTTP status-code classification.
//!
//! # Design
//! Classification is a total function over integers. The five documented
//! ranges are inclusive; anything outside them lands in `Unclassified` rather
//! than being folded into a neighbouring class.

use std::ops::RangeInclusive;

/// Status codes for informational responses (RFC 9110 §15.2).
pub const INFORMATIONAL: RangeInclusive<i32> = 100..=199;
/// Status codes for successful responses (RFC 9110 §15.3).
pub const SUCCESSFUL: RangeInclusive<i32> = 200..=299;
/// Status codes for redirection responses (RFC 9110 §15.4).
pub const REDIRECT: RangeInclusive<i32> = 300..=399;
/// Status codes for client errors (RFC 9110 §15.5).
pub const CLIENT_ERROR: RangeInclusive<i32> = 400..=499;
/// Status codes for server errors (RFC 9110 §15.6).
pub const SERVER_ERROR: RangeInclusive<i32> = 500..=599;

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const ACCEPTED: u16 = 202;
pub const NO_CONTENT: u16 = 204;
pub const MOVED_PERMANENTLY: u16 = 301;
pub const NOT_MODIFIED: u16 = 304;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// The class a status code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
    /// Outside every documented range (e.g. `0`, `-1`, `600`).
    Unclassified,
}

/// Classify a status code by its inclusive range.
pub fn classify(code: i32) -> StatusClass {
    if INFORMATIONAL.contains(&code) {
        StatusClass::Informational
    } else if SUCCESSFUL.contains(&code) {
        StatusClass::Success
    } else if REDIRECT.contains(&code) {
        StatusClass::Redirect
    } else if CLIENT_ERROR.contains(&code) {
        StatusClass::ClientError
    } else if SERVER_ERROR.contains(&code) {
        StatusClass::ServerError
    } else {
        StatusClass::Unclassified
    }
}

pub fn is_informational(code: i32) -> bool {
    classify(code) == StatusClass::Informational
}

pub fn is_successful(code: i32) -> bool {
    classify(code) == StatusClass::Success
}

pub fn is_redirect(code: i32) -> bool {
    classify(code) == StatusClass::Redirect
}

pub fn is_client_error(code: i32) -> bool {
    classify(code) == StatusClass::ClientError
}

pub fn is_server_error(code: i32) -> bool {
    classify(code) == StatusClass::ServerError
}
