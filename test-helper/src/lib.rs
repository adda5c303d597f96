//! Test doubles for `network-service` callers.
//!
//! # Overview
//! [`MockNetworkService`] implements `NetworkClient` by replaying a queue of
//! [`MockOutput`]s, optionally after a [`Delay`]. Code written against the
//! trait can be tested without a server, including its cancellation paths.
//!
//! # Design
//! - Each call consumes the head of the queue once. `repeat(n)` entries stay
//!   at the head for `n` calls; `repeat_infinite` entries never leave.
//! - An empty queue is an error (`MockError::NoOutputQueued`, surfaced as
//!   `NetworkError::Unknown`), not a panic. The mock records every underflow
//!   itself; check `last_error()` or `underflows()` rather than the message.
//! - Failures are mapped through `NetworkError::coerce`, like every other
//!   error crossing the client boundary.

mod output;
mod service;

pub use output::{Delay, MockOutput};
pub use service::{MockError, MockNetworkService};
