//! Transport abstraction.
//!
//! # Design
//! A transport turns one validated request into one *data task*: a handle
//! that does nothing until `resume` and reports exactly one outcome through
//! the completion callback it was created with. `cancel` must make the task
//! stop consuming network resources and, if the outcome has not been
//! reported yet, report `TransportErrorKind::Cancelled`.
//!
//! The executor owns the data task for the duration of one `start` call and
//! never shares it across calls. Connection pooling, TLS and timeouts belong
//! to the transport.
//!
//! Contract for implementors:
//! - The completion callback is invoked at most once.
//! - `resume` and `cancel` do not block and do not invoke the executor.
//! - `resume` after `cancel`, `cancel` after completion, and repeated calls
//!   of either are no-ops.

mod reqwest_client;

use crate::error::TransportErrorKind;
use crate::http::{HttpResponse, TransportRequest};

pub use reqwest_client::{ReqwestTransport, ReqwestTransportBuilder, TransportConfig};

/// What the transport observed, before status classification.
pub type RawOutcome = Result<HttpResponse, TransportErrorKind>;

/// Receives the single outcome of a data task.
pub type Completion = Box<dyn FnOnce(RawOutcome) + Send + 'static>;

/// A dispatched-but-not-yet-completed transport operation.
pub trait DataTask: Send {
    /// Start the operation.
    fn resume(&self);

    /// Stop the operation and report `Cancelled` if nothing was reported yet.
    fn cancel(&self);
}

/// Something that can perform HTTP exchanges.
pub trait Transport: Send + Sync {
    fn data_task(&self, request: TransportRequest, completion: Completion) -> Box<dyn DataTask>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn data_task(&self, request: TransportRequest, completion: Completion) -> Box<dyn DataTask> {
        (**self).data_task(request, completion)
    }
}
