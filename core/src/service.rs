//! The request executor.
//!
//! # Design
//! `NetworkService` holds only a transport and carries no mutable state
//! between calls, so concurrent `start` calls are independent. Each call
//! walks one state machine:
//!
//! ```text
//! NotStarted ──validate──▶ Dispatched ──▶ Completed(success | failure)
//!      │                        │
//!      └──────── cancelled ◀────┘
//! ```
//!
//! 1. Validate the request; failures return `InvalidRequest` and never reach
//!    the transport.
//! 2. If the ambient scope is already cancelled, return `Cancelled` without
//!    dispatching.
//! 3. Create the data task and publish it through an `InFlight` cell, then
//!    race its completion against the ambient cancellation. A cancel, or
//!    dropping the `start` future, cancels the task itself.
//! 4. Classify: transport failures become `Transport`, non-2xx responses
//!    become `Http` (status, headers and body kept), 2xx yields the body.
//!
//! Nothing is retried.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cancel;
use crate::client::NetworkClient;
use crate::error::{NetworkError, TransportErrorKind};
use crate::http::Request;
use crate::inflight::{CancelOnDrop, InFlight};
use crate::status;
use crate::transport::{RawOutcome, ReqwestTransport, Transport};

/// Classify a raw transport outcome into a success body or a typed failure.
pub fn http_map(outcome: RawOutcome) -> Result<Bytes, NetworkError> {
    let response = outcome?;
    if status::is_successful(response.status.into()) {
        Ok(response.body)
    } else {
        Err(NetworkError::Http {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

/// Executes requests over a [`Transport`].
#[derive(Clone)]
pub struct NetworkService {
    transport: Arc<dyn Transport>,
}

impl NetworkService {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// A service over a default-configured `reqwest` transport.
    pub fn with_default_transport() -> Result<Self, NetworkError> {
        Ok(Self::new(ReqwestTransport::new()?))
    }
}

impl std::fmt::Debug for NetworkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkService").finish_non_exhaustive()
    }
}

impl NetworkClient for NetworkService {
    async fn start(&self, request: &Request) -> Result<Bytes, NetworkError> {
        let transport_request = request.validate()?;

        if cancel::is_cancelled() {
            debug!(
                method = %request.method,
                url = %request.url,
                "request cancelled before dispatch"
            );
            return Err(NetworkError::cancelled());
        }

        let (tx, rx) = oneshot::channel::<RawOutcome>();
        let in_flight = InFlight::new();
        let _guard = CancelOnDrop(&in_flight);

        let task = self.transport.data_task(
            transport_request,
            Box::new(move |outcome| {
                // The receiver is gone once the call was cancelled.
                let _ = tx.send(outcome);
            }),
        );
        debug!(method = %request.method, url = %request.url, "dispatching request");
        in_flight.publish(task);

        let outcome = tokio::select! {
            biased;
            outcome = rx => outcome.unwrap_or_else(|_| {
                warn!(
                    url = %request.url,
                    "transport dropped the request without reporting an outcome"
                );
                Err(TransportErrorKind::Other("transport dropped the request".to_string()))
            }),
            () = cancel::cancelled() => {
                in_flight.cancel();
                debug!(method = %request.method, url = %request.url, "request cancelled in flight");
                Err(TransportErrorKind::Cancelled)
            }
        };
        in_flight.finish();

        match &outcome {
            Ok(response) => debug!(
                url = %request.url,
                status = response.status,
                bytes = response.body.len(),
                "request completed"
            ),
            Err(kind) => debug!(url = %request.url, error = %kind, "request failed"),
        }
        http_map(outcome)
    }
}
