//! Ambient, cooperative cancellation.
//!
//! # Design
//! Calls into the network service take no cancellation argument. Instead a
//! caller runs them inside `with_cancellation(token, future)`, which installs
//! the token as a task-local for the duration of `future`. Cancelling the
//! token from anywhere (another task, a timer, a UI handler) cancels every
//! in-flight call made inside that scope.
//!
//! Outside a scope nothing is ever cancelled through this path; dropping the
//! future still cancels, since the executor cancels its in-flight transport
//! operation on drop.
//!
//! `cancelled()` is the one suspension primitive both the real and the mock
//! executor race their work against, so cancelling a mocked call behaves
//! exactly like cancelling a real one.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::NetworkError;

tokio::task_local! {
    static CANCEL_TOKEN: CancellationToken;
}

/// Run `future` with `token` as its ambient cancellation token.
pub async fn with_cancellation<F: Future>(token: CancellationToken, future: F) -> F::Output {
    CANCEL_TOKEN.scope(token, future).await
}

/// The ambient token, if the current task runs inside a scope.
pub fn current() -> Option<CancellationToken> {
    CANCEL_TOKEN.try_with(CancellationToken::clone).ok()
}

/// Whether the ambient scope has already been cancelled.
pub fn is_cancelled() -> bool {
    CANCEL_TOKEN
        .try_with(CancellationToken::is_cancelled)
        .unwrap_or(false)
}

/// Completes when the ambient scope is cancelled; never completes outside one.
pub async fn cancelled() {
    match current() {
        Some(token) => token.cancelled_owned().await,
        None => std::future::pending().await,
    }
}

/// Run `future` unless the ambient scope is cancelled first.
pub async fn run_cancellable<F: Future>(future: F) -> Result<F::Output, NetworkError> {
    tokio::select! {
        biased;
        () = cancelled() => Err(NetworkError::cancelled()),
        output = future => Ok(output),
    }
}

/// Suspend for `duration`, or forever when `None`, unless cancelled.
pub async fn sleep(duration: Option<Duration>) -> Result<(), NetworkError> {
    match duration {
        Some(duration) => run_cancellable(tokio::time::sleep(duration)).await,
        None => run_cancellable(std::future::pending::<()>()).await,
    }
}
