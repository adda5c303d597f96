//! Mock executor.
//!
//! # Design
//! State lives behind one lock. A call takes the head of the queue, puts back
//! what remains of a repeat entry, and reads the delay in a single critical
//! section, so concurrent calls see a serialized queue. The delay is the only
//! suspension point and goes through `cancel::sleep`, the same primitive the
//! real executor races against, so a cancelled mock call ends exactly like a
//! cancelled real one.

use std::collections::VecDeque;

use bytes::Bytes;
use network_service::{cancel, NetworkClient, NetworkError, Request};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::output::{Delay, MockOutput};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockError {
    #[error("no output queued")]
    NoOutputQueued,
}

#[derive(Debug, Default)]
struct MockState {
    outputs: VecDeque<MockOutput>,
    delay: Delay,
    /// Outcome of the most recent dequeue; `None` after one that succeeded.
    last_error: Option<MockError>,
    underflows: usize,
}

/// A [`NetworkClient`] that replays queued outputs instead of sending requests.
#[derive(Debug, Default)]
pub struct MockNetworkService {
    state: Mutex<MockState>,
}

impl MockNetworkService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outputs(outputs: impl IntoIterator<Item = MockOutput>) -> Self {
        let service = Self::new();
        service.set_outputs(outputs);
        service
    }

    pub fn push_output(&self, output: impl Into<MockOutput>) {
        self.state.lock().outputs.push_back(output.into());
    }

    /// Replace the whole queue.
    pub fn set_outputs(&self, outputs: impl IntoIterator<Item = MockOutput>) {
        self.state.lock().outputs = outputs.into_iter().collect();
    }

    /// Snapshot of the queue, head first.
    pub fn outputs(&self) -> Vec<MockOutput> {
        self.state.lock().outputs.iter().cloned().collect()
    }

    pub fn set_delay(&self, delay: Delay) {
        self.state.lock().delay = delay;
    }

    pub fn delay(&self) -> Delay {
        self.state.lock().delay
    }

    /// Why the most recent call found nothing to replay, if it did.
    ///
    /// A queued failure that happens to carry the same message never sets
    /// this.
    pub fn last_error(&self) -> Option<MockError> {
        self.state.lock().last_error.clone()
    }

    /// How many calls found the queue empty.
    pub fn underflows(&self) -> usize {
        self.state.lock().underflows
    }

    /// Consume the head of the queue once.
    pub fn queue(&self) -> Result<MockOutput, MockError> {
        self.next().map(|(output, _)| output)
    }

    fn next(&self) -> Result<(MockOutput, Delay), MockError> {
        let mut state = self.state.lock();
        let Some(head) = state.outputs.pop_front() else {
            state.underflows += 1;
            state.last_error = Some(MockError::NoOutputQueued);
            return Err(MockError::NoOutputQueued);
        };
        state.last_error = None;
        if let Some(rest) = head.clone().after_use() {
            state.outputs.push_front(rest);
        }
        trace!(remaining = state.outputs.len(), "mock output dequeued");
        Ok((head, state.delay))
    }
}

impl NetworkClient for MockNetworkService {
    async fn start(&self, request: &Request) -> Result<Bytes, NetworkError> {
        if cancel::is_cancelled() {
            debug!(
                method = %request.method,
                url = %request.url,
                "mock call cancelled before dequeue"
            );
            return Err(NetworkError::cancelled());
        }

        let (output, delay) = match self.next() {
            Ok(next) => next,
            Err(err) => {
                debug!(method = %request.method, url = %request.url, "mock queue is empty");
                return Err(NetworkError::coerce(Box::new(err)));
            }
        };

        match delay {
            Delay::None => {}
            Delay::Fixed(duration) => {
                debug!(?duration, "mock delaying response");
                cancel::sleep(Some(duration)).await?;
            }
            Delay::Infinite => {
                debug!("mock delaying until cancelled");
                cancel::sleep(None).await?;
            }
        }

        output.output()
    }
}
