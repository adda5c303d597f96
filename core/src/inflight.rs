//! One-shot handoff of an in-flight transport task between the dispatch path
//! and the cancellation path.
//!
//! # Design
//! The cell starts `Pending`. The dispatch path publishes the task exactly
//! once; the cancellation path reads it at most once. Both transitions happen
//! under one lock, so there is no window in which a task exists but a cancel
//! request can be lost:
//!
//! - cancel before publish: the cell records `CancelRequested`, and `publish`
//!   cancels the task instead of resuming it.
//! - cancel after publish: `cancel` takes the recorded task and cancels it.
//! - cancel after `finish`, or a second cancel: no-op.
//!
//! The task is resumed while the lock is held, so a concurrent cancel always
//! observes either "not yet published" or "published and resumed".

use parking_lot::Mutex;

use crate::transport::DataTask;

enum State {
    Pending,
    CancelRequested,
    Recorded(Box<dyn DataTask>),
    Finished,
}

pub(crate) struct InFlight {
    state: Mutex<State>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
        }
    }

    /// Record `task` and start it, or cancel it if a cancel already arrived.
    ///
    /// Returns `false` when the task was cancelled instead of resumed.
    pub(crate) fn publish(&self, task: Box<dyn DataTask>) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, State::Pending) {
            task.resume();
            *state = State::Recorded(task);
            return true;
        }
        // A pending cancel consumes the task. Publishing twice is a caller
        // bug; the late task never runs either way.
        if matches!(*state, State::CancelRequested) {
            *state = State::Finished;
        }
        drop(state);
        task.cancel();
        false
    }

    /// Cancel the recorded task, or remember the request if none is recorded.
    ///
    /// Returns `true` only for the call that actually cancelled a task.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Finished) {
            State::Pending => {
                *state = State::CancelRequested;
                false
            }
            State::Recorded(task) => {
                drop(state);
                task.cancel();
                true
            }
            previous @ (State::CancelRequested | State::Finished) => {
                *state = previous;
                false
            }
        }
    }

    /// Mark the task complete; later cancels become no-ops.
    pub(crate) fn finish(&self) {
        *self.state.lock() = State::Finished;
    }
}

/// Cancels the in-flight task when dropped, unless it already finished.
pub(crate) struct CancelOnDrop<'a>(pub(crate) &'a InFlight);

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
