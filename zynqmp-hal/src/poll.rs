//! # Bounded polling
//!
//! Hardware status bits are polled with a fixed iteration budget instead of a wall-clock
//! timeout. The elapsed time therefore only depends on the register access latency.

/// Result of a single polling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<E> {
    /// The awaited condition was observed.
    Ready,
    /// Poll again.
    Pending,
    /// A failure was observed. Polling stops without exhausting the budget.
    Abort(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PollError<E> {
    #[error("condition not observed after {0} polls")]
    Timeout(u32),
    #[error("polling aborted: {0:?}")]
    Aborted(E),
}

/// Call `step` until it returns [Step::Ready], at most `max_polls` times.
///
/// Returns the number of polls which were required. On timeout, `step` was called exactly
/// `max_polls` times.
pub fn poll_bounded<E, F: FnMut() -> Step<E>>(
    max_polls: u32,
    mut step: F,
) -> Result<u32, PollError<E>> {
    for poll in 1..=max_polls {
        match step() {
            Step::Ready => return Ok(poll),
            Step::Pending => (),
            Step::Abort(e) => return Err(PollError::Aborted(e)),
        }
    }
    Err(PollError::Timeout(max_polls))
}

/// Poll until `condition` returns true, at most `max_polls` times.
#[inline]
pub fn poll_until<F: FnMut() -> bool>(
    max_polls: u32,
    mut condition: F,
) -> Result<u32, PollError<core::convert::Infallible>> {
    poll_bounded(max_polls, || {
        if condition() {
            Step::Ready
        } else {
            Step::Pending
        }
    })
}
