//! Cooperative cancellation for long-running operations.
//!
//! Algorithms poll an [`Interrupt`] at every worklist step and abort with
//! [`AutomatonError::Interrupted`] once it fires.

use crate::types::AutomatonError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cancellation signal polled by the algorithms.
pub trait Interrupt {
    fn is_interrupted(&self) -> bool;
}

/// An interrupt that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Interrupt for Never {
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Fires once a point in time has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }
}

impl Interrupt for Deadline {
    fn is_interrupted(&self) -> bool {
        Instant::now() >= self.0
    }
}

/// Fires once the flag is set, typically from another thread.
impl Interrupt for AtomicBool {
    fn is_interrupted(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Interrupt + ?Sized> Interrupt for &T {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

impl<T: Interrupt + ?Sized> Interrupt for Arc<T> {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

/// Returns `Err(Interrupted)` if the interrupt has fired.
pub(crate) fn check(interrupt: &dyn Interrupt) -> Result<(), AutomatonError> {
    if interrupt.is_interrupted() {
        return Err(AutomatonError::Interrupted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never() {
        assert!(check(&Never).is_ok());
    }

    #[test]
    fn test_expired_deadline() {
        let deadline = Deadline::at(Instant::now() - Duration::from_millis(1));

        assert_eq!(check(&deadline), Err(AutomatonError::Interrupted));
    }

    #[test]
    fn test_future_deadline() {
        let deadline = Deadline::after(Duration::from_secs(3600));

        assert!(!deadline.is_interrupted());
    }

    #[test]
    fn test_shared_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let handle = Arc::clone(&flag);

        assert!(!flag.is_interrupted());
        handle.store(true, Ordering::Relaxed);
        assert!(flag.is_interrupted());
    }
}
