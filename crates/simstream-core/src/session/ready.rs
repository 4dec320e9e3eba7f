//! One-shot "scene is interactive" continuation

use std::fmt;

pub type ReadyContinuation = Box<dyn FnOnce() + Send>;

/// Holds at most one pending continuation
#[derive(Default)]
pub struct ReadySlot {
    pending: Option<ReadyContinuation>,
}

impl ReadySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot. Returns true if a pending continuation was replaced.
    pub fn arm(&mut self, continuation: ReadyContinuation) -> bool {
        self.pending.replace(continuation).is_some()
    }

    /// Invoke and clear the pending continuation, if any
    pub fn fulfill(&mut self) -> bool {
        match self.pending.take() {
            Some(continuation) => {
                continuation();
                true
            }
            None => false,
        }
    }

    /// Drop the pending continuation without invoking it
    pub fn discard(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl fmt::Debug for ReadySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySlot")
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, ReadyContinuation) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_fulfill_once() {
        let (count, continuation) = counter();
        let mut slot = ReadySlot::new();
        assert!(!slot.arm(continuation));
        assert!(slot.fulfill());
        assert!(!slot.fulfill());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arm_replaces_previous() {
        let (first, a) = counter();
        let (second, b) = counter();
        let mut slot = ReadySlot::new();
        slot.arm(a);
        assert!(slot.arm(b));
        slot.fulfill();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_discard_does_not_invoke() {
        let (count, continuation) = counter();
        let mut slot = ReadySlot::new();
        slot.arm(continuation);
        assert!(slot.discard());
        assert!(!slot.is_pending());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
