use std::cell::Cell;
use std::ptr::NonNull;

/// Control block shared by every [`Shared`](crate::Shared) and
/// [`Weak`](crate::Weak) over one allocation.
///
/// - `strong`
///   - number of live `Shared<T>` handles
///   - the payload is dropped when it reaches 0
/// - `weak`
///   - number of live `Weak<T>` handles
///   - the block itself is freed once both counts are 0
pub(crate) struct Counter {
    strong: Cell<usize>,
    weak: Cell<usize>,
}

impl Counter {
    /// Block for a freshly created owning handle.
    pub(crate) fn owned() -> Self {
        Self {
            strong: Cell::new(1),
            weak: Cell::new(0),
        }
    }

    /// Block for a default observing handle that never saw a value.
    pub(crate) fn observed() -> Self {
        Self {
            strong: Cell::new(0),
            weak: Cell::new(1),
        }
    }

    pub(crate) fn alloc(counter: Self) -> NonNull<Self> {
        let ptr = NonNull::from(Box::leak(Box::new(counter)));
        log::trace!(
            "counter {:p}: allocated (strong={}, weak={})",
            ptr,
            unsafe { ptr.as_ref() }.strong(),
            unsafe { ptr.as_ref() }.weak(),
        );
        ptr
    }

    /// # Safety
    ///
    /// `ptr` must come from [`Counter::alloc`], both counts must be 0 and no
    /// handle may touch the block afterwards.
    pub(crate) unsafe fn dealloc(ptr: NonNull<Self>) {
        debug_assert_eq!(ptr.as_ref().strong(), 0);
        debug_assert_eq!(ptr.as_ref().weak(), 0);
        log::trace!("counter {:p}: freed", ptr);
        drop(Box::from_raw(ptr.as_ptr()));
    }

    pub(crate) fn strong(&self) -> usize {
        self.strong.get()
    }

    pub(crate) fn weak(&self) -> usize {
        self.weak.get()
    }

    pub(crate) fn inc_strong(&self) {
        let n = self.strong.get();
        if n == usize::MAX {
            std::process::abort();
        }
        self.strong.set(n + 1);
    }

    /// Returns the strong count after the decrement.
    pub(crate) fn dec_strong(&self) -> usize {
        let n = self.strong.get();
        debug_assert!(n > 0, "strong count underflow");
        self.strong.set(n.wrapping_sub(1));
        n.wrapping_sub(1)
    }

    pub(crate) fn inc_weak(&self) {
        let n = self.weak.get();
        if n == usize::MAX {
            std::process::abort();
        }
        self.weak.set(n + 1);
    }

    /// Returns the weak count after the decrement.
    pub(crate) fn dec_weak(&self) -> usize {
        let n = self.weak.get();
        debug_assert!(n > 0, "weak count underflow");
        self.weak.set(n.wrapping_sub(1));
        n.wrapping_sub(1)
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.strong() == 0 && self.weak() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_counts() {
        let c = Counter::owned();
        assert_eq!((c.strong(), c.weak()), (1, 0));

        let c = Counter::observed();
        assert_eq!((c.strong(), c.weak()), (0, 1));
    }

    #[test]
    fn counts_move_independently() {
        let c = Counter::owned();
        c.inc_strong();
        c.inc_weak();
        c.inc_weak();
        assert_eq!((c.strong(), c.weak()), (2, 2));

        assert_eq!(c.dec_strong(), 1);
        assert_eq!(c.weak(), 2);
        assert_eq!(c.dec_weak(), 1);
        assert_eq!(c.strong(), 1);

        assert_eq!(c.dec_strong(), 0);
        assert!(!c.is_dead());
        assert_eq!(c.dec_weak(), 0);
        assert!(c.is_dead());
    }

    #[test]
    fn alloc_then_dealloc() {
        let ptr = Counter::alloc(Counter::observed());
        assert_eq!(unsafe { ptr.as_ref() }.dec_weak(), 0);
        unsafe { Counter::dealloc(ptr) };
    }
}
