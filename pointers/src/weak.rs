use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

use crate::counter::Counter;
use crate::shared::Shared;

/// Non-owning handle over a value held by [`Shared`].
///
/// Only the weak count of the block is touched, so a `Weak` never keeps the
/// value alive. The address it holds may dangle once the value is gone; it is
/// only read through again after [`Weak::lock`] confirmed the strong count is
/// still positive.
pub struct Weak<T> {
    ptr: Option<NonNull<T>>,
    counter: Option<NonNull<Counter>>,
}

impl<T> Weak<T> {
    /// Observes the value behind `shared`.
    pub fn new(shared: &Shared<T>) -> Self {
        let Some(counter) = shared.counter else {
            return Self::released();
        };
        unsafe { counter.as_ref() }.inc_weak();
        Self {
            ptr: shared.ptr,
            counter: Some(counter),
        }
    }

    const fn released() -> Self {
        Self {
            ptr: None,
            counter: None,
        }
    }

    fn counter(&self) -> Option<&Counter> {
        self.counter.map(|c| unsafe { &*c.as_ptr() })
    }

    pub fn strong_count(&self) -> usize {
        self.counter().map_or(0, Counter::strong)
    }

    pub fn weak_count(&self) -> usize {
        self.counter().map_or(0, Counter::weak)
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.map_or(ptr::null(), |p| p.as_ptr() as *const T)
    }

    pub fn is_released(&self) -> bool {
        self.counter.is_none()
    }

    /// True when there is no value to observe or its last owner is gone.
    pub fn expired(&self) -> bool {
        self.ptr.is_none() || self.counter().map_or(true, |c| c.strong() == 0)
    }

    /// Promotes to an owning handle, or `None` if the value is gone.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        if self.expired() {
            return None;
        }
        let counter = self.counter?;
        unsafe { counter.as_ref() }.inc_strong();
        Some(Shared::from_parts(self.ptr, counter))
    }

    /// Promotes to an owning handle.
    ///
    /// An expired observer yields `Shared::default()`, which has its own
    /// fresh block and no value.
    pub fn lock(&self) -> Shared<T> {
        self.upgrade().unwrap_or_default()
    }

    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::released())
    }

    pub fn assign(&mut self, other: Self) {
        *self = other;
    }

    /// Gives up this handle's weak reference, freeing the block when it was
    /// the last reference of either kind. Never drops the value.
    pub fn release(&mut self) {
        let Some(counter) = self.counter.take() else {
            return;
        };
        self.ptr = None;
        let c = unsafe { counter.as_ref() };
        c.dec_weak();
        if c.is_dead() {
            unsafe { Counter::dealloc(counter) };
        }
    }

    pub fn reset(&mut self) {
        self.release();
        *self = Self::default();
    }
}

impl<T> Default for Weak<T> {
    /// An observer of nothing, alone on a fresh block (strong=0, weak=1).
    fn default() -> Self {
        Self {
            ptr: None,
            counter: Some(Counter::alloc(Counter::observed())),
        }
    }
}

impl<T> From<&Shared<T>> for Weak<T> {
    fn from(shared: &Shared<T>) -> Self {
        Self::new(shared)
    }
}

impl<T> Drop for Weak<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Clone for Weak<T> {
    fn clone(&self) -> Self {
        if let Some(c) = self.counter() {
            c.inc_weak();
        }
        Self {
            ptr: self.ptr,
            counter: self.counter,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if self.counter == source.counter {
            return;
        }
        let copy = source.clone();
        *self = copy;
    }
}

impl<T> PartialEq for Weak<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl<T> Eq for Weak<T> {}

impl<T> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weak")
            .field("ptr", &self.as_ptr())
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}
