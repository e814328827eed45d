use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use crate::counter::Counter;
use crate::weak::Weak;

/// Owning handle over a heap value.
///
/// Every clone shares the value and one control block. The value is
/// dropped when the strong count goes from 1 to 0, no matter which clone
/// performs that step.
///
/// A handle whose `counter` is `None` has been released (moved out of with
/// [`Shared::take`] or explicitly [`Shared::release`]d); dropping it again
/// does nothing.
pub struct Shared<T> {
    pub(crate) ptr: Option<NonNull<T>>,
    pub(crate) counter: Option<NonNull<Counter>>,
    _marker: PhantomData<T>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Takes over an existing heap allocation.
    pub fn from_box(value: Box<T>) -> Self {
        Self::with_payload(Some(NonNull::from(Box::leak(value))))
    }

    /// Takes over a raw allocation. A null `ptr` gives a handle with no value.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from [`Box::into_raw`] and must not be freed
    /// or adopted anywhere else.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self::with_payload(NonNull::new(ptr))
    }

    fn with_payload(ptr: Option<NonNull<T>>) -> Self {
        Self {
            ptr,
            counter: Some(Counter::alloc(Counter::owned())),
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_parts(ptr: Option<NonNull<T>>, counter: NonNull<Counter>) -> Self {
        Self {
            ptr,
            counter: Some(counter),
            _marker: PhantomData,
        }
    }

    const fn released() -> Self {
        Self {
            ptr: None,
            counter: None,
            _marker: PhantomData,
        }
    }

    fn counter(&self) -> Option<&Counter> {
        self.counter.map(|c| unsafe { &*c.as_ptr() })
    }

    /// Number of `Shared` handles over this block, 0 once released.
    ///
    /// A default handle reports 1 even though it owns nothing.
    pub fn use_count(&self) -> usize {
        self.counter().map_or(0, Counter::strong)
    }

    /// Number of `Weak` handles over this block, 0 once released.
    pub fn weak_count(&self) -> usize {
        self.counter().map_or(0, Counter::weak)
    }

    /// Address of the value, null when there is none.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.map_or(ptr::null(), |p| p.as_ptr() as *const T)
    }

    pub fn get(&self) -> Option<&T> {
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    /// Mutable access, only while this is the sole handle of either kind.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.use_count() != 1 || self.weak_count() != 0 {
            return None;
        }
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn is_released(&self) -> bool {
        self.counter.is_none()
    }

    pub fn downgrade(this: &Self) -> Weak<T> {
        Weak::new(this)
    }

    /// Moves the handle out, leaving `self` released. Counts are untouched.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::released())
    }

    /// Drops the current reference and adopts `other` without touching its
    /// counts.
    pub fn assign(&mut self, other: Self) {
        *self = other;
    }

    /// Gives up this handle's strong reference.
    ///
    /// Drops the value when this was the last owner and frees the block when
    /// no observer is left either. Calling it on a released handle is a no-op.
    pub fn release(&mut self) {
        let Some(counter) = self.counter.take() else {
            return;
        };
        let payload = self.ptr.take();
        let c = unsafe { counter.as_ref() };

        if c.dec_strong() != 0 {
            return;
        }
        if let Some(payload) = payload {
            // Observers dropped by the value's destructor must not free the
            // block while it is still in use here.
            c.inc_weak();
            log::trace!("counter {:p}: dropping value {:p}", counter, payload);
            unsafe { drop(Box::from_raw(payload.as_ptr())) };
            c.dec_weak();
        }
        if c.is_dead() {
            unsafe { Counter::dealloc(counter) };
        }
    }

    /// Releases and starts over as an empty handle with a fresh block.
    pub fn reset(&mut self) {
        self.release();
        *self = Self::default();
    }
}

impl<T> Default for Shared<T> {
    /// A handle with no value whose block still reports one owner.
    fn default() -> Self {
        Self::with_payload(None)
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        if let Some(c) = self.counter() {
            c.inc_strong();
        }
        Self {
            ptr: self.ptr,
            counter: self.counter,
            _marker: PhantomData,
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

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced an empty Shared"),
        }
    }
}

impl<T> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl<T> Eq for Shared<T> {}

impl<T> PartialEq<*const T> for Shared<T> {
    fn eq(&self, other: &*const T) -> bool {
        self.as_ptr() == *other
    }
}

impl<T> PartialEq<*mut T> for Shared<T> {
    fn eq(&self, other: &*mut T) -> bool {
        self.as_ptr() == *other as *const T
    }
}

impl<T> PartialEq<Shared<T>> for *const T {
    fn eq(&self, other: &Shared<T>) -> bool {
        other == self
    }
}

impl<T> PartialEq<Shared<T>> for *mut T {
    fn eq(&self, other: &Shared<T>) -> bool {
        other == self
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("ptr", &self.as_ptr())
            .field("strong", &self.use_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

impl<T> fmt::Pointer for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}
