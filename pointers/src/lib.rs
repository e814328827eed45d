//! Single-threaded shared ownership with manual reference counting.
//!
//! [`Shared<T>`] owns a heap value together with every other `Shared` cloned
//! from it; the value is dropped when the last one goes away. [`Weak<T>`]
//! observes the same allocation without keeping the value alive, can tell
//! whether it is gone ([`Weak::expired`]) and can be promoted back into an
//! owner ([`Weak::lock`]).
//!
//! ```
//! use pointers::{Shared, Weak};
//!
//! let a = Shared::new(42);
//! let b = a.clone();
//! assert_eq!(a.use_count(), 2);
//!
//! let w = Weak::new(&a);
//! assert!(!w.expired());
//!
//! drop(a);
//! drop(b);
//! assert!(w.expired());
//! assert!(w.lock() == std::ptr::null::<i32>());
//! ```
//!
//! Counters are plain [`Cell`](std::cell::Cell)s, so neither handle is
//! `Send` or `Sync`.

mod counter;
mod shared;
mod weak;

pub use shared::Shared;
pub use weak::Weak;

#[cfg(test)]
pub(crate) mod test_util {
    use std::cell::Cell;

    pub fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Payload that bumps a shared counter when dropped.
    pub struct DetectDrop<'a>(pub &'a Cell<usize>);

    impl Drop for DetectDrop<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }
}
