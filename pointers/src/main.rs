use log::info;
use pointers::{Shared, Weak};

struct Noisy(&'static str);

impl Drop for Noisy {
    fn drop(&mut self) {
        info!("dropping {}", self.0);
    }
}

fn main() {
    env_logger::init();

    let a = Shared::new(42);
    info!("a = {}, strong = {}", *a, a.use_count());

    let b = a.clone();
    info!("after clone: a.strong = {}, b.strong = {}", a.use_count(), b.use_count());

    let w = Weak::new(&a);
    info!("observer expired: {}", w.expired());

    drop(a);
    drop(b);
    info!("owners gone, observer expired: {}", w.expired());
    let locked = w.lock();
    info!("lock on expired observer is empty: {}", locked == std::ptr::null::<i32>());

    let owner = Shared::new(Noisy("payload"));
    let observer = Shared::downgrade(&owner);
    match observer.upgrade() {
        Some(promoted) => info!("promoted {}, strong = {}", promoted.0, promoted.use_count()),
        None => info!("nothing to promote"),
    }
    drop(owner);
    assert!(observer.upgrade().is_none());
}
