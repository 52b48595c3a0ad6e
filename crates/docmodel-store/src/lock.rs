use std::fmt;

/// Anything a backend holds for the duration of a critical section.
pub trait HeldLock {}

impl<T> HeldLock for T {}

/// A caller-scoped critical section against a store.
///
/// The section lasts until the value is dropped or [`unlock`] is called.
/// Backends that provide no exclusion hand out an empty section.
///
/// [`unlock`]: CriticalSection::unlock
pub struct CriticalSection<'a> {
    guard: Option<Box<dyn HeldLock + 'a>>,
    shared: bool,
}

impl<'a> CriticalSection<'a> {
    /// Wrap a backend guard.
    pub fn new<G: 'a>(guard: G, shared: bool) -> Self {
        Self {
            guard: Some(Box::new(guard)),
            shared,
        }
    }

    /// A section that excludes nothing.
    pub fn noop(shared: bool) -> Self {
        Self {
            guard: None,
            shared,
        }
    }

    /// Whether shared (read) intent was requested.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Whether the backend holds anything for this section.
    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Leave the section.
    pub fn unlock(self) {
        drop(self);
    }
}

impl fmt::Debug for CriticalSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriticalSection")
            .field("shared", &self.shared)
            .field("held", &self.is_held())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Flag<'a>(&'a Cell<bool>);

    impl Drop for Flag<'_> {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn unlock_drops_guard() {
        let released = Cell::new(false);
        let section = CriticalSection::new(Flag(&released), false);
        assert!(section.is_held());
        assert!(!section.is_shared());
        section.unlock();
        assert!(released.get());
    }

    #[test]
    fn noop_holds_nothing() {
        let section = CriticalSection::noop(true);
        assert!(!section.is_held());
        assert!(section.is_shared());
    }
}
