//! Test helpers for swapping container entries
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::testing::TestContainer;
//!
//! #[test]
//! fn test_with_fake_mailer() {
//!     let container = bootstrap::container()?;
//!     let _guard = TestContainer::fake_type::<dyn Mailer>(&container, Arc::new(FakeMailer::default()));
//!
//!     // Everything resolved from `container` now sees FakeMailer
//! }
//! // The real binding is back once the guard drops
//! ```

use super::binding::{Binding, Concrete, Lifetime};
use super::instance::{key_of, Instance};
use super::Container;
use std::sync::Arc;

/// Entry point for faking container entries in tests
pub struct TestContainer;

impl TestContainer {
    /// Serve `instance` for `key` until the guard drops
    ///
    /// An alias key fakes the entry it points at.
    pub fn fake<'c>(
        container: &'c Container,
        key: impl Into<String>,
        instance: Instance,
    ) -> TestContainerGuard<'c> {
        let key = container.get_alias(&key.into());
        let previous = container.replace_entry(&key, None, Some(instance));
        TestContainerGuard {
            container,
            key,
            previous,
        }
    }

    /// Serve `value` for the type key of `T` until the guard drops
    pub fn fake_type<'c, T: ?Sized + Send + Sync + 'static>(
        container: &'c Container,
        value: Arc<T>,
    ) -> TestContainerGuard<'c> {
        Self::fake(container, key_of::<T>(), Instance::new(value))
    }

    /// Replace the binding for `key` (new instance per resolution) until the
    /// guard drops
    pub fn bind<'c>(
        container: &'c Container,
        key: impl Into<String>,
        concrete: impl Into<Concrete>,
    ) -> TestContainerGuard<'c> {
        let key = container.get_alias(&key.into());
        let binding = Binding {
            concrete: concrete.into(),
            lifetime: Lifetime::Transient,
        };
        let previous = container.replace_entry(&key, Some(binding), None);
        TestContainerGuard {
            container,
            key,
            previous,
        }
    }
}

/// Restores the faked entry on drop
#[must_use = "the fake is removed as soon as the guard drops"]
pub struct TestContainerGuard<'c> {
    container: &'c Container,
    key: String,
    previous: (Option<Binding>, Option<Instance>),
}

impl Drop for TestContainerGuard<'_> {
    fn drop(&mut self) {
        let (binding, instance) = self.previous.clone();
        self.container.replace_entry(&self.key, binding, instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct SystemClock;
    impl Clock for SystemClock {
        fn now(&self) -> u64 {
            1
        }
    }

    struct FrozenClock;
    impl Clock for FrozenClock {
        fn now(&self) -> u64 {
            42
        }
    }

    #[test]
    fn test_fake_is_restored_on_drop() {
        let container = Container::new();
        container.singleton_type::<dyn Clock, _>(|_| Ok(Arc::new(SystemClock)));

        {
            let _guard = TestContainer::fake_type::<dyn Clock>(&container, Arc::new(FrozenClock));
            assert_eq!(container.make_type::<dyn Clock>().unwrap().now(), 42);
        }

        assert_eq!(container.make_type::<dyn Clock>().unwrap().now(), 1);
    }

    #[test]
    fn test_bind_fake_removes_entry_that_did_not_exist() {
        let container = Container::new();
        {
            let _guard = TestContainer::bind(&container, "answer", Concrete::value(42u8));
            assert_eq!(*container.make_as::<u8>("answer").unwrap(), 42);
        }
        assert!(!container.bound("answer"));
    }

    #[test]
    fn test_fake_through_alias_replaces_the_target() {
        let container = Container::new();
        container.singleton_type::<dyn Clock, _>(|_| Ok(Arc::new(SystemClock)));
        container.alias("clock", key_of::<dyn Clock>()).unwrap();

        {
            let _guard = TestContainer::fake(&container, "clock", Instance::new::<dyn Clock>(Arc::new(FrozenClock)));
            assert_eq!(container.make_type::<dyn Clock>().unwrap().now(), 42);
            assert_eq!(container.make_as::<dyn Clock>("clock").unwrap().now(), 42);
            assert!(container.is_alias("clock"));
        }

        assert_eq!(container.make_as::<dyn Clock>("clock").unwrap().now(), 1);
    }
}
