//! Tests for host-side collaborators: iterator and class registries, configuration,
//! the driver registry and observer notification.

extern crate arrayshim;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use arrayshim::runner::ds::array_key::ArrayKey;
use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags};
use arrayshim::runner::ds::iterator::HostIterator;
use arrayshim::runner::ds::keyed_collection::KeyedCollection;
use arrayshim::runner::ds::value::HostValue;
use arrayshim::runner::plugin::config::{DiagnosticsMode, HostConfig};
use arrayshim::runner::plugin::registry::IteratorRegistry;
use arrayshim::runner::plugin::types::HostContext;
use arrayshim::runner::std_lib::drivers::{available_drivers, is_driver_available};
use arrayshim::runner::std_lib::observer::{Observer, ObserverList, Subject};

/// Walks a collection from the last entry to the first.
struct ReverseIterator {
    entries: Vec<(ArrayKey, HostValue)>,
    position: usize,
}

impl ReverseIterator {
    fn new(storage: HostValue) -> Self {
        let mut entries = storage
            .as_array()
            .map(|a| a.borrow().to_entries())
            .unwrap_or_default();
        entries.reverse();
        ReverseIterator {
            entries,
            position: 0,
        }
    }
}

impl HostIterator for ReverseIterator {
    fn class_name(&self) -> &str {
        "ReverseIterator"
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn valid(&self) -> bool {
        self.position < self.entries.len()
    }

    fn current(&self) -> Option<HostValue> {
        self.entries.get(self.position).map(|(_, v)| v.clone())
    }

    fn key(&self) -> Option<ArrayKey> {
        self.entries.get(self.position).map(|(k, _)| k.clone())
    }

    fn next(&mut self) {
        self.position += 1;
    }
}

// ============================================================================
// Iterator registry
// ============================================================================

mod iterators {
    use super::*;

    fn context() -> Rc<HostContext> {
        let mut iterators = IteratorRegistry::with_core();
        iterators.register("ReverseIterator", |storage| {
            Box::new(ReverseIterator::new(storage)) as Box<dyn HostIterator>
        });
        HostContext::new().with_iterators(iterators).shared()
    }

    #[test]
    fn test_named_iterator_is_constructed_with_storage() {
        let input = HostValue::from(KeyedCollection::from_values(vec![
            HostValue::from("a"),
            HostValue::from("b"),
            HostValue::from("c"),
        ]));
        let container = ArrayObject::new_in(
            context(),
            input,
            ContainerFlags::empty(),
            Some("reverseiterator"),
        )
        .unwrap();

        let iterator = container.get_iterator().unwrap();
        assert_eq!(iterator.class_name(), "ReverseIterator");
        let values: Vec<HostValue> = iterator.into_entries().map(|(_, v)| v).collect();
        assert_eq!(
            values,
            vec![HostValue::from("c"), HostValue::from("b"), HostValue::from("a")]
        );
    }

    #[test]
    fn test_registry_lookup() {
        let ctx = context();
        assert!(ctx.iterators.has_iterator("ArrayIterator"));
        assert!(ctx.iterators.has_iterator("REVERSEITERATOR"));
        assert!(!ctx.iterators.has_iterator("CachingIterator"));
        assert_eq!(ctx.iterators.names(), vec!["ArrayIterator", "ReverseIterator"]);
    }

    #[test]
    fn test_default_iterator_reaches_appended_entries() {
        let mut container =
            ArrayObject::new(HostValue::Null, ContainerFlags::empty(), None).unwrap();
        container.append(HostValue::Integer(1));
        let mut iterator = container.get_iterator().unwrap();
        iterator.rewind();
        iterator.next();
        assert!(!iterator.valid());
        container.append(HostValue::Integer(2));
        assert!(iterator.valid());
        assert_eq!(iterator.current(), Some(HostValue::Integer(2)));
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;
    use arrayshim::runner::ds::diagnostic::Diagnostic;

    #[test]
    fn test_context_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[diagnostics]").unwrap();
        writeln!(file, "mode = \"collect\"").unwrap();
        writeln!(file, "[serialization]").unwrap();
        writeln!(file, "max_depth = 32").unwrap();

        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.diagnostics, DiagnosticsMode::Collect);

        let ctx = HostContext::from_config(&config).shared();
        assert_eq!(ctx.max_depth, 32);

        let container =
            ArrayObject::new_in(ctx.clone(), HostValue::Null, ContainerFlags::empty(), None)
                .unwrap();
        container.get_property("missing").unwrap();
        assert_eq!(
            ctx.drain_diagnostics(),
            vec![Diagnostic::UndefinedProperty("missing".to_string())]
        );
    }
}

// ============================================================================
// Drivers
// ============================================================================

mod drivers {
    use super::*;

    #[test]
    fn test_drivers_are_listed_and_found() {
        let drivers = available_drivers();
        assert!(!drivers.is_empty());
        for driver in &drivers {
            assert!(is_driver_available(driver));
        }
        assert!(!is_driver_available(""));
    }
}

// ============================================================================
// Observers
// ============================================================================

mod observers {
    use super::*;

    /// A subject that notifies after every stored entry.
    struct WatchedContainer {
        container: ArrayObject,
        observers: ObserverList,
    }

    impl WatchedContainer {
        fn store(&mut self, value: HostValue) {
            self.container.append(value);
            self.notify();
        }
    }

    impl Subject for WatchedContainer {
        fn attach(&mut self, observer: Rc<dyn Observer>) {
            self.observers.attach(observer);
        }

        fn detach(&mut self, observer: &Rc<dyn Observer>) {
            self.observers.detach(observer);
        }

        fn notify(&self) {
            self.observers.notify(self);
        }
    }

    struct CountObserver {
        seen: RefCell<Vec<usize>>,
        counter: Rc<dyn Fn() -> usize>,
    }

    impl Observer for CountObserver {
        fn update(&self, _subject: &dyn Subject) {
            self.seen.borrow_mut().push((self.counter)());
        }
    }

    #[test]
    fn test_observers_follow_container_changes() {
        let mut watched = WatchedContainer {
            container: ArrayObject::new(HostValue::Null, ContainerFlags::empty(), None).unwrap(),
            observers: ObserverList::new(),
        };
        let calls = Rc::new(RefCell::new(0usize));
        let counter_calls = calls.clone();
        let observer = Rc::new(CountObserver {
            seen: RefCell::new(Vec::new()),
            counter: Rc::new(move || {
                *counter_calls.borrow_mut() += 1;
                *counter_calls.borrow()
            }),
        });
        let handle: Rc<dyn Observer> = observer.clone();

        watched.attach(handle.clone());
        watched.attach(handle.clone());
        watched.store(HostValue::Integer(1));
        watched.store(HostValue::Integer(2));
        watched.detach(&handle);
        watched.store(HostValue::Integer(3));

        assert_eq!(*observer.seen.borrow(), vec![1, 2]);
        assert_eq!(watched.container.count(), 3);
        assert!(watched.observers.is_empty());
    }
}
