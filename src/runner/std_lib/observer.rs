//! Observer / subject notification.

use std::rc::Rc;

use log::trace;

pub trait Observer {
    fn update(&self, subject: &dyn Subject);
}

pub trait Subject {
    fn attach(&mut self, observer: Rc<dyn Observer>);

    fn detach(&mut self, observer: &Rc<dyn Observer>);

    fn notify(&self);
}

fn same_observer(a: &Rc<dyn Observer>, b: &Rc<dyn Observer>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Attached observers in attach order. Observers are compared by identity; attaching one that
/// is already present does nothing.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Rc<dyn Observer>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn attach(&mut self, observer: Rc<dyn Observer>) {
        if !self.observers.iter().any(|o| same_observer(o, &observer)) {
            self.observers.push(observer);
        }
    }

    pub fn detach(&mut self, observer: &Rc<dyn Observer>) {
        self.observers.retain(|o| !same_observer(o, observer));
    }

    /// Calls `update` on every observer with `subject` as the source.
    pub fn notify(&self, subject: &dyn Subject) {
        trace!("notifying {} observers", self.observers.len());
        for observer in &self.observers {
            observer.update(subject);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Observer for Recorder {
        fn update(&self, _subject: &dyn Subject) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[derive(Default)]
    struct Counter {
        observers: ObserverList,
    }

    impl Subject for Counter {
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

    fn recorder(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Rc<dyn Observer> {
        Rc::new(Recorder {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn test_notify_in_attach_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subject = Counter::default();
        let first = recorder("first", &log);
        subject.attach(first.clone());
        subject.attach(recorder("second", &log));
        subject.attach(first.clone());
        assert_eq!(subject.observers.len(), 2);

        subject.notify();
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        subject.detach(&first);
        subject.notify();
        assert_eq!(*log.borrow(), vec!["first", "second", "second"]);
    }
}
