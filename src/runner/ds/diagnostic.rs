//! Non-fatal diagnostics.
//!
//! Operations that can recover (a missing property, an append on object storage) complete
//! with a fallback value and report what happened through a [`DiagnosticSink`].

use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use log::warn;

use crate::runner::ds::array_key::ArrayKey;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UndefinedProperty(String),
    UndefinedIndex(ArrayKey),
    UnsupportedOperation(String),
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UndefinedProperty(name) => write!(f, "Undefined property: {}", name),
            Diagnostic::UndefinedIndex(key) => write!(f, "Undefined array key {}", key),
            Diagnostic::UnsupportedOperation(msg) => write!(f, "{}", msg),
        }
    }
}

pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);

    /// Takes whatever the sink has retained. Sinks that do not retain return nothing.
    fn drain(&self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Forwards diagnostics to the `log` facade as warnings.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
    }
}

pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps diagnostics in memory. Clones share the same record list.
#[derive(Clone, Default)]
pub struct CollectingSink {
    records: Rc<RefCell<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }

    fn drain(&self) -> Vec<Diagnostic> {
        self.records.borrow_mut().drain(..).collect()
    }
}
