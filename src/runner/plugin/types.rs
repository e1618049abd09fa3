//! The host context: every capability a container borrows from its environment.

use std::rc::Rc;

use crate::runner::ds::diagnostic::{
    CollectingSink, Diagnostic, DiagnosticSink, LogSink, SilentSink,
};
use crate::runner::ds::error::Result;
use crate::runner::ds::value::HostValue;
use crate::runner::plugin::config::{DiagnosticsMode, HostConfig, DEFAULT_MAX_DEPTH};
use crate::runner::plugin::registry::{ClassRegistry, IteratorRegistry};
use crate::runner::std_lib::serialize::{SerializationCodec, TextCodec};

/// Capabilities supplied by the host: value codec, named type construction, iterator
/// factories and the diagnostic channel.
///
/// Containers hold their context through an `Rc` and never mutate it, so one context is
/// usually shared by every container of a program.
pub struct HostContext {
    pub codec: Box<dyn SerializationCodec>,
    pub classes: ClassRegistry,
    pub iterators: IteratorRegistry,
    pub diagnostics: Box<dyn DiagnosticSink>,
    pub max_depth: usize,
}

impl HostContext {
    pub fn new() -> Self {
        HostContext {
            codec: Box::new(TextCodec),
            classes: ClassRegistry::with_core(),
            iterators: IteratorRegistry::with_core(),
            diagnostics: Box::new(LogSink),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        let diagnostics: Box<dyn DiagnosticSink> = match config.diagnostics {
            DiagnosticsMode::Log => Box::new(LogSink),
            DiagnosticsMode::Collect => Box::new(CollectingSink::new()),
            DiagnosticsMode::Silent => Box::new(SilentSink),
        };
        HostContext {
            diagnostics,
            max_depth: config.max_depth,
            ..Self::new()
        }
    }

    pub fn with_diagnostics<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn with_classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_iterators(mut self, iterators: IteratorRegistry) -> Self {
        self.iterators = iterators;
        self
    }

    pub fn with_codec<C: SerializationCodec + 'static>(mut self, codec: C) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    pub fn encode(&self, value: &HostValue) -> Result<String> {
        self.codec.encode(value, self.max_depth)
    }

    pub fn decode(&self, payload: &str) -> Result<HostValue> {
        self.codec.decode(payload, &self.classes, self.max_depth)
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}
