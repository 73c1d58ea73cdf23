//! Injected logging
//!
//! Conversions and extraction never fail outward. Everything that goes wrong
//! is reported through a [`Diagnostics`] implementation handed to them by the
//! caller. Binaries use [`LogDiagnostics`], which forwards to the [`log`]
//! facade, while tests use [`MemoryDiagnostics`] to assert on exactly what
//! was reported.

use std::cell::RefCell;
use std::fmt;

pub use log::Level;

/// A sink for diagnostics emitted while reading artifacts.
pub trait Diagnostics {
    /// Records a single diagnostic
    fn emit(&self, level: Level, target: &str, args: fmt::Arguments<'_>);

    fn error(&self, target: &str, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, target, args)
    }

    fn warn(&self, target: &str, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, target, args)
    }

    fn info(&self, target: &str, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, target, args)
    }

    fn debug(&self, target: &str, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, target, args)
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn emit(&self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        (**self).emit(level, target, args)
    }
}

/// Forwards diagnostics to whichever logger is installed for the [`log`]
/// facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        log::log!(target: target, level, "{}", args);
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn emit(&self, _level: Level, _target: &str, _args: fmt::Arguments<'_>) {}
}

/// A diagnostic captured by [`MemoryDiagnostics`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Returns the recorded diagnostics at exactly the given level
    pub fn at_level(&self, level: Level) -> Vec<Diagnostic> {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.level == level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn emit(&self, level: Level, target: &str, args: fmt::Arguments<'_>) {
        self.entries.borrow_mut().push(Diagnostic {
            level,
            target: target.to_string(),
            message: args.to_string(),
        });
    }
}
