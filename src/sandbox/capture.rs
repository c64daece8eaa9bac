use std::cell::RefCell;
use std::rc::Rc;

use super::outcome::Transcript;

/// Severity of a captured console call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    /// Level for the tag the console prelude passes back.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "warn" => Level::Warning,
            "error" => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Level::Info => "",
            Level::Warning => "WARNING: ",
            Level::Error => "ERROR: ",
        }
    }
}

/// Stand-in for the console. Each call becomes one transcript line; lines
/// keep call order.
///
/// Handles are cheap clones of the same buffer, so the copy handed to the
/// interpreter and the one kept by the caller see the same lines.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    lines: Rc<RefCell<Transcript>>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call whose arguments are already rendered to text.
    pub fn record<S: AsRef<str>>(&self, level: Level, parts: &[S]) {
        let joined = parts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        self.lines
            .borrow_mut()
            .push(format!("{}{}", level.prefix(), joined));
    }

    pub fn info<S: AsRef<str>>(&self, parts: &[S]) {
        self.record(Level::Info, parts);
    }

    pub fn warn<S: AsRef<str>>(&self, parts: &[S]) {
        self.record(Level::Warning, parts);
    }

    pub fn error<S: AsRef<str>>(&self, parts: &[S]) {
        self.record(Level::Error, parts);
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    pub fn transcript(&self) -> Transcript {
        self.lines.borrow().clone()
    }
}
