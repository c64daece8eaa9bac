use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Parameter name the captured console is injected under.
pub const CONSOLE_NAME: &str = "console";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("binding name `{0}` is not a valid identifier")]
    InvalidName(String),
    #[error("binding name `{0}` is reserved for the captured console")]
    Reserved(String),
    #[error("binding `{0}` is already defined")]
    Duplicate(String),
}

/// A Rust function exposed to snippets. Arguments and the return value cross
/// the boundary as JSON; an `Err` is thrown into the snippet as an `Error`.
pub type NativeFn =
    Arc<dyn Fn(&[serde_json::Value]) -> Result<serde_json::Value, String> + Send + Sync>;

/// A namespace object whose methods are implemented in Rust.
#[derive(Clone, Default)]
pub struct NativeNamespace {
    methods: BTreeMap<String, NativeFn>,
}

impl NativeNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&[serde_json::Value]) -> Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn method(&self, name: &str) -> Option<&NativeFn> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for NativeNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

/// Value injected under a binding name.
#[derive(Debug, Clone)]
pub enum BindingValue {
    /// A single JavaScript expression evaluated inside the run's context.
    /// Leading comments and a trailing `;` or comment are allowed; anything
    /// after the first statement is never evaluated.
    Script(String),
    /// Plain data
    Json(serde_json::Value),
    /// Methods backed by Rust closures
    Native(NativeNamespace),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

/// Ordered, validated set of names injected into every run.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    entries: Vec<Binding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: BindingValue) -> Result<Self, BindingError> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: BindingValue) -> Result<(), BindingError> {
        let name = name.into();
        validate_name(&name)?;
        if self.get(&name).is_some() {
            return Err(BindingError::Duplicate(name));
        }
        self.entries.push(Binding { name, value });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BindingValue> {
        self.entries.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|b| b.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), BindingError> {
    if name == CONSOLE_NAME {
        return Err(BindingError::Reserved(name.to_string()));
    }
    if !IDENTIFIER_RE.is_match(name) || RESERVED_WORDS.contains(&name) {
        return Err(BindingError::InvalidName(name.to_string()));
    }
    Ok(())
}
