pub mod bindings;
pub mod config;
pub mod normalize;
pub mod output;
pub mod playground;
pub mod sandbox;

pub use bindings::{BindingSet, BindingValue, NativeNamespace};
pub use config::SandboxConfig;
pub use playground::{Playground, RunState};
pub use sandbox::{Outcome, Transcript, execute_snippet, run_snippet};
