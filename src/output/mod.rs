pub mod terminal;

pub use terminal::{print_outcome, print_stripped};
