/// The REPL (Read-Eval-Print-Loop) module.
pub mod buffer;
pub mod console;

pub use console::start;
