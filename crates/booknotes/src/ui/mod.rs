//! Terminal front end.

pub mod repl;
