//! Infrastructure adapters (filesystem, clipboard, editor, config, logging).

pub mod clipboard;
pub mod config;
pub mod editor;
pub mod files;
pub mod logging;
