// src/format/mod.rs

pub mod resolver;
pub mod table;

pub use resolver::{default_image, resolve};
pub use table::{load_format_table, BuiltinFormats, FormatEntry, FormatTable, RemoteFormats};
