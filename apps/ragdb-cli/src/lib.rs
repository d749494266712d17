//! Wiring for the `ragdb` binary: argument parsing and pipeline assembly.

pub mod args;
pub mod pipeline;

pub use args::Command;
pub use pipeline::Pipeline;
