//! Launch assembly building blocks: the resolved configuration, the typed
//! container-runtime command builder, and the scoped scratch working
//! directory. These are consumed by the CLI runner.
pub mod command;
pub mod config;
pub mod workdir;
