//! Core of the tasktrack CLI: task model, document codec and storage.

pub mod codec;
pub mod config;
pub mod document;
pub mod render;
pub mod storage;
pub mod task;
pub mod task_ops;
pub mod tracker;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
