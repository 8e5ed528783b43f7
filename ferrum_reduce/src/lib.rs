pub mod api;
pub mod config;
pub mod core;
pub mod framework;

pub use crate::api::record::KeyValue;
pub use crate::api::reduce::Reducer;
pub use crate::core::task::{do_reduce, ReduceReport, ReduceTask, Task};
pub use crate::framework::errors::{FerrumReduceError, Result};
pub use crate::framework::options::{ReduceOptions, Strictness};

#[cfg(test)]
mod tests;
