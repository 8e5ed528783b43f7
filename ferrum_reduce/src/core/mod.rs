pub mod codec;
pub mod collector;
pub mod emitter;
pub mod grouper;
pub mod naming;
pub mod task;
