pub mod errors;
pub mod options;
