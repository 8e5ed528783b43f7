pub mod record;
pub mod reduce;
