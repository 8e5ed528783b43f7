use crate::framework::errors::FerrumReduceError;
use std::str::FromStr;

/// How the executor treats lossy intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Log and skip missing files and malformed records; keep partial output on write failure.
    #[default]
    Degrade,
    /// Abort the task on the first missing file, malformed record or write failure.
    Strict,
}

impl Strictness {
    pub fn is_strict(&self) -> bool {
        matches!(self, Strictness::Strict)
    }
}

impl FromStr for Strictness {
    type Err = FerrumReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" | "false" | "no" | "0" | "" => Ok(Strictness::Degrade),
            "strict" | "true" | "yes" | "1" => Ok(Strictness::Strict),
            other => Err(FerrumReduceError::ConfigError(format!(
                "unknown strictness mode: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReduceOptions {
    pub strictness: Strictness,
}

impl ReduceOptions {
    pub fn strict() -> Self {
        ReduceOptions {
            strictness: Strictness::Strict,
        }
    }
}
