use crate::framework::errors::FerrumReduceError;
use std::str::FromStr;
use tracing::warn;

/// Reducer is invoked once per distinct key with every value seen for it,
/// in the order the values were decoded.
pub trait Reducer {
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

impl<F> Reducer for F
where
    F: Fn(&str, &[String]) -> String,
{
    fn reduce(&self, key: &str, values: &[String]) -> String {
        self(key, values)
    }
}

/// Sums integer values. Values that are not integers, or that would overflow
/// the running total, are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumReducer;

impl Reducer for SumReducer {
    fn reduce(&self, key: &str, values: &[String]) -> String {
        let mut total: i64 = 0;
        for value in values {
            match value.trim().parse::<i64>() {
                Ok(n) => match total.checked_add(n) {
                    Some(sum) => total = sum,
                    None => warn!(key, value = %value, total, "skipping value that overflows the sum"),
                },
                Err(err) => warn!(key, value = %value, "skipping non integer value: {}", err),
            }
        }
        total.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountReducer;

impl Reducer for CountReducer {
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.len().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ConcatReducer {
    pub separator: String,
}

impl Default for ConcatReducer {
    fn default() -> Self {
        ConcatReducer {
            separator: ",".to_string(),
        }
    }
}

impl Reducer for ConcatReducer {
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.join(&self.separator)
    }
}

/// Reducers selectable by name from the worker config or command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinReducer {
    Sum,
    Count,
    Concat,
}

impl BuiltinReducer {
    pub fn into_reducer(self) -> Box<dyn Reducer + Send + Sync> {
        match self {
            BuiltinReducer::Sum => Box::new(SumReducer),
            BuiltinReducer::Count => Box::new(CountReducer),
            BuiltinReducer::Concat => Box::new(ConcatReducer::default()),
        }
    }
}

impl FromStr for BuiltinReducer {
    type Err = FerrumReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(BuiltinReducer::Sum),
            "count" => Ok(BuiltinReducer::Count),
            "concat" => Ok(BuiltinReducer::Concat),
            other => Err(FerrumReduceError::ConfigError(format!(
                "unknown reducer: {}",
                other
            ))),
        }
    }
}
