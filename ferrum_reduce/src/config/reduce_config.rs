use crate::api::reduce::BuiltinReducer;
use crate::core::naming::MrTmpNaming;
use crate::framework::errors::FerrumReduceError;
use crate::framework::options::{ReduceOptions, Strictness};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReduceConfig {
    #[serde(rename = "job.name")]
    pub job_name: String,

    #[serde(rename = "intermediate.dir")]
    pub intermediate_dir: String,

    /// Where outputs go when no explicit path is given; defaults to the
    /// intermediate directory.
    #[serde(rename = "output.dir", default)]
    pub output_dir: Option<String>,

    #[serde(rename = "num.mappers")]
    pub num_mappers: usize,

    #[serde(rename = "strict.mode", default)]
    pub strict_mode: String,

    #[serde(rename = "reducer", default = "default_reducer")]
    pub reducer: String,
}

fn default_reducer() -> String {
    "sum".to_string()
}

impl ReduceConfig {
    pub fn from_xml_file(file_path: &str) -> Result<Self, FerrumReduceError> {
        let xml_str = std::fs::read_to_string(file_path).map_err(|err| {
            FerrumReduceError::ConfigError(format!("Xml config error: {}: {}", file_path, err))
        })?;
        Self::from_xml_str(&xml_str)
    }

    pub fn from_xml_str(xml_str: &str) -> Result<Self, FerrumReduceError> {
        let config: ReduceConfig = serde_xml_rs::from_str(xml_str)?;
        // surface bad values at load time rather than at task start
        config.strictness()?;
        config.builtin_reducer()?;
        Ok(config)
    }

    pub fn strictness(&self) -> Result<Strictness, FerrumReduceError> {
        self.strict_mode.parse()
    }

    pub fn builtin_reducer(&self) -> Result<BuiltinReducer, FerrumReduceError> {
        self.reducer.parse()
    }

    pub fn options(&self) -> Result<ReduceOptions, FerrumReduceError> {
        Ok(ReduceOptions {
            strictness: self.strictness()?,
        })
    }

    pub fn naming(&self) -> MrTmpNaming {
        MrTmpNaming::new(&self.intermediate_dir)
    }

    pub fn output_path(&self, partition: usize) -> PathBuf {
        let dir = self
            .output_dir
            .as_deref()
            .unwrap_or(self.intermediate_dir.as_str());
        MrTmpNaming::new(dir).merge_path(&self.job_name, partition)
    }
}
