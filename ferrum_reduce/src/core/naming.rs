use std::path::{Path, PathBuf};

/// Locates intermediate files produced by the map phase.
pub trait IntermediateNaming {
    fn intermediate_path(&self, job_name: &str, map_index: usize, partition: usize) -> PathBuf;
}

/// `mrtmp.<job>-<map>-<partition>` files inside a single directory.
#[derive(Debug, Clone)]
pub struct MrTmpNaming {
    pub dir: PathBuf,
}

impl MrTmpNaming {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        MrTmpNaming {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Where the reduce output for a partition goes when the caller names no path.
    pub fn merge_path(&self, job_name: &str, partition: usize) -> PathBuf {
        self.dir
            .join(format!("mrtmp.{}-res-{}", job_name, partition))
    }
}

impl Default for MrTmpNaming {
    fn default() -> Self {
        MrTmpNaming::new(".")
    }
}

impl IntermediateNaming for MrTmpNaming {
    fn intermediate_path(&self, job_name: &str, map_index: usize, partition: usize) -> PathBuf {
        self.dir
            .join(format!("mrtmp.{}-{}-{}", job_name, map_index, partition))
    }
}
