use crate::core::codec::{DecodeError, RecordDecoder};
use crate::core::grouper::GroupedTable;
use crate::core::naming::IntermediateNaming;
use crate::framework::errors::{FerrumReduceError, Result};
use crate::framework::options::Strictness;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    pub files_read: usize,
    pub files_missing: usize,
    pub records: u64,
    pub malformed: u64,
    pub read_errors: u64,
}

/// Reads the intermediate files of one reduce partition into a [`GroupedTable`].
pub struct Collector<'a> {
    job_name: &'a str,
    partition: usize,
    num_mappers: usize,
    naming: &'a dyn IntermediateNaming,
    strictness: Strictness,
}

impl<'a> Collector<'a> {
    pub fn new(
        job_name: &'a str,
        partition: usize,
        num_mappers: usize,
        naming: &'a dyn IntermediateNaming,
        strictness: Strictness,
    ) -> Self {
        Collector {
            job_name,
            partition,
            num_mappers,
            naming,
            strictness,
        }
    }

    /// Files are visited in map index order, so values for a key end up in
    /// map index order and then in file order.
    pub fn collect(&self) -> Result<(GroupedTable, CollectStats)> {
        let mut table = GroupedTable::new();
        let mut stats = CollectStats::default();

        for map_index in 0..self.num_mappers {
            let path = self
                .naming
                .intermediate_path(self.job_name, map_index, self.partition);

            let file = match File::open(&path) {
                Ok(file) => file,
                Err(err) => {
                    stats.files_missing += 1;
                    if self.strictness.is_strict() {
                        return Err(FerrumReduceError::MissingIntermediate(format!(
                            "{}: {}",
                            path.display(),
                            err
                        )));
                    }
                    warn!(map_index, path = %path.display(), "skipping intermediate file: {}", err);
                    continue;
                }
            };

            // the handle drops when read_records returns, on every path
            self.read_records(BufReader::new(file), &path, &mut table, &mut stats)?;
            stats.files_read += 1;
        }

        Ok((table, stats))
    }

    fn read_records<R: BufRead>(
        &self,
        reader: R,
        path: &Path,
        table: &mut GroupedTable,
        stats: &mut CollectStats,
    ) -> Result<()> {
        let mut records = 0u64;
        for decoded in RecordDecoder::new(reader) {
            match decoded {
                Ok(kv) => {
                    table.insert(kv);
                    records += 1;
                }
                Err(err @ DecodeError::Malformed { .. }) => {
                    stats.malformed += 1;
                    if self.strictness.is_strict() {
                        return Err(FerrumReduceError::MalformedRecord(format!(
                            "{}: {}",
                            path.display(),
                            err
                        )));
                    }
                    warn!(path = %path.display(), "dropping malformed record: {}", err);
                }
                Err(err @ DecodeError::Io { .. }) => {
                    stats.read_errors += 1;
                    if self.strictness.is_strict() {
                        return Err(FerrumReduceError::ReadError(format!(
                            "{}: {}",
                            path.display(),
                            err
                        )));
                    }
                    error!(path = %path.display(), "abandoning rest of intermediate file: {}", err);
                }
            }
        }
        stats.records += records;
        debug!(path = %path.display(), records, "intermediate file read");
        Ok(())
    }
}
