use crate::api::record::KeyValue;
use crate::api::reduce::Reducer;
use crate::core::codec::{EncodeError, RecordEncoder};
use crate::core::grouper::GroupedTable;
use crate::framework::errors::{FerrumReduceError, Result};
use crate::framework::options::Strictness;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitStats {
    pub keys_reduced: u64,
    pub records_written: u64,
    pub encode_failures: u64,
    pub terminated_early: bool,
}

/// Reduces every group of a [`GroupedTable`] and writes the results to one file.
pub struct Emitter {
    output_path: PathBuf,
    strictness: Strictness,
}

impl Emitter {
    pub fn new(output_path: impl AsRef<Path>, strictness: Strictness) -> Self {
        Emitter {
            output_path: output_path.as_ref().to_path_buf(),
            strictness,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Opens (create and truncate) the output file. Failing here is fatal and
    /// leaves no file behind.
    fn open_output(&self) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.output_path)
            .map_err(|err| {
                FerrumReduceError::OutputOpenError(format!(
                    "{}: {}",
                    self.output_path.display(),
                    err
                ))
            })
    }

    pub fn emit(&self, table: &GroupedTable, reducer: &dyn Reducer) -> Result<EmitStats> {
        let file = self.open_output()?;
        self.emit_to(RecordEncoder::new(file), table, reducer)
    }

    /// Emission loop over an already opened sink. The encoder is flushed on
    /// every path that keeps the output.
    pub(crate) fn emit_to<W: Write>(
        &self,
        mut encoder: RecordEncoder<W>,
        table: &GroupedTable,
        reducer: &dyn Reducer,
    ) -> Result<EmitStats> {
        let mut stats = EmitStats::default();
        let mut serialize_failures = 0u64;

        for (key, values) in table.iter() {
            let reduced = KeyValue::new(key, reducer.reduce(key, values));
            stats.keys_reduced += 1;

            match encoder.encode(&reduced) {
                Ok(()) => {}
                Err(EncodeError::Serialize(reason)) => {
                    serialize_failures += 1;
                    if self.strictness.is_strict() {
                        drop(encoder);
                        return self.abort(FerrumReduceError::WriteError(format!(
                            "key {}: {}",
                            key, reason
                        )));
                    }
                    warn!(key, "skipping output record: {}", reason);
                }
                Err(err @ EncodeError::SinkClosed(_)) => {
                    stats.terminated_early = true;
                    if self.strictness.is_strict() {
                        drop(encoder);
                        return self.abort(FerrumReduceError::WriteError(err.to_string()));
                    }
                    error!(key, path = %self.output_path.display(), "stopping emission: {}", err);
                    break;
                }
            }
        }

        if let Err(err) = encoder.flush() {
            stats.terminated_early = true;
            if self.strictness.is_strict() {
                drop(encoder);
                return self.abort(FerrumReduceError::WriteError(err.to_string()));
            }
            error!(path = %self.output_path.display(), "flushing output failed: {}", err);
        }

        stats.records_written = encoder.records_written();
        stats.encode_failures = serialize_failures + encoder.records_dropped();

        debug!(
            path = %self.output_path.display(),
            keys = stats.keys_reduced,
            written = stats.records_written,
            failed = stats.encode_failures,
            "output written"
        );
        Ok(stats)
    }

    // Only regular files are removed, never devices or directories.
    fn abort<T>(&self, err: FerrumReduceError) -> Result<T> {
        let is_file = fs::symlink_metadata(&self.output_path)
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if is_file {
            if let Err(remove_err) = fs::remove_file(&self.output_path) {
                warn!(
                    path = %self.output_path.display(),
                    "could not remove partial output: {}",
                    remove_err
                );
            }
        }
        Err(err)
    }
}
