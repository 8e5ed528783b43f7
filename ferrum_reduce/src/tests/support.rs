use crate::api::record::KeyValue;
use crate::core::codec::{RecordDecoder, RecordEncoder};
use crate::core::naming::{IntermediateNaming, MrTmpNaming};
use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Scratch directory removed when dropped.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("ferrum_reduce_{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        TestDir { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn write_intermediate(
    naming: &MrTmpNaming,
    job: &str,
    map_index: usize,
    partition: usize,
    records: &[(&str, &str)],
) {
    let file = File::create(naming.intermediate_path(job, map_index, partition)).unwrap();
    let mut encoder = RecordEncoder::new(file);
    for (key, value) in records {
        encoder.encode(&KeyValue::new(*key, *value)).unwrap();
    }
    encoder.flush().unwrap();
}

pub fn write_raw_intermediate(
    naming: &MrTmpNaming,
    job: &str,
    map_index: usize,
    partition: usize,
    bytes: &[u8],
) {
    fs::write(naming.intermediate_path(job, map_index, partition), bytes).unwrap();
}

pub fn read_output(path: &Path) -> Vec<KeyValue> {
    let file = File::open(path).unwrap();
    RecordDecoder::new(BufReader::new(file))
        .map(|record| record.unwrap())
        .collect()
}

/// Accepts `ok_writes` write calls, then fails every later one with `kind`.
pub struct FailAfterWrites {
    ok_writes: usize,
    kind: ErrorKind,
}

impl FailAfterWrites {
    pub fn new(ok_writes: usize, kind: ErrorKind) -> Self {
        FailAfterWrites {
            ok_writes,
            kind,
        }
    }
}

impl Write for FailAfterWrites {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.ok_writes == 0 {
            return Err(io::Error::new(self.kind, "sink refused write"));
        }
        self.ok_writes -= 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Yields `prefix`, then fails every read.
pub struct FailingTail {
    prefix: io::Cursor<Vec<u8>>,
}

impl FailingTail {
    pub fn new(prefix: &[u8]) -> Self {
        FailingTail {
            prefix: io::Cursor::new(prefix.to_vec()),
        }
    }
}

impl Read for FailingTail {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.prefix.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(ErrorKind::Other, "device went away"));
        }
        Ok(n)
    }
}
