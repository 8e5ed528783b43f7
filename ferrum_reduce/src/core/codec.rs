//! JSON Lines codec for key/value records.
//!
//! Every record is a single JSON object followed by a newline. A stream has
//! no header or record count; it ends where the underlying reader ends.
//!
//! The decoder also accepts several objects concatenated on one line. A value
//! pretty-printed across several lines is not supported: each of its lines is
//! reported as malformed.

use crate::api::record::KeyValue;
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, ErrorKind, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// One record could not be decoded. The stream is still usable.
    Malformed { line: usize, reason: String },
    /// The reader failed. The decoder yields nothing after this.
    Io { line: usize, reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { line, reason } => write!(f, "line {}: {}", line, reason),
            DecodeError::Io { line, reason } => write!(f, "read failed at line {}: {}", line, reason),
        }
    }
}

/// Lazy decoder over a record stream.
pub struct RecordDecoder<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    queued: VecDeque<Result<KeyValue, DecodeError>>,
    done: bool,
}

impl<R: BufRead> RecordDecoder<R> {
    pub fn new(reader: R) -> Self {
        RecordDecoder {
            reader,
            buf: Vec::new(),
            line: 0,
            queued: VecDeque::new(),
            done: false,
        }
    }

    // Decodes every value on the current line. Decoding stops at the first
    // bad value; the rest of the line is one malformed record.
    fn queue_line(&mut self) {
        let record = trim_ascii(&self.buf);
        if record.is_empty() {
            return;
        }
        let line = self.line;
        for value in serde_json::Deserializer::from_slice(record).into_iter::<KeyValue>() {
            match value {
                Ok(kv) => self.queued.push_back(Ok(kv)),
                Err(err) => {
                    self.queued.push_back(Err(DecodeError::Malformed {
                        line,
                        reason: err.to_string(),
                    }));
                    break;
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordDecoder<R> {
    type Item = Result<KeyValue, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Some(item);
            }
            if self.done {
                return None;
            }
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    self.queue_line();
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(DecodeError::Io {
                        line: self.line + 1,
                        reason: err.to_string(),
                    }));
                }
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for RecordDecoder<R> {}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[derive(Debug)]
pub enum EncodeError {
    /// The record could not be serialized; nothing was written.
    Serialize(String),
    /// The sink refused the write. No later write is expected to succeed.
    SinkClosed(io::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Serialize(reason) => write!(f, "serialize failed: {}", reason),
            EncodeError::SinkClosed(err) if is_end_of_stream(err) => {
                write!(f, "sink closed: {}", err)
            }
            EncodeError::SinkClosed(err) => write!(f, "sink write failed: {}", err),
        }
    }
}

fn is_end_of_stream(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::WriteZero | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
    )
}

pub const DEFAULT_BATCH_BYTES: usize = 64 * 1024;

/// Batching encoder. Records are buffered until `batch_bytes` is reached and
/// only count as written once their batch reached the sink. Call
/// [`RecordEncoder::flush`] before dropping; nothing is flushed on drop.
pub struct RecordEncoder<W: Write> {
    sink: W,
    pending: Vec<u8>,
    pending_records: u64,
    batch_bytes: usize,
    written: u64,
    dropped: u64,
}

impl<W: Write> RecordEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_batch_bytes(sink, DEFAULT_BATCH_BYTES)
    }

    /// A `batch_bytes` of 0 writes every record as soon as it is encoded.
    pub fn with_batch_bytes(sink: W, batch_bytes: usize) -> Self {
        RecordEncoder {
            sink,
            pending: Vec::with_capacity(batch_bytes),
            pending_records: 0,
            batch_bytes,
            written: 0,
            dropped: 0,
        }
    }

    pub fn encode(&mut self, record: &KeyValue) -> Result<(), EncodeError> {
        let line =
            serde_json::to_vec(record).map_err(|err| EncodeError::Serialize(err.to_string()))?;
        self.pending.extend_from_slice(&line);
        self.pending.push(b'\n');
        self.pending_records += 1;
        if self.pending.len() >= self.batch_bytes {
            self.write_pending()?;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<(), EncodeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self.sink.write_all(&self.pending);
        match result {
            Ok(()) => self.written += self.pending_records,
            Err(_) => self.dropped += self.pending_records,
        }
        self.pending.clear();
        self.pending_records = 0;
        result.map_err(EncodeError::SinkClosed)
    }

    /// Writes any buffered records and flushes the sink.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.write_pending()?;
        self.sink.flush().map_err(EncodeError::SinkClosed)
    }

    /// Records that reached the sink.
    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Records lost because the sink refused their batch.
    pub fn records_dropped(&self) -> u64 {
        self.dropped
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
