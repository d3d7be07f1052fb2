//! Journal: durable, append-only history of the book.
//!
//! Every accepted order and every match step is one record. A match step
//! touches the ledger and two orders, and writing it as a single framed
//! record is what makes the step all-or-nothing: a frame that did not reach
//! disk completely fails its checksum and is dropped on replay.
//!
//! # Frame format (file journal)
//! ```text
//! [payload_len: u32 LE]
//! [checksum:    u32 LE]  // CRC32C over payload
//! [payload:     serde_json bytes of JournalRecord]
//! ```

use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::types::{Fill, Order};

const HEADER_LEN: usize = 8;
// anything larger is treated as a corrupt length prefix
const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Journal unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalRecord {
    OrderAccepted(Order),
    Fill(Fill),
}

/// Persistence handle owned by the matching engine.
pub trait Journal {
    /// Durably appends one record. On error nothing of the record is kept.
    fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError>;

    /// Every intact record, oldest first.
    fn replay(&mut self) -> Result<Vec<JournalRecord>, JournalError>;
}

impl<J: Journal + ?Sized> Journal for Box<J> {
    fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        (**self).append(record)
    }

    fn replay(&mut self) -> Result<Vec<JournalRecord>, JournalError> {
        (**self).replay()
    }
}

/// Keeps records in memory. Used for tests and for running without a file.
#[derive(Default)]
pub struct MemoryJournal {
    records: Vec<JournalRecord>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[JournalRecord] {
        &self.records
    }
}

impl Journal for MemoryJournal {
    fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn replay(&mut self) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(self.records.clone())
    }
}

/// Append-only journal file, synced after every record.
pub struct FileJournal {
    path: PathBuf,
    file: File,
    /// Length of the file up to the last complete frame.
    len: u64,
    /// Set when a partial frame could not be cut off; the file is not
    /// appended to again because replay would stop at that frame.
    poisoned: bool,
}

impl FileJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            len,
            poisoned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(record: &JournalRecord) -> Result<Vec<u8>, JournalError> {
        let payload = serde_json::to_vec(record)?;
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc32c(&payload).to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decodes frames from the start of `data`.
    ///
    /// Returns the intact records and the byte length they cover; decoding
    /// stops at the first incomplete or damaged frame.
    fn decode(data: &[u8]) -> (Vec<JournalRecord>, usize) {
        let mut records = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let rest = &data[pos..];
            if rest.len() < HEADER_LEN {
                warn!(offset = pos, "journal ends inside a frame header");
                break;
            }

            let payload_len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
            let checksum = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
            if payload_len > MAX_PAYLOAD_LEN {
                warn!(offset = pos, payload_len, "implausible frame length");
                break;
            }
            if rest.len() < HEADER_LEN + payload_len {
                warn!(offset = pos, "journal ends inside a frame payload");
                break;
            }

            let payload = &rest[HEADER_LEN..HEADER_LEN + payload_len];
            if crc32c(payload) != checksum {
                warn!(offset = pos, "frame checksum mismatch");
                break;
            }
            match serde_json::from_slice::<JournalRecord>(payload) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(offset = pos, error = %e, "undecodable frame payload");
                    break;
                }
            }
            pos += HEADER_LEN + payload_len;
        }

        (records, pos)
    }
}

impl Journal for FileJournal {
    fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        if self.poisoned {
            return Err(JournalError::Unavailable(format!(
                "{} holds a partial frame that could not be rolled back",
                self.path.display()
            )));
        }
        let frame = Self::encode(record)?;

        let written = self
            .file
            .write_all(&frame)
            .and_then(|_| self.file.sync_data());
        if let Err(e) = written {
            // drop whatever part of the frame made it out
            if let Err(trunc) = self.file.set_len(self.len) {
                error!(
                    path = %self.path.display(),
                    error = %trunc,
                    "could not roll back partial journal frame, refusing further appends"
                );
                self.poisoned = true;
            }
            return Err(e.into());
        }

        self.len += frame.len() as u64;
        Ok(())
    }

    fn replay(&mut self) -> Result<Vec<JournalRecord>, JournalError> {
        let mut data = Vec::new();
        File::open(&self.path)?.read_to_end(&mut data)?;

        let (records, valid) = Self::decode(&data);
        if valid < data.len() {
            warn!(
                path = %self.path.display(),
                discarded = data.len() - valid,
                "truncating damaged journal tail"
            );
            self.file.set_len(valid as u64)?;
            self.file.sync_data()?;
        }
        self.len = valid as u64;

        debug!(records = records.len(), "journal replayed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, Side};

    fn accepted(id: u64, side: Side, px: &str, qty: u64) -> JournalRecord {
        JournalRecord::OrderAccepted(Order {
            id: OrderId(id),
            side,
            price: px.parse().unwrap(),
            remaining_qty: qty,
            created_at: id,
        })
    }

    fn fill(buy: u64, sell: u64, px: &str, qty: u64) -> JournalRecord {
        JournalRecord::Fill(Fill {
            buy: OrderId(buy),
            sell: OrderId(sell),
            price: px.parse().unwrap(),
            qty,
        })
    }

    #[test]
    fn memory_journal_replays_in_order() {
        let mut journal = MemoryJournal::new();
        journal.append(&accepted(1, Side::Sell, "10", 5)).unwrap();
        journal.append(&fill(2, 1, "10", 5)).unwrap();
        let records = journal.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], fill(2, 1, "10", 5));
    }

    #[test]
    fn file_journal_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.journal");

        {
            let mut journal = FileJournal::open(&path).unwrap();
            journal.append(&accepted(1, Side::Sell, "99.50", 5)).unwrap();
            journal.append(&accepted(2, Side::Buy, "100", 5)).unwrap();
            journal.append(&fill(2, 1, "99.50", 5)).unwrap();
        }

        let mut journal = FileJournal::open(&path).unwrap();
        let records = journal.replay().unwrap();
        assert_eq!(
            records,
            vec![
                accepted(1, Side::Sell, "99.50", 5),
                accepted(2, Side::Buy, "100", 5),
                fill(2, 1, "99.50", 5),
            ]
        );
    }

    #[test]
    fn torn_tail_is_truncated_and_appends_continue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.journal");

        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&accepted(1, Side::Sell, "10", 5)).unwrap();
        let good_len = fs::metadata(&path).unwrap().len();

        // half a frame, as if the process died mid-write
        let frame = FileJournal::encode(&fill(2, 1, "10", 5)).unwrap();
        {
            let mut raw = OpenOptions::new().append(true).open(&path).unwrap();
            raw.write_all(&frame[..frame.len() / 2]).unwrap();
        }

        let mut journal = FileJournal::open(&path).unwrap();
        let records = journal.replay().unwrap();
        assert_eq!(records, vec![accepted(1, Side::Sell, "10", 5)]);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);

        journal.append(&accepted(2, Side::Buy, "11", 1)).unwrap();
        let records = FileJournal::open(&path).unwrap().replay().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn checksum_mismatch_stops_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.journal");

        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&accepted(1, Side::Sell, "10", 5)).unwrap();
        journal.append(&accepted(2, Side::Sell, "11", 5)).unwrap();

        // flip one payload byte of the second frame
        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 2;
        data[last] ^= 0xFF;
        fs::write(&path, &data).unwrap();

        let records = FileJournal::open(&path).unwrap().replay().unwrap();
        assert_eq!(records, vec![accepted(1, Side::Sell, "10", 5)]);
    }

    #[test]
    fn decode_rejects_huge_length_prefix() {
        let mut data = Vec::new();
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let (records, valid) = FileJournal::decode(&data);
        assert!(records.is_empty());
        assert_eq!(valid, 0);
    }

    // /dev/full fails every write with ENOSPC and cannot be truncated, so the
    // partial frame can never be cut off.
    #[cfg(target_os = "linux")]
    #[test]
    fn unrecoverable_append_failure_refuses_later_appends() {
        let path = Path::new("/dev/full");
        if !path.exists() {
            return;
        }
        let mut journal = FileJournal::open(path).unwrap();

        let first = journal.append(&accepted(1, Side::Sell, "10", 5));
        assert!(matches!(first, Err(JournalError::Io(_))));

        let second = journal.append(&accepted(2, Side::Buy, "10", 5));
        assert!(matches!(second, Err(JournalError::Unavailable(_))));
    }
}
