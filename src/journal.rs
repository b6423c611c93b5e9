//! Append-only durable journal.
//!
//! This is the only state that survives a crash. Every append is
//! flushed and fsync'd before returning, so an acknowledged write is
//! never lost and already-written lines are never touched again. A
//! torn trailing line from a crashed write is skipped by the lenient
//! readers.

use crate::error::Result;
use crate::record::{self, LogRecord, Status};

use rustc_hash::FxHashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append handle over the journal file.
pub struct Journal {
    path: PathBuf,
    file: BufWriter<File>,
}

impl Journal {
    /// Open or create the journal for appending, creating parent
    /// directories if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: BufWriter::new(file),
        })
    }

    /// Append one record and fsync before returning.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.file.write_all(record.to_line().as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.file.get_ref().sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// State rebuilt from the journal on startup.
#[derive(Debug, Default)]
pub struct Replay {
    /// Every sequence number durably written by prior runs.
    pub seen: FxHashSet<u64>,
    /// Highest sequence ever written, `None` for an empty journal.
    pub last_written: Option<u64>,
    /// Malformed lines skipped during the replay.
    pub skipped_lines: u64,
}

/// Replay the journal, collecting every written sequence number.
///
/// Malformed lines are skipped individually. An unreadable file
/// degrades to an empty replay rather than an error: the receiver
/// stays available at the cost of possibly re-logging sequences the
/// unreadable journal already had.
pub fn replay(path: &Path) -> Replay {
    let mut out = Replay::default();

    if !path.exists() {
        return out;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "journal unreadable, starting empty");
            return Replay::default();
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "journal read failed, starting empty");
                return Replay::default();
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match record::parse_sequence(line) {
            Some(seq) => {
                out.seen.insert(seq);
                out.last_written = Some(out.last_written.map_or(seq, |m| m.max(seq)));
            }
            None => out.skipped_lines += 1,
        }
    }

    out
}

/// Read every well-formed record, skipping malformed lines.
pub fn read_records(path: &Path) -> Result<Vec<LogRecord>> {
    let file = File::open(path)?;
    let mut out = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some(record) = LogRecord::parse_line(line.trim()) {
            out.push(record);
        }
    }

    Ok(out)
}

/// Aggregate view of a journal, as the restart harness inspects it
/// between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Coverage {
    /// Well-formed records (not deduplicated).
    pub records: u64,
    pub unique_sequences: u64,
    pub ok: u64,
    pub late: u64,
    pub retransmit: u64,
    /// Sequences in `[0, max_logged]` absent from the journal.
    pub gaps: u64,
    pub malformed_lines: u64,
}

/// Compute coverage and the status breakdown for a journal file.
pub fn coverage(path: &Path) -> Result<Coverage> {
    let file = File::open(path)?;
    let mut cov = Coverage::default();
    let mut sequences = FxHashSet::default();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match LogRecord::parse_line(line) {
            Some(record) => {
                cov.records += 1;
                match record.status {
                    Status::Ok => cov.ok += 1,
                    Status::Late => cov.late += 1,
                    Status::Retransmit => cov.retransmit += 1,
                }
                sequences.insert(record.sequence);
            }
            None => cov.malformed_lines += 1,
        }
    }

    cov.unique_sequences = sequences.len() as u64;
    if let Some(&max) = sequences.iter().max() {
        cov.gaps = (0..=max).filter(|s| !sequences.contains(s)).count() as u64;
    }

    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(sequence: u64, status: Status) -> LogRecord {
        LogRecord {
            sequence,
            timestamp: format!("t{sequence}"),
            payload: vec![sequence as u8],
            status,
        }
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/events.log");

        let mut journal = Journal::open(&path).unwrap();
        journal.append(&record(0, Status::Ok)).unwrap();

        assert!(path.exists());
        assert_eq!(journal.path(), path);
    }

    #[test]
    fn test_replay_rebuilds_seen_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut journal = Journal::open(&path).unwrap();
        for seq in [3u64, 0, 7] {
            journal.append(&record(seq, Status::Ok)).unwrap();
        }
        drop(journal);

        let replay = replay(&path);
        assert_eq!(replay.last_written, Some(7));
        assert_eq!(replay.seen.len(), 3);
        assert!(replay.seen.contains(&0));
        assert!(replay.seen.contains(&3));
        assert!(replay.seen.contains(&7));
        assert_eq!(replay.skipped_lines, 0);
    }

    #[test]
    fn test_replay_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let replay = replay(&dir.path().join("absent.log"));
        assert!(replay.seen.is_empty());
        assert_eq!(replay.last_written, None);
    }

    #[test]
    fn test_replay_skips_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        fs::write(
            &path,
            "0,t0,00,OK\ngarbage\nx,t,00,OK\n5,t5,zz,WEIRD\n7,t7,0", // torn last line
        )
        .unwrap();

        let replay = replay(&path);
        // 5 counts despite the bad hex and unknown status; the torn
        // three-field line and the garbage lines do not.
        assert_eq!(replay.last_written, Some(5));
        assert!(replay.seen.contains(&0));
        assert!(replay.seen.contains(&5));
        assert_eq!(replay.seen.len(), 2);
        assert_eq!(replay.skipped_lines, 3);
    }

    #[test]
    fn test_replay_unreadable_degrades_to_empty() {
        // A directory at the journal path makes reads fail with EISDIR.
        let dir = tempdir().unwrap();
        let replay = replay(dir.path());
        assert!(replay.seen.is_empty());
        assert_eq!(replay.last_written, None);
    }

    #[test]
    fn test_coverage_counts_statuses_and_gaps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut journal = Journal::open(&path).unwrap();
        journal.append(&record(0, Status::Ok)).unwrap();
        journal.append(&record(2, Status::Ok)).unwrap();
        journal.append(&record(1, Status::Late)).unwrap();
        journal.append(&record(5, Status::Retransmit)).unwrap();
        drop(journal);
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not a record\n")
            .unwrap();

        let cov = coverage(&path).unwrap();
        assert_eq!(cov.records, 4);
        assert_eq!(cov.unique_sequences, 4);
        assert_eq!(cov.ok, 2);
        assert_eq!(cov.late, 1);
        assert_eq!(cov.retransmit, 1);
        assert_eq!(cov.gaps, 2); // 3 and 4
        assert_eq!(cov.malformed_lines, 1);
    }

    #[test]
    fn test_read_records_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut journal = Journal::open(&path).unwrap();
        journal.append(&record(1, Status::Ok)).unwrap();
        journal.append(&record(0, Status::Late)).unwrap();
        drop(journal);

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, 1);
        assert_eq!(records[1].sequence, 0);
        assert_eq!(records[1].status, Status::Late);
    }
}
