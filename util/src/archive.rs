//! CSV archives of per-cycle telemetry
//!
//! A module which archives owns an optional `Archiver`, created during
//! `init` under the session's `arch/` directory, and writes one record per
//! cycle. Each record is flushed straight away so a fail-safe exit loses at
//! most the cycle in progress.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{self, File};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
///
/// Records must be flat structs (scalar fields only), which is what the CSV
/// header writer supports.
#[derive(Debug)]
pub struct Archiver {
    writer: Writer<File>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot serialise the record: {0}")]
    CsvError(csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create an archiver at `path` inside the session's archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        Self::from_abs_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given absolute path.
    pub fn from_abs_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }

        // Truncates any archive left by an earlier run at the same path
        let file = File::create(path.as_ref()).map_err(ArchiveError::FileError)?;

        Ok(Self {
            writer: WriterBuilder::new().has_headers(true).from_writer(file)
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        self.writer.serialize(record).map_err(ArchiveError::CsvError)?;
        self.writer.flush().map_err(ArchiveError::FileError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        time_ms: u64,
        roll: i32,
        armed: bool,
    }

    #[test]
    fn test_archiver_writes_header_once() {
        let path = std::env::temp_dir()
            .join(format!("fc_archive_test_{}", std::process::id()))
            .join("sample.csv");

        let mut arch = Archiver::from_abs_path(&path).unwrap();
        arch.serialise(Sample { time_ms: 0, roll: -12, armed: false }).unwrap();
        arch.serialise(Sample { time_ms: 5, roll: 40, armed: true }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["time_ms,roll,armed", "0,-12,false", "5,40,true"]);

        std::fs::remove_file(&path).ok();
    }
}
