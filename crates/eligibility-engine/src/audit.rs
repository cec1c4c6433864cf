//! Append-only record of every decision the engine produces.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::scoring::{ConfidenceVector, DecisionLabel};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Checksum of a value's canonical JSON form (object keys sorted).
pub fn input_checksum<T: Serialize>(value: &T) -> Result<String, AuditError> {
    let canonical = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec(&canonical)?;
    Ok(sha256_hex(&bytes))
}

/// One line of the decision audit trail.
///
/// Holds a checksum of the request rather than the request itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub ruleset_id: String,
    pub input_checksum: String,
    pub decision_label: DecisionLabel,
    pub eligibility_score: i32,
    pub confidence: ConfidenceVector,
    pub passed_rule_ids: Vec<String>,
    pub failed_rule_ids: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to serialise audit record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write audit record to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for decision records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &DecisionRecord) -> Result<(), AuditError>;
}

/// Appends one JSON object per line to a file, creating parent directories
/// on first write.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, record: &DecisionRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error(err))?;
        file.write_all(&line).map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: &DecisionRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
