//! Analysis journal: a bounded record of per-request outcomes.
//!
//! Entries carry metadata only (provider, outcome, timing, transcript length).
//! Transcript and answer text are never recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    /// `"success"` or an error kind such as `"provider_http"`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub latency_ms: u64,
    pub transcript_chars: usize,
}

impl JournalEntry {
    pub fn new(id: Uuid, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            provider: provider.into(),
            model: model.into(),
            outcome: String::new(),
            http_status: None,
            latency_ms: 0,
            transcript_chars: 0,
        }
    }
}

/// Ring buffer of entries, optionally mirrored to a JSONL file.
pub struct Journal {
    entries: VecDeque<JournalEntry>,
    capacity: usize,
    writer: Option<BufWriter<File>>,
}

impl Journal {
    #[must_use]
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            writer: None,
        }
    }

    /// Open (or create) a JSONL journal, replaying its tail into memory.
    pub fn with_file(capacity: usize, file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file_path = file_path.as_ref();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut journal = Self::in_memory(capacity);

        if file_path.exists() {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines().map_while(std::result::Result::ok) {
                if let Ok(entry) = serde_json::from_str::<JournalEntry>(&line) {
                    journal.push(entry);
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        journal.writer = Some(BufWriter::new(file));

        Ok(journal)
    }

    pub fn record(&mut self, entry: JournalEntry) {
        if let Some(ref mut writer) = self.writer {
            if let Ok(json) = serde_json::to_string(&entry) {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
        self.push(entry);
    }

    fn push(&mut self, entry: JournalEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent entries, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<JournalEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct SharedJournal(Arc<Mutex<Journal>>);

impl SharedJournal {
    #[must_use]
    pub fn new(journal: Journal) -> Self {
        Self(Arc::new(Mutex::new(journal)))
    }

    #[must_use]
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Journal::in_memory(capacity))
    }

    pub fn record(&self, entry: JournalEntry) {
        if let Ok(mut journal) = self.0.lock() {
            journal.record(entry);
        }
    }

    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<JournalEntry> {
        self.0.lock().map(|j| j.recent(limit)).unwrap_or_default()
    }
}
