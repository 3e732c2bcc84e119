//! Command implementations and the state they share.

use chrono::{DateTime, Utc};
use rollcall_canonical::{EventId, UserId, ValidationError};
use rollcall_core::{Ledger, Settings, SettingsError};
use rollcall_store::{EventDesk, JournalAudit, JsonDirStore, WriteOptions};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod audit;
pub mod checkin;
pub mod claim;
pub mod credential;
pub mod draw;
pub mod event;
pub mod export;
pub mod prize;

/// Default audit journal file name inside the store directory.
pub const JOURNAL_FILE: &str = "audit.rcj";

/// Errors raised by the CLI itself, before a desk operation runs.
#[derive(Error, Debug)]
pub enum CliError {
    /// An argument failed validation.
    #[error("invalid {field}: {source}")]
    Argument {
        /// Argument name.
        field: &'static str,
        /// Validation failure.
        source: ValidationError,
    },
    /// Settings file could not be loaded.
    #[error("failed to load settings from {path}: {source}")]
    Settings {
        /// Settings path.
        path: PathBuf,
        /// Underlying error.
        source: SettingsError,
    },
    /// No journal has been written yet.
    #[error("no audit journal at {0}")]
    NoJournal(PathBuf),
}

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub type Desk = EventDesk<JsonDirStore, JournalAudit>;

/// Global options resolved once per invocation.
pub struct Context {
    store: PathBuf,
    journal: PathBuf,
    config: Option<PathBuf>,
    at: Option<DateTime<Utc>>,
}

impl Context {
    pub fn new(
        store: PathBuf,
        journal: Option<PathBuf>,
        config: Option<PathBuf>,
        at: Option<DateTime<Utc>>,
    ) -> Self {
        let journal = journal.unwrap_or_else(|| store.join(JOURNAL_FILE));
        Self {
            store,
            journal,
            config,
            at,
        }
    }

    /// `--at` if given, otherwise the wall clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }

    pub fn journal(&self) -> &Path {
        &self.journal
    }

    pub fn settings(&self) -> Result<Settings, CliError> {
        match &self.config {
            Some(path) => Settings::from_json_file(path).map_err(|source| CliError::Settings {
                path: path.clone(),
                source,
            }),
            None => Ok(Settings::default()),
        }
    }

    /// Opens the store and journal and builds a desk over them.
    pub fn desk(&self) -> Result<Desk, Box<dyn std::error::Error>> {
        let settings = self.settings()?;
        let store = JsonDirStore::open(&self.store)?;
        if let Some(parent) = self.journal.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = WriteOptions {
            canonicalizer: settings.canonicalizer(),
            ..WriteOptions::default()
        };
        let audit = JournalAudit::open(&self.journal, options)?;
        Ok(EventDesk::new(store, audit, &settings))
    }
}

pub fn event_id(raw: &str) -> Result<EventId, CliError> {
    EventId::parse(raw).map_err(|source| CliError::Argument {
        field: "event id",
        source,
    })
}

pub fn user_id(raw: &str) -> Result<UserId, CliError> {
    UserId::parse(raw).map_err(|source| CliError::Argument {
        field: "user id",
        source,
    })
}

/// Prints credits the host's wallet service should apply.
pub struct ConsoleLedger;

impl Ledger for ConsoleLedger {
    type Error = Infallible;

    fn credit(&mut self, user_id: &UserId, amount: u64) -> Result<(), Infallible> {
        println!("credit {} {}", user_id, amount);
        Ok(())
    }
}
