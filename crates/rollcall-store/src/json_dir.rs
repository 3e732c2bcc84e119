//! One JSON file per event.

use crate::error::StoreError;
use crate::traits::EventStore;
use rollcall_canonical::EventId;
use rollcall_core::Event;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Stores each event as `<root>/<event-id>.json`.
///
/// Writes go to a temporary sibling file that is then renamed over the target,
/// so readers never observe a half-written event.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Opens `root`, creating it if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the event files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File an event is stored in.
    pub fn path_for(&self, id: &EventId) -> PathBuf {
        self.root.join(format!("{}.{}", id, EXTENSION))
    }

    fn write(&self, event: &Event) -> Result<(), StoreError> {
        let target = self.path_for(&event.id);
        let tmp = self.root.join(format!(".{}.{}.tmp", event.id, EXTENSION));
        let bytes = serde_json::to_vec_pretty(event)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

impl EventStore for JsonDirStore {
    fn get(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, event: &Event) -> Result<(), StoreError> {
        self.write(event)
    }

    fn insert(&self, event: &Event) -> Result<(), StoreError> {
        if self.path_for(&event.id).exists() {
            return Err(StoreError::AlreadyExists(event.id.clone()));
        }
        self.write(event)
    }

    fn list(&self) -> Result<Vec<EventId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // stray files that are not event ids are ignored
            if let Ok(id) = EventId::parse(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
