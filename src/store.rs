use crate::datemath::DateKey;
use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key under which the serialized events live
pub(crate) const EVENTS_KEY: &str = "calendar-events";

/// String-valued key-value persistence
pub(crate) trait Storage {
    fn read(&self, key: &str) -> Option<String>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to serialize events")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStorage(HashMap<String, String>);

#[cfg(test)]
impl MemoryStorage {
    pub(crate) fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Keeps each key in its own file inside a directory
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub(crate) fn new<P: Into<PathBuf>>(dir: P) -> FileStorage {
        FileStorage { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "treating unreadable storage file as empty");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        write_replace(&self.dir, &tmp, &path, value).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = value.len(), "wrote storage file");
        Ok(())
    }
}

fn write_replace(dir: &Path, tmp: &Path, path: &Path, value: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(tmp, value)?;
    fs::rename(tmp, path)
}

pub(crate) type EventMap = BTreeMap<DateKey, Vec<String>>;

/// Per-day text events, reloaded from storage on every read and written back
/// on every change
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct EventStore<S> {
    storage: S,
}

impl<S: Storage> EventStore<S> {
    pub(crate) fn new(storage: S) -> EventStore<S> {
        EventStore { storage }
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Missing or corrupt data loads as an empty map and is replaced by the
    /// next write.
    pub(crate) fn load(&self) -> EventMap {
        let Some(blob) = self.storage.read(EVENTS_KEY) else {
            return EventMap::new();
        };
        match serde_json::from_str::<EventMap>(&blob) {
            Ok(mut events) => {
                events.retain(|_, entries| !entries.is_empty());
                events
            }
            Err(e) => {
                warn!(error = %e, "discarding unparseable event data");
                EventMap::new()
            }
        }
    }

    fn save(&mut self, events: &EventMap) -> Result<(), StorageError> {
        let blob = serde_json::to_string(events)?;
        self.storage.write(EVENTS_KEY, &blob)
    }

    pub(crate) fn get_events(&self, date: DateKey) -> Vec<String> {
        self.load().remove(&date).unwrap_or_default()
    }

    /// Appends `text` as given; trimming and rejecting blank text is up to
    /// the caller.
    pub(crate) fn add_event(&mut self, date: DateKey, text: &str) -> Result<(), StorageError> {
        let mut events = self.load();
        events.entry(date).or_default().push(text.to_owned());
        self.save(&events)?;
        debug!(%date, "added event");
        Ok(())
    }

    /// Does nothing if there is no event at `index` on `date`
    pub(crate) fn remove_event(&mut self, date: DateKey, index: usize) -> Result<(), StorageError> {
        let mut events = self.load();
        let Some(entries) = events.get_mut(&date) else {
            return Ok(());
        };
        if index >= entries.len() {
            return Ok(());
        }
        entries.remove(index);
        if entries.is_empty() {
            events.remove(&date);
        }
        self.save(&events)?;
        debug!(%date, index, "removed event");
        Ok(())
    }

    pub(crate) fn has_events(&self, date: DateKey) -> bool {
        self.load().get(&date).is_some_and(|entries| !entries.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn key() -> DateKey {
        DateKey::from(date!(2024 - 03 - 15))
    }

    fn persisted(store: &EventStore<MemoryStorage>) -> serde_json::Value {
        serde_json::from_str(&store.storage().read(EVENTS_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_add_then_get() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "Meeting").unwrap();
        assert_eq!(store.get_events(key()), vec!["Meeting"]);
        assert!(store.has_events(key()));
        assert_eq!(
            persisted(&store),
            serde_json::json!({"2024-03-15": ["Meeting"]})
        );
    }

    #[test]
    fn test_events_keep_insertion_order() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "first").unwrap();
        store.add_event(key(), "second").unwrap();
        store.add_event(key(), "first").unwrap();
        assert_eq!(store.get_events(key()), vec!["first", "second", "first"]);
        store.remove_event(key(), 1).unwrap();
        assert_eq!(store.get_events(key()), vec!["first", "first"]);
    }

    #[test]
    fn test_remove_last_event_drops_key() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "Meeting").unwrap();
        store.remove_event(key(), 0).unwrap();
        assert!(store.get_events(key()).is_empty());
        assert!(!store.has_events(key()));
        assert_eq!(persisted(&store), serde_json::json!({}));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "Meeting").unwrap();
        let before = store.storage().clone();
        store.remove_event(key(), 1).unwrap();
        store
            .remove_event(DateKey::from(date!(2024 - 03 - 16)), 0)
            .unwrap();
        assert_eq!(store.storage(), &before);
    }

    #[test]
    fn test_remove_from_empty_store_does_not_write() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.remove_event(key(), 0).unwrap();
        assert_eq!(store.storage().read(EVENTS_KEY), None);
    }

    #[test]
    fn test_missing_key_is_empty() {
        let store = EventStore::new(MemoryStorage::new());
        assert!(store.load().is_empty());
        assert!(store.get_events(key()).is_empty());
        assert!(!store.has_events(key()));
    }

    #[test]
    fn test_corrupt_data_self_heals() {
        let mut storage = MemoryStorage::new();
        storage.write(EVENTS_KEY, "{not json").unwrap();
        let mut store = EventStore::new(storage);
        assert!(store.load().is_empty());
        store.add_event(key(), "Dentist").unwrap();
        assert_eq!(
            persisted(&store),
            serde_json::json!({"2024-03-15": ["Dentist"]})
        );
    }

    #[test]
    fn test_empty_lists_are_dropped_on_load() {
        let mut storage = MemoryStorage::new();
        storage
            .write(EVENTS_KEY, r#"{"2024-03-15": [], "2024-03-16": ["Lunch"]}"#)
            .unwrap();
        let store = EventStore::new(storage);
        assert!(!store.has_events(key()));
        let events = store.load();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events.get(&DateKey::from(date!(2024 - 03 - 16))),
            Some(&vec![String::from("Lunch")])
        );
    }

    #[test]
    fn test_reads_see_external_writes() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "Meeting").unwrap();
        store
            .storage_mut()
            .write(EVENTS_KEY, r#"{"2024-03-15": ["Replaced"]}"#)
            .unwrap();
        assert_eq!(store.get_events(key()), vec!["Replaced"]);
    }

    #[test]
    fn test_negative_year_keeps_other_events() {
        let mut store = EventStore::new(MemoryStorage::new());
        store.add_event(key(), "Meeting").unwrap();
        let ancient = "-0005-03-01".parse::<DateKey>().unwrap();
        store.add_event(ancient, "Ancient").unwrap();
        assert_eq!(store.get_events(ancient), vec!["Ancient"]);
        store.add_event(key(), "Next").unwrap();
        assert_eq!(store.get_events(key()), vec!["Meeting", "Next"]);
        assert_eq!(
            persisted(&store),
            serde_json::json!({"-0005-03-01": ["Ancient"], "2024-03-15": ["Meeting", "Next"]})
        );
    }

    #[test]
    fn test_file_storage() {
        let tmpdir = tempfile::tempdir().unwrap();
        let dir = tmpdir.path().join("data");
        let mut store = EventStore::new(FileStorage::new(&dir));
        assert!(store.load().is_empty());
        store.add_event(key(), "Meeting").unwrap();
        let raw = fs::read_to_string(dir.join("calendar-events.json")).unwrap();
        assert_eq!(raw, r#"{"2024-03-15":["Meeting"]}"#);
        assert!(!dir.join("calendar-events.json.tmp").exists());
        let reopened = EventStore::new(FileStorage::new(&dir));
        assert_eq!(reopened.get_events(key()), vec!["Meeting"]);
    }
}
