// 📄 File Storage - whole store serialized as a single JSON document
//
// The document maps "<ClassName>.<id>" to the record's attributes plus a
// "__class__" discriminator. Writes replace the file in place; a crash mid
// write can leave it truncated.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::Storage;
use crate::entities::{ClassName, Record};
use crate::error::{Result, StorageError};

pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<String, Record>,
    /// Live set as of the last successful save or reload
    persisted: BTreeMap<String, Record>,
}

impl FileStorage {
    /// Storage backed by `path`. Nothing is read until [`Storage::reload`].
    pub fn open(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            objects: BTreeMap::new(),
            persisted: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if file.metadata()?.len() == 0 {
            return Ok(None);
        }

        let document: Map<String, Value> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(document))
    }
}

impl Storage for FileStorage {
    fn all(&self, class: Option<ClassName>) -> Result<BTreeMap<String, Record>> {
        let objects = match class {
            Some(class) => self
                .objects
                .iter()
                .filter(|(_, record)| record.class() == class)
                .map(|(key, record)| (key.clone(), record.clone()))
                .collect(),
            None => self.objects.clone(),
        };
        Ok(objects)
    }

    fn get(&self, class: ClassName, id: &str) -> Result<Option<Record>> {
        Ok(self.objects.get(&class.key(id)).cloned())
    }

    fn count(&self, class: ClassName) -> Result<usize> {
        Ok(self.objects.values().filter(|r| r.class() == class).count())
    }

    fn new(&mut self, record: Record) -> Result<()> {
        tracing::debug!(key = %record.key(), "registering record");
        self.objects.insert(record.key(), record);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let mut document = Map::new();
        for (key, record) in &self.objects {
            document.insert(key.clone(), Value::Object(record.to_dict()?));
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
        self.persisted = self.objects.clone();

        tracing::debug!(path = %self.path.display(), records = self.objects.len(), "store saved");
        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<bool> {
        Ok(self.objects.remove(&record.key()).is_some())
    }

    fn reload(&mut self) -> Result<()> {
        let Some(document) = self.read_document()? else {
            tracing::debug!(path = %self.path.display(), "no store file yet, starting empty");
            self.objects.clear();
            self.persisted.clear();
            return Ok(());
        };

        // the live set is replaced only once the whole document has parsed
        let mut objects = BTreeMap::new();
        for (key, value) in document {
            let Value::Object(map) = value else {
                return Err(StorageError::Corrupt {
                    key,
                    message: "expected an object".to_string(),
                });
            };

            match Record::from_dict(map) {
                Ok(record) => {
                    if record.key() != key {
                        tracing::warn!(%key, actual = %record.key(), "store key does not match record");
                    }
                    objects.insert(record.key(), record);
                }
                Err(StorageError::UnknownClass(class)) => {
                    tracing::warn!(%key, %class, "skipping record of unknown class");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(records = objects.len(), "store reloaded");
        self.persisted = objects.clone();
        self.objects = objects;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.reload()
    }

    fn discard(&mut self) -> Result<()> {
        self.objects = self.persisted.clone();
        Ok(())
    }

    fn enforces_references(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{City, Place, State, User};
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> FileStorage {
        FileStorage::open(dir.path().join("file.json"))
    }

    #[test]
    fn test_reload_without_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        storage.reload().unwrap();
        assert!(storage.all(None).unwrap().is_empty());
    }

    #[test]
    fn test_new_all_and_filter() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let state = Record::from(State::new("California"));
        let user = Record::from(User::new("a@b.c", "pwd"));
        storage.new(state.clone()).unwrap();
        storage.new(user.clone()).unwrap();

        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key(&state.key()));

        let states = storage.all(Some(ClassName::State)).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[&state.key()], state);

        assert_eq!(storage.count(ClassName::User).unwrap(), 1);
        assert_eq!(storage.count(ClassName::City).unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let mut place = Place::default();
        place.name = "Loft".to_string();
        place.latitude = Some(48.85);
        place.add_amenity("wifi");
        let place = Record::from(place);
        let state = Record::from(State::new("Oregon"));

        storage.new(place.clone()).unwrap();
        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        let mut reloaded = storage_in(&dir);
        reloaded.reload().unwrap();

        assert_eq!(reloaded.all(None).unwrap(), storage.all(None).unwrap());
        assert_eq!(reloaded.get(ClassName::Place, place.id()).unwrap(), Some(place));
    }

    #[test]
    fn test_document_format() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let state = Record::from(State::new("Utah"));
        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        let entry = &doc[state.key()];

        assert_eq!(entry["__class__"], "State");
        assert_eq!(entry["name"], "Utah");
        assert_eq!(entry["id"], state.id());
        // %Y-%m-%dT%H:%M:%S.ffffff
        assert_eq!(entry["created_at"].as_str().unwrap().len(), 26);
    }

    #[test]
    fn test_delete_requires_save_to_be_durable() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let state = Record::from(State::new("Ohio"));
        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        assert!(storage.delete(&state).unwrap());
        assert!(!storage.delete(&state).unwrap());
        assert!(storage.get(ClassName::State, state.id()).unwrap().is_none());

        // close discards the unsaved delete
        storage.close().unwrap();
        assert!(storage.get(ClassName::State, state.id()).unwrap().is_some());

        storage.delete(&state).unwrap();
        storage.save().unwrap();
        storage.reload().unwrap();
        assert!(storage.all(None).unwrap().is_empty());
    }

    #[test]
    fn test_accepts_dangling_references() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        assert!(!storage.enforces_references());
        let city = Record::from(City::new("SF", "no-such-state"));
        storage.new(city.clone()).unwrap();
        assert!(storage.get(ClassName::City, city.id()).unwrap().is_some());
    }

    #[test]
    fn test_reload_skips_unknown_classes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        std::fs::write(
            &path,
            r#"{"BaseModel.1": {"__class__": "BaseModel", "id": "1"},
                "State.2": {"__class__": "State", "id": "2", "name": "Iowa",
                            "created_at": "2020-01-01T00:00:00.000000",
                            "updated_at": "2020-01-01T00:00:00.000000"}}"#,
        )
        .unwrap();

        let mut storage = FileStorage::open(&path);
        storage.reload().unwrap();

        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("State.2"));
    }

    #[test]
    fn test_reload_rejects_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut storage = FileStorage::open(&path);
        assert!(matches!(
            storage.reload(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_failed_reload_keeps_live_set() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let state = Record::from(State::new("Ohio"));
        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        std::fs::write(storage.path(), "{\"State.1\": ").unwrap();
        assert!(storage.reload().is_err());
        assert_eq!(storage.get(ClassName::State, state.id()).unwrap(), Some(state));
    }

    #[test]
    fn test_discard_after_failed_save() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);

        let ohio = Record::from(State::new("Ohio"));
        let iowa = Record::from(State::new("Iowa"));
        storage.new(ohio.clone()).unwrap();
        storage.save().unwrap();

        // a directory in place of the store file makes the write fail
        std::fs::remove_file(storage.path()).unwrap();
        std::fs::create_dir(storage.path()).unwrap();

        storage.new(iowa.clone()).unwrap();
        assert!(matches!(storage.save(), Err(StorageError::Io(_))));

        storage.discard().unwrap();
        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key(&ohio.key()));

        std::fs::remove_dir(storage.path()).unwrap();
        storage.save().unwrap();
        storage.reload().unwrap();
        assert_eq!(storage.get(ClassName::State, ohio.id()).unwrap(), Some(ohio));
        assert!(storage.get(ClassName::State, iowa.id()).unwrap().is_none());
    }
}
