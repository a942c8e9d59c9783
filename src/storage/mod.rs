//! Storage engines
//!
//! Both backends expose the same surface through the [`Storage`] trait:
//!
//! - [`FileStorage`]: every record in an in-memory map, persisted as one JSON
//!   document. Permissive: references are not checked and deletes do not
//!   cascade.
//! - [`DbStorage`]: SQLite tables with foreign keys. Strict: dangling
//!   references are rejected and deletes cascade.
//!
//! Records are keyed `"<ClassName>.<id>"` in every map the engines return.

pub mod db;
pub mod file;
pub mod relations;

pub use db::DbStorage;
pub use file::FileStorage;

use std::collections::BTreeMap;

use crate::entities::{ClassName, Record};
use crate::error::Result;

/// Uniform persistence surface shared by the console and the web views.
pub trait Storage: Send {
    /// Every live record, or only those of `class`.
    fn all(&self, class: Option<ClassName>) -> Result<BTreeMap<String, Record>>;

    fn get(&self, class: ClassName, id: &str) -> Result<Option<Record>> {
        Ok(self.all(Some(class))?.remove(&class.key(id)))
    }

    fn count(&self, class: ClassName) -> Result<usize> {
        Ok(self.all(Some(class))?.len())
    }

    /// Register a record (new or modified) as pending persistence.
    fn new(&mut self, record: Record) -> Result<()>;

    /// Durably persist all pending state.
    fn save(&mut self) -> Result<()>;

    /// Remove a record from the live set. Durable after the next `save`.
    fn delete(&mut self, record: &Record) -> Result<bool>;

    /// (Re)populate the live set from the backing store.
    fn reload(&mut self) -> Result<()>;

    /// End the current session, discarding whatever was not saved.
    fn close(&mut self) -> Result<()>;

    /// Undo every `new`/`delete` since the last successful `save` or
    /// `reload`, without touching the backing store.
    fn discard(&mut self) -> Result<()>;

    /// Whether `new` rejects records that point at missing records.
    fn enforces_references(&self) -> bool;
}
