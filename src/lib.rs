// HBNB - rental data store core library
// Exposes all modules for use in the console, the web server, and tests

pub mod attributes;
pub mod config;
pub mod console;
pub mod entities;
pub mod error;
pub mod logger;
pub mod storage;
pub mod web;

// Re-export commonly used types
pub use attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue, InputMode};
pub use config::{HbnbConfig, StorageKind};
pub use console::{Console, ConsoleError};
pub use entities::{
    Amenity, BaseRecord, City, ClassName, Entity, Place, Record, Reference, Review, State, User,
};
pub use error::{Result, StorageError};
pub use storage::{DbStorage, FileStorage, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
