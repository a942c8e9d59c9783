// Entity Models
//
// Every record carries a stable identity (UUID) plus created/updated
// timestamps (see `base`). Domain records are flat attribute bags whose
// assignable fields are declared in their `ATTRIBUTES` whitelist.

pub mod amenity;
pub mod base;
pub mod city;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::Amenity;
pub use base::BaseRecord;
pub use city::City;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::attributes::{self, AttributeDefinition, AttributeError, AttributeType, AttributeValue, InputMode};
use crate::error::StorageError;

// ============================================================================
// CLASS REGISTRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassName {
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl ClassName {
    /// Parents before children, so reloading in this order satisfies references.
    pub const ALL: [ClassName; 6] = [
        ClassName::User,
        ClassName::State,
        ClassName::City,
        ClassName::Amenity,
        ClassName::Place,
        ClassName::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassName::User => "User",
            ClassName::State => "State",
            ClassName::City => "City",
            ClassName::Amenity => "Amenity",
            ClassName::Place => "Place",
            ClassName::Review => "Review",
        }
    }

    /// Relational table backing this class
    pub fn table(&self) -> &'static str {
        match self {
            ClassName::User => "users",
            ClassName::State => "states",
            ClassName::City => "cities",
            ClassName::Amenity => "amenities",
            ClassName::Place => "places",
            ClassName::Review => "reviews",
        }
    }

    pub fn attributes(&self) -> &'static [AttributeDefinition] {
        match self {
            ClassName::User => User::ATTRIBUTES,
            ClassName::State => State::ATTRIBUTES,
            ClassName::City => City::ATTRIBUTES,
            ClassName::Amenity => Amenity::ATTRIBUTES,
            ClassName::Place => Place::ATTRIBUTES,
            ClassName::Review => Review::ATTRIBUTES,
        }
    }

    /// Storage key for a record of this class: `"<ClassName>.<id>"`
    pub fn key(&self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassName {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassName::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| StorageError::UnknownClass(s.to_string()))
    }
}

// ============================================================================
// ENTITY TRAIT
// ============================================================================

/// A reference from one record to another (`state_id`, `user_id`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub class: ClassName,
    pub id: String,
}

impl Reference {
    pub fn new(class: ClassName, id: &str) -> Self {
        Reference {
            class,
            id: id.to_string(),
        }
    }
}

pub trait Entity {
    const CLASS: ClassName;

    /// Assignable fields and their parsers
    const ATTRIBUTES: &'static [AttributeDefinition];

    fn base(&self) -> &BaseRecord;

    fn base_mut(&mut self) -> &mut BaseRecord;

    /// Assign an already parsed value to a whitelisted field.
    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError>;

    /// First required field that is still unset.
    fn missing_required(&self) -> Option<&'static str> {
        None
    }

    /// Records this one points at.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn unknown(attribute: &str) -> AttributeError
    where
        Self: Sized,
    {
        AttributeError::Unknown {
            class: Self::CLASS,
            attribute: attribute.to_string(),
        }
    }
}

pub(crate) fn expect_string(attribute: &str, value: AttributeValue) -> Result<String, AttributeError> {
    let shown = format!("{:?}", value);
    value.into_string().ok_or_else(|| AttributeError::InvalidValue {
        attribute: attribute.to_string(),
        value: shown,
        expected: AttributeType::String.as_str(),
    })
}

// ============================================================================
// RECORD
// ============================================================================

/// Any stored domain record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    User(User),
    State(State),
    City(City),
    Amenity(Amenity),
    Place(Place),
    Review(Review),
}

macro_rules! each_record {
    ($record:expr, $inner:ident => $body:expr) => {
        match $record {
            Record::User($inner) => $body,
            Record::State($inner) => $body,
            Record::City($inner) => $body,
            Record::Amenity($inner) => $body,
            Record::Place($inner) => $body,
            Record::Review($inner) => $body,
        }
    };
}

impl Record {
    /// Fresh record of `class` with a new identity and default values.
    pub fn new(class: ClassName) -> Self {
        match class {
            ClassName::User => Record::User(User::default()),
            ClassName::State => Record::State(State::default()),
            ClassName::City => Record::City(City::default()),
            ClassName::Amenity => Record::Amenity(Amenity::default()),
            ClassName::Place => Record::Place(Place::default()),
            ClassName::Review => Record::Review(Review::default()),
        }
    }

    pub fn class(&self) -> ClassName {
        match self {
            Record::User(_) => ClassName::User,
            Record::State(_) => ClassName::State,
            Record::City(_) => ClassName::City,
            Record::Amenity(_) => ClassName::Amenity,
            Record::Place(_) => ClassName::Place,
            Record::Review(_) => ClassName::Review,
        }
    }

    pub fn base(&self) -> &BaseRecord {
        each_record!(self, inner => inner.base())
    }

    pub fn base_mut(&mut self) -> &mut BaseRecord {
        each_record!(self, inner => inner.base_mut())
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> String {
        self.class().key(self.id())
    }

    pub fn touch(&mut self) {
        self.base_mut().touch();
    }

    pub fn missing_required(&self) -> Option<&'static str> {
        each_record!(self, inner => inner.missing_required())
    }

    pub fn references(&self) -> Vec<Reference> {
        each_record!(self, inner => inner.references())
    }

    /// Parse `raw` with the field's parser and assign it.
    pub fn assign(&mut self, attribute: &str, raw: &str, mode: InputMode) -> Result<(), AttributeError> {
        let def = attributes::lookup(self.class(), attribute)?;
        let value = def.parse(raw, mode)?;
        each_record!(self, inner => inner.assign(attribute, value))
    }

    /// Assign from a JSON value (dictionary form of `update`).
    pub fn assign_json(&mut self, attribute: &str, value: &Value) -> Result<(), AttributeError> {
        let def = attributes::lookup(self.class(), attribute)?;
        let value = def.parse_json(value)?;
        each_record!(self, inner => inner.assign(attribute, value))
    }

    /// Attribute map without the class discriminator.
    pub fn attributes(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = each_record!(self, inner => serde_json::to_value(inner))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Persisted form: all attributes plus `__class__`.
    pub fn to_dict(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut map = self.attributes()?;
        map.insert(
            "__class__".to_string(),
            Value::String(self.class().as_str().to_string()),
        );
        Ok(map)
    }

    /// Rebuild a record from its persisted form, dispatching on `__class__`.
    pub fn from_dict(mut map: Map<String, Value>) -> Result<Self, StorageError> {
        let class: ClassName = match map.remove("__class__") {
            Some(Value::String(name)) => name.parse()?,
            _ => return Err(StorageError::UnknownClass("<missing __class__>".to_string())),
        };

        let value = Value::Object(map);
        let record = match class {
            ClassName::User => Record::User(serde_json::from_value(value)?),
            ClassName::State => Record::State(serde_json::from_value(value)?),
            ClassName::City => Record::City(serde_json::from_value(value)?),
            ClassName::Amenity => Record::Amenity(serde_json::from_value(value)?),
            ClassName::Place => Record::Place(serde_json::from_value(value)?),
            ClassName::Review => Record::Review(serde_json::from_value(value)?),
        };
        Ok(record)
    }
}

/// `[User] (<id>) {"created_at": ..., ...}`
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self.attributes().map_err(|_| fmt::Error)?;
        let body = serde_json::to_string(&attributes).map_err(|_| fmt::Error)?;
        write!(f, "[{}] ({}) {}", self.class(), self.id(), body)
    }
}

macro_rules! record_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Record {
                fn from(inner: $variant) -> Self {
                    Record::$variant(inner)
                }
            }
        )*
    };
}

record_from!(User, State, City, Amenity, Place, Review);
