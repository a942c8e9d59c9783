// Attribute whitelist - every field the console may assign, with its parser

use serde_json::Value;
use thiserror::Error;

use crate::entities::ClassName;

// ============================================================================
// ATTRIBUTE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// Plain string, stored as typed
    String,
    /// Free text; on `create`, underscores stand for spaces
    Text,
    Integer,
    Float,
    /// List of record ids
    IdList,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Text => "text",
            AttributeType::Integer => "integer",
            AttributeType::Float => "float",
            AttributeType::IdList => "id list",
        }
    }
}

/// A parsed, typed attribute value ready to be assigned to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    IdList(Vec<String>),
}

/// How a raw value reached the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// `create <Class> key=value`: underscores in text fields become spaces
    Create,
    /// `update <Class> <id> <attr> <value>`: value is taken literally
    Update,
}

// ============================================================================
// ATTRIBUTE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub name: &'static str,
    pub type_: AttributeType,
    /// Record is not saved while this field is unset
    pub required: bool,
}

impl AttributeDefinition {
    pub const fn new(name: &'static str, type_: AttributeType) -> Self {
        AttributeDefinition {
            name,
            type_,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Parse a raw console token according to this attribute's type.
    pub fn parse(&self, raw: &str, mode: InputMode) -> Result<AttributeValue, AttributeError> {
        let invalid = || AttributeError::InvalidValue {
            attribute: self.name.to_string(),
            value: raw.to_string(),
            expected: self.type_.as_str(),
        };
        let raw = raw.trim();

        match self.type_ {
            AttributeType::String => Ok(AttributeValue::String(raw.to_string())),
            AttributeType::Text => {
                let text = match mode {
                    InputMode::Create => raw.replace('_', " "),
                    InputMode::Update => raw.to_string(),
                };
                Ok(AttributeValue::String(text))
            }
            AttributeType::Integer => raw
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|_| invalid()),
            AttributeType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(AttributeValue::Float)
                .ok_or_else(invalid),
            AttributeType::IdList => {
                if raw.starts_with('[') {
                    let ids: Vec<String> = serde_json::from_str(raw).map_err(|_| invalid())?;
                    return Ok(AttributeValue::IdList(ids));
                }
                let ids = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(AttributeValue::IdList(ids))
            }
        }
    }

    /// Convert a JSON value (from the dictionary form of `update`).
    pub fn parse_json(&self, value: &Value) -> Result<AttributeValue, AttributeError> {
        match (self.type_, value) {
            (AttributeType::Integer, Value::Number(n)) => n
                .as_i64()
                .map(AttributeValue::Integer)
                .ok_or_else(|| self.invalid_json(value)),
            (AttributeType::Float, Value::Number(n)) => n
                .as_f64()
                .map(AttributeValue::Float)
                .ok_or_else(|| self.invalid_json(value)),
            (AttributeType::IdList, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(AttributeValue::IdList)
                .ok_or_else(|| self.invalid_json(value)),
            (_, Value::String(s)) => self.parse(s, InputMode::Update),
            (AttributeType::String | AttributeType::Text, Value::Number(n)) => {
                self.parse(&n.to_string(), InputMode::Update)
            }
            _ => Err(self.invalid_json(value)),
        }
    }

    fn invalid_json(&self, value: &Value) -> AttributeError {
        AttributeError::InvalidValue {
            attribute: self.name.to_string(),
            value: value.to_string(),
            expected: self.type_.as_str(),
        }
    }
}

impl AttributeValue {
    pub fn into_string(self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_integer(self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn into_float(self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(f),
            AttributeValue::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn into_id_list(self) -> Option<Vec<String>> {
        match self {
            AttributeValue::IdList(ids) => Some(ids),
            _ => None,
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("{class} has no attribute '{attribute}'")]
    Unknown { class: ClassName, attribute: String },

    #[error("attribute '{0}' cannot be changed")]
    Immutable(String),

    #[error("invalid {expected} value for '{attribute}': {value}")]
    InvalidValue {
        attribute: String,
        value: String,
        expected: &'static str,
    },
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Fields owned by the base record; never assignable from the console.
pub const IMMUTABLE_ATTRIBUTES: [&str; 4] = ["id", "created_at", "updated_at", "__class__"];

/// Find the definition of `attribute` on `class`.
pub fn lookup(class: ClassName, attribute: &str) -> Result<&'static AttributeDefinition, AttributeError> {
    if IMMUTABLE_ATTRIBUTES.contains(&attribute) {
        return Err(AttributeError::Immutable(attribute.to_string()));
    }

    class
        .attributes()
        .iter()
        .find(|def| def.name == attribute)
        .ok_or_else(|| AttributeError::Unknown {
            class,
            attribute: attribute.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_underscores_only_on_create() {
        let def = AttributeDefinition::new("name", AttributeType::Text);

        assert_eq!(
            def.parse("My_little_house", InputMode::Create).unwrap(),
            AttributeValue::String("My little house".to_string())
        );
        assert_eq!(
            def.parse("My_little_house", InputMode::Update).unwrap(),
            AttributeValue::String("My_little_house".to_string())
        );
    }

    #[test]
    fn test_plain_string_keeps_underscores() {
        let def = AttributeDefinition::new("email", AttributeType::String);
        assert_eq!(
            def.parse("first_last@mail.com", InputMode::Create).unwrap(),
            AttributeValue::String("first_last@mail.com".to_string())
        );
    }

    #[test]
    fn test_numeric_parsers() {
        let rooms = AttributeDefinition::new("number_rooms", AttributeType::Integer);
        let lat = AttributeDefinition::new("latitude", AttributeType::Float);

        assert_eq!(rooms.parse("4", InputMode::Create).unwrap(), AttributeValue::Integer(4));
        assert!(rooms.parse("4.5", InputMode::Create).is_err());
        assert!(rooms.parse("four", InputMode::Update).is_err());

        assert_eq!(lat.parse("37.77", InputMode::Create).unwrap(), AttributeValue::Float(37.77));
        assert_eq!(lat.parse("-122", InputMode::Create).unwrap(), AttributeValue::Float(-122.0));
        assert!(lat.parse("NaN", InputMode::Create).is_err());
    }

    #[test]
    fn test_id_list_parser() {
        let def = AttributeDefinition::new("amenity_ids", AttributeType::IdList);

        assert_eq!(
            def.parse("a1,b2", InputMode::Update).unwrap(),
            AttributeValue::IdList(vec!["a1".to_string(), "b2".to_string()])
        );
        assert_eq!(
            def.parse(r#"["a1"]"#, InputMode::Update).unwrap(),
            AttributeValue::IdList(vec!["a1".to_string()])
        );
    }

    #[test]
    fn test_parse_json_values() {
        let guests = AttributeDefinition::new("max_guest", AttributeType::Integer);
        assert_eq!(
            guests.parse_json(&serde_json::json!(6)).unwrap(),
            AttributeValue::Integer(6)
        );
        assert_eq!(
            guests.parse_json(&serde_json::json!("6")).unwrap(),
            AttributeValue::Integer(6)
        );
        assert!(guests.parse_json(&serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_lookup() {
        assert!(lookup(ClassName::Place, "number_rooms").is_ok());
        assert!(matches!(
            lookup(ClassName::Place, "id"),
            Err(AttributeError::Immutable(_))
        ));
        assert!(matches!(
            lookup(ClassName::State, "email"),
            Err(AttributeError::Unknown { .. })
        ));
    }
}
