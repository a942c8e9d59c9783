// 🏙️ City Entity - belongs to a State, owns places

use serde::{Deserialize, Serialize};

use super::{expect_string, BaseRecord, ClassName, Entity, Reference};
use crate::attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseRecord,

    #[serde(default)]
    pub state_id: String,

    #[serde(default)]
    pub name: String,
}

impl City {
    pub fn new(name: impl Into<String>, state_id: impl Into<String>) -> Self {
        City {
            name: name.into(),
            state_id: state_id.into(),
            ..Default::default()
        }
    }
}

impl Entity for City {
    const CLASS: ClassName = ClassName::City;

    const ATTRIBUTES: &'static [AttributeDefinition] = &[
        AttributeDefinition::new("state_id", AttributeType::String),
        AttributeDefinition::new("name", AttributeType::Text),
    ];

    fn base(&self) -> &BaseRecord {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }

    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match attribute {
            "state_id" => self.state_id = expect_string(attribute, value)?,
            "name" => self.name = expect_string(attribute, value)?,
            _ => return Err(Self::unknown(attribute)),
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(ClassName::State, &self.state_id)]
    }
}
