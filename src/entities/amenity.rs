// Amenity Entity - linked to places through `Place::amenity_ids`

use serde::{Deserialize, Serialize};

use super::{expect_string, BaseRecord, ClassName, Entity};
use crate::attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Amenity {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl Entity for Amenity {
    const CLASS: ClassName = ClassName::Amenity;

    const ATTRIBUTES: &'static [AttributeDefinition] =
        &[AttributeDefinition::new("name", AttributeType::Text).required()];

    fn base(&self) -> &BaseRecord {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }

    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match attribute {
            "name" => self.name = Some(expect_string(attribute, value)?),
            _ => return Err(Self::unknown(attribute)),
        }
        Ok(())
    }

    fn missing_required(&self) -> Option<&'static str> {
        self.name.is_none().then_some("name")
    }
}
