// Review Entity - text written by a User about a Place

use serde::{Deserialize, Serialize};

use super::{expect_string, BaseRecord, ClassName, Entity, Reference};
use crate::attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseRecord,

    #[serde(default)]
    pub place_id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub text: String,
}

impl Entity for Review {
    const CLASS: ClassName = ClassName::Review;

    const ATTRIBUTES: &'static [AttributeDefinition] = &[
        AttributeDefinition::new("place_id", AttributeType::String),
        AttributeDefinition::new("user_id", AttributeType::String),
        AttributeDefinition::new("text", AttributeType::Text),
    ];

    fn base(&self) -> &BaseRecord {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }

    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match attribute {
            "place_id" => self.place_id = expect_string(attribute, value)?,
            "user_id" => self.user_id = expect_string(attribute, value)?,
            "text" => self.text = expect_string(attribute, value)?,
            _ => return Err(Self::unknown(attribute)),
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new(ClassName::Place, &self.place_id),
            Reference::new(ClassName::User, &self.user_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_place_and_user() {
        let review = Review {
            place_id: "p1".to_string(),
            user_id: "u1".to_string(),
            text: "Quiet street".to_string(),
            ..Default::default()
        };

        assert_eq!(
            review.references(),
            vec![
                Reference::new(ClassName::Place, "p1"),
                Reference::new(ClassName::User, "u1"),
            ]
        );
        assert_eq!(review.missing_required(), None);
    }

    #[test]
    fn test_text_must_be_a_string() {
        let mut review = Review::default();
        assert!(matches!(
            review.assign("text", AttributeValue::Integer(5)),
            Err(AttributeError::InvalidValue { .. })
        ));
    }
}
