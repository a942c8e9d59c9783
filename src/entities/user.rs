// 👤 User Entity - account that owns places and writes reviews

use serde::{Deserialize, Serialize};

use super::{expect_string, Entity, BaseRecord, ClassName};
use crate::attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        User {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }
}

impl Entity for User {
    const CLASS: ClassName = ClassName::User;

    const ATTRIBUTES: &'static [AttributeDefinition] = &[
        AttributeDefinition::new("email", AttributeType::String).required(),
        AttributeDefinition::new("password", AttributeType::String).required(),
        AttributeDefinition::new("first_name", AttributeType::Text),
        AttributeDefinition::new("last_name", AttributeType::Text),
    ];

    fn base(&self) -> &BaseRecord {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }

    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match attribute {
            "email" => self.email = Some(expect_string(attribute, value)?),
            "password" => self.password = Some(expect_string(attribute, value)?),
            "first_name" => self.first_name = Some(expect_string(attribute, value)?),
            "last_name" => self.last_name = Some(expect_string(attribute, value)?),
            _ => return Err(Self::unknown(attribute)),
        }
        Ok(())
    }

    fn missing_required(&self) -> Option<&'static str> {
        if self.email.is_none() {
            return Some("email");
        }
        if self.password.is_none() {
            return Some("password");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_requires_email_then_password() {
        let mut user = User::default();
        assert_eq!(user.missing_required(), Some("email"));

        user.assign("email", AttributeValue::String("a@b.c".to_string())).unwrap();
        assert_eq!(user.missing_required(), Some("password"));

        user.assign("password", AttributeValue::String("pwd".to_string())).unwrap();
        assert_eq!(user.missing_required(), None);
    }

    #[test]
    fn test_unset_fields_are_not_serialized() {
        let user = User::new("a@b.c", "pwd");
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["email"], "a@b.c");
        assert!(value.get("first_name").is_none());
        assert!(value.get("id").is_some());
    }

    #[test]
    fn test_assign_rejects_wrong_type() {
        let mut user = User::default();
        let err = user.assign("email", AttributeValue::Integer(3)).unwrap_err();
        assert!(matches!(err, AttributeError::InvalidValue { .. }));
    }
}
