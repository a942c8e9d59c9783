// 🏠 Place Entity - a rentable listing
//
// Belongs to a City and a User, has many Reviews, and links to Amenities
// through `amenity_ids` (the `place_amenity` join table in the database).

use serde::{Deserialize, Serialize};

use super::{expect_string, BaseRecord, ClassName, Entity, Reference};
use crate::attributes::{AttributeDefinition, AttributeError, AttributeType, AttributeValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseRecord,

    #[serde(default)]
    pub city_id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub number_rooms: i64,

    #[serde(default)]
    pub number_bathrooms: i64,

    #[serde(default)]
    pub max_guest: i64,

    #[serde(default)]
    pub price_by_night: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

impl Place {
    /// Link an amenity; linking the same amenity twice is a no-op.
    pub fn add_amenity(&mut self, amenity_id: impl Into<String>) {
        let amenity_id = amenity_id.into();
        if !self.amenity_ids.contains(&amenity_id) {
            self.amenity_ids.push(amenity_id);
        }
    }
}

fn expect_integer(attribute: &str, value: AttributeValue) -> Result<i64, AttributeError> {
    let shown = format!("{:?}", value);
    value.into_integer().ok_or_else(|| AttributeError::InvalidValue {
        attribute: attribute.to_string(),
        value: shown,
        expected: AttributeType::Integer.as_str(),
    })
}

fn expect_float(attribute: &str, value: AttributeValue) -> Result<f64, AttributeError> {
    let shown = format!("{:?}", value);
    value.into_float().ok_or_else(|| AttributeError::InvalidValue {
        attribute: attribute.to_string(),
        value: shown,
        expected: AttributeType::Float.as_str(),
    })
}

impl Entity for Place {
    const CLASS: ClassName = ClassName::Place;

    const ATTRIBUTES: &'static [AttributeDefinition] = &[
        AttributeDefinition::new("city_id", AttributeType::String),
        AttributeDefinition::new("user_id", AttributeType::String),
        AttributeDefinition::new("name", AttributeType::Text),
        AttributeDefinition::new("description", AttributeType::Text),
        AttributeDefinition::new("number_rooms", AttributeType::Integer),
        AttributeDefinition::new("number_bathrooms", AttributeType::Integer),
        AttributeDefinition::new("max_guest", AttributeType::Integer),
        AttributeDefinition::new("price_by_night", AttributeType::Integer),
        AttributeDefinition::new("latitude", AttributeType::Float),
        AttributeDefinition::new("longitude", AttributeType::Float),
        AttributeDefinition::new("amenity_ids", AttributeType::IdList),
    ];

    fn base(&self) -> &BaseRecord {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseRecord {
        &mut self.base
    }

    fn assign(&mut self, attribute: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match attribute {
            "city_id" => self.city_id = expect_string(attribute, value)?,
            "user_id" => self.user_id = expect_string(attribute, value)?,
            "name" => self.name = expect_string(attribute, value)?,
            "description" => self.description = expect_string(attribute, value)?,
            "number_rooms" => self.number_rooms = expect_integer(attribute, value)?,
            "number_bathrooms" => self.number_bathrooms = expect_integer(attribute, value)?,
            "max_guest" => self.max_guest = expect_integer(attribute, value)?,
            "price_by_night" => self.price_by_night = expect_integer(attribute, value)?,
            "latitude" => self.latitude = Some(expect_float(attribute, value)?),
            "longitude" => self.longitude = Some(expect_float(attribute, value)?),
            "amenity_ids" => {
                let shown = format!("{:?}", value);
                let ids = value.into_id_list().ok_or_else(|| AttributeError::InvalidValue {
                    attribute: attribute.to_string(),
                    value: shown,
                    expected: AttributeType::IdList.as_str(),
                })?;
                self.amenity_ids.clear();
                for id in ids {
                    self.add_amenity(id);
                }
            }
            _ => return Err(Self::unknown(attribute)),
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![
            Reference::new(ClassName::City, &self.city_id),
            Reference::new(ClassName::User, &self.user_id),
        ];
        refs.extend(
            self.amenity_ids
                .iter()
                .map(|id| Reference::new(ClassName::Amenity, id)),
        );
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_defaults() {
        let place = Place::default();
        assert_eq!(place.number_rooms, 0);
        assert_eq!(place.price_by_night, 0);
        assert!(place.latitude.is_none());
        assert!(place.amenity_ids.is_empty());
        assert_eq!(place.missing_required(), None);
    }

    #[test]
    fn test_place_typed_assignment() {
        let mut place = Place::default();
        place.assign("number_rooms", AttributeValue::Integer(3)).unwrap();
        place.assign("latitude", AttributeValue::Float(37.77)).unwrap();
        // integers are accepted where a float is expected
        place.assign("longitude", AttributeValue::Integer(-122)).unwrap();

        assert_eq!(place.number_rooms, 3);
        assert_eq!(place.latitude, Some(37.77));
        assert_eq!(place.longitude, Some(-122.0));

        assert!(place
            .assign("max_guest", AttributeValue::Float(2.5))
            .is_err());
    }

    #[test]
    fn test_amenity_ids_deduplicated() {
        let mut place = Place::default();
        place
            .assign(
                "amenity_ids",
                AttributeValue::IdList(vec!["a".to_string(), "b".to_string(), "a".to_string()]),
            )
            .unwrap();
        place.add_amenity("b");

        assert_eq!(place.amenity_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_place_references() {
        let mut place = Place::default();
        place.city_id = "c1".to_string();
        place.user_id = "u1".to_string();
        place.add_amenity("a1");

        let refs = place.references();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0], Reference::new(ClassName::City, "c1"));
        assert_eq!(refs[2], Reference::new(ClassName::Amenity, "a1"));
    }
}
