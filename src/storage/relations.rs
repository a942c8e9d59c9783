// Relationship navigation resolved through any storage engine
//
// The file backend has no joins, so these scan `all(class)` and filter on the
// reference field. Results are sorted by name where the record has one.

use super::Storage;
use crate::entities::{Amenity, City, ClassName, Place, Record, Review, State};
use crate::error::Result;

/// Cities of a state, sorted by name
pub fn state_cities(storage: &dyn Storage, state: &State) -> Result<Vec<City>> {
    let mut cities: Vec<City> = storage
        .all(Some(ClassName::City))?
        .into_values()
        .filter_map(|record| match record {
            Record::City(city) if city.state_id == state.base.id => Some(city),
            _ => None,
        })
        .collect();
    cities.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cities)
}

/// States sorted by name
pub fn sorted_states(storage: &dyn Storage) -> Result<Vec<State>> {
    let mut states: Vec<State> = storage
        .all(Some(ClassName::State))?
        .into_values()
        .filter_map(|record| match record {
            Record::State(state) => Some(state),
            _ => None,
        })
        .collect();
    states.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    Ok(states)
}

/// Amenities sorted by name
pub fn sorted_amenities(storage: &dyn Storage) -> Result<Vec<Amenity>> {
    let mut amenities: Vec<Amenity> = storage
        .all(Some(ClassName::Amenity))?
        .into_values()
        .filter_map(|record| match record {
            Record::Amenity(amenity) => Some(amenity),
            _ => None,
        })
        .collect();
    amenities.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    Ok(amenities)
}

pub fn place_reviews(storage: &dyn Storage, place: &Place) -> Result<Vec<Review>> {
    Ok(storage
        .all(Some(ClassName::Review))?
        .into_values()
        .filter_map(|record| match record {
            Record::Review(review) if review.place_id == place.base.id => Some(review),
            _ => None,
        })
        .collect())
}

/// Amenities linked to a place; ids that no longer resolve are skipped.
pub fn place_amenities(storage: &dyn Storage, place: &Place) -> Result<Vec<Amenity>> {
    let mut amenities = Vec::with_capacity(place.amenity_ids.len());
    for id in &place.amenity_ids {
        if let Some(Record::Amenity(amenity)) = storage.get(ClassName::Amenity, id)? {
            amenities.push(amenity);
        }
    }
    Ok(amenities)
}

pub fn amenity_places(storage: &dyn Storage, amenity: &Amenity) -> Result<Vec<Place>> {
    Ok(storage
        .all(Some(ClassName::Place))?
        .into_values()
        .filter_map(|record| match record {
            Record::Place(place) if place.amenity_ids.contains(&amenity.base.id) => Some(place),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn test_state_cities_sorted() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json"));

        let california = State::new("California");
        let nevada = State::new("Nevada");
        for city in [
            City::new("San Jose", &california.base.id),
            City::new("Fremont", &california.base.id),
            City::new("Reno", &nevada.base.id),
        ] {
            storage.new(city.into()).unwrap();
        }
        storage.new(nevada.clone().into()).unwrap();
        storage.new(california.clone().into()).unwrap();

        let cities: Vec<String> = state_cities(&storage, &california)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(cities, vec!["Fremont", "San Jose"]);

        let states: Vec<String> = sorted_states(&storage)
            .unwrap()
            .into_iter()
            .map(|s| s.display_name().to_string())
            .collect();
        assert_eq!(states, vec!["California", "Nevada"]);
    }

    #[test]
    fn test_place_amenities_and_reviews() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json"));

        let wifi = Amenity::new("Wifi");
        let mut place = Place::default();
        place.add_amenity(wifi.base.id.clone());
        place.add_amenity("deleted-amenity");

        let review = Review {
            place_id: place.base.id.clone(),
            text: "Great".to_string(),
            ..Default::default()
        };

        storage.new(wifi.clone().into()).unwrap();
        storage.new(place.clone().into()).unwrap();
        storage.new(review.into()).unwrap();

        let amenities = place_amenities(&storage, &place).unwrap();
        assert_eq!(amenities, vec![wifi.clone()]);

        let reviews = place_reviews(&storage, &place).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, "Great");

        let places = amenity_places(&storage, &wifi).unwrap();
        assert_eq!(places, vec![place]);

        assert_eq!(sorted_amenities(&storage).unwrap(), vec![wifi]);
    }
}
