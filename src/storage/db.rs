// 🗄️ Database Storage - SQLite tables with foreign keys
//
// One table per class plus the place_amenity join table. Reads run in
// autocommit so they always see the latest commits. The first `new`/`delete`
// opens a transaction; `save` commits it, `close` and `discard` roll it back.

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

use super::Storage;
use crate::entities::base::{format_timestamp, parse_timestamp};
use crate::entities::{Amenity, BaseRecord, City, ClassName, Place, Record, Review, State, User};
use crate::error::{Result, StorageError};

pub struct DbStorage {
    conn: Connection,
}

/// Create all tables (idempotent).
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT
        );

        CREATE TABLE IF NOT EXISTS states (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            state_id TEXT NOT NULL REFERENCES states(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS amenities (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            city_id TEXT NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            number_rooms INTEGER NOT NULL DEFAULT 0,
            number_bathrooms INTEGER NOT NULL DEFAULT 0,
            max_guest INTEGER NOT NULL DEFAULT 0,
            price_by_night INTEGER NOT NULL DEFAULT 0,
            latitude REAL,
            longitude REAL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            text TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS place_amenity (
            place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
            amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
            PRIMARY KEY (place_id, amenity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cities_state ON cities(state_id);
        CREATE INDEX IF NOT EXISTS idx_places_city ON places(city_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_place ON reviews(place_id);",
    )?;

    Ok(())
}

/// Drop every table, children first. Used when running with `HBNB_ENV=test`.
pub fn drop_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS place_amenity;
         DROP TABLE IF EXISTS reviews;
         DROP TABLE IF EXISTS places;
         DROP TABLE IF EXISTS amenities;
         DROP TABLE IF EXISTS cities;
         DROP TABLE IF EXISTS states;
         DROP TABLE IF EXISTS users;",
    )?;
    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|source| {
        let err = StorageError::Timestamp { value: raw.clone(), source };
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    })
}

/// Columns 0..3 of every entity table
fn base_from_row(row: &Row) -> rusqlite::Result<BaseRecord> {
    Ok(BaseRecord {
        id: row.get(0)?,
        created_at: timestamp_at(row, 1)?,
        updated_at: timestamp_at(row, 2)?,
    })
}

fn select_sql(class: ClassName) -> &'static str {
    match class {
        ClassName::User => {
            "SELECT id, created_at, updated_at, email, password, first_name, last_name FROM users"
        }
        ClassName::State => "SELECT id, created_at, updated_at, name FROM states",
        ClassName::City => "SELECT id, created_at, updated_at, state_id, name FROM cities",
        ClassName::Amenity => "SELECT id, created_at, updated_at, name FROM amenities",
        ClassName::Place => {
            "SELECT id, created_at, updated_at, city_id, user_id, name, description,
                    number_rooms, number_bathrooms, max_guest, price_by_night,
                    latitude, longitude
             FROM places"
        }
        ClassName::Review => {
            "SELECT id, created_at, updated_at, place_id, user_id, text FROM reviews"
        }
    }
}

fn record_from_row(class: ClassName, row: &Row) -> rusqlite::Result<Record> {
    let base = base_from_row(row)?;
    let record = match class {
        ClassName::User => Record::User(User {
            base,
            email: row.get(3)?,
            password: row.get(4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
        }),
        ClassName::State => Record::State(State {
            base,
            name: row.get(3)?,
        }),
        ClassName::City => Record::City(City {
            base,
            state_id: row.get(3)?,
            name: row.get(4)?,
        }),
        ClassName::Amenity => Record::Amenity(Amenity {
            base,
            name: row.get(3)?,
        }),
        ClassName::Place => Record::Place(Place {
            base,
            city_id: row.get(3)?,
            user_id: row.get(4)?,
            name: row.get(5)?,
            description: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            number_rooms: row.get(7)?,
            number_bathrooms: row.get(8)?,
            max_guest: row.get(9)?,
            price_by_night: row.get(10)?,
            latitude: row.get(11)?,
            longitude: row.get(12)?,
            // filled from place_amenity afterwards
            amenity_ids: Vec::new(),
        }),
        ClassName::Review => Record::Review(Review {
            base,
            place_id: row.get(3)?,
            user_id: row.get(4)?,
            text: row.get(5)?,
        }),
    };
    Ok(record)
}

impl DbStorage {
    /// Open (or create) the database file at `path`.
    ///
    /// Connection failures surface here, at start-up.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.as_ref().display(), journal_mode = %mode, "database opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        DbStorage { conn }
    }

    /// Drop every table; the next `reload` recreates an empty schema.
    pub fn drop_all(&mut self) -> Result<()> {
        self.rollback()?;
        drop_all(&self.conn)
    }

    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn exists(&self, class: ClassName, id: &str) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", class.table());
        let found = self
            .conn
            .query_row(&sql, [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn load(&self, class: ClassName, id: Option<&str>) -> Result<Vec<Record>> {
        let mut records = match id {
            Some(id) => {
                let sql = format!("{} WHERE id = ?1", select_sql(class));
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([id], |row| record_from_row(class, row))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("{} ORDER BY created_at", select_sql(class));
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| record_from_row(class, row))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        for record in &mut records {
            if let Record::Place(place) = record {
                place.amenity_ids = self.amenity_ids(&place.base.id)?;
            }
        }

        Ok(records)
    }

    fn amenity_ids(&self, place_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map([place_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn check_references(&self, record: &Record) -> Result<()> {
        for reference in record.references() {
            if reference.id.is_empty() || !self.exists(reference.class, &reference.id)? {
                return Err(StorageError::MissingReference {
                    class: reference.class.as_str().to_string(),
                    id: reference.id,
                });
            }
        }
        Ok(())
    }

    fn upsert(&self, record: &Record) -> Result<()> {
        let base = record.base();
        let created_at = format_timestamp(&base.created_at);
        let updated_at = format_timestamp(&base.updated_at);

        match record {
            Record::User(user) => {
                self.conn.execute(
                    "INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        email = excluded.email,
                        password = excluded.password,
                        first_name = excluded.first_name,
                        last_name = excluded.last_name",
                    params![
                        base.id,
                        created_at,
                        updated_at,
                        user.email,
                        user.password,
                        user.first_name,
                        user.last_name,
                    ],
                )?;
            }
            Record::State(state) => {
                self.conn.execute(
                    "INSERT INTO states (id, created_at, updated_at, name)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        name = excluded.name",
                    params![base.id, created_at, updated_at, state.name],
                )?;
            }
            Record::City(city) => {
                self.conn.execute(
                    "INSERT INTO cities (id, created_at, updated_at, state_id, name)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        state_id = excluded.state_id,
                        name = excluded.name",
                    params![base.id, created_at, updated_at, city.state_id, city.name],
                )?;
            }
            Record::Amenity(amenity) => {
                self.conn.execute(
                    "INSERT INTO amenities (id, created_at, updated_at, name)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        name = excluded.name",
                    params![base.id, created_at, updated_at, amenity.name],
                )?;
            }
            Record::Place(place) => {
                self.conn.execute(
                    "INSERT INTO places (id, created_at, updated_at, city_id, user_id, name,
                                         description, number_rooms, number_bathrooms, max_guest,
                                         price_by_night, latitude, longitude)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        city_id = excluded.city_id,
                        user_id = excluded.user_id,
                        name = excluded.name,
                        description = excluded.description,
                        number_rooms = excluded.number_rooms,
                        number_bathrooms = excluded.number_bathrooms,
                        max_guest = excluded.max_guest,
                        price_by_night = excluded.price_by_night,
                        latitude = excluded.latitude,
                        longitude = excluded.longitude",
                    params![
                        base.id,
                        created_at,
                        updated_at,
                        place.city_id,
                        place.user_id,
                        place.name,
                        place.description,
                        place.number_rooms,
                        place.number_bathrooms,
                        place.max_guest,
                        place.price_by_night,
                        place.latitude,
                        place.longitude,
                    ],
                )?;

                self.conn
                    .execute("DELETE FROM place_amenity WHERE place_id = ?1", [&base.id])?;
                for amenity_id in &place.amenity_ids {
                    self.conn.execute(
                        "INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                        params![base.id, amenity_id],
                    )?;
                }
            }
            Record::Review(review) => {
                self.conn.execute(
                    "INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                        updated_at = excluded.updated_at,
                        place_id = excluded.place_id,
                        user_id = excluded.user_id,
                        text = excluded.text",
                    params![
                        base.id,
                        created_at,
                        updated_at,
                        review.place_id,
                        review.user_id,
                        review.text,
                    ],
                )?;
            }
        }

        Ok(())
    }
}

impl Storage for DbStorage {
    fn all(&self, class: Option<ClassName>) -> Result<BTreeMap<String, Record>> {
        let classes: Vec<ClassName> = match class {
            Some(class) => vec![class],
            None => ClassName::ALL.to_vec(),
        };

        let mut objects = BTreeMap::new();
        for class in classes {
            for record in self.load(class, None)? {
                objects.insert(record.key(), record);
            }
        }
        Ok(objects)
    }

    fn get(&self, class: ClassName, id: &str) -> Result<Option<Record>> {
        Ok(self.load(class, Some(id))?.into_iter().next())
    }

    fn count(&self, class: ClassName) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", class.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn new(&mut self, record: Record) -> Result<()> {
        self.begin()?;
        self.check_references(&record)?;
        self.upsert(&record)?;
        tracing::debug!(key = %record.key(), "record staged");
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
            tracing::debug!("session committed");
        }
        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<bool> {
        self.begin()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", record.class().table());
        let removed = self.conn.execute(&sql, [record.id()])?;
        Ok(removed > 0)
    }

    fn reload(&mut self) -> Result<()> {
        self.rollback()?;
        setup_database(&self.conn)
    }

    fn close(&mut self) -> Result<()> {
        self.rollback()
    }

    fn discard(&mut self) -> Result<()> {
        self.rollback()
    }

    fn enforces_references(&self) -> bool {
        true
    }
}
