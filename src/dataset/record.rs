//! Record types in the shape handed over by ingestion
//!
//! A [`Section`] is keyed by its `uuid`, a [`Room`] by its composite
//! `name` (`<shortname>_<number>`).

use serde::{Deserialize, Serialize};

use super::kind::{DatasetKind, Field};
use super::value::FieldValue;

/// One offering of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub dept: String,
    pub id: String,
    pub instructor: String,
    pub title: String,
    pub avg: f64,
    pub pass: i64,
    pub fail: i64,
    pub audit: i64,
    pub uuid: String,
    pub year: i64,
}

/// One bookable room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: i64,
    #[serde(rename = "type")]
    pub room_type: String,
    pub furniture: String,
    pub href: String,
}

/// A kind-tagged record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Section(Section),
    Room(Room),
}

impl Record {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Record::Section(_) => DatasetKind::Sections,
            Record::Room(_) => DatasetKind::Rooms,
        }
    }

    /// Natural key, unique within a record store
    pub fn primary_key(&self) -> &str {
        match self {
            Record::Section(s) => &s.uuid,
            Record::Room(r) => &r.name,
        }
    }

    /// Reads a field. Returns `None` if the field belongs to the other kind.
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match self {
            Record::Section(s) => s.value(field),
            Record::Room(r) => r.value(field),
        }
    }
}

impl Section {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        let value = match field {
            Field::Dept => FieldValue::Text(&self.dept),
            Field::Id => FieldValue::Text(&self.id),
            Field::Instructor => FieldValue::Text(&self.instructor),
            Field::Title => FieldValue::Text(&self.title),
            Field::Uuid => FieldValue::Text(&self.uuid),
            Field::Avg => FieldValue::Number(self.avg),
            Field::Pass => FieldValue::Number(self.pass as f64),
            Field::Fail => FieldValue::Number(self.fail as f64),
            Field::Audit => FieldValue::Number(self.audit as f64),
            Field::Year => FieldValue::Number(self.year as f64),
            _ => return None,
        };
        Some(value)
    }
}

impl Room {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        let value = match field {
            Field::Fullname => FieldValue::Text(&self.fullname),
            Field::Shortname => FieldValue::Text(&self.shortname),
            Field::Number => FieldValue::Text(&self.number),
            Field::Name => FieldValue::Text(&self.name),
            Field::Address => FieldValue::Text(&self.address),
            Field::Type => FieldValue::Text(&self.room_type),
            Field::Furniture => FieldValue::Text(&self.furniture),
            Field::Href => FieldValue::Text(&self.href),
            Field::Lat => FieldValue::Number(self.lat),
            Field::Lon => FieldValue::Number(self.lon),
            Field::Seats => FieldValue::Number(self.seats as f64),
            _ => return None,
        };
        Some(value)
    }
}

impl From<Section> for Record {
    fn from(section: Section) -> Self {
        Record::Section(section)
    }
}

impl From<Room> for Record {
    fn from(room: Room) -> Self {
        Record::Room(room)
    }
}
