//! Dataset kinds and their field vocabularies
//!
//! Every dataset holds records of exactly one kind. A query key
//! `<datasetId>_<field>` resolves to a [`Field`] only if the field belongs
//! to the kind of the referenced dataset.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Record kind of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Academic course sections
    #[serde(rename = "courses")]
    Sections,
    /// Campus rooms
    Rooms,
}

impl DatasetKind {
    /// Returns the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Sections => "courses",
            DatasetKind::Rooms => "rooms",
        }
    }

    /// Parses a wire name (`courses` or `rooms`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "courses" => Some(DatasetKind::Sections),
            "rooms" => Some(DatasetKind::Rooms),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scalar type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    Text,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Text => "string",
        }
    }
}

/// Every queryable field across both record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Sections
    Dept,
    Id,
    Avg,
    Instructor,
    Title,
    Pass,
    Fail,
    Audit,
    Uuid,
    Year,
    // Rooms
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Lat,
    Lon,
    Seats,
    Type,
    Furniture,
    Href,
}

const SECTION_FIELDS: &[Field] = &[
    Field::Dept,
    Field::Id,
    Field::Avg,
    Field::Instructor,
    Field::Title,
    Field::Pass,
    Field::Fail,
    Field::Audit,
    Field::Uuid,
    Field::Year,
];

const ROOM_FIELDS: &[Field] = &[
    Field::Fullname,
    Field::Shortname,
    Field::Number,
    Field::Name,
    Field::Address,
    Field::Lat,
    Field::Lon,
    Field::Seats,
    Field::Type,
    Field::Furniture,
    Field::Href,
];

impl Field {
    /// All fields of the given kind, in declaration order
    pub fn all(kind: DatasetKind) -> &'static [Field] {
        match kind {
            DatasetKind::Sections => SECTION_FIELDS,
            DatasetKind::Rooms => ROOM_FIELDS,
        }
    }

    /// Resolves a bare field name against a kind.
    ///
    /// Returns `None` when the name is unknown or belongs to the other kind.
    pub fn parse(kind: DatasetKind, name: &str) -> Option<Field> {
        Self::all(kind).iter().copied().find(|f| f.name() == name)
    }

    /// Bare field name as it appears after the underscore in a query key
    pub fn name(&self) -> &'static str {
        match self {
            Field::Dept => "dept",
            Field::Id => "id",
            Field::Avg => "avg",
            Field::Instructor => "instructor",
            Field::Title => "title",
            Field::Pass => "pass",
            Field::Fail => "fail",
            Field::Audit => "audit",
            Field::Uuid => "uuid",
            Field::Year => "year",
            Field::Fullname => "fullname",
            Field::Shortname => "shortname",
            Field::Number => "number",
            Field::Name => "name",
            Field::Address => "address",
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Seats => "seats",
            Field::Type => "type",
            Field::Furniture => "furniture",
            Field::Href => "href",
        }
    }

    /// The kind this field belongs to
    pub fn kind(&self) -> DatasetKind {
        if SECTION_FIELDS.contains(self) {
            DatasetKind::Sections
        } else {
            DatasetKind::Rooms
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Field::Avg
            | Field::Pass
            | Field::Fail
            | Field::Audit
            | Field::Year
            | Field::Lat
            | Field::Lon
            | Field::Seats => ValueType::Number,
            _ => ValueType::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.value_type() == ValueType::Number
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
