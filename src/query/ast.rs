//! Validated query representation
//!
//! The validator turns the raw JSON document into these types. Keys are
//! resolved to [`Field`]s once, so evaluation never re-parses strings.

use crate::dataset::{DatasetKind, Field};

/// Numeric comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Gt,
    Eq,
}

impl Comparator {
    /// Tag as written in a query document
    pub fn tag(&self) -> &'static str {
        match self {
            Comparator::Lt => "LT",
            Comparator::Gt => "GT",
            Comparator::Eq => "EQ",
        }
    }

    pub fn matches(&self, value: f64, literal: f64) -> bool {
        match self {
            Comparator::Lt => value < literal,
            Comparator::Gt => value > literal,
            Comparator::Eq => value == literal,
        }
    }
}

/// Boolean filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// `LT`, `GT` or `EQ` on a numeric field
    Compare {
        op: Comparator,
        field: Field,
        value: f64,
    },
    /// `IS` on a text field; `pattern` may still carry asterisks
    Is { field: Field, pattern: String },
}

/// Sort direction of an ORDER object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Up,
    Down,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Up => "UP",
            SortDirection::Down => "DOWN",
        }
    }

    pub fn parse(dir: &str) -> Option<Self> {
        match dir {
            "UP" => Some(SortDirection::Up),
            "DOWN" => Some(SortDirection::Down),
            _ => None,
        }
    }
}

/// Sort specification; a bare-string ORDER becomes `Up` with one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub direction: SortDirection,
    /// Column names, most significant first
    pub keys: Vec<String>,
}

/// An output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Output key exactly as requested
    pub key: String,
    /// Dataset field for raw columns; `None` for GROUP/APPLY names
    pub field: Option<Field>,
}

/// Aggregate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Sum => "SUM",
            ApplyToken::Count => "COUNT",
        }
    }

    /// COUNT accepts any field; the rest need a numeric one
    pub fn requires_numeric(&self) -> bool {
        !matches!(self, ApplyToken::Count)
    }
}

/// A GROUP key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    /// Full `<datasetId>_<field>` key, used as the output name
    pub key: String,
    pub field: Field,
}

/// A named aggregate over one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformations {
    pub group: Vec<GroupKey>,
    pub apply: Vec<ApplyRule>,
}

/// A query that passed validation, bound to one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub dataset_id: String,
    pub kind: DatasetKind,
    /// `None` for an empty WHERE, which matches every record
    pub filter: Option<Filter>,
    pub columns: Vec<Column>,
    pub order: Option<Order>,
    pub transformations: Option<Transformations>,
}

impl ValidatedQuery {
    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn is_transformed(&self) -> bool {
        self.transformations.is_some()
    }
}
