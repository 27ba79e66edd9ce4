//! Filter predicate tree over channel records
//!
//! Filters compose field comparisons with AND/OR/NOT. Comparisons against a
//! field the record does not carry (e.g. `last_message_at` on a channel with
//! no messages) never match, regardless of operator.

use chrono::{DateTime, Utc};
use mirror_core::ChannelRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Filterable channel fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelField {
    Cid,
    Kind,
    Frozen,
    MemberCount,
    Team,
    CreatedAt,
    UpdatedAt,
    LastMessageAt,
    DeletedAt,
    /// A key inside the opaque extra-attribute payload
    Extra(String),
}

impl ChannelField {
    /// Extract the field's comparable value from a record, if present
    pub fn value_of(&self, record: &ChannelRecord) -> Option<FieldValue> {
        match self {
            Self::Cid => Some(FieldValue::Text(record.cid.to_string())),
            Self::Kind => Some(FieldValue::Text(record.kind().to_owned())),
            Self::Frozen => Some(FieldValue::Bool(record.frozen)),
            Self::MemberCount => Some(FieldValue::Int(i64::from(record.member_count))),
            Self::Team => record.team.clone().map(FieldValue::Text),
            Self::CreatedAt => Some(FieldValue::Time(record.created_at)),
            Self::UpdatedAt => Some(FieldValue::Time(record.updated_at)),
            Self::LastMessageAt => record.last_message_at.map(FieldValue::Time),
            Self::DeletedAt => record.deleted_at.map(FieldValue::Time),
            Self::Extra(key) => record.extra.get(key).and_then(json_field_value),
        }
    }
}

fn json_field_value(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
        serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(FieldValue::Int),
        _ => None,
    }
}

/// A comparable field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl FieldValue {
    /// Compare two values of the same variant; mixed variants do not compare
    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(t)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Equal => ord == Ordering::Equal,
            Self::NotEqual => ord != Ordering::Equal,
            Self::Greater => ord == Ordering::Greater,
            Self::GreaterOrEqual => ord != Ordering::Less,
            Self::Less => ord == Ordering::Less,
            Self::LessOrEqual => ord != Ordering::Greater,
        }
    }
}

/// Filter predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Field comparison against a constant
    Compare {
        field: ChannelField,
        op: CompareOp,
        value: FieldValue,
    },
    /// Field equals any of the given values
    In {
        field: ChannelField,
        values: Vec<FieldValue>,
    },
    /// Field presence test
    Exists { field: ChannelField, exists: bool },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn equal(field: ChannelField, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Equal, value)
    }

    pub fn not_equal(field: ChannelField, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::NotEqual, value)
    }

    pub fn greater(field: ChannelField, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Greater, value)
    }

    pub fn less(field: ChannelField, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Less, value)
    }

    pub fn compare(field: ChannelField, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Self::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<FieldValue>>(
        field: ChannelField,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exists(field: ChannelField, exists: bool) -> Self {
        Self::Exists { field, exists }
    }

    /// Evaluate the predicate against a record
    pub fn matches(&self, record: &ChannelRecord) -> bool {
        match self {
            Self::Compare { field, op, value } => field
                .value_of(record)
                .and_then(|actual| actual.compare(value))
                .is_some_and(|ord| op.holds(ord)),
            Self::In { field, values } => field
                .value_of(record)
                .is_some_and(|actual| values.contains(&actual)),
            Self::Exists { field, exists } => field.value_of(record).is_some() == *exists,
            Self::And(filters) => filters.iter().all(|f| f.matches(record)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Self::Not(filter) => !filter.matches(record),
        }
    }
}

// `f1 & f2` / `f1 | f2` combinators, flattening nested groups
impl std::ops::BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(rhs);
                Filter::And(filters)
            }
            lhs => Filter::And(vec![lhs, rhs]),
        }
    }
}

impl std::ops::BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(rhs);
                Filter::Or(filters)
            }
            lhs => Filter::Or(vec![lhs, rhs]),
        }
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }
}
