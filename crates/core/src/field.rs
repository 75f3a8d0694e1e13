//! Static per-entity field tables.
//!
//! Each entity publishes a table of [`FieldDef`]s mapping the field names
//! clients may use in filters, sorts and patch documents to a column, a
//! [`FieldKind`] and typed getter/setter functions. Lookups go through
//! [`Schema::field`], so an unknown name is a checked [`QueryError`] rather
//! than a runtime failure deep inside a query.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::query::QueryError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Field kinds
// ---------------------------------------------------------------------------

/// The storage type behind a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uuid,
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
}

impl FieldKind {
    /// Kinds that support `GreaterThan` / `LessThan` style comparisons.
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            FieldKind::Integer | FieldKind::Decimal | FieldKind::Timestamp
        )
    }

    /// Kinds that support substring operators.
    pub fn is_text(self) -> bool {
        self == FieldKind::Text
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Uuid => "uuid",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        }
    }

    /// Convert a filter value string into a typed value of this kind.
    ///
    /// Returns `None` if the string does not parse or the value cannot be
    /// stored unchanged. Surrounding whitespace is ignored for every kind
    /// except `Text`.
    pub fn parse(self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        let value = match self {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Uuid => Uuid::parse_str(trimmed).ok().map(FieldValue::Uuid),
            FieldKind::Integer => trimmed.parse::<i64>().ok().map(FieldValue::Integer),
            FieldKind::Decimal => parse_decimal(trimmed).map(FieldValue::Decimal),
            FieldKind::Boolean => parse_bool(trimmed).map(FieldValue::Boolean),
            FieldKind::Timestamp => parse_timestamp(trimmed).map(FieldValue::Timestamp),
        };
        value.filter(|v| v.storage_issue().is_none())
    }

    /// Convert a JSON value (as found in a patch document) into a typed value.
    ///
    /// JSON `null` becomes [`FieldValue::Null`]; whether that is acceptable is
    /// up to the caller. Numeric and boolean kinds also accept their string
    /// spelling.
    pub fn from_json(self, json: &serde_json::Value) -> Option<FieldValue> {
        use serde_json::Value;

        let value = match (self, json) {
            (_, Value::Null) => Some(FieldValue::Null),
            (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
            (FieldKind::Decimal, Value::Number(n)) => {
                parse_decimal(&n.to_string()).map(FieldValue::Decimal)
            }
            (FieldKind::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (FieldKind::Text, _) => None,
            (kind, Value::String(s)) => kind.parse(s),
            _ => None,
        };
        value.filter(|v| v.storage_issue().is_none())
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// Earliest year a `TIMESTAMPTZ` column accepts (4713 BC).
const MIN_STORABLE_YEAR: i32 = -4712;

/// A typed field value read from (or written to) an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Uuid(Uuid),
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Timestamp(Timestamp),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Why storage would reject or alter this value, if it would.
    ///
    /// Postgres text cannot hold NUL, and `TIMESTAMPTZ` keeps microseconds.
    pub fn storage_issue(&self) -> Option<&'static str> {
        match self {
            FieldValue::Text(s) if s.contains('\0') => Some("text must not contain NUL characters"),
            FieldValue::Timestamp(t) if t.nanosecond() % 1_000 != 0 => {
                Some("timestamps are limited to microsecond precision")
            }
            FieldValue::Timestamp(t) if t.year() < MIN_STORABLE_YEAR => {
                Some("timestamp is before the earliest storable date")
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two non-null values of the same kind.
    ///
    /// Returns `None` when either side is null or the kinds differ, which
    /// makes every ordering comparison against NULL false, as in SQL.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls sort after every value.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    pub fn into_text(self) -> Result<String, QueryError> {
        match self {
            FieldValue::Text(s) => Ok(s),
            _ => Err(mismatch(FieldKind::Text)),
        }
    }

    pub fn into_opt_text(self) -> Result<Option<String>, QueryError> {
        match self {
            FieldValue::Null => Ok(None),
            other => other.into_text().map(Some),
        }
    }

    pub fn into_uuid(self) -> Result<Uuid, QueryError> {
        match self {
            FieldValue::Uuid(u) => Ok(u),
            _ => Err(mismatch(FieldKind::Uuid)),
        }
    }

    pub fn into_opt_uuid(self) -> Result<Option<Uuid>, QueryError> {
        match self {
            FieldValue::Null => Ok(None),
            other => other.into_uuid().map(Some),
        }
    }

    pub fn into_integer(self) -> Result<i64, QueryError> {
        match self {
            FieldValue::Integer(i) => Ok(i),
            _ => Err(mismatch(FieldKind::Integer)),
        }
    }

    pub fn into_decimal(self) -> Result<Decimal, QueryError> {
        match self {
            FieldValue::Decimal(d) => Ok(d),
            _ => Err(mismatch(FieldKind::Decimal)),
        }
    }

    pub fn into_boolean(self) -> Result<bool, QueryError> {
        match self {
            FieldValue::Boolean(b) => Ok(b),
            _ => Err(mismatch(FieldKind::Boolean)),
        }
    }

    pub fn into_timestamp(self) -> Result<Timestamp, QueryError> {
        match self {
            FieldValue::Timestamp(t) => Ok(t),
            _ => Err(mismatch(FieldKind::Timestamp)),
        }
    }

    pub fn into_opt_timestamp(self) -> Result<Option<Timestamp>, QueryError> {
        match self {
            FieldValue::Null => Ok(None),
            other => other.into_timestamp().map(Some),
        }
    }
}

fn mismatch(expected: FieldKind) -> QueryError {
    QueryError::TypeMismatch {
        expected: expected.name(),
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(v: Timestamp) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Field definitions
// ---------------------------------------------------------------------------

/// Reads a field from an entity.
pub type Getter<T> = fn(&T) -> FieldValue;

/// Writes an already-typed value into an entity.
pub type Setter<T> = fn(&mut T, FieldValue) -> Result<(), QueryError>;

/// How a field may be written.
pub enum Access<T> {
    /// The primary key. Assigned at creation, never patched.
    Key,
    /// Maintained by storage (timestamps).
    ReadOnly,
    /// Client-writable through create, update and patch.
    Writable(Setter<T>),
}

/// One entry of an entity's field table.
pub struct FieldDef<T: 'static> {
    /// Name used by clients (camelCase, matched case-insensitively).
    pub name: &'static str,
    /// Database column.
    pub column: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
    /// Included in free-text search.
    pub searchable: bool,
    pub access: Access<T>,
    pub get: Getter<T>,
}

impl<T> FieldDef<T> {
    /// Whether `name` refers to this field, either by client name or column.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.column.eq_ignore_ascii_case(name)
    }

    pub fn setter(&self) -> Option<Setter<T>> {
        match self.access {
            Access::Writable(set) => Some(set),
            Access::Key | Access::ReadOnly => None,
        }
    }

    /// Columns written on insert: the key plus every writable field.
    pub fn is_inserted(&self) -> bool {
        !matches!(self.access, Access::ReadOnly)
    }
}

impl<T> fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// An entity with a static field table.
pub trait Schema: Sized + 'static {
    /// Entity name, used in error messages and as the entitlement resource.
    const ENTITY: &'static str;

    fn fields() -> &'static [FieldDef<Self>];

    fn id(&self) -> DbId;

    fn set_id(&mut self, id: DbId);

    /// Resolve a client-supplied field name.
    fn field(name: &str) -> Result<&'static FieldDef<Self>, QueryError> {
        let name = name.trim();
        Self::fields()
            .iter()
            .find(|f| f.matches_name(name))
            .ok_or_else(|| QueryError::UnknownProperty(name.to_string()))
    }

    fn searchable_fields() -> impl Iterator<Item = &'static FieldDef<Self>> {
        Self::fields().iter().filter(|f| f.searchable)
    }

    /// Check that every client-written field would round-trip through
    /// storage unchanged.
    fn check_storable(&self) -> Result<(), QueryError> {
        for field in Self::fields().iter().filter(|f| f.setter().is_some()) {
            if let Some(reason) = (field.get)(self).storage_issue() {
                return Err(QueryError::Unstorable {
                    property: field.name.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }
}
