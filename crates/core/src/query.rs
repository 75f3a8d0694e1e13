//! Filter, search, sort and pagination compiled into a [`QueryPlan`].
//!
//! A plan is built once per list request from client input and validated
//! against the entity's field table before any storage is touched. It can be
//! rendered to SQL (see `pricing_db::query`) or evaluated directly over a
//! slice of entities with [`QueryPlan::apply`]; both must select and order
//! the same rows.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::field::{FieldDef, FieldValue, Schema};
use crate::filter::{FilterCriteria, FilterOperator};

/// Default page number when the client sends none.
pub const DEFAULT_PAGE_NUMBER: i64 = 1;

/// Default page size when the client sends none.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Default sort direction token.
pub const DEFAULT_SORT_ORDER: &str = "asc";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can be wrong with filter, sort, page or patch input.
///
/// All variants are caller errors and surface as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Unsupported filter operator '{0}'")]
    UnsupportedOperator(String),

    #[error("Invalid value '{value}' for property '{property}': expected {expected}")]
    InvalidValue {
        property: String,
        value: String,
        expected: &'static str,
    },

    #[error("Operator '{operator}' requires an orderable property, but '{property}' is {kind}")]
    NotOrderable {
        property: String,
        operator: &'static str,
        kind: &'static str,
    },

    #[error("Operator '{operator}' requires a text property, but '{property}' is {kind}")]
    NotText {
        property: String,
        operator: &'static str,
        kind: &'static str,
    },

    #[error("Operator '{operator}' cannot compare property '{property}' with null")]
    NullComparison {
        property: String,
        operator: &'static str,
    },

    #[error("Malformed filters: {0}")]
    MalformedFilters(String),

    #[error("Invalid sort order '{0}'. Use 'asc' or 'desc'")]
    InvalidSortOrder(String),

    #[error("Page size invalid.")]
    InvalidPageSize,

    #[error("Page number invalid.")]
    InvalidPageNumber,

    #[error("Page is out of range.")]
    PageOutOfRange,

    #[error("Property '{0}' is read-only")]
    ReadOnlyProperty(String),

    #[error("Property '{0}' cannot be null")]
    NotNullable(String),

    #[error("Unsupported patch operation '{0}'")]
    UnsupportedPatchOperation(String),

    #[error("Invalid patch path '{0}'")]
    InvalidPatchPath(String),

    #[error("Patch operation '{op}' on '{path}' requires a value")]
    MissingPatchValue { op: String, path: String },

    #[error("Invalid value for property '{property}': {reason}")]
    Unstorable {
        property: String,
        reason: &'static str,
    },

    #[error("Value does not match field type {expected}")]
    TypeMismatch { expected: &'static str },
}

impl From<QueryError> for CoreError {
    fn from(err: QueryError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// A validated offset page: `pageNumber >= 1`, `pageSize >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_size: i64,
    offset: i64,
}

impl PageRequest {
    /// Validate page bounds. Out-of-range input is an error, never clamped.
    pub fn new(page_number: i64, page_size: i64) -> Result<Self, QueryError> {
        if page_size < 1 {
            return Err(QueryError::InvalidPageSize);
        }
        if page_number < 1 {
            return Err(QueryError::InvalidPageNumber);
        }
        let offset = (page_number - 1)
            .checked_mul(page_size)
            .ok_or(QueryError::PageOutOfRange)?;

        Ok(Self { page_size, offset })
    }

    /// Number of rows to take (`LIMIT`).
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Number of rows to skip (`OFFSET`).
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Skip/take over an already filtered and ordered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(QueryError::InvalidSortOrder(token.to_string()))
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A resolved sort: the entity's id is always the tiebreaker, in the same
/// direction, so ascending and descending are exact reverses.
#[derive(Debug)]
pub struct SortSpec<T: 'static> {
    pub field: &'static FieldDef<T>,
    pub direction: SortDirection,
}

impl<T: Schema> SortSpec<T> {
    /// Resolve a sort request. A missing or blank field means "no sort", in
    /// which case the direction token is not examined.
    pub fn resolve(field: Option<&str>, order: &str) -> Result<Option<Self>, QueryError> {
        let Some(name) = field.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(None);
        };
        let field = T::field(name)?;
        let direction = order.parse()?;
        Ok(Some(Self { field, direction }))
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        let ordering = (self.field.get)(a)
            .sort_cmp(&(self.field.get)(b))
            .then_with(|| a.id().cmp(&b.id()));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A compiled, type-checked filter criterion.
#[derive(Debug)]
pub struct Condition<T: 'static> {
    pub field: &'static FieldDef<T>,
    pub operator: FilterOperator,
    /// Converted to the field's kind, or [`FieldValue::Null`].
    pub value: FieldValue,
}

impl<T: Schema> Condition<T> {
    pub fn compile(criteria: &FilterCriteria) -> Result<Self, QueryError> {
        let field = T::field(&criteria.property_name)?;
        let operator: FilterOperator = criteria.operator.parse()?;

        if operator.is_ordering() && !field.kind.is_orderable() {
            return Err(QueryError::NotOrderable {
                property: field.name.to_string(),
                operator: operator.as_str(),
                kind: field.kind.name(),
            });
        }
        if operator.is_substring() && !field.kind.is_text() {
            return Err(QueryError::NotText {
                property: field.name.to_string(),
                operator: operator.as_str(),
                kind: field.kind.name(),
            });
        }

        let wants_null = field.nullable
            && !operator.is_substring()
            && criteria.value.trim().eq_ignore_ascii_case("null");
        let value = if wants_null {
            if operator.is_ordering() {
                return Err(QueryError::NullComparison {
                    property: field.name.to_string(),
                    operator: operator.as_str(),
                });
            }
            FieldValue::Null
        } else {
            field
                .kind
                .parse(&criteria.value)
                .ok_or_else(|| QueryError::InvalidValue {
                    property: field.name.to_string(),
                    value: criteria.value.clone(),
                    expected: field.kind.name(),
                })?
        };

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Evaluate against one entity with SQL semantics: ordering and
    /// substring comparisons involving NULL are false, `NotEqual` behaves
    /// like `IS DISTINCT FROM`.
    pub fn holds(&self, item: &T) -> bool {
        let actual = (self.field.get)(item);
        let ordering = || actual.compare(&self.value);

        match self.operator {
            FilterOperator::Equal => actual == self.value,
            FilterOperator::NotEqual => actual != self.value,
            FilterOperator::GreaterThan => ordering() == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => {
                matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOperator::LessThan => ordering() == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => {
                matches!(ordering(), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                match (actual.as_text(), self.value.as_text()) {
                    (Some(haystack), Some(needle)) => match self.operator {
                        FilterOperator::Contains => haystack.contains(needle),
                        FilterOperator::StartsWith => haystack.starts_with(needle),
                        _ => haystack.ends_with(needle),
                    },
                    _ => false,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A fully validated list query for entity `T`.
#[derive(Debug)]
pub struct QueryPlan<T: 'static> {
    conditions: Vec<Condition<T>>,
    search: Option<String>,
    sort: Option<SortSpec<T>>,
    page: PageRequest,
}

impl<T: Schema> QueryPlan<T> {
    /// Compile client input into a plan.
    ///
    /// `page` is validated by the caller first so that bad bounds fail before
    /// any other work. Criteria compile in list order and the first failure
    /// is returned.
    pub fn build(
        page: PageRequest,
        filters: &[FilterCriteria],
        search_term: Option<&str>,
        sort_field: Option<&str>,
        sort_order: &str,
    ) -> Result<Self, QueryError> {
        let conditions = filters
            .iter()
            .map(Condition::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let search = search_term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let sort = SortSpec::resolve(sort_field, sort_order)?;

        Ok(Self {
            conditions,
            search,
            sort,
            page,
        })
    }

    pub fn conditions(&self) -> &[Condition<T>] {
        &self.conditions
    }

    /// The trimmed, non-empty search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort(&self) -> Option<&SortSpec<T>> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// Whether `item` satisfies every condition and the search term.
    pub fn matches(&self, item: &T) -> bool {
        self.conditions.iter().all(|c| c.holds(item)) && self.matches_search(item)
    }

    fn matches_search(&self, item: &T) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let mut fields = T::searchable_fields().peekable();
        if fields.peek().is_none() {
            return true;
        }
        let needle = term.to_lowercase();
        fields.any(|f| {
            (f.get)(item)
                .as_text()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
        })
    }

    /// Filter, order and page an in-memory collection.
    ///
    /// Text ordering here is by code point, whereas the database orders by
    /// its collation.
    pub fn apply(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut selected: Vec<T> = items.into_iter().filter(|i| self.matches(i)).collect();
        if let Some(sort) = &self.sort {
            selected.sort_by(|a, b| sort.compare(a, b));
        }
        self.page.slice(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, Item};
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;

    fn plan(filters: &[FilterCriteria]) -> QueryPlan<Item> {
        QueryPlan::build(PageRequest::new(1, 100).unwrap(), filters, None, None, "asc")
            .expect("plan compiles")
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    fn sample() -> Vec<Item> {
        vec![
            item("A", 10, Some("first entry")),
            item("B", 20, None),
            item("C", 30, Some("Third Entry")),
        ]
    }

    // -- Pagination ---------------------------------------------------------

    #[test]
    fn page_bounds_are_validated() {
        assert_eq!(PageRequest::new(1, 0), Err(QueryError::InvalidPageSize));
        assert_eq!(PageRequest::new(0, 10), Err(QueryError::InvalidPageNumber));
        assert_eq!(PageRequest::new(-3, -1), Err(QueryError::InvalidPageSize));
        assert_eq!(
            PageRequest::new(i64::MAX, 2),
            Err(QueryError::PageOutOfRange)
        );
    }

    #[test]
    fn page_offset_is_skip_then_take() {
        let page = PageRequest::new(3, 4).unwrap();
        assert_eq!(page.offset(), 8);
        assert_eq!(page.limit(), 4);
        assert_eq!(page.slice(0..20), vec![8, 9, 10, 11]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = PageRequest::new(5, 10).unwrap();
        assert!(page.slice(0..20).is_empty());
    }

    // -- Compilation --------------------------------------------------------

    #[test]
    fn unknown_property_names_the_property() {
        let err = QueryPlan::<Item>::build(
            PageRequest::default(),
            &[FilterCriteria::new("colour", FilterOperator::Equal, "red")],
            None,
            None,
            "asc",
        )
        .unwrap_err();
        assert_eq!(err, QueryError::UnknownProperty("colour".to_string()));
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn property_names_are_case_insensitive() {
        let p = plan(&[FilterCriteria::new("AMOUNT", FilterOperator::Equal, "20")]);
        assert_eq!(p.conditions()[0].field.name, "amount");
    }

    #[test]
    fn ordering_operator_on_unorderable_field_is_a_type_error() {
        let err = Condition::<Item>::compile(&FilterCriteria::new(
            "name",
            FilterOperator::GreaterThan,
            "B",
        ))
        .unwrap_err();
        assert_matches!(err, QueryError::NotOrderable { ref property, .. } if property == "name");
    }

    #[test]
    fn contains_on_non_text_field_is_a_type_error() {
        let err = Condition::<Item>::compile(&FilterCriteria::new(
            "amount",
            FilterOperator::Contains,
            "1",
        ))
        .unwrap_err();
        assert_matches!(err, QueryError::NotText { .. });
    }

    #[test]
    fn malformed_value_is_rejected() {
        let err = Condition::<Item>::compile(&FilterCriteria::new(
            "amount",
            FilterOperator::Equal,
            "lots",
        ))
        .unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidValue {
                property: "amount".to_string(),
                value: "lots".to_string(),
                expected: "decimal",
            }
        );
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let criteria = FilterCriteria {
            property_name: "name".to_string(),
            operator: "Matches".to_string(),
            value: "x".to_string(),
        };
        assert_eq!(
            Condition::<Item>::compile(&criteria).unwrap_err(),
            QueryError::UnsupportedOperator("Matches".to_string())
        );
    }

    #[test]
    fn null_literal_only_applies_to_nullable_fields() {
        let c = Condition::<Item>::compile(&FilterCriteria::new(
            "note",
            FilterOperator::Equal,
            "NULL",
        ))
        .unwrap();
        assert_eq!(c.value, FieldValue::Null);

        let c = Condition::<Item>::compile(&FilterCriteria::new(
            "name",
            FilterOperator::Equal,
            "null",
        ))
        .unwrap();
        assert_eq!(c.value, FieldValue::Text("null".to_string()));
    }

    // -- Evaluation ---------------------------------------------------------

    #[test]
    fn criteria_combine_conjunctively() {
        let p = plan(&[
            FilterCriteria::new("amount", FilterOperator::GreaterThan, "10"),
            FilterCriteria::new("name", FilterOperator::NotEqual, "C"),
        ]);
        let result = p.apply(sample());
        assert_eq!(names(&result), vec!["B"]);
        assert!(result.iter().all(|i| p.conditions().iter().all(|c| c.holds(i))));
    }

    #[test]
    fn rejected_items_fail_at_least_one_criterion() {
        let p = plan(&[
            FilterCriteria::new("amount", FilterOperator::GreaterThanOrEqual, "20"),
            FilterCriteria::new("note", FilterOperator::Contains, "Entry"),
        ]);
        let all = sample();
        let kept = p.apply(all.clone());
        assert_eq!(names(&kept), vec!["C"]);
        for rejected in all.iter().filter(|i| !kept.contains(i)) {
            assert!(p.conditions().iter().any(|c| !c.holds(rejected)));
        }
    }

    #[test]
    fn not_equal_treats_null_as_distinct() {
        let p = plan(&[FilterCriteria::new(
            "note",
            FilterOperator::NotEqual,
            "first entry",
        )]);
        assert_eq!(names(&p.apply(sample())), vec!["B", "C"]);
    }

    #[test]
    fn equal_null_selects_missing_values() {
        let p = plan(&[FilterCriteria::new("note", FilterOperator::Equal, "null")]);
        assert_eq!(names(&p.apply(sample())), vec!["B"]);
    }

    #[test]
    fn substring_operators_are_case_sensitive() {
        let p = plan(&[FilterCriteria::new("note", FilterOperator::Contains, "entry")]);
        assert_eq!(names(&p.apply(sample())), vec!["A"]);

        let p = plan(&[FilterCriteria::new("note", FilterOperator::StartsWith, "Third")]);
        assert_eq!(names(&p.apply(sample())), vec!["C"]);

        let p = plan(&[FilterCriteria::new("note", FilterOperator::EndsWith, "Entry")]);
        assert_eq!(names(&p.apply(sample())), vec!["C"]);
    }

    #[test]
    fn search_is_case_insensitive_across_searchable_fields() {
        let p = QueryPlan::<Item>::build(
            PageRequest::default(),
            &[],
            Some("  ENTRY "),
            None,
            "asc",
        )
        .unwrap();
        assert_eq!(p.search_term(), Some("ENTRY"));
        assert_eq!(names(&p.apply(sample())), vec!["A", "C"]);

        let p = QueryPlan::<Item>::build(PageRequest::default(), &[], Some("b"), None, "asc")
            .unwrap();
        assert_eq!(names(&p.apply(sample())), vec!["B"]);
    }

    #[test]
    fn blank_search_term_is_ignored() {
        let p = QueryPlan::<Item>::build(PageRequest::default(), &[], Some("   "), None, "asc")
            .unwrap();
        assert!(p.search_term().is_none());
        assert_eq!(p.apply(sample()).len(), 3);
    }

    // -- Sorting ------------------------------------------------------------

    #[test]
    fn sort_desc_with_page_size_two_returns_top_two() {
        let p = QueryPlan::<Item>::build(
            PageRequest::new(1, 2).unwrap(),
            &[],
            None,
            Some("amount"),
            "desc",
        )
        .unwrap();
        assert_eq!(names(&p.apply(sample())), vec!["C", "B"]);
    }

    #[test]
    fn ascending_and_descending_are_exact_reverses() {
        let mut items = sample();
        items.push(item("D", 20, None));
        items.push(item("E", 10, Some("x")));

        let asc = QueryPlan::<Item>::build(
            PageRequest::new(1, 50).unwrap(),
            &[],
            None,
            Some("amount"),
            "ASC",
        )
        .unwrap()
        .apply(items.clone());
        let mut desc = QueryPlan::<Item>::build(
            PageRequest::new(1, 50).unwrap(),
            &[],
            None,
            Some("amount"),
            "Desc",
        )
        .unwrap()
        .apply(items);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn nulls_sort_last_ascending() {
        let p = QueryPlan::<Item>::build(
            PageRequest::default(),
            &[],
            None,
            Some("note"),
            "asc",
        )
        .unwrap();
        assert_eq!(names(&p.apply(sample())), vec!["C", "A", "B"]);
    }

    #[test]
    fn missing_sort_field_preserves_input_order() {
        let p = QueryPlan::<Item>::build(PageRequest::default(), &[], None, Some(""), "bogus")
            .unwrap();
        assert!(p.sort().is_none());
        assert_eq!(names(&p.apply(sample())), vec!["A", "B", "C"]);
    }

    #[test]
    fn invalid_sort_order_is_rejected() {
        let err = QueryPlan::<Item>::build(
            PageRequest::default(),
            &[],
            None,
            Some("amount"),
            "sideways",
        )
        .unwrap_err();
        assert_eq!(err, QueryError::InvalidSortOrder("sideways".to_string()));
        assert!(err.to_string().starts_with("Invalid sort order"));
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = QueryPlan::<Item>::build(
            PageRequest::default(),
            &[],
            None,
            Some("weight"),
            "asc",
        )
        .unwrap_err();
        assert_eq!(err, QueryError::UnknownProperty("weight".to_string()));
    }

    #[test]
    fn query_errors_become_validation_errors() {
        let core: CoreError = QueryError::InvalidPageSize.into();
        assert_matches!(core, CoreError::Validation(msg) if msg == "Page size invalid.");
    }

    #[test]
    fn decimal_filters_compare_numerically() {
        let p = plan(&[FilterCriteria::new("amount", FilterOperator::Equal, "20.00")]);
        let result = p.apply(sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].amount, Decimal::new(20, 0));
    }
}
