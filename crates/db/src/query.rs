//! SQL rendering for entity tables.
//!
//! Statements are assembled as strings with numbered `$n` placeholders and a
//! parallel list of typed [`BindValue`]s. Column names only ever come from the
//! static field tables; client input only ever reaches the database as a bind.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

use pricing_core::field::{Access, FieldKind, FieldValue, Schema};
use pricing_core::filter::FilterOperator;
use pricing_core::query::{Condition, QueryPlan};
use pricing_core::types::{DbId, Timestamp};

/// An entity stored in its own table.
pub trait Table: Schema + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin {
    const TABLE: &'static str;

    /// Column refreshed with `NOW()` on every update.
    const TOUCH_COLUMN: Option<&'static str> = Some("updated_at");
}

/// A typed bind value. The kind is kept so NULLs bind with the right type.
#[derive(Debug, Clone, PartialEq)]
pub struct BindValue {
    pub kind: FieldKind,
    pub value: FieldValue,
}

/// A rendered statement and its binds, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Push a bind and return its placeholder.
fn push_bind(binds: &mut Vec<BindValue>, kind: FieldKind, value: FieldValue) -> String {
    binds.push(BindValue { kind, value });
    format!("${}", binds.len())
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Every column, in field-table order.
pub fn select_columns<T: Table>() -> String {
    T::fields()
        .iter()
        .map(|f| f.column)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The primary key column.
pub fn key_column<T: Table>() -> &'static str {
    T::fields()
        .iter()
        .find(|f| matches!(f.access, Access::Key))
        .map_or("id", |f| f.column)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

fn render_condition<T: Table>(condition: &Condition<T>, binds: &mut Vec<BindValue>) -> String {
    let column = condition.field.column;
    let kind = condition.field.kind;

    if condition.value.is_null() {
        return match condition.operator {
            FilterOperator::NotEqual => format!("{column} IS NOT NULL"),
            _ => format!("{column} IS NULL"),
        };
    }

    let comparison = match condition.operator {
        FilterOperator::Equal => "=",
        FilterOperator::NotEqual => "IS DISTINCT FROM",
        FilterOperator::GreaterThan => ">",
        FilterOperator::GreaterThanOrEqual => ">=",
        FilterOperator::LessThan => "<",
        FilterOperator::LessThanOrEqual => "<=",
        FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
            let needle = escape_like(condition.value.as_text().unwrap_or_default());
            let pattern = match condition.operator {
                FilterOperator::Contains => format!("%{needle}%"),
                FilterOperator::StartsWith => format!("{needle}%"),
                _ => format!("%{needle}"),
            };
            let p = push_bind(binds, FieldKind::Text, FieldValue::Text(pattern));
            return format!("{column} LIKE {p} ESCAPE '\\'");
        }
    };

    let p = push_bind(binds, kind, condition.value.clone());
    format!("{column} {comparison} {p}")
}

fn render_search<T: Table>(term: &str, binds: &mut Vec<BindValue>) -> Option<String> {
    let columns: Vec<&str> = T::searchable_fields().map(|f| f.column).collect();
    if columns.is_empty() {
        return None;
    }
    let pattern = format!("%{}%", escape_like(term));
    let p = push_bind(binds, FieldKind::Text, FieldValue::Text(pattern));
    let clauses: Vec<String> = columns
        .iter()
        .map(|c| format!("{c} ILIKE {p} ESCAPE '\\'"))
        .collect();
    Some(format!("({})", clauses.join(" OR ")))
}

/// `SELECT ... WHERE ... ORDER BY ... LIMIT ... OFFSET ...` for a list plan.
pub fn build_list<T: Table>(plan: &QueryPlan<T>) -> Statement {
    let mut binds = Vec::new();
    let mut conditions: Vec<String> = plan
        .conditions()
        .iter()
        .map(|c| render_condition(c, &mut binds))
        .collect();

    if let Some(term) = plan.search_term() {
        if let Some(clause) = render_search::<T>(term, &mut binds) {
            conditions.push(clause);
        }
    }

    let mut sql = format!("SELECT {} FROM {}", select_columns::<T>(), T::TABLE);

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(sort) = plan.sort() {
        let dir = sort.direction.as_sql();
        let key = key_column::<T>();
        sql.push_str(&format!(" ORDER BY {} {dir}", sort.field.column));
        if sort.field.column != key {
            sql.push_str(&format!(", {key} {dir}"));
        }
    }

    let page = plan.page();
    let limit = push_bind(&mut binds, FieldKind::Integer, FieldValue::Integer(page.limit()));
    let offset = push_bind(&mut binds, FieldKind::Integer, FieldValue::Integer(page.offset()));
    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

    Statement { sql, binds }
}

/// `SELECT ... WHERE id = $1`, optionally locking the row.
pub fn build_find<T: Table>(id: DbId, for_update: bool) -> Statement {
    let mut binds = Vec::new();
    let p = push_bind(&mut binds, FieldKind::Uuid, FieldValue::Uuid(id));
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} = {p}",
        select_columns::<T>(),
        T::TABLE,
        key_column::<T>()
    );
    if for_update {
        sql.push_str(" FOR UPDATE");
    }
    Statement { sql, binds }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// `INSERT ... RETURNING ...` writing the key and every writable field.
pub fn build_insert<T: Table>(entity: &T) -> Statement {
    let mut binds = Vec::new();
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();

    for field in T::fields().iter().filter(|f| f.is_inserted()) {
        columns.push(field.column);
        placeholders.push(push_bind(&mut binds, field.kind, (field.get)(entity)));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", "),
        select_columns::<T>()
    );
    Statement { sql, binds }
}

/// `UPDATE ... SET <writable fields> WHERE id = ... RETURNING ...`.
pub fn build_update<T: Table>(entity: &T) -> Statement {
    let mut binds = Vec::new();
    let mut sets: Vec<String> = T::fields()
        .iter()
        .filter(|f| f.setter().is_some())
        .map(|f| {
            let p = push_bind(&mut binds, f.kind, (f.get)(entity));
            format!("{} = {p}", f.column)
        })
        .collect();

    if let Some(touch) = T::TOUCH_COLUMN {
        sets.push(format!("{touch} = NOW()"));
    }

    let id = push_bind(&mut binds, FieldKind::Uuid, FieldValue::Uuid(entity.id()));
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {id} RETURNING {}",
        T::TABLE,
        sets.join(", "),
        key_column::<T>(),
        select_columns::<T>()
    );
    Statement { sql, binds }
}

/// `DELETE ... WHERE id = $1 RETURNING id`.
pub fn build_delete<T: Table>(id: DbId) -> Statement {
    let mut binds = Vec::new();
    let p = push_bind(&mut binds, FieldKind::Uuid, FieldValue::Uuid(id));
    let key = key_column::<T>();
    Statement {
        sql: format!("DELETE FROM {} WHERE {key} = {p} RETURNING {key}", T::TABLE),
        binds,
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind a slice of [`BindValue`]s to a sqlx `QueryAs`.
pub fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    binds: &'q [BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for bind in binds {
        q = match (&bind.value, bind.kind) {
            (FieldValue::Null, FieldKind::Uuid) => q.bind(None::<Uuid>),
            (FieldValue::Null, FieldKind::Text) => q.bind(None::<String>),
            (FieldValue::Null, FieldKind::Integer) => q.bind(None::<i64>),
            (FieldValue::Null, FieldKind::Decimal) => q.bind(None::<rust_decimal::Decimal>),
            (FieldValue::Null, FieldKind::Boolean) => q.bind(None::<bool>),
            (FieldValue::Null, FieldKind::Timestamp) => q.bind(None::<Timestamp>),
            (FieldValue::Uuid(v), _) => q.bind(*v),
            (FieldValue::Text(v), _) => q.bind(v.as_str()),
            (FieldValue::Integer(v), _) => q.bind(*v),
            (FieldValue::Decimal(v), _) => q.bind(*v),
            (FieldValue::Boolean(v), _) => q.bind(*v),
            (FieldValue::Timestamp(v), _) => q.bind(*v),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price_list_version_component::PriceListVersionComponent;
    use crate::models::transaction::Transaction;
    use pricing_core::filter::FilterCriteria;
    use pricing_core::query::PageRequest;
    use rust_decimal::Decimal;

    fn plan<T: Table>(
        filters: &[FilterCriteria],
        search: Option<&str>,
        sort: Option<&str>,
        order: &str,
        page: (i64, i64),
    ) -> QueryPlan<T> {
        QueryPlan::build(
            PageRequest::new(page.0, page.1).unwrap(),
            filters,
            search,
            sort,
            order,
        )
        .expect("plan compiles")
    }

    #[test]
    fn like_escaping_covers_wildcards() {
        assert_eq!(escape_like(r"50%_off\now"), r"50\%\_off\\now");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn unfiltered_list_only_pages() {
        let stmt = build_list(&plan::<Transaction>(&[], None, None, "asc", (1, 10)));
        assert!(stmt.sql.starts_with("SELECT id, reference, "));
        assert!(stmt.sql.ends_with(" FROM transactions LIMIT $1 OFFSET $2"));
        assert_eq!(
            stmt.binds,
            vec![
                BindValue { kind: FieldKind::Integer, value: FieldValue::Integer(10) },
                BindValue { kind: FieldKind::Integer, value: FieldValue::Integer(0) },
            ]
        );
    }

    #[test]
    fn criteria_render_as_conjunction_in_order() {
        let stmt = build_list(&plan::<Transaction>(
            &[
                FilterCriteria::new("amount", FilterOperator::GreaterThan, "10"),
                FilterCriteria::new("Status", FilterOperator::NotEqual, "void"),
                FilterCriteria::new("reference", FilterOperator::StartsWith, "INV_"),
            ],
            None,
            None,
            "asc",
            (2, 25),
        ));
        assert!(stmt.sql.contains(
            " WHERE amount > $1 AND status IS DISTINCT FROM $2 \
             AND reference LIKE $3 ESCAPE '\\' LIMIT $4 OFFSET $5"
        ));
        assert_eq!(stmt.binds[0].value, FieldValue::Decimal(Decimal::new(10, 0)));
        assert_eq!(stmt.binds[1].value, FieldValue::Text("void".to_string()));
        assert_eq!(stmt.binds[2].value, FieldValue::Text(r"INV\_%".to_string()));
        assert_eq!(stmt.binds[4].value, FieldValue::Integer(25));
    }

    #[test]
    fn null_comparisons_render_without_binds() {
        let stmt = build_list(&plan::<Transaction>(
            &[
                FilterCriteria::new("description", FilterOperator::Equal, "null"),
                FilterCriteria::new("priceListId", FilterOperator::NotEqual, "NULL"),
            ],
            None,
            None,
            "asc",
            (1, 10),
        ));
        assert!(stmt
            .sql
            .contains(" WHERE description IS NULL AND price_list_id IS NOT NULL LIMIT $1"));
        assert_eq!(stmt.binds.len(), 2);
    }

    #[test]
    fn search_reuses_one_placeholder_across_columns() {
        let stmt = build_list(&plan::<PriceListVersionComponent>(
            &[FilterCriteria::new("versionNumber", FilterOperator::Equal, "3")],
            Some("base 100%"),
            None,
            "asc",
            (1, 10),
        ));
        assert!(stmt.sql.contains(
            " WHERE version_number = $1 AND (component_name ILIKE $2 ESCAPE '\\' \
             OR component_type ILIKE $2 ESCAPE '\\') LIMIT $3 OFFSET $4"
        ));
        assert_eq!(stmt.binds[1].value, FieldValue::Text(r"%base 100\%%".to_string()));
    }

    #[test]
    fn sort_appends_key_tiebreaker_in_same_direction() {
        let stmt = build_list(&plan::<Transaction>(&[], None, Some("amount"), "DESC", (1, 2)));
        assert!(stmt
            .sql
            .ends_with(" ORDER BY amount DESC, id DESC LIMIT $1 OFFSET $2"));

        let stmt = build_list(&plan::<Transaction>(&[], None, Some("id"), "asc", (1, 2)));
        assert!(stmt.sql.ends_with(" ORDER BY id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn insert_writes_key_and_writable_columns_only() {
        let tx = crate::models::transaction::tests::sample_transaction();
        let stmt = build_insert(&tx);
        assert!(stmt.sql.starts_with(
            "INSERT INTO transactions (id, reference, description, amount, currency, \
             price_list_id, status, transaction_date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING "
        ));
        assert_eq!(stmt.binds.len(), 8);
        assert_eq!(stmt.binds[0].value, FieldValue::Uuid(tx.id));
        assert_eq!(
            stmt.binds[5],
            BindValue { kind: FieldKind::Uuid, value: FieldValue::Null }
        );
    }

    #[test]
    fn update_sets_writable_columns_and_touches_updated_at() {
        let tx = crate::models::transaction::tests::sample_transaction();
        let stmt = build_update(&tx);
        assert!(stmt.sql.starts_with(
            "UPDATE transactions SET reference = $1, description = $2, amount = $3, \
             currency = $4, price_list_id = $5, status = $6, transaction_date = $7, \
             updated_at = NOW() WHERE id = $8 RETURNING "
        ));
        assert_eq!(stmt.binds.last().map(|b| &b.value), Some(&FieldValue::Uuid(tx.id)));
    }

    #[test]
    fn find_and_delete_target_the_key() {
        let id = Uuid::now_v7();
        let find = build_find::<Transaction>(id, true);
        assert!(find.sql.ends_with(" FROM transactions WHERE id = $1 FOR UPDATE"));

        let delete = build_delete::<Transaction>(id);
        assert_eq!(
            delete.sql,
            "DELETE FROM transactions WHERE id = $1 RETURNING id"
        );
        assert_eq!(delete.binds[0].value, FieldValue::Uuid(id));
    }
}
