//! Transaction model.

use pricing_core::field::{Access, FieldDef, FieldKind, FieldValue, Schema};
use pricing_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::query::Table;

/// A row from the `transactions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: DbId,
    pub reference: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub price_list_id: Option<DbId>,
    pub status: String,
    pub transaction_date: Timestamp,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

static TRANSACTION_FIELDS: &[FieldDef<Transaction>] = &[
    FieldDef {
        name: "id",
        column: "id",
        kind: FieldKind::Uuid,
        nullable: false,
        searchable: false,
        access: Access::Key,
        get: |e| e.id.into(),
    },
    FieldDef {
        name: "reference",
        column: "reference",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.reference = v.into_text()?;
            Ok(())
        }),
        get: |e| e.reference.clone().into(),
    },
    FieldDef {
        name: "description",
        column: "description",
        kind: FieldKind::Text,
        nullable: true,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.description = v.into_opt_text()?;
            Ok(())
        }),
        get: |e| e.description.clone().into(),
    },
    FieldDef {
        name: "amount",
        column: "amount",
        kind: FieldKind::Decimal,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.amount = v.into_decimal()?;
            Ok(())
        }),
        get: |e| e.amount.into(),
    },
    FieldDef {
        name: "currency",
        column: "currency",
        kind: FieldKind::Text,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.currency = v.into_text()?;
            Ok(())
        }),
        get: |e| e.currency.clone().into(),
    },
    FieldDef {
        name: "priceListId",
        column: "price_list_id",
        kind: FieldKind::Uuid,
        nullable: true,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.price_list_id = v.into_opt_uuid()?;
            Ok(())
        }),
        get: |e| e.price_list_id.into(),
    },
    FieldDef {
        name: "status",
        column: "status",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.status = v.into_text()?;
            Ok(())
        }),
        get: |e| e.status.clone().into(),
    },
    FieldDef {
        name: "transactionDate",
        column: "transaction_date",
        kind: FieldKind::Timestamp,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.transaction_date = v.into_timestamp()?;
            Ok(())
        }),
        get: |e| e.transaction_date.into(),
    },
    FieldDef {
        name: "createdAt",
        column: "created_at",
        kind: FieldKind::Timestamp,
        nullable: false,
        searchable: false,
        access: Access::ReadOnly,
        get: |e| FieldValue::Timestamp(e.created_at),
    },
    FieldDef {
        name: "updatedAt",
        column: "updated_at",
        kind: FieldKind::Timestamp,
        nullable: false,
        searchable: false,
        access: Access::ReadOnly,
        get: |e| FieldValue::Timestamp(e.updated_at),
    },
];

impl Schema for Transaction {
    const ENTITY: &'static str = "Transaction";

    fn fields() -> &'static [FieldDef<Self>] {
        TRANSACTION_FIELDS
    }

    fn id(&self) -> DbId {
        self.id
    }

    fn set_id(&mut self, id: DbId) {
        self.id = id;
    }
}

impl Table for Transaction {
    const TABLE: &'static str = "transactions";
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pricing_core::filter::{FilterCriteria, FilterOperator};
    use pricing_core::patch::{PatchDocument, PatchOperation};
    use pricing_core::query::{PageRequest, QueryError, QueryPlan};
    use serde_json::json;
    use uuid::Uuid;

    pub(crate) fn sample_transaction() -> Transaction {
        Transaction {
            id: Uuid::now_v7(),
            reference: "INV-001".to_string(),
            description: Some("Opening order".to_string()),
            amount: Decimal::new(1999, 2),
            currency: "USD".to_string(),
            price_list_id: None,
            status: "Pending".to_string(),
            transaction_date: Timestamp::default(),
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    fn with(reference: &str, amount: i64, status: &str) -> Transaction {
        Transaction {
            reference: reference.to_string(),
            amount: Decimal::new(amount, 0),
            status: status.to_string(),
            ..sample_transaction()
        }
    }

    #[test]
    fn amount_greater_than_with_sort_desc() {
        let plan = QueryPlan::<Transaction>::build(
            PageRequest::new(1, 2).unwrap(),
            &[FilterCriteria::new("amount", FilterOperator::GreaterThan, "10")],
            None,
            Some("amount"),
            "desc",
        )
        .unwrap();
        let kept = plan.apply(vec![
            with("A", 5, "Paid"),
            with("B", 20, "Paid"),
            with("C", 30, "Paid"),
            with("D", 15, "Paid"),
        ]);
        let refs: Vec<&str> = kept.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(refs, vec!["C", "B"]);
    }

    #[test]
    fn search_matches_status_case_insensitively() {
        let plan =
            QueryPlan::<Transaction>::build(PageRequest::default(), &[], Some("PAID"), None, "asc")
                .unwrap();
        let kept = plan.apply(vec![with("A", 1, "paid"), with("B", 2, "Pending")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].reference, "A");
    }

    #[test]
    fn patch_replaces_amount_and_keeps_other_fields() {
        let mut tx = sample_transaction();
        let before = tx.clone();
        PatchDocument::<Transaction>::compile(&[PatchOperation::replace("/amount", json!(42.5))])
            .unwrap()
            .apply(&mut tx)
            .unwrap();
        assert_eq!(tx.amount, Decimal::new(425, 1));
        assert_eq!(
            Transaction {
                amount: before.amount,
                ..tx.clone()
            },
            before
        );
    }

    #[test]
    fn body_values_storage_would_alter_are_rejected() {
        assert_eq!(sample_transaction().check_storable(), Ok(()));

        let nul = Transaction {
            reference: "nul\0byte".to_string(),
            ..sample_transaction()
        };
        assert_matches!(
            nul.check_storable(),
            Err(QueryError::Unstorable { ref property, .. }) if property == "reference"
        );

        let nanos = Transaction {
            transaction_date: "2024-06-01T12:00:00.123456789Z".parse().unwrap(),
            ..sample_transaction()
        };
        assert_matches!(
            nanos.check_storable(),
            Err(QueryError::Unstorable { ref property, .. }) if property == "transactionDate"
        );
    }

    #[test]
    fn decimal_amounts_serialize_as_strings() {
        let json = serde_json::to_value(sample_transaction()).unwrap();
        assert_eq!(json["amount"], json!("19.99"));
        assert_eq!(json["priceListId"], json!(null));
    }
}
