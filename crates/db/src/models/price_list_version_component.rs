//! Price list version component model.

use pricing_core::field::{Access, FieldDef, FieldKind, FieldValue, Schema};
use pricing_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::query::Table;

/// A row from the `price_list_version_components` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListVersionComponent {
    #[serde(default)]
    pub id: DbId,
    pub price_list_id: DbId,
    pub version_number: i64,
    pub component_name: String,
    pub component_type: String,
    pub amount: Decimal,
    pub sequence: i64,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

static COMPONENT_FIELDS: &[FieldDef<PriceListVersionComponent>] = &[
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
        name: "priceListId",
        column: "price_list_id",
        kind: FieldKind::Uuid,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.price_list_id = v.into_uuid()?;
            Ok(())
        }),
        get: |e| e.price_list_id.into(),
    },
    FieldDef {
        name: "versionNumber",
        column: "version_number",
        kind: FieldKind::Integer,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.version_number = v.into_integer()?;
            Ok(())
        }),
        get: |e| e.version_number.into(),
    },
    FieldDef {
        name: "componentName",
        column: "component_name",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.component_name = v.into_text()?;
            Ok(())
        }),
        get: |e| e.component_name.clone().into(),
    },
    FieldDef {
        name: "componentType",
        column: "component_type",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.component_type = v.into_text()?;
            Ok(())
        }),
        get: |e| e.component_type.clone().into(),
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
        name: "sequence",
        column: "sequence",
        kind: FieldKind::Integer,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.sequence = v.into_integer()?;
            Ok(())
        }),
        get: |e| e.sequence.into(),
    },
    FieldDef {
        name: "isActive",
        column: "is_active",
        kind: FieldKind::Boolean,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.is_active = v.into_boolean()?;
            Ok(())
        }),
        get: |e| e.is_active.into(),
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

impl Schema for PriceListVersionComponent {
    const ENTITY: &'static str = "PriceListVersionComponent";

    fn fields() -> &'static [FieldDef<Self>] {
        COMPONENT_FIELDS
    }

    fn id(&self) -> DbId {
        self.id
    }

    fn set_id(&mut self, id: DbId) {
        self.id = id;
    }
}

impl Table for PriceListVersionComponent {
    const TABLE: &'static str = "price_list_version_components";
}
