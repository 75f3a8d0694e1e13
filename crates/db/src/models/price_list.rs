//! Price list model.

use pricing_core::field::{Access, FieldDef, FieldKind, FieldValue, Schema};
use pricing_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::query::Table;

/// A row from the `price_lists` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceList {
    #[serde(default)]
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub currency: String,
    pub is_active: bool,
    pub effective_from: Timestamp,
    pub effective_to: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

static PRICE_LIST_FIELDS: &[FieldDef<PriceList>] = &[
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
        name: "name",
        column: "name",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.name = v.into_text()?;
            Ok(())
        }),
        get: |e| e.name.clone().into(),
    },
    FieldDef {
        name: "code",
        column: "code",
        kind: FieldKind::Text,
        nullable: false,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.code = v.into_text()?;
            Ok(())
        }),
        get: |e| e.code.clone().into(),
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
        name: "effectiveFrom",
        column: "effective_from",
        kind: FieldKind::Timestamp,
        nullable: false,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.effective_from = v.into_timestamp()?;
            Ok(())
        }),
        get: |e| e.effective_from.into(),
    },
    FieldDef {
        name: "effectiveTo",
        column: "effective_to",
        kind: FieldKind::Timestamp,
        nullable: true,
        searchable: false,
        access: Access::Writable(|e, v| {
            e.effective_to = v.into_opt_timestamp()?;
            Ok(())
        }),
        get: |e| e.effective_to.into(),
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

impl Schema for PriceList {
    const ENTITY: &'static str = "PriceList";

    fn fields() -> &'static [FieldDef<Self>] {
        PRICE_LIST_FIELDS
    }

    fn id(&self) -> DbId {
        self.id
    }

    fn set_id(&mut self, id: DbId) {
        self.id = id;
    }
}

impl Table for PriceList {
    const TABLE: &'static str = "price_lists";
}
