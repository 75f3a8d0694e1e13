//! A small entity used by the unit tests in this crate.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::field::{Access, FieldDef, FieldKind, FieldValue, Schema};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: DbId,
    pub name: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

pub fn item(name: &str, amount: i64, note: Option<&str>) -> Item {
    Item {
        id: Uuid::now_v7(),
        name: name.to_string(),
        amount: Decimal::new(amount, 0),
        note: note.map(str::to_string),
        created_at: Timestamp::default(),
    }
}

static ITEM_FIELDS: &[FieldDef<Item>] = &[
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
        name: "note",
        column: "note",
        kind: FieldKind::Text,
        nullable: true,
        searchable: true,
        access: Access::Writable(|e, v| {
            e.note = v.into_opt_text()?;
            Ok(())
        }),
        get: |e| e.note.clone().into(),
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
];

impl Schema for Item {
    const ENTITY: &'static str = "Item";

    fn fields() -> &'static [FieldDef<Self>] {
        ITEM_FIELDS
    }

    fn id(&self) -> DbId {
        self.id
    }

    fn set_id(&mut self, id: DbId) {
        self.id = id;
    }
}
