//! Generic CRUD service, instantiated once per entity type.

use std::marker::PhantomData;

use pricing_core::error::CoreError;
use pricing_core::filter::FilterCriteria;
use pricing_core::patch::{PatchDocument, PatchOperation};
use pricing_core::query::{PageRequest, QueryPlan};
use pricing_core::types::DbId;
use pricing_db::query::Table;
use pricing_db::repositories::EntityRepo;
use pricing_db::DbPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Message for an update whose body id differs from the path id.
pub const MISMATCHED_ID: &str = "Mismatched Id";

/// Message for a PATCH without a document.
pub const MISSING_PATCH_DOCUMENT: &str = "Patch document is missing.";

/// CRUD operations for entity `T`.
///
/// Every input is validated before storage is touched. Each mutating
/// operation runs as one statement or one transaction.
pub struct EntityService<T> {
    pool: DbPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Table> EntityService<T> {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn not_found(id: DbId) -> CoreError {
        CoreError::NotFound {
            entity: T::ENTITY,
            id,
        }
    }

    /// Persist a new entity under a freshly generated id and return the id.
    ///
    /// Any id supplied by the client is discarded.
    pub async fn create(&self, mut entity: T) -> AppResult<DbId> {
        entity.check_storable()?;
        entity.set_id(Uuid::now_v7());
        let created = EntityRepo::<T>::create(&self.pool, &entity).await?;
        Ok(created.id())
    }

    /// Fetch one entity. A miss is `None`, not an error.
    pub async fn get_by_id(&self, id: DbId) -> AppResult<Option<T>> {
        Ok(EntityRepo::<T>::find_by_id(&self.pool, id).await?)
    }

    /// Filter, search, sort and page.
    ///
    /// Takes already validated page bounds. Every criterion and the sort are
    /// compiled before the database is queried.
    pub async fn get(
        &self,
        page: PageRequest,
        filters: &[FilterCriteria],
        search_term: Option<&str>,
        sort_field: Option<&str>,
        sort_order: &str,
    ) -> AppResult<Vec<T>> {
        let plan = QueryPlan::<T>::build(page, filters, search_term, sort_field, sort_order)?;
        Ok(EntityRepo::<T>::list(&self.pool, &plan).await?)
    }

    /// Replace every writable field of the entity at `id`.
    pub async fn update(&self, id: DbId, entity: T) -> AppResult<bool> {
        if entity.id() != id {
            return Err(CoreError::Validation(MISMATCHED_ID.to_string()).into());
        }
        entity.check_storable()?;
        EntityRepo::<T>::update(&self.pool, &entity)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Ok(true)
    }

    /// Apply a patch document to the entity at `id`.
    ///
    /// The document is compiled before the transaction starts. The row is
    /// locked while the operations are applied and written back.
    pub async fn patch(&self, id: DbId, document: Option<&[PatchOperation]>) -> AppResult<bool> {
        let operations = document
            .ok_or_else(|| CoreError::Validation(MISSING_PATCH_DOCUMENT.to_string()))?;
        let patch = PatchDocument::<T>::compile(operations)?;

        let mut tx = self.pool.begin().await?;
        let mut current = EntityRepo::<T>::find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        patch.apply(&mut current)?;

        EntityRepo::<T>::update(&mut *tx, &current)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        tx.commit().await?;

        Ok(true)
    }

    /// Delete the entity at `id`.
    pub async fn delete(&self, id: DbId) -> AppResult<bool> {
        if !EntityRepo::<T>::delete(&self.pool, id).await? {
            return Err(Self::not_found(id).into());
        }
        Ok(true)
    }
}
