//! Generic repository over any [`Table`].

use std::marker::PhantomData;

use pricing_core::query::QueryPlan;
use pricing_core::types::DbId;
use sqlx::{Executor, PgPool, Postgres};

use crate::query::{self, bind_values, Table};

/// Provides CRUD operations for the table behind `T`.
pub struct EntityRepo<T>(PhantomData<T>);

impl<T: Table> EntityRepo<T> {
    /// Insert a row, returning it as stored.
    pub async fn create<'e, E>(executor: E, entity: &T) -> Result<T, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stmt = query::build_insert(entity);
        bind_values(sqlx::query_as::<_, T>(&stmt.sql), &stmt.binds)
            .fetch_one(executor)
            .await
    }

    /// Find a row by primary key.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<T>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stmt = query::build_find::<T>(id, false);
        bind_values(sqlx::query_as::<_, T>(&stmt.sql), &stmt.binds)
            .fetch_optional(executor)
            .await
    }

    /// Find a row by primary key and lock it until the surrounding
    /// transaction ends.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<T>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stmt = query::build_find::<T>(id, true);
        bind_values(sqlx::query_as::<_, T>(&stmt.sql), &stmt.binds)
            .fetch_optional(executor)
            .await
    }

    /// Run a compiled list query.
    pub async fn list(pool: &PgPool, plan: &QueryPlan<T>) -> Result<Vec<T>, sqlx::Error> {
        let stmt = query::build_list(plan);
        tracing::debug!(entity = T::ENTITY, sql = %stmt.sql, binds = stmt.binds.len(), "List query");
        bind_values(sqlx::query_as::<_, T>(&stmt.sql), &stmt.binds)
            .fetch_all(pool)
            .await
    }

    /// Replace every writable column of the row with `entity.id()`.
    ///
    /// Returns `None` if no such row exists.
    pub async fn update<'e, E>(executor: E, entity: &T) -> Result<Option<T>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stmt = query::build_update(entity);
        bind_values(sqlx::query_as::<_, T>(&stmt.sql), &stmt.binds)
            .fetch_optional(executor)
            .await
    }

    /// Delete a row by primary key. Returns `true` if a row was removed.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stmt = query::build_delete::<T>(id);
        let deleted = bind_values(sqlx::query_as::<_, (DbId,)>(&stmt.sql), &stmt.binds)
            .fetch_optional(executor)
            .await?;
        Ok(deleted.is_some())
    }
}
