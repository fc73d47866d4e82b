//! PostgreSQL-backed harbor repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::models::{HarborRow, NewHarborRow};
use super::pool::{DbPool, PoolError};
use super::schema::harbors;
use crate::domain::ports::{HarborRepository, HarborRepositoryError};
use crate::domain::{Harbor, Unloc};

/// Diesel-backed implementation of [`HarborRepository`].
#[derive(Clone)]
pub struct DieselHarborRepository {
    pool: DbPool,
}

impl DieselHarborRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: &PoolError) -> HarborRepositoryError {
    HarborRepositoryError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> HarborRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    let message = error.to_string();
    debug!(%message, %operation, "diesel operation failed");
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => HarborRepositoryError::connection(message),
        _ => HarborRepositoryError::query(message),
    }
}

#[async_trait]
impl HarborRepository for DieselHarborRepository {
    async fn upsert_harbor(&self, harbor: &Harbor) -> Result<(), HarborRepositoryError> {
        let row = NewHarborRow::from(harbor);
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;

        diesel::insert_into(harbors::table)
            .values(&row)
            .on_conflict(harbors::unloc)
            .do_update()
            .set((
                harbors::name.eq(excluded(harbors::name)),
                harbors::city.eq(excluded(harbors::city)),
                harbors::country.eq(excluded(harbors::country)),
                harbors::alias.eq(excluded(harbors::alias)),
                harbors::regions.eq(excluded(harbors::regions)),
                harbors::coordinates.eq(excluded(harbors::coordinates)),
                harbors::province.eq(excluded(harbors::province)),
                harbors::timezone.eq(excluded(harbors::timezone)),
                harbors::unlocs.eq(excluded(harbors::unlocs)),
                harbors::code.eq(excluded(harbors::code)),
                harbors::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "harbor upsert"))?;

        Ok(())
    }

    async fn find_by_unloc(&self, unloc: &Unloc) -> Result<Option<Harbor>, HarborRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;

        let row = harbors::table
            .find(unloc.as_str())
            .select(HarborRow::as_select())
            .first::<HarborRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "harbor lookup"))?;

        row.map(Harbor::try_from).transpose()
    }
}
