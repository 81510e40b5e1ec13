//! Unified SQL checkpoint backend.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of `PositionBackend`.
///
/// Every operation acquires its own pooled connection, points it at the
/// configured schema and runs a single statement. The connection goes back
/// to the pool when the guard is dropped, on success and failure alike.
pub struct SqlPositionBackend<DB: SqlDatabase> {
    pool: DB::Pool,
    schema: String,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlPositionBackend<DB> {
    /// Create a new SQL backend with the given pool, storing checkpoints in
    /// `schema`.
    pub fn new(pool: DB::Pool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }

    /// Schema the checkpoint table lives in.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

/// Macro to implement `PositionBackend` for a specific SQL backend.
macro_rules! impl_position_backend {
    ($db_type:ty, $sqlx_db:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlPositionBackend<$db_type> {
            async fn scoped_connection(
                &self,
            ) -> crate::storage::Result<sqlx::pool::PoolConnection<$sqlx_db>> {
                let mut conn = self.pool.acquire().await?;
                if let Some(sql) = <$db_type>::select_schema(&self.schema) {
                    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&sql)).await?;
                }
                Ok(conn)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::PositionBackend for SqlPositionBackend<$db_type> {
            async fn init(&self) -> crate::storage::Result<()> {
                use crate::storage::schema::create_positions_table;

                let sql = <$db_type>::build_create(create_positions_table());
                let mut conn = self.scoped_connection().await?;
                sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&sql)).await?;

                Ok(())
            }

            async fn write(
                &self,
                key: &crate::storage::CheckpointKey,
                position: &crate::position::Position,
            ) -> crate::storage::Result<()> {
                use sea_query::{OnConflict, Query};

                use crate::storage::schema::Positions;
                use crate::storage::StorageError;

                let offset = i64::try_from(position.offset())
                    .map_err(|_| StorageError::OffsetOutOfRange(position.offset()))?;

                let stmt = Query::insert()
                    .into_table(Positions::Table)
                    .columns([
                        Positions::ServerId,
                        Positions::BinlogFile,
                        Positions::BinlogPosition,
                        Positions::ClientId,
                    ])
                    .values_panic([
                        i64::from(key.server_id).into(),
                        position.file().into(),
                        offset.into(),
                        key.client_id.as_str().into(),
                    ])
                    .on_conflict(
                        OnConflict::columns([Positions::ServerId, Positions::ClientId])
                            .update_columns([Positions::BinlogFile, Positions::BinlogPosition])
                            .to_owned(),
                    )
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);

                tracing::debug!(
                    schema = %self.schema,
                    server_id = key.server_id,
                    client_id = %key.client_id,
                    position = %position,
                    "Writing binlog position"
                );

                let mut conn = self.scoped_connection().await?;
                sqlx::query(&sql).execute(&mut *conn).await?;

                Ok(())
            }

            async fn read(
                &self,
                key: &crate::storage::CheckpointKey,
            ) -> crate::storage::Result<Option<crate::position::Position>> {
                use sea_query::{Expr, Query};
                use sqlx::Row;

                use crate::position::Position;
                use crate::storage::schema::Positions;
                use crate::storage::StorageError;

                let stmt = Query::select()
                    .columns([Positions::BinlogFile, Positions::BinlogPosition])
                    .from(Positions::Table)
                    .and_where(Expr::col(Positions::ServerId).eq(i64::from(key.server_id)))
                    .and_where(Expr::col(Positions::ClientId).eq(key.client_id.as_str()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let mut conn = self.scoped_connection().await?;
                let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;

                match row {
                    Some(row) => {
                        let file: String = row.try_get("binlog_file")?;
                        let offset: i64 = row.try_get("binlog_position")?;
                        let offset =
                            u64::try_from(offset).map_err(|_| StorageError::InvalidOffset {
                                server_id: key.server_id,
                                client_id: key.client_id.clone(),
                                offset,
                            })?;
                        Ok(Some(Position::new(file, offset)))
                    }
                    None => Ok(None),
                }
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_position_backend!(super::mysql::Mysql, sqlx::MySql, "mysql");
impl_position_backend!(super::postgres::Postgres, sqlx::Postgres, "postgres");
impl_position_backend!(super::sqlite::Sqlite, sqlx::Sqlite, "sqlite");

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::storage::sql::sqlite::SqlitePositionBackend;
    use crate::storage::{CheckpointKey, PositionBackend};

    fn assert_send<T: Send>(_: &T) {}

    async fn backend(dir: &tempfile::TempDir) -> SqlitePositionBackend {
        let uri = format!("sqlite://{}?mode=rwc", dir.path().join("positions.db").display());
        let pool = sqlx::SqlitePool::connect(&uri).await.unwrap();
        SqlPositionBackend::new(pool, "maxwell")
    }

    #[tokio::test]
    async fn test_scoped_connection_is_send() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = backend(&dir).await;

        let acquire = backend.scoped_connection();
        assert_send(&acquire);
        acquire.await.unwrap();
    }

    #[tokio::test]
    async fn test_init_runs_raw_ddl_and_is_repeatable() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = backend(&dir).await;
        let key = CheckpointKey::new(1, "maxwell");

        backend.init().await.unwrap();
        backend.init().await.unwrap();

        backend
            .write(&key, &Position::new("bin.000001", 154))
            .await
            .unwrap();
        assert_eq!(
            backend.read(&key).await.unwrap(),
            Some(Position::new("bin.000001", 154))
        );
    }
}
