//! Unified SQL storage implementations.
//!
//! This module provides the shared checkpoint backend for SQL databases
//! (MySQL, PostgreSQL, SQLite). The implementation is parameterized by
//! database type using the `SqlDatabase` trait.

mod position_store;
mod query;

pub use position_store::SqlPositionBackend;
pub use query::SqlDatabase;

#[cfg(feature = "mysql")]
pub mod mysql {
    //! MySQL database backend.

    use sea_query::MysqlQueryBuilder;
    use sqlx::MySqlPool;

    /// MySQL database marker type.
    pub struct Mysql;

    impl super::SqlDatabase for Mysql {
        type Pool = MySqlPool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(MysqlQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(MysqlQueryBuilder)
        }

        fn build_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.to_string(MysqlQueryBuilder)
        }

        fn select_schema(schema: &str) -> Option<String> {
            Some(format!("USE `{}`", schema.replace('`', "``")))
        }
    }

    /// MySQL checkpoint backend.
    pub type MysqlPositionBackend = super::SqlPositionBackend<Mysql>;
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn select_schema(schema: &str) -> Option<String> {
            Some(format!("SET search_path TO \"{}\"", schema.replace('"', "\"\"")))
        }
    }

    /// PostgreSQL checkpoint backend.
    pub type PostgresPositionBackend = super::SqlPositionBackend<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn select_schema(_schema: &str) -> Option<String> {
            None
        }
    }

    /// SQLite checkpoint backend.
    pub type SqlitePositionBackend = super::SqlPositionBackend<Sqlite>;
}
