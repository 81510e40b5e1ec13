//! SQL database abstraction trait.

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (MySQL, PostgreSQL,
/// SQLite) by providing the pool type and query building methods.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// Build a SQL query string from a sea-query SELECT statement.
    fn build_select(stmt: sea_query::SelectStatement) -> String;

    /// Build a SQL query string from a sea-query INSERT statement.
    fn build_insert(stmt: sea_query::InsertStatement) -> String;

    /// Build a SQL query string from a sea-query CREATE TABLE statement.
    fn build_create(stmt: sea_query::TableCreateStatement) -> String;

    /// Statement that points a pooled connection at `schema`.
    ///
    /// `None` for backends where the pool is already bound to one database.
    fn select_schema(schema: &str) -> Option<String>;
}
