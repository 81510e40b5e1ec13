//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
use sea_query::{ColumnDef, Iden, Index, Table, TableCreateStatement};

/// Name of the checkpoint table.
pub const POSITIONS_TABLE: &str = "positions";

/// Positions table schema.
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
#[derive(Iden)]
pub enum Positions {
    Table,
    #[iden = "server_id"]
    ServerId,
    #[iden = "binlog_file"]
    BinlogFile,
    #[iden = "binlog_position"]
    BinlogPosition,
    #[iden = "client_id"]
    ClientId,
}

/// `CREATE TABLE IF NOT EXISTS positions`, keyed on `(server_id, client_id)`.
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
pub fn create_positions_table() -> TableCreateStatement {
    Table::create()
        .table(Positions::Table)
        .if_not_exists()
        .col(ColumnDef::new(Positions::ServerId).big_integer().not_null())
        .col(ColumnDef::new(Positions::BinlogFile).string_len(255))
        .col(ColumnDef::new(Positions::BinlogPosition).big_integer())
        .col(
            ColumnDef::new(Positions::ClientId)
                .string_len(255)
                .not_null()
                .default("maxwell"),
        )
        .primary_key(
            Index::create()
                .col(Positions::ServerId)
                .col(Positions::ClientId),
        )
        .to_owned()
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use sea_query::SqliteQueryBuilder;

    use super::*;

    #[test]
    fn test_table_name_matches_iden() {
        assert_eq!(Positions::Table.to_string(), POSITIONS_TABLE);
    }

    #[test]
    fn test_create_statement_keys_on_server_and_client() {
        let sql = create_positions_table().to_string(SqliteQueryBuilder);
        assert!(sql.contains("IF NOT EXISTS"));
        assert!(sql.contains("\"positions\""));
        assert!(sql.contains("PRIMARY KEY"));
        assert!(sql.contains("\"client_id\""));
    }
}
