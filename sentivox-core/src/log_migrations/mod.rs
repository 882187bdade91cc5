//! Event log schema, embedded at compile time
//!
//! Files are applied in order and recorded in `sys_migrations`. The first file
//! creates that bookkeeping table and is safe to run on every open.

use anyhow::Result;
use duckdb::Connection;

const BOOKKEEPING: &str = "000_migrations.sql";

/// All log migrations as `(file name, sql)`
///
/// Append new `NNN_description.sql` files here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    (BOOKKEEPING, include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];

/// Bring the log database up to date; returns how many files were applied
pub fn apply(conn: &Connection) -> Result<usize> {
    let mut applied = 0;

    for (name, sql) in LOG_MIGRATIONS {
        if *name == BOOKKEEPING {
            conn.execute_batch(sql)?;
            continue;
        }

        let done: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sys_migrations WHERE migration_name = ?",
            [name],
            |row| row.get(0),
        )?;
        if done {
            continue;
        }

        conn.execute_batch(sql)?;
        conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )?;
        applied += 1;
    }

    Ok(applied)
}
