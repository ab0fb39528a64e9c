use ::duckdb::{params, Connection};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_observations",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS observations_id_seq START 1;

CREATE TABLE IF NOT EXISTS observations (
    id BIGINT PRIMARY KEY DEFAULT nextval('observations_id_seq'),
    exchange TEXT NOT NULL,
    timestamp DOUBLE NOT NULL,
    ask DOUBLE NOT NULL,
    bid DOUBLE NOT NULL,
    volume DOUBLE NOT NULL DEFAULT 0,
    currencyCode TEXT NOT NULL
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_observations_exchange_currency ON observations(exchange, currencyCode);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
        }
    }

    Ok(())
}
