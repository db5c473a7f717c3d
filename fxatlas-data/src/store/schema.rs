use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version of the country schema this build reads and writes.
pub const SCHEMA_VERSION: i64 = 2;

/// Create the country and status tables inside an SQLite database.
///
/// Creation is idempotent and runs in one transaction. Databases stamped
/// with a different schema version are rejected so migrations can be applied
/// explicitly.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use fxatlas_data::store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("second run is a no-op");
///
/// let total: i64 = conn
///     .query_row("SELECT total_countries FROM system_status WHERE id = 1", [], |row| row.get(0))
///     .expect("status row exists");
/// assert_eq!(total, 0);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    seed_status(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create countries",
        "CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            name_key TEXT NOT NULL UNIQUE,
            capital TEXT,
            region TEXT,
            population INTEGER NOT NULL CHECK (population >= 0),
            currency_code TEXT,
            exchange_rate REAL CHECK (exchange_rate IS NULL OR exchange_rate > 0),
            estimated_gdp REAL,
            flag_url TEXT,
            last_refreshed_at INTEGER NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create system_status",
        "CREATE TABLE IF NOT EXISTS system_status (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            total_countries INTEGER NOT NULL DEFAULT 0 CHECK (total_countries >= 0),
            last_refreshed_at INTEGER
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index countries by region",
        "CREATE INDEX IF NOT EXISTS idx_countries_region
            ON countries(region COLLATE NOCASE)",
    )?;
    run_migration_step(
        transaction,
        "index countries by currency",
        "CREATE INDEX IF NOT EXISTS idx_countries_currency
            ON countries(currency_code COLLATE NOCASE)",
    )
}

fn seed_status(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "seed system_status",
        "INSERT OR IGNORE INTO system_status (id, total_countries, last_refreshed_at)
            VALUES (1, 0, NULL)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS fxatlas_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM fxatlas_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO fxatlas_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the country schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A migration statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Statement label.
        step: &'static str,
        /// Driver error.
        #[source]
        source: SqliteError,
    },
    /// The database carries a schema this build does not understand.
    #[error(
        "expected fxatlas schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build expects.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}
