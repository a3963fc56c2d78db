use log::info;
use rusqlite::{Connection, Result, Transaction};

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

type Migration = fn(&Transaction) -> Result<()>;

/// Migrations indexed by version - 1
const MIGRATIONS: [Migration; CURRENT_VERSION as usize] = [migration_v1, migration_v2];

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies pending migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;
        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number, inside a transaction
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migration = MIGRATIONS[(version - 1) as usize];
        let tx = conn.unchecked_transaction()?;
        migration(&tx)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
        info!("Applied schema migration v{}", version);
        Ok(())
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Migration v1: order snapshots
fn migration_v1(tx: &Transaction) -> Result<()> {
    tx.execute(
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            order_code TEXT NULL,
            order_name TEXT NULL,
            status TEXT NOT NULL CHECK(status IN (
                'new','waiting_sizes','design_created','sizes_validated',
                'invoiced','production','shipped','completed','cancelled'
            )),
            design_approved INTEGER NOT NULL DEFAULT 0,
            sizes_validated INTEGER NOT NULL DEFAULT 0,
            deposit_received INTEGER NOT NULL DEFAULT 0,
            invoice_url TEXT NULL,
            priority TEXT NOT NULL DEFAULT 'normal' CHECK(priority IN ('low','normal','high')),
            est_delivery TEXT NULL,
            created_ts INTEGER NOT NULL,
            updated_ts INTEGER NOT NULL,
            salesperson_id TEXT NULL
        )",
        [],
    )?;
    // Note: est_delivery is a calendar date stored as YYYY-MM-DD

    tx.execute("CREATE INDEX idx_orders_status ON orders(status)", [])?;
    tx.execute("CREATE INDEX idx_orders_salesperson ON orders(salesperson_id)", [])?;
    Ok(())
}

/// Migration v2: import log
fn migration_v2(tx: &Transaction) -> Result<()> {
    tx.execute(
        "CREATE TABLE imports (
            id INTEGER PRIMARY KEY,
            source TEXT NOT NULL,
            order_count INTEGER NOT NULL,
            replaced INTEGER NOT NULL DEFAULT 0,
            imported_ts INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}
