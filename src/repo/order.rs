use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{Order, OrderStatus, Priority};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use std::collections::HashSet;

const ORDER_COLUMNS: &str = "id, order_code, order_name, status, design_approved, sizes_validated,
    deposit_received, invoice_url, priority, est_delivery, created_ts, updated_ts, salesperson_id";

/// Row in the import log
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub id: i64,
    pub source: String,
    pub order_count: i64,
    pub replaced: bool,
    pub imported_ts: i64,
}

/// Order snapshot repository
pub struct OrderRepo;

impl OrderRepo {
    /// Insert or overwrite a single order snapshot
    pub fn upsert(conn: &Connection, order: &Order) -> Result<()> {
        conn.execute(
            "INSERT INTO orders (id, order_code, order_name, status, design_approved, sizes_validated,
                    deposit_received, invoice_url, priority, est_delivery, created_ts, updated_ts,
                    salesperson_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(id) DO UPDATE SET
                order_code = excluded.order_code,
                order_name = excluded.order_name,
                status = excluded.status,
                design_approved = excluded.design_approved,
                sizes_validated = excluded.sizes_validated,
                deposit_received = excluded.deposit_received,
                invoice_url = excluded.invoice_url,
                priority = excluded.priority,
                est_delivery = excluded.est_delivery,
                created_ts = excluded.created_ts,
                updated_ts = excluded.updated_ts,
                salesperson_id = excluded.salesperson_id",
            rusqlite::params![
                order.id,
                order.order_code,
                order.order_name,
                order.status.as_str(),
                order.design_approved,
                order.sizes_validated,
                order.deposit_received,
                order.invoice_url,
                order.priority.as_str(),
                order.est_delivery.map(|d| d.format("%Y-%m-%d").to_string()),
                order.created_at.timestamp(),
                order.updated_at.timestamp(),
                order.salesperson_id,
            ],
        )
        .with_context(|| format!("Failed to store order {}", order.id))?;
        Ok(())
    }

    /// Store a full snapshot in one transaction and log the import.
    /// With `replace`, orders absent from the snapshot are dropped first.
    /// A repeated id overwrites the earlier record and is counted once.
    pub fn import_snapshot(conn: &Connection, source: &str, orders: &[Order], replace: bool) -> Result<ImportRecord> {
        let tx = conn.unchecked_transaction()
            .context("Failed to start import transaction")?;

        if replace {
            let removed = tx.execute("DELETE FROM orders", [])?;
            debug!("Cleared {} stored orders before import", removed);
        }
        for order in orders {
            Self::upsert(&tx, order)?;
        }
        let order_count = orders.iter().map(|o| o.id).collect::<HashSet<_>>().len() as i64;

        let now = Utc::now().timestamp();
        tx.execute(
            "INSERT INTO imports (source, order_count, replaced, imported_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![source, order_count, replace, now],
        )
        .context("Failed to record import")?;
        let id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit import")?;

        info!("Imported {} orders from {}", order_count, source);
        Ok(ImportRecord {
            id,
            source: source.to_string(),
            order_count,
            replaced: replace,
            imported_ts: now,
        })
    }

    /// Get order by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let order = stmt.query_row([id], row_to_order).optional()
            .with_context(|| format!("Failed to load order {}", id))?;
        Ok(order)
    }

    /// List all stored orders ordered by id
    pub fn list_all(conn: &Connection) -> Result<Vec<Order>> {
        let sql = format!("SELECT {} FROM orders ORDER BY id", ORDER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_order)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row.context("Failed to read stored order")?);
        }
        Ok(orders)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove every stored order, returning how many were removed
    pub fn clear(conn: &Connection) -> Result<usize> {
        let removed = conn.execute("DELETE FROM orders", [])
            .context("Failed to clear orders")?;
        Ok(removed)
    }

    /// Most recent import, if any
    pub fn last_import(conn: &Connection) -> Result<Option<ImportRecord>> {
        let record = conn.query_row(
            "SELECT id, source, order_count, replaced, imported_ts
             FROM imports ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok(ImportRecord {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    order_count: row.get(2)?,
                    replaced: row.get(3)?,
                    imported_ts: row.get(4)?,
                })
            },
        ).optional()?;
        Ok(record)
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn row_to_order(row: &Row) -> rusqlite::Result<Order> {
    let status: String = row.get(3)?;
    let priority: String = row.get(8)?;
    let est_delivery: Option<String> = row.get(9)?;
    let created_ts: i64 = row.get(10)?;
    let updated_ts: i64 = row.get(11)?;

    let est_delivery = match est_delivery {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| conversion_error(9, format!("invalid est_delivery '{}'", raw)))?,
        ),
        None => None,
    };

    Ok(Order {
        id: row.get(0)?,
        order_code: row.get(1)?,
        order_name: row.get(2)?,
        status: OrderStatus::from_str(&status)
            .ok_or_else(|| conversion_error(3, format!("unknown status '{}'", status)))?,
        design_approved: row.get(4)?,
        sizes_validated: row.get(5)?,
        deposit_received: row.get(6)?,
        invoice_url: row.get(7)?,
        priority: Priority::from_str(&priority)
            .ok_or_else(|| conversion_error(8, format!("unknown priority '{}'", priority)))?,
        est_delivery,
        created_at: DateTime::from_timestamp(created_ts, 0)
            .ok_or_else(|| conversion_error(10, format!("invalid created_ts {}", created_ts)))?,
        updated_at: DateTime::from_timestamp(updated_ts, 0)
            .ok_or_else(|| conversion_error(11, format!("invalid updated_ts {}", updated_ts)))?,
        salesperson_id: row.get(12)?,
    })
}
