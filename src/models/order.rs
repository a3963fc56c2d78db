use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order status (pipeline lifecycle as reported by the orders API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    WaitingSizes,
    DesignCreated,
    SizesValidated,
    Invoiced,
    Production,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::New,
        OrderStatus::WaitingSizes,
        OrderStatus::DesignCreated,
        OrderStatus::SizesValidated,
        OrderStatus::Invoiced,
        OrderStatus::Production,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::WaitingSizes => "waiting_sizes",
            OrderStatus::DesignCreated => "design_created",
            OrderStatus::SizesValidated => "sizes_validated",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Production => "production",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        OrderStatus::ALL.iter().copied().find(|status| status.as_str() == s)
    }

    /// Early statuses are the ones where an order can go stale before work starts.
    pub fn is_early(&self) -> bool {
        matches!(self, Self::New | Self::WaitingSizes | Self::DesignCreated)
    }
}

/// Order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Normal, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Errors raised while turning a wire record into a typed [`Order`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order {id}: unknown status '{value}'")]
    UnknownStatus { id: i64, value: String },

    #[error("order {id}: unknown priority '{value}'")]
    UnknownPriority { id: i64, value: String },

    #[error("order {id}: invalid {field} '{value}'")]
    InvalidDate {
        id: i64,
        field: &'static str,
        value: String,
    },
}

/// One element of the `GET /api/orders` response, exactly as the API sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub design_approved: bool,
    #[serde(default)]
    pub sizes_validated: bool,
    #[serde(default)]
    pub deposit_received: bool,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub est_delivery: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub salesperson_id: Option<String>,
}

/// Order model
///
/// A read-only snapshot of an order. Only the fields the pipeline engine
/// consumes are carried, plus code and name for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_code: Option<String>,
    pub order_name: Option<String>,
    pub status: OrderStatus,
    pub design_approved: bool,
    pub sizes_validated: bool,
    pub deposit_received: bool,
    pub invoice_url: Option<String>,
    pub priority: Priority,
    pub est_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub salesperson_id: Option<String>,
}

impl Order {
    /// Create a new order in `new` status with no milestones reached
    pub fn new(id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            order_code: None,
            order_name: None,
            status: OrderStatus::New,
            design_approved: false,
            sizes_validated: false,
            deposit_received: false,
            invoice_url: None,
            priority: Priority::Normal,
            est_delivery: None,
            created_at: now,
            updated_at: now,
            salesperson_id: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_invoice(&self) -> bool {
        self.invoice_url.is_some()
    }

    /// Label used in tables: order code if known, otherwise `#id`
    pub fn display_code(&self) -> String {
        self.order_code
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let status = OrderStatus::from_str(record.status.trim()).ok_or_else(|| {
            OrderError::UnknownStatus {
                id,
                value: record.status.clone(),
            }
        })?;

        let priority = match record.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::Normal,
            Some(p) => Priority::from_str(p).ok_or_else(|| OrderError::UnknownPriority {
                id,
                value: p.to_string(),
            })?,
        };

        let est_delivery = match non_empty(record.est_delivery) {
            None => None,
            Some(raw) => Some(parse_delivery_date(&raw).ok_or(OrderError::InvalidDate {
                id,
                field: "estDelivery",
                value: raw,
            })?),
        };

        let created_at = parse_timestamp(&record.created_at).ok_or_else(|| {
            OrderError::InvalidDate {
                id,
                field: "createdAt",
                value: record.created_at.clone(),
            }
        })?;
        let updated_at = parse_timestamp(&record.updated_at).ok_or_else(|| {
            OrderError::InvalidDate {
                id,
                field: "updatedAt",
                value: record.updated_at.clone(),
            }
        })?;

        Ok(Order {
            id,
            order_code: non_empty(record.order_code),
            order_name: non_empty(record.order_name),
            status,
            design_approved: record.design_approved,
            sizes_validated: record.sizes_validated,
            deposit_received: record.deposit_received,
            // An empty invoice URL means no invoice document exists
            invoice_url: non_empty(record.invoice_url),
            priority,
            est_delivery,
            created_at,
            updated_at,
            salesperson_id: non_empty(record.salesperson_id),
        })
    }
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        OrderRecord {
            id: order.id,
            order_code: order.order_code.clone(),
            order_name: order.order_name.clone(),
            status: order.status.as_str().to_string(),
            design_approved: order.design_approved,
            sizes_validated: order.sizes_validated,
            deposit_received: order.deposit_received,
            invoice_url: order.invoice_url.clone(),
            priority: Some(order.priority.as_str().to_string()),
            est_delivery: order.est_delivery.map(|d| d.format("%Y-%m-%d").to_string()),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            salesperson_id: order.salesperson_id.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Delivery dates are calendar dates; full timestamps are reduced to the local day.
fn parse_delivery_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

/// RFC 3339, or the bare `YYYY-MM-DD HH:MM:SS` form Postgres emits, taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
