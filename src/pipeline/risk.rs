// Risk detection: overdue deliveries, high priority and stale early-stage orders

use crate::models::{Order, OrderStatus, Priority};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

/// Orders sitting in an early status for more than this many whole days are stale
pub const STALE_AFTER_DAYS: i64 = 14;

/// Why an order is considered at risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskReason {
    HighPriority,
    Overdue { est_delivery: NaiveDate },
    Stale { days: i64 },
}

impl RiskReason {
    pub fn describe(&self) -> String {
        match self {
            RiskReason::HighPriority => "high priority".to_string(),
            RiskReason::Overdue { est_delivery } => {
                format!("overdue (due {})", est_delivery.format("%Y-%m-%d"))
            }
            RiskReason::Stale { days } => format!("stale ({} days in early stage)", days),
        }
    }
}

/// Overdue relative to `today`, comparing calendar dates only.
/// An order without an estimated delivery date is never overdue.
pub fn is_overdue_on(order: &Order, today: NaiveDate) -> bool {
    order.est_delivery.map_or(false, |due| due < today)
}

/// Overdue relative to the local calendar date
pub fn is_overdue(order: &Order) -> bool {
    is_overdue_on(order, Local::now().date_naive())
}

/// Whole days elapsed since the order was created, floored
pub fn days_since_created(order: &Order, now: DateTime<Local>) -> i64 {
    let elapsed = now.with_timezone(&Utc) - order.created_at;
    elapsed.num_seconds().div_euclid(86_400)
}

/// Still in an early status more than `STALE_AFTER_DAYS` after creation
pub fn is_stale_at(order: &Order, now: DateTime<Local>) -> bool {
    order.status.is_early() && days_since_created(order, now) > STALE_AFTER_DAYS
}

/// Every reason the order is at risk as of `now`, in a stable order
pub fn risk_reasons_at(order: &Order, now: DateTime<Local>) -> Vec<RiskReason> {
    let mut reasons = Vec::new();
    if order.priority == Priority::High {
        reasons.push(RiskReason::HighPriority);
    }
    if let Some(est_delivery) = order.est_delivery {
        if is_overdue_on(order, now.date_naive()) {
            reasons.push(RiskReason::Overdue { est_delivery });
        }
    }
    if is_stale_at(order, now) {
        reasons.push(RiskReason::Stale {
            days: days_since_created(order, now),
        });
    }
    reasons
}

pub fn is_at_risk_at(order: &Order, now: DateTime<Local>) -> bool {
    order.priority == Priority::High
        || is_overdue_on(order, now.date_naive())
        || is_stale_at(order, now)
}

pub fn is_at_risk(order: &Order) -> bool {
    is_at_risk_at(order, Local::now())
}

/// Filter for the issues overlay: at risk and not yet out the door
pub fn needs_attention(order: &Order, now: DateTime<Local>) -> bool {
    is_at_risk_at(order, now)
        && order.status != OrderStatus::Completed
        && order.status != OrderStatus::Shipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, 9, 30, 0).single().unwrap()
    }

    fn order_created_days_ago(days: i64) -> Order {
        let mut order = Order::new(1);
        order.created_at = (fixed_now() - Duration::days(days)).with_timezone(&Utc);
        order
    }

    #[test]
    fn test_overdue_compares_calendar_dates() {
        let now = fixed_now();
        let mut order = Order::new(1);

        order.est_delivery = Some(now.date_naive());
        assert!(!is_overdue_on(&order, now.date_naive()));

        order.est_delivery = now.date_naive().pred_opt();
        assert!(is_overdue_on(&order, now.date_naive()));

        order.est_delivery = None;
        assert!(!is_overdue_on(&order, now.date_naive()));
    }

    #[test]
    fn test_stale_threshold_is_exclusive() {
        let now = fixed_now();
        assert!(!is_at_risk_at(&order_created_days_ago(14), now));
        assert!(is_at_risk_at(&order_created_days_ago(15), now));
    }

    #[test]
    fn test_stale_ignores_late_statuses() {
        let now = fixed_now();
        let order = order_created_days_ago(40).with_status(OrderStatus::Production);
        assert!(!is_at_risk_at(&order, now));
        let order = order_created_days_ago(40).with_status(OrderStatus::Cancelled);
        assert!(!is_at_risk_at(&order, now));
    }

    #[test]
    fn test_days_since_created_floors() {
        let now = fixed_now();
        let mut order = Order::new(1);
        order.created_at = (now - Duration::hours(47)).with_timezone(&Utc);
        assert_eq!(days_since_created(&order, now), 1);
        order.created_at = (now + Duration::hours(1)).with_timezone(&Utc);
        assert_eq!(days_since_created(&order, now), -1);
    }

    #[test]
    fn test_risk_reasons() {
        let now = fixed_now();
        let mut order = order_created_days_ago(20).with_priority(Priority::High);
        order.est_delivery = Some(now.date_naive() - Duration::days(3));
        let reasons = risk_reasons_at(&order, now);
        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0], RiskReason::HighPriority);
        assert_eq!(reasons[2], RiskReason::Stale { days: 20 });
        assert_eq!(reasons[0].describe(), "high priority");
    }

    #[test]
    fn test_needs_attention_excludes_shipped_and_completed() {
        let now = fixed_now();
        for status in [OrderStatus::Shipped, OrderStatus::Completed] {
            let order = Order::new(1).with_status(status).with_priority(Priority::High);
            assert!(is_at_risk_at(&order, now));
            assert!(!needs_attention(&order, now));
        }
        let order = Order::new(1)
            .with_status(OrderStatus::Production)
            .with_priority(Priority::High);
        assert!(needs_attention(&order, now));
    }
}
