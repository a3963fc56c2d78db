//! Filter expression evaluator
//!
//! Evaluates filter expressions against order snapshots.
//!
//! # Filter Terms
//!
//! - `id` - Match by order ID (supports =, >, <, >=, <=, !=)
//! - `status=<status>` - Match by status (comma-separated for any-of)
//! - `priority=<priority>` - Match by priority
//! - `stage=<stage>` - Derived: canonical pipeline stage, or the issues overlay
//! - `salesperson=<id>` - Match by salesperson (`none` matches unassigned orders)
//! - `est=<expr>` - Match by estimated delivery date (`any`, `none` or a date expression)
//! - `+flag` / `-flag` - Milestone flags: approved, sized, deposit, invoiced
//! - `risk` / `overdue` / `stale` - Derived from the risk detector

use crate::filter::parser::{ComparisonOp, FilterTerm, Milestone};
use crate::models::{Order, StageId};
use crate::pipeline::{get_order_stage_at, is_at_risk_at, is_overdue_on, is_stale_at, needs_attention};
use crate::utils::parse_date_expr;
use chrono::{DateTime, Local, NaiveDate};

#[derive(Debug, Clone)]
pub enum FilterExpr {
    All, // Match all
    Term(FilterTerm),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Evaluate filter against an order as of `now`
    pub fn matches(&self, order: &Order, now: DateTime<Local>) -> bool {
        match self {
            FilterExpr::All => true,
            FilterExpr::Term(term) => term.matches(order, now),
            FilterExpr::And(exprs) => exprs.iter().all(|e| e.matches(order, now)),
            FilterExpr::Or(exprs) => exprs.iter().any(|e| e.matches(order, now)),
            FilterExpr::Not(expr) => !expr.matches(order, now),
        }
    }
}

/// Orders matching the filter, in input order
pub fn filter_orders<'a>(orders: &'a [Order], filter: &FilterExpr, now: DateTime<Local>) -> Vec<&'a Order> {
    orders.iter().filter(|o| filter.matches(o, now)).collect()
}

fn compare<T: PartialOrd>(lhs: T, op: ComparisonOp, rhs: T) -> bool {
    match op {
        ComparisonOp::Eq => lhs == rhs,
        ComparisonOp::Neq => lhs != rhs,
        ComparisonOp::Gt => lhs > rhs,
        ComparisonOp::Lt => lhs < rhs,
        ComparisonOp::Gte => lhs >= rhs,
        ComparisonOp::Lte => lhs <= rhs,
    }
}

/// Equality-only membership test shared by status, priority and stage terms
fn any_of(matches_any: bool, op: ComparisonOp) -> bool {
    match op {
        ComparisonOp::Neq => !matches_any,
        _ => matches_any,
    }
}

/// Helper to evaluate the estimated delivery date with a comparison operator
fn match_date_field(value: Option<NaiveDate>, op: ComparisonOp, expr: &str, today: NaiveDate) -> bool {
    match expr {
        "any" => any_of(value.is_some(), op),
        "none" => any_of(value.is_none(), op),
        _ => match (value, parse_date_expr(expr, today)) {
            (Some(date), Ok(target)) => compare(date, op, target),
            // An order with no date differs from every date
            (None, Ok(_)) => op == ComparisonOp::Neq,
            (_, Err(_)) => false,
        },
    }
}

impl FilterTerm {
    fn matches(&self, order: &Order, now: DateTime<Local>) -> bool {
        match self {
            FilterTerm::Id(op, id) => compare(order.id, *op, *id),
            FilterTerm::Status(op, statuses) => any_of(statuses.contains(&order.status), *op),
            FilterTerm::Priority(op, priorities) => any_of(priorities.contains(&order.priority), *op),
            FilterTerm::Stage(op, stages) => {
                let canonical = get_order_stage_at(order, now).map(|s| s.id);
                let matches_any = stages.iter().any(|stage| match stage {
                    StageId::Issues => needs_attention(order, now),
                    _ => canonical == Some(*stage),
                });
                any_of(matches_any, *op)
            }
            FilterTerm::Salesperson(op, who) => {
                let matches = match (order.salesperson_id.as_deref(), who.as_str()) {
                    (None, "none") => true,
                    (Some(id), _) => id.eq_ignore_ascii_case(who),
                    (None, _) => false,
                };
                any_of(matches, *op)
            }
            FilterTerm::Est(op, expr) => match_date_field(order.est_delivery, *op, expr, now.date_naive()),
            FilterTerm::Flag(flag, positive) => {
                let set = match flag {
                    Milestone::DesignApproved => order.design_approved,
                    Milestone::SizesValidated => order.sizes_validated,
                    Milestone::DepositReceived => order.deposit_received,
                    Milestone::Invoiced => order.has_invoice(),
                };
                set == *positive
            }
            FilterTerm::Risk => is_at_risk_at(order, now),
            FilterTerm::Overdue => is_overdue_on(order, now.date_naive()),
            FilterTerm::Stale => is_stale_at(order, now),
        }
    }
}
