//! Filter parser for order queries
//!
//! Implements boolean expression parsing with AND/OR/NOT operators.
//!
//! # Grammar
//!
//! ```text
//! filter := term | filter "or" term | "not" term
//! term := id | status=<status> | priority=<p> | stage=<stage> | salesperson=<id>
//!       | est=<date> | est<date | ... | +flag | -flag | risk | overdue | stale
//! ```
//!
//! # Precedence
//!
//! 1. `not` (highest)
//! 2. Implicit `and` (between adjacent terms)
//! 3. `or` (lowest)
//!
//! # Examples
//!
//! ```text
//! // Implicit AND
//! status=production priority=high
//!
//! // Explicit OR
//! stage=drafts or stage=awaiting-sizes
//!
//! // NOT
//! not +deposit
//!
//! // Comparison operators
//! est>=today est<+7d
//! ```

use crate::filter::evaluator::FilterExpr;
use crate::models::{OrderStatus, Priority, StageId};
use crate::utils::fuzzy::with_suggestion;
use crate::utils::parse_date_expr;
use chrono::Local;

/// Comparison operators for filter expressions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonOp {
    Eq,    // =
    Neq,   // != or <>
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=
}

/// Milestone flags addressable as `+flag` / `-flag`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Milestone {
    DesignApproved,
    SizesValidated,
    DepositReceived,
    Invoiced,
}

const MILESTONE_NAMES: &[&str] = &["approved", "sized", "deposit", "invoiced"];

impl Milestone {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Milestone::DesignApproved),
            "sized" => Some(Milestone::SizesValidated),
            "deposit" => Some(Milestone::DepositReceived),
            "invoiced" => Some(Milestone::Invoiced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FilterTerm {
    Id(ComparisonOp, i64),
    Status(ComparisonOp, Vec<OrderStatus>),
    Priority(ComparisonOp, Vec<Priority>),
    Stage(ComparisonOp, Vec<StageId>),
    Salesperson(ComparisonOp, String),
    Est(ComparisonOp, String),
    Flag(Milestone, bool), // (flag, is_positive)
    Risk,
    Overdue,
    Stale,
}

/// Parse filter tokens into a FilterExpr
///
/// # Example
///
/// ```
/// use richhabits::filter::parse_filter;
///
/// let filter = parse_filter(vec!["status=production".to_string(), "risk".to_string()]).unwrap();
/// ```
pub fn parse_filter(tokens: Vec<String>) -> Result<FilterExpr, String> {
    if tokens.is_empty() {
        return Ok(FilterExpr::All); // No filter = match all
    }

    // First pass: parse tokens into filter terms and operators
    let mut parsed: Vec<FilterToken> = Vec::new();
    for token in &tokens {
        match token.as_str() {
            "or" => parsed.push(FilterToken::Or),
            "not" => parsed.push(FilterToken::Not),
            _ => parsed.push(FilterToken::Term(parse_filter_term(token)?)),
        }
    }

    // Second pass: build expression tree respecting precedence
    build_expression(parsed)
}

#[derive(Debug, Clone)]
enum FilterToken {
    Term(FilterTerm),
    Not,
    Or,
}

/// Split a token into (key, operator, value) using operator detection.
/// Returns None if no operator is found.
fn split_on_operator(token: &str) -> Option<(String, ComparisonOp, String)> {
    let op_start = token.find(['=', '>', '<', '!'])?;

    let key = token[..op_start].to_string();
    if key.is_empty() {
        return None;
    }

    let rest = &token[op_start..];
    let (op, op_len) = if rest.starts_with(">=") {
        (ComparisonOp::Gte, 2)
    } else if rest.starts_with("<=") {
        (ComparisonOp::Lte, 2)
    } else if rest.starts_with("!=") || rest.starts_with("<>") {
        (ComparisonOp::Neq, 2)
    } else if rest.starts_with('=') {
        (ComparisonOp::Eq, 1)
    } else if rest.starts_with('>') {
        (ComparisonOp::Gt, 1)
    } else if rest.starts_with('<') {
        (ComparisonOp::Lt, 1)
    } else {
        return None;
    };

    Some((key, op, rest[op_len..].to_string()))
}

/// Known filter keys (exact match only)
const FILTER_KEYS: &[&str] = &["id", "status", "priority", "stage", "salesperson", "est"];

/// Parse a single filter term token
fn parse_filter_term(token: &str) -> Result<FilterTerm, String> {
    // Bare numeric ID
    if let Ok(id) = token.parse::<i64>() {
        return Ok(FilterTerm::Id(ComparisonOp::Eq, id));
    }

    if let Some((key, op, value)) = split_on_operator(token) {
        let key_lower = key.to_lowercase();
        return match key_lower.as_str() {
            "id" => value
                .parse::<i64>()
                .map(|id| FilterTerm::Id(op, id))
                .map_err(|_| format!("Invalid order ID in filter: '{}'", value)),
            "status" => {
                require_equality("Status", op)?;
                let names: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                let statuses = parse_list(&value, "status", &names, OrderStatus::from_str)?;
                Ok(FilterTerm::Status(op, statuses))
            }
            "priority" => {
                require_equality("Priority", op)?;
                let names: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
                let priorities = parse_list(&value, "priority", &names, Priority::from_str)?;
                Ok(FilterTerm::Priority(op, priorities))
            }
            "stage" => {
                require_equality("Stage", op)?;
                let names: Vec<&str> = crate::pipeline::STAGE_REGISTRY
                    .iter()
                    .map(|s| s.id.as_str())
                    .collect();
                let stages = parse_list(&value, "stage", &names, StageId::from_str)?;
                Ok(FilterTerm::Stage(op, stages))
            }
            "salesperson" => {
                require_equality("Salesperson", op)?;
                Ok(FilterTerm::Salesperson(op, value))
            }
            "est" => {
                if value != "any" && value != "none" {
                    parse_date_expr(&value, Local::now().date_naive()).map_err(|e| e.to_string())?;
                } else if op != ComparisonOp::Eq && op != ComparisonOp::Neq {
                    return Err(format!("'{}' only supports '=' and '!='", value));
                }
                Ok(FilterTerm::Est(op, value))
            }
            _ => Err(with_suggestion(
                format!("Unknown filter field '{}'. Known fields: {}", key, FILTER_KEYS.join(", ")),
                &key_lower,
                FILTER_KEYS,
            )),
        };
    }

    // +flag or -flag
    if let Some((name, positive)) = token
        .strip_prefix('+')
        .map(|n| (n, true))
        .or_else(|| token.strip_prefix('-').map(|n| (n, false)))
    {
        return Milestone::from_str(name)
            .map(|flag| FilterTerm::Flag(flag, positive))
            .ok_or_else(|| {
                with_suggestion(
                    format!("Unknown flag '{}'. Known flags: {}", name, MILESTONE_NAMES.join(", ")),
                    name,
                    MILESTONE_NAMES,
                )
            });
    }

    // Derived filters
    match token {
        "risk" | "at-risk" => Ok(FilterTerm::Risk),
        "overdue" => Ok(FilterTerm::Overdue),
        "stale" => Ok(FilterTerm::Stale),
        _ => Err(format!("Invalid filter token: {}", token)),
    }
}

fn require_equality(field: &str, op: ComparisonOp) -> Result<(), String> {
    if op == ComparisonOp::Eq || op == ComparisonOp::Neq {
        Ok(())
    } else {
        Err(format!("{} filter only supports '=' and '!=' operators, got '{}'", field, format_op(op)))
    }
}

/// Parse a comma-separated list of enumeration values
fn parse_list<T>(
    value: &str,
    field: &str,
    names: &[&str],
    parse: fn(&str) -> Option<T>,
) -> Result<Vec<T>, String> {
    value
        .split(',')
        .map(|v| v.trim().to_lowercase())
        .map(|v| {
            parse(&v).ok_or_else(|| {
                with_suggestion(
                    format!("Unknown {} '{}'. Valid values: {}", field, v, names.join(", ")),
                    &v,
                    names,
                )
            })
        })
        .collect()
}

/// Format a ComparisonOp for display
fn format_op(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::Neq => "!=",
        ComparisonOp::Gt => ">",
        ComparisonOp::Lt => "<",
        ComparisonOp::Gte => ">=",
        ComparisonOp::Lte => "<=",
    }
}

/// Build expression tree from parsed tokens
/// Precedence: not > and > or
fn build_expression(tokens: Vec<FilterToken>) -> Result<FilterExpr, String> {
    // Split by OR into AND groups, applying NOT to the term that follows it
    let mut or_groups: Vec<Vec<FilterExpr>> = Vec::new();
    let mut current_group: Vec<FilterExpr> = Vec::new();
    let mut negate_next = false;

    for token in tokens {
        match token {
            FilterToken::Not => {
                if negate_next {
                    return Err("NOT operator must be followed by a term".to_string());
                }
                negate_next = true;
            }
            FilterToken::Term(term) => {
                let expr = FilterExpr::Term(term);
                current_group.push(if negate_next {
                    FilterExpr::Not(Box::new(expr))
                } else {
                    expr
                });
                negate_next = false;
            }
            FilterToken::Or => {
                if negate_next {
                    return Err("NOT operator must be followed by a term".to_string());
                }
                if current_group.is_empty() {
                    return Err("OR operator requires a term on both sides".to_string());
                }
                or_groups.push(std::mem::take(&mut current_group));
            }
        }
    }

    if negate_next {
        return Err("NOT operator requires a following term".to_string());
    }
    if current_group.is_empty() {
        return Err("OR operator requires a term on both sides".to_string());
    }
    or_groups.push(current_group);

    let mut or_exprs: Vec<FilterExpr> = or_groups
        .into_iter()
        .map(|mut group| {
            if group.len() == 1 {
                group.remove(0)
            } else {
                FilterExpr::And(group)
            }
        })
        .collect();

    if or_exprs.len() == 1 {
        Ok(or_exprs.remove(0))
    } else {
        Ok(FilterExpr::Or(or_exprs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_id() {
        let expr = parse_filter(tokens(&["10"])).unwrap();
        match expr {
            FilterExpr::Term(FilterTerm::Id(ComparisonOp::Eq, 10)) => {}
            _ => panic!("Expected Id(10)"),
        }
    }

    #[test]
    fn test_parse_status_and_priority() {
        let expr = parse_filter(tokens(&["status=production,shipped", "priority=high"])).unwrap();
        match expr {
            FilterExpr::And(terms) => {
                assert_eq!(terms.len(), 2);
                match &terms[0] {
                    FilterExpr::Term(FilterTerm::Status(ComparisonOp::Eq, statuses)) => {
                        assert_eq!(statuses, &vec![OrderStatus::Production, OrderStatus::Shipped]);
                    }
                    _ => panic!("Expected Status term"),
                }
            }
            _ => panic!("Expected And expression"),
        }
    }

    #[test]
    fn test_parse_or() {
        let expr = parse_filter(tokens(&["stage=drafts", "or", "stage=issues"])).unwrap();
        match expr {
            FilterExpr::Or(groups) => assert_eq!(groups.len(), 2),
            _ => panic!("Expected Or expression"),
        }
    }

    #[test]
    fn test_parse_not() {
        let expr = parse_filter(tokens(&["not", "+deposit"])).unwrap();
        match expr {
            FilterExpr::Not(inner) => match *inner {
                FilterExpr::Term(FilterTerm::Flag(Milestone::DepositReceived, true)) => {}
                _ => panic!("Expected deposit flag"),
            },
            _ => panic!("Expected Not expression"),
        }
    }

    #[test]
    fn test_dangling_operators() {
        assert!(parse_filter(tokens(&["not"])).is_err());
        assert!(parse_filter(tokens(&["or", "risk"])).is_err());
        assert!(parse_filter(tokens(&["risk", "or"])).is_err());
        assert!(parse_filter(tokens(&["not", "or", "risk"])).is_err());
    }

    #[test]
    fn test_unknown_field_suggests() {
        let err = parse_filter(tokens(&["stauts=new"])).unwrap_err();
        assert!(err.contains("Unknown filter field"));
        assert!(err.contains("Did you mean 'status'?"));
    }

    #[test]
    fn test_unknown_value_suggests() {
        let err = parse_filter(tokens(&["stage=in_production"])).unwrap_err();
        assert!(err.contains("Did you mean 'in-production'?"), "{}", err);
        let err = parse_filter(tokens(&["status=on_hold"])).unwrap_err();
        assert!(err.contains("Unknown status 'on_hold'"));
    }

    #[test]
    fn test_status_rejects_comparison() {
        assert!(parse_filter(tokens(&["status>new"])).is_err());
        assert!(parse_filter(tokens(&["status!=cancelled"])).is_ok());
    }

    #[test]
    fn test_est_comparisons() {
        let expr = parse_filter(tokens(&["est<=+7d"])).unwrap();
        match expr {
            FilterExpr::Term(FilterTerm::Est(ComparisonOp::Lte, value)) => assert_eq!(value, "+7d"),
            _ => panic!("Expected Est term"),
        }
        assert!(parse_filter(tokens(&["est=none"])).is_ok());
        assert!(parse_filter(tokens(&["est>none"])).is_err());
        assert!(parse_filter(tokens(&["est<someday"])).is_err());
    }

    #[test]
    fn test_derived_terms() {
        for token in ["risk", "at-risk", "overdue", "stale"] {
            assert!(parse_filter(tokens(&[token])).is_ok(), "{}", token);
        }
        assert!(parse_filter(tokens(&["+shipped"])).is_err());
    }
}
