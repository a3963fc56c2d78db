//! Classification audit
//!
//! Reports orders the pipeline handles badly without changing how they are
//! classified:
//!
//! - `Unstaged`: no pipeline stage claims a non-cancelled order, so it is
//!   invisible on every board column except possibly issues.
//! - `Ambiguous`: more than one pipeline filter matches. The registry assumes
//!   at most one does; this catches a future stage that breaks that.
//! - `Drift`: the registry filters and the detail view's status table put the
//!   order in different stages.

use crate::detail::status_to_stage;
use crate::models::{Order, OrderStatus, StageId};
use crate::pipeline::classifier::matching_stages;
use chrono::{DateTime, Local};
use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditIssue {
    Unstaged,
    Ambiguous {
        stages: Vec<StageId>,
    },
    Drift {
        classifier: Option<StageId>,
        status_map: Option<StageId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub issue: AuditIssue,
}

impl AuditFinding {
    pub fn describe(&self) -> String {
        match &self.issue {
            AuditIssue::Unstaged => format!(
                "order {} ({}) matches no pipeline stage",
                self.order_id,
                self.status.as_str()
            ),
            AuditIssue::Ambiguous { stages } => format!(
                "order {} ({}) matches several stages: {}",
                self.order_id,
                self.status.as_str(),
                stage_list(stages)
            ),
            AuditIssue::Drift { classifier, status_map } => format!(
                "order {} ({}) classified as {} but status maps to {}",
                self.order_id,
                self.status.as_str(),
                classifier.map_or("none", |s| s.as_str()),
                status_map.map_or("none", |s| s.as_str())
            ),
        }
    }
}

fn stage_list(stages: &[StageId]) -> String {
    stages.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

/// Audit a single order
pub fn audit_order(order: &Order, now: DateTime<Local>) -> Vec<AuditFinding> {
    let pipeline: Vec<StageId> = matching_stages(order, now)
        .into_iter()
        .filter(|id| !id.is_overlay())
        .collect();
    let classifier = pipeline.first().copied();
    let status_map = status_to_stage(order.status);

    let mut issues = Vec::new();
    if pipeline.is_empty() && order.status != OrderStatus::Cancelled {
        issues.push(AuditIssue::Unstaged);
    }
    if pipeline.len() > 1 {
        issues.push(AuditIssue::Ambiguous { stages: pipeline });
    }
    if classifier != status_map {
        issues.push(AuditIssue::Drift { classifier, status_map });
    }

    issues
        .into_iter()
        .map(|issue| AuditFinding {
            order_id: order.id,
            status: order.status,
            issue,
        })
        .collect()
}

/// Audit every order, logging each finding at warn level
pub fn audit_orders(orders: &[Order], now: DateTime<Local>) -> Vec<AuditFinding> {
    let findings: Vec<AuditFinding> = orders
        .iter()
        .flat_map(|order| audit_order(order, now))
        .collect();
    for finding in &findings {
        warn!("{}", finding.describe());
    }
    findings
}
