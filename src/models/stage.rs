use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use crate::models::{Order, Role};

/// Stage identifier (kebab-case on the wire and on the command line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Drafts,
    AwaitingSizes,
    ReadyToInvoice,
    ReadyForProduction,
    InProduction,
    Shipped,
    Completed,
    Issues,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Drafts => "drafts",
            StageId::AwaitingSizes => "awaiting-sizes",
            StageId::ReadyToInvoice => "ready-to-invoice",
            StageId::ReadyForProduction => "ready-for-production",
            StageId::InProduction => "in-production",
            StageId::Shipped => "shipped",
            StageId::Completed => "completed",
            StageId::Issues => "issues",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "drafts" => Some(StageId::Drafts),
            "awaiting-sizes" => Some(StageId::AwaitingSizes),
            "ready-to-invoice" => Some(StageId::ReadyToInvoice),
            "ready-for-production" => Some(StageId::ReadyForProduction),
            "in-production" => Some(StageId::InProduction),
            "shipped" => Some(StageId::Shipped),
            "completed" => Some(StageId::Completed),
            "issues" => Some(StageId::Issues),
            _ => None,
        }
    }

    /// Issues is a cross-cutting overlay, not a member of the pipeline partition
    pub fn is_overlay(&self) -> bool {
        matches!(self, StageId::Issues)
    }
}

/// Stage predicate. Takes the evaluation clock because the issues overlay is time-dependent.
pub type StageFilter = fn(&Order, DateTime<Local>) -> bool;

/// The main call-to-action shown on a stage and the roles allowed to trigger it
#[derive(Debug, Clone, Copy)]
pub struct PrimaryAction {
    pub label: &'static str,
    pub roles: &'static [Role],
}

/// Static description of one pipeline stage
#[derive(Debug, Clone, Copy)]
pub struct StageConfig {
    pub id: StageId,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color_class: &'static str,
    pub bg_class: &'static str,
    pub border_class: &'static str,
    pub filter: StageFilter,
    pub primary_action: PrimaryAction,
    pub visible_to_roles: &'static [Role],
}

impl StageConfig {
    pub fn matches(&self, order: &Order) -> bool {
        self.matches_at(order, Local::now())
    }

    pub fn matches_at(&self, order: &Order, now: DateTime<Local>) -> bool {
        (self.filter)(order, now)
    }

    pub fn is_visible_to(&self, role: Role) -> bool {
        self.visible_to_roles.contains(&role)
    }
}
