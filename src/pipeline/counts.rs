// Per-stage counting and kanban grouping

use crate::models::{Order, StageConfig, StageId};
use crate::pipeline::classifier::get_order_stage_at;
use crate::pipeline::registry::STAGE_REGISTRY;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of orders matching each registry stage, issues included.
/// Keys iterate (and serialize) in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StageCounts(BTreeMap<StageId, usize>);

impl StageCounts {
    pub fn get(&self, id: StageId) -> usize {
        self.0.get(&id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageId, usize)> + '_ {
        self.0.iter().map(|(id, count)| (*id, *count))
    }

    /// Keep only the given stages (e.g. the ones a role can see)
    pub fn retain_stages(&mut self, stages: &[StageId]) {
        self.0.retain(|id, _| stages.contains(id));
    }
}

/// Count orders per stage against the current clock
pub fn compute_stage_counts(orders: &[Order]) -> StageCounts {
    compute_stage_counts_at(orders, Local::now())
}

/// Count orders per stage. Each stage's filter runs over the full list; the
/// registry is small and order lists are page-sized, so nothing is cached.
/// An order can be counted under both its pipeline stage and issues.
pub fn compute_stage_counts_at(orders: &[Order], now: DateTime<Local>) -> StageCounts {
    let counts = STAGE_REGISTRY
        .iter()
        .map(|stage| {
            let count = orders.iter().filter(|o| stage.matches_at(o, now)).count();
            (stage.id, count)
        })
        .collect();
    StageCounts(counts)
}

/// One kanban column: a stage and the orders its filter selects
#[derive(Debug, Clone)]
pub struct StageColumn<'a> {
    pub stage: &'static StageConfig,
    pub orders: Vec<&'a Order>,
}

/// Group orders into columns for the requested stages, preserving input order within a column
pub fn group_by_stage<'a>(
    orders: &'a [Order],
    stages: &[&'static StageConfig],
    now: DateTime<Local>,
) -> Vec<StageColumn<'a>> {
    stages
        .iter()
        .copied()
        .map(|stage| StageColumn {
            stage,
            orders: orders.iter().filter(|o| stage.matches_at(o, now)).collect(),
        })
        .collect()
}

/// Orders that no pipeline stage claims (cancelled, or an unmatched flag combination)
pub fn unstaged_orders(orders: &[Order], now: DateTime<Local>) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| get_order_stage_at(o, now).is_none())
        .collect()
}
