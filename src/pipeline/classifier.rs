// Stage classification: map an order to its canonical pipeline stage

use crate::models::{Order, StageConfig, StageId};
use crate::pipeline::registry::{pipeline_stages, STAGE_REGISTRY};
use chrono::{DateTime, Local};

/// First pipeline stage (registry order, issues skipped) whose filter matches.
///
/// Returns `None` when nothing matches. Cancelled orders always land here and
/// that is a valid terminal state, not an error.
pub fn get_order_stage(order: &Order) -> Option<&'static StageConfig> {
    get_order_stage_at(order, Local::now())
}

pub fn get_order_stage_at(order: &Order, now: DateTime<Local>) -> Option<&'static StageConfig> {
    pipeline_stages().find(|stage| stage.matches_at(order, now))
}

/// Every registry stage whose filter matches, issues included
pub fn matching_stages(order: &Order, now: DateTime<Local>) -> Vec<StageId> {
    STAGE_REGISTRY
        .iter()
        .filter(|stage| stage.matches_at(order, now))
        .map(|stage| stage.id)
        .collect()
}
