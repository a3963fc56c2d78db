// Role-based stage visibility

use crate::models::{Role, StageConfig, StageId};
use crate::pipeline::registry::{stage_config, STAGE_REGISTRY};

/// Registry stages the role may see, in registry order.
/// Each stage lists its roles explicitly; there is no role inheritance.
pub fn get_visible_stages(role: Role) -> Vec<&'static StageConfig> {
    STAGE_REGISTRY
        .iter()
        .filter(|stage| stage.is_visible_to(role))
        .collect()
}

pub fn visible_stage_ids(role: Role) -> Vec<StageId> {
    get_visible_stages(role).iter().map(|stage| stage.id).collect()
}

/// Whether the role may trigger the stage's primary action
pub fn can_perform_primary_action(role: Role, stage: StageId) -> bool {
    stage_config(stage).primary_action.roles.contains(&role)
}
