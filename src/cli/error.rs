// Error handling utilities for consistent error messages and exit codes

use crate::models::{Role, StageId};
use crate::pipeline::STAGE_REGISTRY;
use crate::utils::fuzzy::with_suggestion;
use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that an order ID is valid (positive integer)
pub fn validate_order_id(id_str: &str) -> Result<i64, String> {
    let trimmed = id_str.trim_start_matches('#');
    trimmed.parse::<i64>()
        .map_err(|_| format!("Invalid order ID: '{}'. Order ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid order ID: {}. Order ID must be positive.", id))
            }
        })
}

/// Parse a role name, suggesting the closest known role on a typo
pub fn parse_role(name: &str) -> Result<Role, String> {
    Role::from_str(&name.to_lowercase()).ok_or_else(|| {
        let names: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        with_suggestion(
            format!("Unknown role '{}'. Valid roles: {}.", name, names.join(", ")),
            name,
            &names,
        )
    })
}

/// Parse a stage id, suggesting the closest registered stage on a typo
pub fn parse_stage(id: &str) -> Result<StageId, String> {
    StageId::from_str(id).ok_or_else(|| {
        let ids: Vec<&str> = STAGE_REGISTRY.iter().map(|s| s.id.as_str()).collect();
        with_suggestion(format!("Unknown stage '{}'.", id), id, &ids)
    })
}
