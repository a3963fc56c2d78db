//! Stage registry
//!
//! The ordered, compiled-in table of pipeline stages. Order matters: the
//! classifier walks this table top to bottom and the first matching pipeline
//! stage wins, so moving an entry changes how overlapping orders are classified
//! (`waiting_sizes` with sizes validated is the known overlap).
//!
//! `issues` sits last and is an overlay. It is counted and shown like any other
//! column but never returned as an order's canonical stage.

use crate::models::{Order, OrderStatus, PrimaryAction, Role, StageConfig, StageId};
use crate::pipeline::risk::needs_attention;
use chrono::{DateTime, Local};

const ALL_ROLES: &[Role] = &Role::ALL;

fn is_draft(order: &Order, _now: DateTime<Local>) -> bool {
    order.status == OrderStatus::New
}

fn is_awaiting_sizes(order: &Order, _now: DateTime<Local>) -> bool {
    matches!(order.status, OrderStatus::WaitingSizes | OrderStatus::DesignCreated)
        && !order.sizes_validated
}

fn is_ready_to_invoice(order: &Order, _now: DateTime<Local>) -> bool {
    let sizes_done = order.status == OrderStatus::SizesValidated
        || (order.status == OrderStatus::WaitingSizes && order.sizes_validated);
    sizes_done && order.invoice_url.is_none()
}

fn is_ready_for_production(order: &Order, _now: DateTime<Local>) -> bool {
    order.status == OrderStatus::Invoiced
}

fn is_in_production(order: &Order, _now: DateTime<Local>) -> bool {
    order.status == OrderStatus::Production
}

fn is_shipped(order: &Order, _now: DateTime<Local>) -> bool {
    order.status == OrderStatus::Shipped
}

fn is_completed(order: &Order, _now: DateTime<Local>) -> bool {
    order.status == OrderStatus::Completed
}

pub static STAGE_REGISTRY: [StageConfig; 8] = [
    StageConfig {
        id: StageId::Drafts,
        label: "Drafts",
        description: "New orders still being set up",
        icon: "file-edit",
        color_class: "text-gray-600",
        bg_class: "bg-gray-50",
        border_class: "border-gray-200",
        filter: is_draft,
        primary_action: PrimaryAction {
            label: "Request Sizes",
            roles: &[Role::Admin, Role::Sales],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Designer, Role::Ops],
    },
    StageConfig {
        id: StageId::AwaitingSizes,
        label: "Awaiting Sizes",
        description: "Waiting on the customer to confirm the size breakdown",
        icon: "ruler",
        color_class: "text-amber-600",
        bg_class: "bg-amber-50",
        border_class: "border-amber-200",
        filter: is_awaiting_sizes,
        primary_action: PrimaryAction {
            label: "Validate Sizes",
            roles: &[Role::Admin, Role::Sales, Role::Ops],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Designer, Role::Ops],
    },
    StageConfig {
        id: StageId::ReadyToInvoice,
        label: "Ready to Invoice",
        description: "Sizes confirmed, invoice not yet issued",
        icon: "receipt",
        color_class: "text-blue-600",
        bg_class: "bg-blue-50",
        border_class: "border-blue-200",
        filter: is_ready_to_invoice,
        primary_action: PrimaryAction {
            label: "Create Invoice",
            roles: &[Role::Admin, Role::Finance],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Ops, Role::Finance],
    },
    StageConfig {
        id: StageId::ReadyForProduction,
        label: "Ready for Production",
        description: "Invoiced and waiting to be sent to a manufacturer",
        icon: "package-check",
        color_class: "text-indigo-600",
        bg_class: "bg-indigo-50",
        border_class: "border-indigo-200",
        filter: is_ready_for_production,
        primary_action: PrimaryAction {
            label: "Send to Manufacturer",
            roles: &[Role::Admin, Role::Ops],
        },
        visible_to_roles: &[Role::Admin, Role::Ops, Role::Manufacturer],
    },
    StageConfig {
        id: StageId::InProduction,
        label: "In Production",
        description: "Being manufactured",
        icon: "factory",
        color_class: "text-purple-600",
        bg_class: "bg-purple-50",
        border_class: "border-purple-200",
        filter: is_in_production,
        primary_action: PrimaryAction {
            label: "Update Progress",
            roles: &[Role::Admin, Role::Ops, Role::Manufacturer],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Ops, Role::Manufacturer],
    },
    StageConfig {
        id: StageId::Shipped,
        label: "Shipped",
        description: "On the way to the customer",
        icon: "truck",
        color_class: "text-cyan-600",
        bg_class: "bg-cyan-50",
        border_class: "border-cyan-200",
        filter: is_shipped,
        primary_action: PrimaryAction {
            label: "Confirm Delivery",
            roles: &[Role::Admin, Role::Sales, Role::Ops],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Ops, Role::Manufacturer],
    },
    StageConfig {
        id: StageId::Completed,
        label: "Completed",
        description: "Delivered and closed out",
        icon: "check-circle",
        color_class: "text-green-600",
        bg_class: "bg-green-50",
        border_class: "border-green-200",
        filter: is_completed,
        primary_action: PrimaryAction {
            label: "View Summary",
            roles: ALL_ROLES,
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Ops, Role::Finance],
    },
    StageConfig {
        id: StageId::Issues,
        label: "Needs Attention",
        description: "High priority, overdue or stalled orders",
        icon: "alert-triangle",
        color_class: "text-red-600",
        bg_class: "bg-red-50",
        border_class: "border-red-200",
        filter: needs_attention,
        primary_action: PrimaryAction {
            label: "Review Order",
            roles: &[Role::Admin, Role::Ops],
        },
        visible_to_roles: &[Role::Admin, Role::Sales, Role::Ops],
    },
];

/// Configuration for a stage id.
/// Registry entries are laid out in `StageId` declaration order.
pub fn stage_config(id: StageId) -> &'static StageConfig {
    &STAGE_REGISTRY[id as usize]
}

/// Look up a stage by its kebab-case id
pub fn find_stage(id: &str) -> Option<&'static StageConfig> {
    StageId::from_str(id).map(stage_config)
}

/// Registry entries that form the exclusive pipeline partition (everything but issues)
pub fn pipeline_stages() -> impl Iterator<Item = &'static StageConfig> {
    STAGE_REGISTRY.iter().filter(|stage| !stage.id.is_overlay())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_one_entry_per_stage() {
        let ids: Vec<&str> = STAGE_REGISTRY.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "drafts",
                "awaiting-sizes",
                "ready-to-invoice",
                "ready-for-production",
                "in-production",
                "shipped",
                "completed",
                "issues",
            ]
        );
    }

    #[test]
    fn test_stage_config_lookup() {
        for stage in STAGE_REGISTRY.iter() {
            assert_eq!(stage_config(stage.id).id, stage.id);
        }
        assert_eq!(find_stage("shipped").map(|s| s.label), Some("Shipped"));
        assert!(find_stage("Shipped").is_none());
    }

    #[test]
    fn test_pipeline_stages_skip_issues() {
        assert_eq!(pipeline_stages().count(), 7);
        assert!(pipeline_stages().all(|s| s.id != StageId::Issues));
    }

    #[test]
    fn test_every_stage_visible_to_admin() {
        assert!(STAGE_REGISTRY.iter().all(|s| s.is_visible_to(Role::Admin)));
    }
}
