// Default module selection for the order detail view

use crate::detail::sections::{role_section_config, SectionId};
use crate::models::{OrderStatus, Role, StageId};

/// Status-only stage lookup used by the detail view.
///
/// This table is maintained separately from the registry filters and ignores
/// milestone flags, so it can disagree with `get_order_stage` (see
/// `pipeline::audit`). Cancelled orders have no stage here.
pub fn status_to_stage(status: OrderStatus) -> Option<StageId> {
    match status {
        OrderStatus::New => Some(StageId::Drafts),
        OrderStatus::WaitingSizes | OrderStatus::DesignCreated => Some(StageId::AwaitingSizes),
        OrderStatus::SizesValidated => Some(StageId::ReadyToInvoice),
        OrderStatus::Invoiced => Some(StageId::ReadyForProduction),
        OrderStatus::Production => Some(StageId::InProduction),
        OrderStatus::Shipped => Some(StageId::Shipped),
        OrderStatus::Completed => Some(StageId::Completed),
        OrderStatus::Cancelled => None,
    }
}

/// Section a stage opens on
pub fn stage_module(stage: StageId) -> SectionId {
    match stage {
        StageId::Drafts => SectionId::LineItems,
        StageId::AwaitingSizes => SectionId::Sizes,
        StageId::ReadyToInvoice => SectionId::Invoice,
        StageId::ReadyForProduction | StageId::InProduction => SectionId::Manufacturing,
        StageId::Shipped => SectionId::Shipping,
        StageId::Completed => SectionId::Overview,
        StageId::Issues => SectionId::Activity,
    }
}

/// Pick the section the detail view opens on.
///
/// Precedence: explicit stage, then the stage implied by the order status,
/// then the role's configured default.
pub fn get_default_module(
    role: Role,
    stage: Option<StageId>,
    order_status: Option<OrderStatus>,
) -> SectionId {
    stage
        .or_else(|| order_status.and_then(status_to_stage))
        .map(stage_module)
        .unwrap_or(role_section_config(role).default_module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_stage_wins() {
        let module = get_default_module(
            Role::Finance,
            Some(StageId::Shipped),
            Some(OrderStatus::New),
        );
        assert_eq!(module, SectionId::Shipping);
    }

    #[test]
    fn test_status_used_when_no_stage() {
        let module = get_default_module(Role::Finance, None, Some(OrderStatus::WaitingSizes));
        assert_eq!(module, SectionId::Sizes);
    }

    #[test]
    fn test_role_default_when_status_has_no_stage() {
        assert_eq!(
            get_default_module(Role::Finance, None, Some(OrderStatus::Cancelled)),
            SectionId::Invoice
        );
        assert_eq!(get_default_module(Role::Designer, None, None), SectionId::Design);
    }

    #[test]
    fn test_status_map_covers_all_but_cancelled() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status_to_stage(status).is_none(),
                status == OrderStatus::Cancelled,
                "{:?}",
                status
            );
        }
    }
}
