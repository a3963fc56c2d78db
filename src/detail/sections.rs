//! Role section configuration
//!
//! Progressive disclosure for the order detail view. Each role opens with a
//! short list of sections and can expand an "advanced" list. A section listed
//! nowhere is hidden for that role. Nothing prevents a section from being
//! listed twice; when it is, the default listing wins.

use crate::models::Role;
use serde::Serialize;

/// Order detail section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    Overview,
    Customer,
    LineItems,
    Design,
    Sizes,
    Invoice,
    Payments,
    Manufacturing,
    Shipping,
    Activity,
    Notes,
    Attachments,
}

impl SectionId {
    pub const ALL: [SectionId; 12] = [
        SectionId::Overview,
        SectionId::Customer,
        SectionId::LineItems,
        SectionId::Design,
        SectionId::Sizes,
        SectionId::Invoice,
        SectionId::Payments,
        SectionId::Manufacturing,
        SectionId::Shipping,
        SectionId::Activity,
        SectionId::Notes,
        SectionId::Attachments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Overview => "overview",
            SectionId::Customer => "customer",
            SectionId::LineItems => "line-items",
            SectionId::Design => "design",
            SectionId::Sizes => "sizes",
            SectionId::Invoice => "invoice",
            SectionId::Payments => "payments",
            SectionId::Manufacturing => "manufacturing",
            SectionId::Shipping => "shipping",
            SectionId::Activity => "activity",
            SectionId::Notes => "notes",
            SectionId::Attachments => "attachments",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        SectionId::ALL.iter().copied().find(|section| section.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoleSectionConfig {
    pub role: Role,
    pub default_visible: &'static [SectionId],
    pub advanced_sections: &'static [SectionId],
    pub default_module: SectionId,
}

pub static ROLE_SECTION_CONFIG: [RoleSectionConfig; 6] = [
    RoleSectionConfig {
        role: Role::Admin,
        default_visible: &[
            SectionId::Overview,
            SectionId::Customer,
            SectionId::LineItems,
            SectionId::Design,
            SectionId::Sizes,
            SectionId::Invoice,
            SectionId::Manufacturing,
            SectionId::Shipping,
        ],
        advanced_sections: &[
            SectionId::Payments,
            SectionId::Activity,
            SectionId::Notes,
            SectionId::Attachments,
        ],
        default_module: SectionId::Overview,
    },
    RoleSectionConfig {
        role: Role::Sales,
        default_visible: &[
            SectionId::Overview,
            SectionId::Customer,
            SectionId::LineItems,
            SectionId::Design,
            SectionId::Sizes,
            SectionId::Notes,
        ],
        advanced_sections: &[
            SectionId::Invoice,
            SectionId::Payments,
            SectionId::Shipping,
            SectionId::Activity,
            SectionId::Attachments,
        ],
        default_module: SectionId::Customer,
    },
    RoleSectionConfig {
        role: Role::Designer,
        default_visible: &[
            SectionId::Overview,
            SectionId::Design,
            SectionId::LineItems,
            SectionId::Attachments,
        ],
        advanced_sections: &[SectionId::Sizes, SectionId::Notes, SectionId::Activity],
        default_module: SectionId::Design,
    },
    RoleSectionConfig {
        role: Role::Ops,
        default_visible: &[
            SectionId::Overview,
            SectionId::LineItems,
            SectionId::Sizes,
            SectionId::Manufacturing,
            SectionId::Shipping,
        ],
        advanced_sections: &[
            SectionId::Customer,
            SectionId::Invoice,
            SectionId::Activity,
            SectionId::Notes,
            SectionId::Attachments,
        ],
        default_module: SectionId::Manufacturing,
    },
    RoleSectionConfig {
        role: Role::Manufacturer,
        default_visible: &[
            SectionId::Overview,
            SectionId::LineItems,
            SectionId::Sizes,
            SectionId::Manufacturing,
            SectionId::Shipping,
        ],
        advanced_sections: &[SectionId::Design, SectionId::Attachments, SectionId::Notes],
        default_module: SectionId::Manufacturing,
    },
    RoleSectionConfig {
        role: Role::Finance,
        default_visible: &[
            SectionId::Overview,
            SectionId::Invoice,
            SectionId::Payments,
            SectionId::Customer,
        ],
        advanced_sections: &[
            SectionId::LineItems,
            SectionId::Shipping,
            SectionId::Activity,
            SectionId::Notes,
        ],
        default_module: SectionId::Invoice,
    },
];

/// How a section is presented to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionVisibility {
    Default,
    Advanced,
    Hidden,
}

/// Sections listed twice or not at all for a role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionConfigGaps {
    pub overlapping: Vec<SectionId>,
    pub unlisted: Vec<SectionId>,
}

impl SectionConfigGaps {
    pub fn is_empty(&self) -> bool {
        self.overlapping.is_empty() && self.unlisted.is_empty()
    }
}

/// Section configuration for a role.
/// The table is laid out in `Role` declaration order.
pub fn role_section_config(role: Role) -> &'static RoleSectionConfig {
    &ROLE_SECTION_CONFIG[role as usize]
}

pub fn section_visibility(role: Role, section: SectionId) -> SectionVisibility {
    let config = role_section_config(role);
    if config.default_visible.contains(&section) {
        SectionVisibility::Default
    } else if config.advanced_sections.contains(&section) {
        SectionVisibility::Advanced
    } else {
        SectionVisibility::Hidden
    }
}

/// Sections to render: defaults first, then advanced ones when expanded
pub fn visible_sections(role: Role, include_advanced: bool) -> Vec<SectionId> {
    let config = role_section_config(role);
    let mut sections: Vec<SectionId> = config.default_visible.to_vec();
    if include_advanced {
        for section in config.advanced_sections {
            if !sections.contains(section) {
                sections.push(*section);
            }
        }
    }
    sections
}

/// Report (never enforce) sections that are double-listed or unlisted for a role
pub fn section_config_gaps(role: Role) -> SectionConfigGaps {
    let config = role_section_config(role);
    let overlapping = config
        .default_visible
        .iter()
        .filter(|s| config.advanced_sections.contains(s))
        .copied()
        .collect();
    let unlisted = SectionId::ALL
        .iter()
        .filter(|s| !config.default_visible.contains(s) && !config.advanced_sections.contains(s))
        .copied()
        .collect();
    SectionConfigGaps { overlapping, unlisted }
}
