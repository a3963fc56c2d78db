use serde::{Deserialize, Serialize};

/// Session role, controlling which stages and sections a user sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Sales,
    Designer,
    Ops,
    Manufacturer,
    Finance,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Sales,
        Role::Designer,
        Role::Ops,
        Role::Manufacturer,
        Role::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
            Role::Designer => "designer",
            Role::Ops => "ops",
            Role::Manufacturer => "manufacturer",
            Role::Finance => "finance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Role::ALL.iter().copied().find(|role| role.as_str() == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert_eq!(Role::from_str("finance"), Some(Role::Finance));
        assert_eq!(Role::Manufacturer.as_str(), "manufacturer");
        assert_eq!(Role::from_str("Finance"), None);
        assert_eq!(Role::from_str("customer"), None);
    }
}
