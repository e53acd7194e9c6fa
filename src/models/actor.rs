use serde::{Deserialize, Serialize};

use super::enums::Role;

/// The authenticated identity driving a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn patient(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Patient,
        }
    }

    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Staff,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}
