use serde::Serialize;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// argon2 PHC string
    #[serde(skip_serializing)]
    pub password: String,
    pub role_id: u8,
    pub is_active: bool,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

/// A user about to be stored; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}
