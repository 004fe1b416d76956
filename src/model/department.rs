use serde::Deserialize;
use utoipa::ToSchema;

use super::link::Linkable;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Department {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[schema(example = json!({ "name": "RESEARCH", "description": "Dallas lab" }))]
pub struct DepartmentInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Linkable for DepartmentInput {
    const ID_FIELD: &'static str = "id";
}

impl Department {
    pub fn from_input(id: u64, input: &DepartmentInput) -> Self {
        Self {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
        }
    }
}
