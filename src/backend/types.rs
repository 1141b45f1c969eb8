use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{Schema, Shape};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

// `"roles": null` is accepted by the shape, so it has to deserialize too
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserInfo {
    pub fn is_staff(&self) -> bool {
        self.roles.iter().any(|r| r == "staff" || r == "admin")
    }
}

impl Schema for UserInfo {
    fn shape() -> Shape {
        Shape::object()
            .field("sub", Shape::String)
            .field("name", Shape::String)
            .field("email", Shape::String)
            .optional("roles", Shape::array(Shape::String))
            .optional("organization_id", Shape::String)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
}

impl Schema for Organization {
    fn shape() -> Shape {
        Shape::object()
            .field("id", Shape::String)
            .field("name", Shape::String)
            .optional("slug", Shape::String)
            .optional("member_count", Shape::Unsigned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub organization_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Schema for Project {
    fn shape() -> Shape {
        Shape::object()
            .field("id", Shape::String)
            .field("name", Shape::String)
            .field("organization_id", Shape::String)
            .optional("description", Shape::String)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
}

impl Schema for User {
    fn shape() -> Shape {
        Shape::object()
            .field("id", Shape::String)
            .field("name", Shape::String)
            .field("email", Shape::String)
            .field("role", Shape::String)
            .field("active", Shape::Boolean)
    }
}
