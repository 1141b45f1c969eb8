use serde::Serialize;
use serde_json::Value;

use crate::middleware::{Page, PageContext};

/// List pages are placeholders until the backend exposes list endpoints
#[derive(Debug, Serialize)]
pub struct ListPage {
    pub resource: &'static str,
    pub items: Vec<Value>,
}

fn list(context: PageContext, resource: &'static str) -> Page<ListPage> {
    Page::new(
        context,
        ListPage {
            resource,
            items: Vec::new(),
        },
    )
}

/// GET /organizations
pub async fn organization_list(context: PageContext) -> Page<ListPage> {
    list(context, "organizations")
}

/// GET /projects
pub async fn project_list(context: PageContext) -> Page<ListPage> {
    list(context, "projects")
}

/// GET /users
pub async fn user_list(context: PageContext) -> Page<ListPage> {
    list(context, "users")
}
