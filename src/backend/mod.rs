// Backend lookups used by portal pages.
//
// Each lookup is one GET through the typed request builder, validated against
// the fixed shape of the resource it returns.

pub mod types;

use std::sync::Arc;

use crate::client::{api_request, AuthContext, HttpTransport, Method, RequestError};
use crate::schema::Schema;

pub use types::{Organization, Project, User, UserInfo};

#[derive(Clone)]
pub struct BackendApi {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for BackendApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendApi").field("base_url", &self.base_url).finish()
    }
}

impl BackendApi {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// Identity behind the credentials (the session/userinfo lookup)
    pub async fn userinfo(&self, auth: AuthContext) -> Result<UserInfo, RequestError> {
        self.get("/userinfo", auth).await
    }

    pub async fn organization(&self, auth: AuthContext, id: &str) -> Result<Organization, RequestError> {
        self.get(&format!("/organizations/{}", path_segment(id)?), auth).await
    }

    pub async fn project(&self, auth: AuthContext, id: &str) -> Result<Project, RequestError> {
        self.get(&format!("/projects/{}", path_segment(id)?), auth).await
    }

    pub async fn user(&self, auth: AuthContext, id: &str) -> Result<User, RequestError> {
        self.get(&format!("/users/{}", path_segment(id)?), auth).await
    }

    async fn get<T: Schema>(&self, path: &str, auth: AuthContext) -> Result<T, RequestError> {
        api_request(Method::Get, path)
            .base_url(self.base_url.as_str())
            .header("accept", "application/json")
            .auth(auth)
            .output(T::schema())
            .execute(self.transport.as_ref())
            .await
    }
}

/// Ids are interpolated into paths, so only plain identifier characters are allowed.
fn path_segment(id: &str) -> Result<&str, RequestError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && id != "."
        && id != "..";

    if valid {
        Ok(id)
    } else {
        Err(RequestError::InvalidRequest(format!("invalid resource id '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;

    fn api(transport: MockTransport) -> BackendApi {
        BackendApi::new(MockTransport::BASE_URL, Arc::new(transport))
    }

    #[tokio::test]
    async fn userinfo_sends_bearer_token() {
        let transport = MockTransport::new().respond(
            "/userinfo",
            200,
            json!({"sub": "u1", "name": "Ada", "email": "ada@example.com", "roles": ["staff"]}),
        );
        let backend = api(transport.clone());

        let info = backend.userinfo(AuthContext::Bearer("tok".to_string())).await.unwrap();
        assert_eq!(info.sub, "u1");
        assert!(info.is_staff());

        let sent = transport.requests();
        assert_eq!(sent[0].headers().get("authorization").unwrap(), "Bearer tok");
        assert_eq!(sent[0].url().path(), "/api/userinfo");
    }

    #[tokio::test]
    async fn userinfo_accepts_null_roles() {
        let transport = MockTransport::new().respond(
            "/userinfo",
            200,
            json!({"sub": "u2", "name": "Lin", "email": "lin@example.com", "roles": null}),
        );
        let info = api(transport).userinfo(AuthContext::SameOrigin).await.unwrap();
        assert!(info.roles.is_empty());
        assert!(!info.is_staff());
    }

    #[tokio::test]
    async fn organization_lookup_validates_shape() {
        let transport = MockTransport::new().respond(
            "/organizations/acme",
            200,
            json!({"id": "acme", "name": "Acme", "slug": 7}),
        );
        let err = api(transport)
            .organization(AuthContext::SameOrigin, "acme")
            .await
            .unwrap_err();

        match err {
            RequestError::Validation(e) => assert_eq!(e.path, "$.slug"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn negative_member_count_names_the_field() {
        let transport = MockTransport::new().respond(
            "/organizations/acme",
            200,
            json!({"id": "acme", "name": "Acme", "member_count": -1}),
        );
        let err = api(transport)
            .organization(AuthContext::SameOrigin, "acme")
            .await
            .unwrap_err();

        match err {
            RequestError::Validation(e) => {
                assert_eq!(e.path, "$.member_count");
                assert_eq!(e.expected, "unsigned integer");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn project_and_user_lookups() {
        let transport = MockTransport::new()
            .respond(
                "/projects/p-1",
                200,
                json!({"id": "p-1", "name": "Portal", "organization_id": "acme", "description": null}),
            )
            .respond(
                "/users/u_2",
                200,
                json!({"id": "u_2", "name": "Lin", "email": "lin@example.com", "role": "member", "active": true}),
            );
        let backend = api(transport);

        let project = backend.project(AuthContext::SameOrigin, "p-1").await.unwrap();
        assert_eq!(project.organization_id, "acme");
        assert_eq!(project.description, None);

        let user = backend.user(AuthContext::SameOrigin, "u_2").await.unwrap();
        assert!(user.active);
    }

    #[tokio::test]
    async fn traversal_ids_are_rejected_before_sending() {
        let transport = MockTransport::new();
        let backend = api(transport.clone());

        for id in ["", "..", "a/b", "a b"] {
            let err = backend.user(AuthContext::SameOrigin, id).await.unwrap_err();
            assert!(matches!(err, RequestError::InvalidRequest(_)), "id {:?}", id);
        }
        assert!(transport.requests().is_empty());
    }
}
