//! Caller identity forwarded by the upstream auth provider.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use safety_core::Role;

use crate::error::WebError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORG_ID_HEADER: &str = "x-org-id";
pub const ORG_ROLE_HEADER: &str = "x-org-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub org_id: Option<String>,
    pub role: Role,
    pub email: Option<String>,
}

impl Principal {
    /// Read the principal from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, WebError> {
        let user_id = header(headers, USER_ID_HEADER).ok_or(WebError::Unauthorized)?;

        Ok(Self {
            user_id,
            org_id: header(headers, ORG_ID_HEADER),
            role: header(headers, ORG_ROLE_HEADER)
                .map(|claim| Role::from_claim(&claim))
                .unwrap_or(Role::Member),
            email: header(headers, USER_EMAIL_HEADER),
        })
    }

    /// Owners see their own rows; moderators and admins see rows of their org.
    pub fn can_view(&self, owner_user_id: &str, owner_org_id: Option<&str>) -> bool {
        if self.user_id == owner_user_id {
            return true;
        }
        self.role.can_moderate() && self.org_id.is_some() && self.org_id.as_deref() == owner_org_id
    }

    /// Fail with 403 unless the caller may moderate.
    pub fn require_moderator(&self) -> Result<(), WebError> {
        if self.role.can_moderate() {
            Ok(())
        } else {
            Err(WebError::Forbidden("Moderator role required".to_string()))
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Principal::from_headers(&parts.headers)
    }
}
