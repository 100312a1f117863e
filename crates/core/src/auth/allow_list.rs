use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use super::{AuthError, AuthRequest, Authenticator, Identity, USER_ID_HEADER};

/// Admits only the chat users whose numeric id is on the configured list.
///
/// The id is read from the `X-User-Id` header, which the chat gateway sets
/// from the message sender.
#[derive(Debug)]
pub struct AllowListAuthenticator {
    allowed: HashSet<i64>,
}

impl AllowListAuthenticator {
    pub fn new(allowed: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed.contains(&user_id)
    }
}

#[async_trait]
impl Authenticator for AllowListAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let raw = request
            .header(USER_ID_HEADER)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        let user_id: i64 = raw
            .parse()
            .map_err(|_| AuthError::Forbidden(raw.to_string()))?;

        if self.is_allowed(user_id) {
            Ok(Identity {
                user_id: user_id.to_string(),
                method: self.method_name().to_string(),
            })
        } else {
            warn!(user_id, "Rejected request from user outside the allow-list");
            Err(AuthError::Forbidden(user_id.to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "allow_list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_from(user_id: Option<&str>) -> AuthRequest {
        AuthRequest {
            headers: user_id
                .map(|id| (USER_ID_HEADER.to_string(), id.to_string()))
                .into_iter()
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_allowed_user() {
        let auth = AllowListAuthenticator::new([1001, 1002]);
        let identity = auth.authenticate(&request_from(Some("1002"))).await.unwrap();
        assert_eq!(identity.user_id, "1002");
        assert_eq!(identity.method, "allow_list");
    }

    #[tokio::test]
    async fn test_unknown_user_is_forbidden() {
        let auth = AllowListAuthenticator::new([1001]);
        let result = auth.authenticate(&request_from(Some("999"))).await;
        assert!(matches!(result, Err(AuthError::Forbidden(id)) if id == "999"));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let auth = AllowListAuthenticator::new([1001]);
        let result = auth.authenticate(&request_from(None)).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_non_numeric_id() {
        let auth = AllowListAuthenticator::new([1001]);
        let result = auth.authenticate(&request_from(Some("admin"))).await;
        assert!(matches!(result, Err(AuthError::Forbidden(_))));
    }
}
