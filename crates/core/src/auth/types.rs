use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header carrying the caller's chat user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Request information for authentication
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let identity = Identity::anonymous();
        assert_eq!(identity.user_id, "anonymous");
        assert_eq!(identity.method, "none");
    }

    #[test]
    fn test_header_lookup() {
        let request = AuthRequest {
            headers: [(USER_ID_HEADER.to_string(), "42".to_string())].into(),
        };
        assert_eq!(request.header(USER_ID_HEADER), Some("42"));
        assert_eq!(request.header("authorization"), None);
    }
}
