//! Signed-in session.
//!
//! Sign-in itself is served elsewhere; this is the shape it returns, kept here so clients
//! can carry the token and route on the user's role.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DOCTOR_ROLE: &str = "Doctor";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub role: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl Session {
    pub fn is_doctor(&self) -> bool {
        self.user.role == DOCTOR_ROLE
    }

    /// Where the UI sends this user after sign-in.
    pub fn landing_path(&self) -> &'static str {
        if self.is_doctor() {
            "/dashboard"
        } else {
            "/"
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(role: &str) -> Session {
        serde_json::from_value(json!({
            "token": "abc123",
            "user": {
                "role": role,
                "firstName": "Asha",
                "lastName": "Rao",
                "email": "asha@example.com"
            }
        }))
        .expect("sign-in payload should parse")
    }

    #[test]
    fn doctor_lands_on_dashboard() {
        let s = session("Doctor");
        assert!(s.is_doctor());
        assert_eq!(s.landing_path(), "/dashboard");
        assert_eq!(s.user.first_name, "Asha");
    }

    #[test]
    fn other_roles_land_on_home() {
        let s = session("Patient");
        assert!(!s.is_doctor());
        assert_eq!(s.landing_path(), "/");
    }

    #[test]
    fn authorization_header_is_bearer() {
        assert_eq!(session("Doctor").authorization(), "Bearer abc123");
    }
}
