//! Login and logout
//!
//! The two calls that write the session store as a side effect. Login
//! persists the session only when the server confirms it and hands out a
//! token; logout clears it only when the server confirms, so a failed
//! logout can simply be retried.

use crate::envelope::ApiResponse;
use crate::gateway::{ApiGateway, RequestOptions};
use crate::validation::{Validate, Validator};
use ficct_session::{PermissionSet, Role};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// The backend decides what a valid login identifier is; only presence is
/// checked before sending.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Validate for LoginCredentials {
    fn validate(&self) -> Validator {
        let mut validator = Validator::new();
        validator
            .required("email", &self.email)
            .required("password", &self.password);
        validator
    }
}

/// Session material extracted from a successful login payload
#[derive(Debug, Clone, PartialEq)]
pub struct LoginData {
    pub token: String,
    pub user: Value,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

impl LoginData {
    /// Read `{token, user, rol, permisos}`; `None` without a non-empty token
    pub fn from_value(data: &Value) -> Option<Self> {
        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?
            .to_string();
        let user = data.get("user").cloned().unwrap_or(Value::Null);

        let role = data
            .get("rol")
            .or_else(|| user.get("rol"))
            .and_then(role_name)
            .and_then(Role::from_wire);

        let permissions = data
            .get("permisos")
            .or_else(|| user.get("permisos"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(permission_name).collect())
            .unwrap_or_default();

        Some(Self {
            token,
            user,
            role,
            permissions,
        })
    }
}

/// Roles arrive either as a bare string or as `{nombre: ...}`
fn role_name(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("nombre").and_then(Value::as_str))
        .or_else(|| value.get("name").and_then(Value::as_str))
}

fn permission_name(value: &Value) -> Option<String> {
    role_name(value).map(str::to_string)
}

impl ApiGateway {
    /// Authenticate and, on success, persist the session
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResponse<Value> {
        if let Err(invalid) = credentials.validate().finish() {
            return invalid;
        }

        let body = match serde_json::to_value(credentials) {
            Ok(body) => body,
            Err(e) => return ApiResponse::failure("serialization error", e.to_string()),
        };
        let response = self.request("/login", RequestOptions::post(body)).await;

        if !response.is_success() {
            info!(status = ?response.status, "Login rejected");
            return response;
        }

        let Some(login) = response.data.as_ref().and_then(LoginData::from_value) else {
            warn!("Login succeeded without a token; session not stored");
            return response;
        };

        if let Err(e) = self.session().set_session(
            &login.token,
            &login.user,
            login.role,
            &login.permissions,
        ) {
            e.log();
            return ApiResponse {
                status: response.status,
                ..ApiResponse::failure("session error", "could not store the session")
            };
        }

        info!(role = ?login.role, "Logged in");
        response
    }

    /// End the session on the server, then locally if the server agreed
    pub async fn logout(&self) -> ApiResponse<Value> {
        let response = self
            .request("/logout", RequestOptions::post(Value::Object(Default::default())))
            .await;

        if response.is_success() {
            if let Err(e) = self.session().clear_session() {
                e.log();
            }
        } else {
            warn!(
                message = %response.message_or("logout failed"),
                "Logout failed; keeping the stored session"
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_data_from_flat_payload() {
        let data = json!({
            "token": "abc",
            "user": {"id": 1, "name": "Ana"},
            "rol": "docente",
            "permisos": ["x"]
        });
        let login = LoginData::from_value(&data).unwrap();
        assert_eq!(login.token, "abc");
        assert_eq!(login.role, Some(Role::Docente));
        assert!(login.permissions.contains("x"));
    }

    #[test]
    fn test_login_data_from_nested_records() {
        let data = json!({
            "token": "abc",
            "user": {"id": 1, "rol": {"id": 2, "nombre": "coordinador"}},
            "permisos": [{"id": 1, "nombre": "materias.crear"}, "docentes.ver", 42]
        });
        let login = LoginData::from_value(&data).unwrap();
        assert_eq!(login.role, Some(Role::Coordinador));
        assert_eq!(login.permissions.len(), 2);
    }

    #[test]
    fn test_login_data_requires_token() {
        assert!(LoginData::from_value(&json!({"user": {}})).is_none());
        assert!(LoginData::from_value(&json!({"token": ""})).is_none());
    }

    #[test]
    fn test_unknown_role_is_none() {
        let login = LoginData::from_value(&json!({"token": "t", "rol": "estudiante"})).unwrap();
        assert_eq!(login.role, None);
        assert!(login.permissions.is_empty());
    }

    #[test]
    fn test_credentials_validation() {
        assert!(LoginCredentials::new("ana@ficct.edu.bo", "secret")
            .validate()
            .is_valid());
        let validator = LoginCredentials::new("", "").validate();
        assert!(validator.errors().contains_key("email"));
        assert!(validator.errors().contains_key("password"));
    }

    #[test]
    fn test_username_login_is_not_rejected_locally() {
        assert!(LoginCredentials::new("admin", "secret").validate().is_valid());
        let validator = LoginCredentials::new("admin", "").validate();
        assert!(!validator.errors().contains_key("email"));
        assert!(validator.errors().contains_key("password"));
    }
}
