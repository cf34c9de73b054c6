//! Account and session client for the hosted backend.
//!
//! Registration, email/password sign-in, current-user lookup, and sign-out
//! against the Appwrite account API. The returned session secret is what the
//! note store client attaches to authenticated requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::http::{build_client, request_error, status_error, PROJECT_HEADER, SESSION_HEADER};

/// The authenticated account as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// An open backend session: the secret plus the account it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub secret: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("secret", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Where a front end keeps the session between invocations.
pub trait SessionPersistence: Send + Sync {
    fn load_session(&self) -> Result<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> Result<()>;
    fn clear_session(&self) -> Result<()>;
}

/// HTTP client for the backend account API.
#[derive(Debug, Clone)]
pub struct AccountClient {
    endpoint: String,
    project_id: String,
    client: reqwest::Client,
}

impl AccountClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            project_id: config.project_id.clone(),
            client: build_client(config.timeout)?,
        })
    }

    /// Create an account, then immediately open a session for it.
    ///
    /// The session is needed right away so the new user can write documents.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "userId": "unique()",
            "email": email,
            "password": password,
            "name": name.trim(),
        });
        let response = self
            .client
            .post(format!("{}/account", self.endpoint))
            .header(PROJECT_HEADER, &self.project_id)
            .json(&payload)
            .send()
            .await
            .map_err(|error| request_error(&error))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        self.login(email, password).await
    }

    /// Open an email/password session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}/account/sessions/email", self.endpoint))
            .header(PROJECT_HEADER, &self.project_id)
            .json(&payload)
            .send()
            .await
            .map_err(|error| request_error(&error))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let session = response
            .json::<SessionResponse>()
            .await
            .map_err(|error| request_error(&error))?;
        let secret = session.into_secret()?;

        let user = self.current_user(&secret).await?;
        Ok(AuthSession { secret, user })
    }

    /// Look up the account the given session belongs to.
    pub async fn current_user(&self, session_secret: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(format!("{}/account", self.endpoint))
            .header(PROJECT_HEADER, &self.project_id)
            .header(SESSION_HEADER, session_secret)
            .send()
            .await
            .map_err(|error| request_error(&error))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let user = response
            .json::<UserResponse>()
            .await
            .map_err(|error| request_error(&error))?;
        Ok(user.into())
    }

    /// Close the current session. An already-expired session is not an error.
    pub async fn logout(&self, session_secret: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/account/sessions/current", self.endpoint))
            .header(PROJECT_HEADER, &self.project_id)
            .header(SESSION_HEADER, session_secret)
            .send()
            .await
            .map_err(|error| request_error(&error))?;
        if !(response.status().is_success() || response.status() == reqwest::StatusCode::UNAUTHORIZED)
        {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::Validation("email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(Error::Validation("password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    secret: Option<String>,
}

impl SessionResponse {
    /// Prefer the explicit secret; older server versions only return the
    /// session id, which doubles as the secret for session headers.
    fn into_secret(self) -> Result<String> {
        let secret = self
            .secret
            .map(|secret| secret.trim().to_string())
            .filter(|secret| !secret.is_empty())
            .unwrap_or(self.id);
        if secret.is_empty() {
            return Err(Error::Auth(
                "sign-in response did not include a session secret".to_string(),
            ));
        }
        Ok(secret)
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<UserResponse> for AuthUser {
    fn from(value: UserResponse) -> Self {
        Self {
            id: value.id,
            email: value.email.filter(|email| !email.trim().is_empty()),
            name: value.name.filter(|name| !name.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_credentials_requires_both_fields() {
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("user@example.com", "  ").is_err());
        assert!(validate_credentials("user@example.com", "pw").is_ok());
    }

    #[test]
    fn session_response_prefers_explicit_secret() {
        let response = SessionResponse {
            id: "session-id".to_string(),
            secret: Some("session-secret".to_string()),
        };
        assert_eq!(response.into_secret().unwrap(), "session-secret");
    }

    #[test]
    fn session_response_falls_back_to_id() {
        let response = SessionResponse {
            id: "session-id".to_string(),
            secret: Some("   ".to_string()),
        };
        assert_eq!(response.into_secret().unwrap(), "session-id");
    }

    #[test]
    fn session_debug_redacts_secret() {
        let session = AuthSession {
            secret: "very-secret-value".to_string(),
            user: AuthUser {
                id: "user".to_string(),
                email: None,
                name: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("very-secret-value"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn user_response_drops_empty_optional_fields() {
        let user: AuthUser = UserResponse {
            id: "user".to_string(),
            email: Some("  ".to_string()),
            name: Some("Ada".to_string()),
        }
        .into();
        assert_eq!(user.email, None);
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }
}
