// SPDX-License-Identifier: MIT

//! User directory adapter over the identity provider's REST API.
//!
//! Wraps account lookup, creation, update and deletion. Not-found is
//! translated into `None` rather than an error; everything else surfaces as
//! `AppError::Identity`.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::DirectoryUser;
use serde_json::{json, Value};

/// Identity provider client.
#[derive(Clone)]
pub struct Directory {
    client: Option<reqwest::Client>,
    base_url: String,
    api_key: String,
}

/// Outcome of a provider call: payload or provider error code.
enum ApiResponse {
    Ok(Value),
    Err(String),
}

impl Directory {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Some(reqwest::Client::new()),
            base_url: config.identity_api_url.trim_end_matches('/').to_string(),
            api_key: config.identity_api_key.clone(),
        }
    }

    /// Create a mock directory for testing (offline mode).
    ///
    /// All provider operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            base_url: String::new(),
            api_key: String::new(),
        }
    }

    fn get_client(&self) -> Result<&reqwest::Client> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Identity("Identity provider not connected (offline mode)".to_string())
        })
    }

    async fn post(&self, action: &str, body: Value) -> Result<ApiResponse> {
        let url = format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key);

        let response = self
            .get_client()?
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Request to {} failed: {}", action, e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("Invalid response from {}: {}", action, e)))?;

        if status.is_success() {
            Ok(ApiResponse::Ok(payload))
        } else {
            let code = payload["error"]["message"]
                .as_str()
                .unwrap_or("UNKNOWN")
                .to_string();
            Ok(ApiResponse::Err(code))
        }
    }

    /// Create a new account. Duplicate emails surface as BadRequest.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<DirectoryUser> {
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": false,
        });

        match self.post("signUp", body).await? {
            ApiResponse::Ok(payload) => {
                let uid = payload["localId"]
                    .as_str()
                    .ok_or_else(|| AppError::Identity("signUp returned no localId".to_string()))?
                    .to_string();
                tracing::info!(email, uid = %uid, "Created user");
                Ok(DirectoryUser {
                    uid,
                    email: email.to_string(),
                    display_name: None,
                    disabled: false,
                    is_admin: false,
                })
            }
            ApiResponse::Err(code) if code.starts_with("EMAIL_EXISTS") => Err(
                AppError::BadRequest("An account with this email already exists".to_string()),
            ),
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }

    /// Verify credentials. Returns the uid on success, None on bad
    /// email/password (not an error).
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<String>> {
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": false,
        });

        match self.post("signInWithPassword", body).await? {
            ApiResponse::Ok(payload) => Ok(payload["localId"].as_str().map(String::from)),
            ApiResponse::Err(code)
                if code.starts_with("EMAIL_NOT_FOUND")
                    || code.starts_with("INVALID_PASSWORD")
                    || code.starts_with("INVALID_LOGIN_CREDENTIALS")
                    || code.starts_with("USER_DISABLED") =>
            {
                tracing::warn!(email, code = %code, "Login rejected by identity provider");
                Ok(None)
            }
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }

    /// Get a user by email. Absent users are None, not errors.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
        self.lookup(json!({ "email": [email] })).await
    }

    /// Get a user by uid. Absent users are None, not errors.
    pub async fn get_user_by_id(&self, uid: &str) -> Result<Option<DirectoryUser>> {
        self.lookup(json!({ "localId": [uid] })).await
    }

    async fn lookup(&self, body: Value) -> Result<Option<DirectoryUser>> {
        match self.post("lookup", body).await? {
            ApiResponse::Ok(payload) => Ok(payload["users"]
                .as_array()
                .and_then(|users| users.first())
                .map(parse_user)),
            ApiResponse::Err(code) if code.starts_with("USER_NOT_FOUND") => Ok(None),
            ApiResponse::Err(code) if code.starts_with("EMAIL_NOT_FOUND") => Ok(None),
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }

    /// Update a user's display name and/or disabled flag.
    pub async fn update_user(
        &self,
        uid: &str,
        display_name: Option<&str>,
        disabled: Option<bool>,
    ) -> Result<()> {
        let mut body = json!({ "localId": uid });
        if let Some(name) = display_name {
            body["displayName"] = json!(name);
        }
        if let Some(flag) = disabled {
            body["disableUser"] = json!(flag);
        }

        match self.post("update", body).await? {
            ApiResponse::Ok(_) => {
                tracing::info!(uid, "Updated user");
                Ok(())
            }
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }

    /// Delete an account.
    pub async fn delete_user(&self, uid: &str) -> Result<()> {
        match self.post("delete", json!({ "localId": uid })).await? {
            ApiResponse::Ok(_) => {
                tracing::info!(uid, "Deleted user");
                Ok(())
            }
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }

    /// List accounts, one provider page at a time.
    pub async fn list_users(
        &self,
        page_token: Option<&str>,
    ) -> Result<(Vec<DirectoryUser>, Option<String>)> {
        let mut body = json!({ "maxResults": 100 });
        if let Some(token) = page_token {
            body["nextPageToken"] = json!(token);
        }

        match self.post("batchGet", body).await? {
            ApiResponse::Ok(payload) => {
                let users = payload["users"]
                    .as_array()
                    .map(|list| list.iter().map(parse_user).collect())
                    .unwrap_or_default();
                let next = payload["nextPageToken"].as_str().map(String::from);
                Ok((users, next))
            }
            ApiResponse::Err(code) => Err(AppError::Identity(code)),
        }
    }
}

/// Parse a provider user record, including the `is_admin` custom claim
/// carried as a JSON string in `customAttributes`.
fn parse_user(record: &Value) -> DirectoryUser {
    let is_admin = record["customAttributes"]
        .as_str()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|claims| claims["is_admin"].as_bool())
        .unwrap_or(false);

    DirectoryUser {
        uid: record["localId"].as_str().unwrap_or_default().to_string(),
        email: record["email"].as_str().unwrap_or_default().to_string(),
        display_name: record["displayName"].as_str().map(String::from),
        disabled: record["disabled"].as_bool().unwrap_or(false),
        is_admin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_with_admin_claim() {
        let record = json!({
            "localId": "u1",
            "email": "root@example.com",
            "displayName": "Root",
            "customAttributes": "{\"is_admin\": true}"
        });
        let user = parse_user(&record);
        assert_eq!(user.uid, "u1");
        assert!(user.is_admin);
        assert!(!user.disabled);
    }

    #[test]
    fn test_parse_user_without_claims() {
        let record = json!({ "localId": "u2", "email": "plain@example.com" });
        let user = parse_user(&record);
        assert!(!user.is_admin);
        assert_eq!(user.display_name, None);
    }

    #[tokio::test]
    async fn test_mock_directory_is_offline() {
        let directory = Directory::new_mock();
        let err = directory.get_user_by_email("a@b.c").await.unwrap_err();
        assert!(matches!(err, AppError::Identity(_)));
    }
}
