//! Supabase Client
//!
//! The thin client over the managed service's HTTP surface: GoTrue for
//! auth, PostgREST for the profile and vote stores, and the realtime
//! websocket for insert notifications. All service-specific wire
//! details live here; the rest of the crate only sees the
//! [`VoteBackend`] trait.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::realtime;
use super::traits::{AdminBackend, AdminUser, CreateUser, VoteBackend, VoteSubscription};
use crate::error::CoreError;
use crate::profile::{Profile, ProfileId};
use crate::session::AuthSession;
use crate::votes::{NewVote, Rating, RecentVote, VoteRow};

/// Request timeout for every REST call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// The end-user client over the service's public (anon-key) surface.
pub struct SupabaseBackend {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
    /// Bearer token of the signed-in account, once there is one.
    access_token: RwLock<Option<String>>,
}

// ============================================
// Wire types
// ============================================

#[derive(Debug, Deserialize)]
struct SignInResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: ProfileId,
    email: String,
    display_name: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NameRef {
    display_name: Option<String>,
    email: Option<String>,
}

impl NameRef {
    fn label(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .unwrap_or("someone")
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecentVoteWire {
    rating: Rating,
    timestamp: chrono::DateTime<chrono::Utc>,
    voter: Option<NameRef>,
    voted_for: Option<NameRef>,
}

impl From<RecentVoteWire> for RecentVote {
    fn from(wire: RecentVoteWire) -> Self {
        RecentVote {
            voter_name: wire
                .voter
                .as_ref()
                .map(NameRef::label)
                .unwrap_or_else(|| "someone".to_string()),
            voted_for_name: wire
                .voted_for
                .as_ref()
                .map(NameRef::label)
                .unwrap_or_else(|| "someone".to_string()),
            rating: wire.rating,
            timestamp: wire.timestamp,
        }
    }
}

impl SupabaseBackend {
    /// Build a client for the given service coordinates.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            anon_key: anon_key.into(),
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            access_token: RwLock::new(None),
        }
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .clone()
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    async fn fetch_profiles(&self, query: &str) -> Result<Vec<Profile>, CoreError> {
        let url = self.rest_url(&format!("profiles?select=id,email,display_name{query}"));
        let response = self.request(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "profile query failed with {}",
                response.status()
            )));
        }
        let rows: Vec<ProfileRow> = response.json().await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

#[async_trait]
impl VoteBackend for SupabaseBackend {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, CoreError> {
        let url = self.auth_url("token?grant_type=password");
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNAUTHORIZED
        {
            return Err(CoreError::AuthFailed);
        }
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "sign-in failed with {}",
                response.status()
            )));
        }

        let signed_in: SignInResponse = response.json().await?;
        *self.access_token.write() = Some(signed_in.access_token);

        let needs_password_change = signed_in.user.user_metadata["needs_password_change"]
            .as_bool()
            .unwrap_or(false);

        // Merge the stored profile row over the auth identity. A
        // missing row is tolerated: the identity alone is enough to
        // use the app.
        let id = ProfileId::from_uuid(signed_in.user.id);
        let profile = match self.profile_by_id(id).await {
            Ok(Some(profile)) => profile,
            Ok(None) | Err(_) => Profile {
                id,
                email: signed_in.user.email.clone(),
                display_name: signed_in.user.user_metadata["display_name"]
                    .as_str()
                    .map(str::to_string),
            },
        };

        Ok(AuthSession {
            profile,
            needs_password_change,
        })
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        let url = self.auth_url("logout");
        let result = self.request(self.http.post(&url)).send().await;
        // The local token is gone either way.
        *self.access_token.write() = None;
        result?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), CoreError> {
        let url = self.auth_url("user");
        let response = self
            .request(self.http.put(&url))
            .json(&json!({
                "password": new_password,
                "data": { "needs_password_change": false },
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "password update failed with {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), CoreError> {
        let url = self.auth_url("recover");
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "password reset failed with {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn profile_by_id(&self, id: ProfileId) -> Result<Option<Profile>, CoreError> {
        let profiles = self.fetch_profiles(&format!("&id=eq.{id}")).await?;
        Ok(profiles.into_iter().next())
    }

    async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>, CoreError> {
        let profiles = self.fetch_profiles(&format!("&email=eq.{email}")).await?;
        Ok(profiles.into_iter().next())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, CoreError> {
        self.fetch_profiles("").await
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<(), CoreError> {
        let url = self.rest_url("votes");
        let response = self
            .request(self.http.post(&url))
            .header("Prefer", "return=minimal")
            .json(vote)
            .send()
            .await
            .map_err(|e| CoreError::SubmissionFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CoreError::SubmissionFailed(format!(
                "insert rejected with {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn list_votes(&self) -> Result<Vec<VoteRow>, CoreError> {
        let url = self.rest_url("votes?select=voted_for_id,rating");
        let response = self.request(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "vote listing failed with {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn recent_votes(&self, limit: usize) -> Result<Vec<RecentVote>, CoreError> {
        let select = "rating,timestamp,\
             voter:profiles!voter_id(email,display_name),\
             voted_for:profiles!voted_for_id(email,display_name)";
        let url = self.rest_url(&format!(
            "votes?select={select}&order=timestamp.desc&limit={limit}"
        ));
        let response = self.request(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "recent votes failed with {}",
                response.status()
            )));
        }
        let rows: Vec<RecentVoteWire> = response.json().await?;
        Ok(rows.into_iter().map(RecentVote::from).collect())
    }

    async fn subscribe_votes(&self, target: ProfileId) -> Result<VoteSubscription, CoreError> {
        let ws_url = realtime::websocket_url(&self.base_url, &self.anon_key);
        Ok(realtime::spawn_subscription(
            ws_url,
            self.access_token.read().clone(),
            target,
        ))
    }
}

// ============================================
// Privileged management API
// ============================================

#[derive(Debug, Deserialize)]
struct AdminUserRow {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct AdminUserList {
    users: Vec<AdminUserRow>,
}

/// Client for the privileged management API. Only ever constructed by
/// offline operator tooling with the service-role key.
pub struct SupabaseAdmin {
    base_url: String,
    service_key: String,
    http: reqwest::Client,
}

impl SupabaseAdmin {
    /// Build an admin client for the given service coordinates.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/auth/v1/admin/{path}", self.base_url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response, CoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(CoreError::BackendUnavailable(format!(
                "{what} failed with {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl AdminBackend for SupabaseAdmin {
    async fn list_users(&self) -> Result<Vec<AdminUser>, CoreError> {
        let response = self
            .request(self.http.get(self.admin_url("users")))
            .send()
            .await?;
        let response = Self::check(response, "user listing").await?;
        let list: AdminUserList = response.json().await?;
        Ok(list
            .users
            .into_iter()
            .map(|u| AdminUser {
                id: u.id,
                email: u.email,
            })
            .collect())
    }

    async fn create_user(&self, request: &CreateUser) -> Result<AdminUser, CoreError> {
        let response = self
            .request(self.http.post(self.admin_url("users")))
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "email_confirm": true,
                "user_metadata": {
                    "display_name": request.display_name,
                    "needs_password_change": request.must_change_password,
                },
            }))
            .send()
            .await?;
        let response = Self::check(response, "user creation").await?;
        let row: AdminUserRow = response.json().await?;
        Ok(AdminUser {
            id: row.id,
            email: row.email,
        })
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), CoreError> {
        let response = self
            .request(self.http.put(self.admin_url(&format!("users/{user_id}"))))
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        Self::check(response, "password update").await?;
        Ok(())
    }

    async fn set_email(&self, user_id: &str, new_email: &str) -> Result<(), CoreError> {
        let response = self
            .request(self.http.put(self.admin_url(&format!("users/{user_id}"))))
            .json(&json!({ "email": new_email }))
            .send()
            .await?;
        Self::check(response, "email update").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = SupabaseBackend::new("https://x.supabase.co/", "key");
        assert_eq!(
            backend.rest_url("votes"),
            "https://x.supabase.co/rest/v1/votes"
        );
        assert_eq!(
            backend.auth_url("logout"),
            "https://x.supabase.co/auth/v1/logout"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let backend = SupabaseBackend::new("https://x.supabase.co", "anon");
        assert_eq!(backend.bearer(), "anon");
        *backend.access_token.write() = Some("jwt".into());
        assert_eq!(backend.bearer(), "jwt");
    }

    #[test]
    fn test_name_ref_label_fallbacks() {
        let named = NameRef {
            display_name: Some("Ana".into()),
            email: Some("ana@famstar.local".into()),
        };
        assert_eq!(named.label(), "Ana");

        let anon = NameRef {
            display_name: None,
            email: Some("bruno@famstar.local".into()),
        };
        assert_eq!(anon.label(), "bruno");

        let unknown = NameRef {
            display_name: None,
            email: None,
        };
        assert_eq!(unknown.label(), "someone");
    }
}
