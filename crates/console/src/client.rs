//! HTTP data client for the user service.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use domain::{Role, UserResponse, UsersByRole};

use crate::error::{ClientError, ClientResult};

const CSRF_PATH: &str = "/api/csrf-token";
const CSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Body for create and update. `None` fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CsrfToken {
    token: String,
}

#[derive(Debug, Serialize)]
struct RoleIds<'a> {
    roles: &'a [i32],
}

/// Client for the user service REST API.
///
/// Cookies persist across requests, so the `XSRF-TOKEN` cookie set by the
/// handshake is sent back automatically; the token itself goes in a header.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: RwLock::new(None),
        })
    }

    /// Fetch a fresh anti-forgery token and remember it.
    pub async fn init_csrf(&self) -> ClientResult<String> {
        let request = self.http.get(self.url(CSRF_PATH));
        let CsrfToken { token } = self.execute(&Method::GET, CSRF_PATH, request).await?;

        *self.csrf_token.write().await = Some(token.clone());
        tracing::debug!("Anti-forgery token initialised");
        Ok(token)
    }

    /// `GET /api`
    pub async fn api_status(&self) -> ClientResult<String> {
        let Message { message } = self.get("/api").await?;
        Ok(message)
    }

    pub async fn list_roles(&self) -> ClientResult<Vec<Role>> {
        self.get("/api/roles").await
    }

    pub async fn list_users(&self) -> ClientResult<Vec<UserResponse>> {
        self.get("/api/users").await
    }

    pub async fn list_users_by_role(&self) -> ClientResult<UsersByRole> {
        self.get("/api/users/by-role").await
    }

    pub async fn get_user(&self, id: i32) -> ClientResult<UserResponse> {
        self.get(&format!("/api/users/{}", id)).await
    }

    pub async fn create_user(&self, payload: &UserPayload) -> ClientResult<UserResponse> {
        self.write(Method::POST, "/api/users", Some(payload)).await
    }

    pub async fn update_user(&self, id: i32, payload: &UserPayload) -> ClientResult<UserResponse> {
        self.write(Method::PUT, &format!("/api/users/{}", id), Some(payload))
            .await
    }

    /// Delete a user, returning the server's confirmation message
    pub async fn delete_user(&self, id: i32) -> ClientResult<String> {
        let Message { message } = self
            .write(Method::DELETE, &format!("/api/users/{}", id), None::<&()>)
            .await?;
        Ok(message)
    }

    pub async fn attach_roles(&self, id: i32, roles: &[i32]) -> ClientResult<UserResponse> {
        self.write(
            Method::POST,
            &format!("/api/users/{}/roles", id),
            Some(&RoleIds { roles }),
        )
        .await
    }

    pub async fn detach_roles(&self, id: i32, roles: &[i32]) -> ClientResult<UserResponse> {
        self.write(
            Method::DELETE,
            &format!("/api/users/{}/roles", id),
            Some(&RoleIds { roles }),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.http.get(self.url(path));
        self.execute(&Method::GET, path, request).await
    }

    /// Mutating request; performs the handshake first when no token is held.
    async fn write<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self.token().await?;

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(CSRF_HEADER, token);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(&method, path, request).await
    }

    async fn token(&self) -> ClientResult<String> {
        if let Some(token) = self.csrf_token.read().await.clone() {
            return Ok(token);
        }
        self.init_csrf().await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        tracing::debug!(%method, path, "API request");

        let response = request.send().await.inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "API request failed");
        })?;
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status, &body))
    }
}
