//! REST client for the mall backend.
//!
//! Every request carries the bearer token currently held by the
//! [`CredentialStore`] the session writes to.

use std::sync::Arc;

use async_trait::async_trait;
use mall_auth::{AuthBackend, AuthError, CredentialStore, LoginGrant, Role, User};
use mall_core::{Page, PageQuery, Resource, StoreId, WeeklySchedule};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::collection::CollectionApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `{message}` or `{error}` body of a failed request.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// `GET /auth/me` answers either the user or `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl BackendClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match self.credentials.load() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("backend request failed: {e}");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let error = Self::error_from(response).await;
        tracing::warn!(status = status.as_u16(), url = %url, "backend returned an error: {error}");
        Err(error)
    }

    async fn error_from(response: Response) -> ClientError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return ClientError::Unauthorized;
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);

        ClientError::api(status.as_u16(), message.trim())
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.json(self.request(Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.json(self.request(Method::PUT, path).json(body)).await
    }

    /// `DELETE`; the response body is ignored.
    pub async fn delete_at(&self, path: &str) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, path)).await.map(drop)
    }

    /// `GET /stores/{id}/schedule`.
    pub async fn store_schedule(&self, store: &StoreId) -> ClientResult<WeeklySchedule> {
        self.get(&format!("stores/{store}/schedule")).await
    }

    /// `PUT /stores/{id}/schedule`; validated locally first.
    pub async fn update_store_schedule(
        &self,
        store: &StoreId,
        schedule: &WeeklySchedule,
    ) -> ClientResult<WeeklySchedule> {
        schedule.validate()?;
        self.put(&format!("stores/{store}/schedule"), &schedule.sorted())
            .await
    }

    /// Roles assignable on the users screen.
    pub async fn roles(&self) -> ClientResult<Vec<Role>> {
        self.get("roles").await
    }
}

#[async_trait]
impl<E: Resource> CollectionApi<E> for BackendClient {
    async fn list(&self, query: &PageQuery) -> ClientResult<Page<E>> {
        let request = self.request(Method::GET, E::COLLECTION).query(query);
        let mut page: Page<E> = self.json(request).await?;

        if !page.meta.is_consistent() {
            tracing::warn!(
                collection = E::COLLECTION,
                total = page.meta.total,
                limit = page.meta.limit,
                reported = page.meta.total_pages,
                "backend page count disagrees with total/limit"
            );
            page.meta = page.meta.normalized();
        }

        Ok(page)
    }

    async fn create(&self, draft: &E::Draft) -> ClientResult<E> {
        E::validate_draft(draft)?;
        self.post(E::COLLECTION, draft).await
    }

    async fn update(&self, id: &E::Id, draft: &E::Draft) -> ClientResult<E> {
        E::validate_draft(draft)?;
        self.put(&format!("{}/{id}", E::COLLECTION), draft).await
    }

    async fn delete(&self, id: &E::Id) -> ClientResult<()> {
        self.delete_at(&format!("{}/{id}", E::COLLECTION)).await
    }
}

#[async_trait]
impl AuthBackend for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, AuthError> {
        let request = self
            .http
            .post(self.url("auth/login"))
            .json(&LoginRequest { email, password });

        match self.json::<LoginGrant>(request).await {
            Ok(grant) => Ok(grant),
            Err(ClientError::Unauthorized) => Err(AuthError::InvalidCredentials),
            Err(ClientError::Api { status: 400 | 403, .. }) => Err(AuthError::InvalidCredentials),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let request = self.http.get(self.url("auth/me")).bearer_auth(token);
        match self.json::<MeResponse>(request).await? {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => Ok(user),
        }
    }
}
