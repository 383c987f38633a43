//! The reqwest-backed API client and the traits the core is generic over.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use warden_shared::{Conversation, ConversationId, Message, Principal, SenderKind};

use crate::config::ApiConfig;
use crate::dto::{ConversationDto, ErrorBody, LoginResponse, Page};
use crate::error::{ApiError, ApiResult};

/// Authentication endpoints the session layer depends on, plus credential
/// management: the implementation attaches the held token to every request.
pub trait AuthApi: Send + Sync {
    /// Store the bearer token attached to subsequent requests.
    fn set_token(&self, token: &str);

    /// Drop the held token. Idempotent.
    fn clear_token(&self);

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<LoginResponse>> + Send;

    fn logout(&self) -> impl Future<Output = ApiResult<()>> + Send;

    /// Fetch the principal the held credential belongs to.
    fn current_principal(&self) -> impl Future<Output = ApiResult<Principal>> + Send;
}

/// Conversation and message endpoints the chat synchronizer depends on.
pub trait ChatApi: Send + Sync {
    fn list_conversations(
        &self,
        page: u32,
    ) -> impl Future<Output = ApiResult<Page<Conversation>>> + Send;

    fn create_conversation(
        &self,
        participant_id: Uuid,
        participant_kind: SenderKind,
    ) -> impl Future<Output = ApiResult<Conversation>> + Send;

    /// Messages of one page, time-ordered ascending within the page.
    fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> impl Future<Output = ApiResult<Page<Message>>> + Send;

    fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> impl Future<Output = ApiResult<Message>> + Send;
}

impl<T: AuthApi> AuthApi for std::sync::Arc<T> {
    fn set_token(&self, token: &str) {
        (**self).set_token(token)
    }

    fn clear_token(&self) {
        (**self).clear_token()
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        (**self).login(email, password).await
    }

    async fn logout(&self) -> ApiResult<()> {
        (**self).logout().await
    }

    async fn current_principal(&self) -> ApiResult<Principal> {
        (**self).current_principal().await
    }
}

impl<T: ChatApi> ChatApi for std::sync::Arc<T> {
    async fn list_conversations(&self, page: u32) -> ApiResult<Page<Conversation>> {
        (**self).list_conversations(page).await
    }

    async fn create_conversation(
        &self,
        participant_id: Uuid,
        participant_kind: SenderKind,
    ) -> ApiResult<Conversation> {
        (**self).create_conversation(participant_id, participant_kind).await
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> ApiResult<Page<Message>> {
        (**self).list_messages(conversation_id, page).await
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> ApiResult<Message> {
        (**self).send_message(conversation_id, content).await
    }
}

/// JSON-over-HTTPS client for the Warden backend.
///
/// Holds the bearer token internally so every outgoing call carries it once
/// the session layer has stored one.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path).json(body)
    }

    /// Send the request and decode a JSON body, mapping non-success statuses
    /// to [`ApiError::Status`] with the server's message when it sent one.
    async fn execute<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ApiResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            tracing::debug!(status = status.as_u16(), message = %message, "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    /// Like [`Self::execute`] for endpoints whose success body is empty.
    async fn execute_unit(&self, req: reqwest::RequestBuilder) -> ApiResult<()> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl AuthApi for ApiClient {
    fn set_token(&self, token: &str) {
        *self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear_token(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = json!({ "email": email, "password": password });
        self.execute(self.post("/auth/login", &body)).await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.execute_unit(self.post("/auth/logout", &json!({}))).await
    }

    async fn current_principal(&self) -> ApiResult<Principal> {
        self.execute(self.get("/auth/me")).await
    }
}

impl ChatApi for ApiClient {
    async fn list_conversations(&self, page: u32) -> ApiResult<Page<Conversation>> {
        let raw: Page<ConversationDto> = self
            .execute(self.get(&format!("/chats?page={page}")))
            .await?;

        let mut items = Vec::with_capacity(raw.items.len());
        for dto in raw.items {
            items.push(dto.into_conversation()?);
        }
        Ok(Page {
            items,
            page: raw.page,
            total: raw.total,
        })
    }

    async fn create_conversation(
        &self,
        participant_id: Uuid,
        participant_kind: SenderKind,
    ) -> ApiResult<Conversation> {
        let body = json!({
            "participant_id": participant_id,
            "participant_kind": participant_kind,
        });
        let dto: ConversationDto = self.execute(self.post("/chats", &body)).await?;
        dto.into_conversation()
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
    ) -> ApiResult<Page<Message>> {
        self.execute(self.get(&format!("/chats/{conversation_id}/messages?page={page}")))
            .await
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> ApiResult<Message> {
        let body = json!({ "content": content });
        self.execute(self.post(&format!("/chats/{conversation_id}/messages"), &body))
            .await
    }
}
