//! Gmail API mail store implementation.
//!
//! This module provides a [`MailStore`] implementation using the Gmail
//! REST API. It handles OAuth 2.0 authentication, message search and
//! retrieval, and batched deletion.
//!
//! # Authentication
//!
//! Gmail uses OAuth 2.0. Refresh tokens and client credentials are stored
//! in the system keychain, referenced by the account's user ID. The store
//! exchanges the refresh token for an access token on `authenticate`.
//!
//! # API Usage
//!
//! This store uses the Gmail API v1:
//! - `users.messages.list` for message search
//! - `users.messages.get` for full and metadata-only retrieval
//! - `users.messages.batchDelete` for bulk deletion

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{MailStore, MailStoreError, MessagePage, Result};
use crate::domain::{BodyPart, EmailMessage, Header, MessageId, UserId};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Gmail API cap on `maxResults` for message list calls.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<GmailMessageRef>>,
    next_page_token: Option<String>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

/// Gmail API message reference (list results carry IDs only).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageRef {
    id: String,
    #[allow(dead_code)]
    thread_id: Option<String>,
}

/// Gmail API message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    snippet: Option<String>,
    payload: Option<GmailPayload>,
    #[allow(dead_code)]
    internal_date: Option<String>,
}

/// Gmail message payload (headers and body parts).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPayload {
    mime_type: Option<String>,
    headers: Option<Vec<GmailHeader>>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
}

/// Gmail message header.
#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail message part (for multipart messages).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    mime_type: Option<String>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
    #[allow(dead_code)]
    filename: Option<String>,
}

/// Gmail message body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailBody {
    data: Option<String>,
    #[allow(dead_code)]
    size: Option<u32>,
    #[allow(dead_code)]
    attachment_id: Option<String>,
}

/// Gmail batch delete request body.
#[derive(Debug, Serialize)]
struct BatchDeleteRequest {
    ids: Vec<String>,
}

/// Gmail profile response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    email_address: Option<String>,
    #[allow(dead_code)]
    messages_total: Option<u64>,
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: u64,
    #[allow(dead_code)]
    token_type: String,
}

/// OAuth credentials stored in the keychain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailCredentials {
    /// OAuth refresh token.
    pub refresh_token: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

/// Gmail API mail store.
///
/// Implements [`MailStore`] using the Gmail REST API with OAuth 2.0
/// authentication.
///
/// # Example
///
/// ```ignore
/// use sweep::providers::{GmailStore, MailStore};
///
/// let mut store = GmailStore::new(UserId::me());
/// store.authenticate().await?;
///
/// let page = store.search("category:promotions", 100, None).await?;
/// ```
pub struct GmailStore {
    /// User ID for keychain credential lookup.
    user_id: UserId,
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// OAuth credentials.
    credentials: Option<GmailCredentials>,
    /// Current OAuth access token (refreshed as needed).
    access_token: Option<String>,
    /// Whether the store is authenticated.
    authenticated: bool,
}

impl GmailStore {
    /// Creates a new Gmail store for the specified user.
    ///
    /// The store is not authenticated until [`authenticate`](Self::authenticate)
    /// is called.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            client: reqwest::Client::new(),
            credentials: None,
            access_token: None,
            authenticated: false,
        }
    }

    /// Creates a Gmail store with explicit credentials (for testing or direct use).
    pub fn with_credentials(user_id: UserId, credentials: GmailCredentials) -> Self {
        Self {
            user_id,
            client: reqwest::Client::new(),
            credentials: Some(credentials),
            access_token: None,
            authenticated: false,
        }
    }

    /// Returns whether the store is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns the user ID for this store.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Authenticates with the Gmail API.
    ///
    /// Loads credentials from the keychain when none were provided
    /// explicitly, then refreshes the access token.
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.credentials.is_none() {
            self.credentials = Some(self.load_credentials_from_keychain()?);
        }

        self.refresh_access_token().await?;
        self.authenticated = true;

        tracing::info!(user_id = %self.user_id, "Gmail store authenticated");
        Ok(())
    }

    /// Loads credentials from the system keychain.
    fn load_credentials_from_keychain(&self) -> Result<GmailCredentials> {
        let entry = keyring::Entry::new("sweep", &format!("gmail-{}", self.user_id.0))
            .map_err(|e| MailStoreError::Authentication(format!("keyring error: {}", e)))?;

        let creds_json = entry
            .get_password()
            .map_err(|e| MailStoreError::Authentication(format!("no credentials found: {}", e)))?;

        serde_json::from_str(&creds_json)
            .map_err(|e| MailStoreError::Authentication(format!("invalid credentials: {}", e)))
    }

    /// Saves credentials to the system keychain.
    pub fn save_credentials_to_keychain(&self, credentials: &GmailCredentials) -> Result<()> {
        let entry = keyring::Entry::new("sweep", &format!("gmail-{}", self.user_id.0))
            .map_err(|e| MailStoreError::Authentication(format!("keyring error: {}", e)))?;

        let creds_json = serde_json::to_string(credentials)
            .map_err(|e| MailStoreError::Authentication(format!("serialize error: {}", e)))?;

        entry
            .set_password(&creds_json)
            .map_err(|e| MailStoreError::Authentication(format!("keyring error: {}", e)))?;

        Ok(())
    }

    /// Refreshes the OAuth access token using the refresh token.
    async fn refresh_access_token(&mut self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| MailStoreError::Authentication("no credentials available".to_string()))?;

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| MailStoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailStoreError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| MailStoreError::Internal(format!("parse token response: {}", e)))?;

        self.access_token = Some(token_response.access_token.clone());
        Ok(token_response.access_token)
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| MailStoreError::Authentication("not authenticated".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| MailStoreError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    fn require_auth(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(MailStoreError::Authentication(
                "not authenticated".to_string(),
            ))
        }
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let headers = self.auth_headers()?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| MailStoreError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Makes an authenticated POST request that doesn't return a body.
    async fn post_no_response<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| MailStoreError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }
        Ok(())
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| MailStoreError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> MailStoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => MailStoreError::Authentication(format!("unauthorized: {}", body)),
            404 => MailStoreError::NotFound(body),
            429 => MailStoreError::RateLimited {
                retry_after_secs: None,
            },
            _ => MailStoreError::Internal(format!("API error ({}): {}", status, body)),
        }
    }

    /// Returns the authenticated account's email address.
    pub async fn profile_email(&self) -> Result<Option<String>> {
        self.require_auth()?;
        let response: ProfileResponse = self.get("/profile").await?;
        Ok(response.email_address)
    }

    /// Percent-encodes a query parameter value.
    fn encode_query(value: &str) -> String {
        url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
    }

    /// Converts a Gmail API message to the domain message shape.
    fn to_email_message(msg: GmailMessage) -> EmailMessage {
        let (headers, body) = match msg.payload {
            Some(payload) => {
                let headers = payload
                    .headers
                    .unwrap_or_default()
                    .into_iter()
                    .map(|h| Header::new(h.name, h.value))
                    .collect();
                let body = Some(BodyPart {
                    mime_type: payload.mime_type.unwrap_or_default(),
                    data: payload.body.and_then(|b| b.data),
                    parts: payload
                        .parts
                        .unwrap_or_default()
                        .into_iter()
                        .map(Self::to_body_part)
                        .collect(),
                });
                (headers, body)
            }
            None => (Vec::new(), None),
        };

        EmailMessage {
            id: MessageId::from(msg.id),
            snippet: msg.snippet.unwrap_or_default(),
            headers,
            body,
        }
    }

    /// Recursively converts a Gmail part into the domain body tree.
    fn to_body_part(part: GmailPart) -> BodyPart {
        BodyPart {
            mime_type: part.mime_type.unwrap_or_default(),
            data: part.body.and_then(|b| b.data),
            parts: part
                .parts
                .unwrap_or_default()
                .into_iter()
                .map(Self::to_body_part)
                .collect(),
        }
    }
}

#[async_trait]
impl MailStore for GmailStore {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<MessagePage> {
        self.require_auth()?;

        let mut endpoint = format!(
            "/messages?q={}&maxResults={}",
            Self::encode_query(query),
            max_results.min(MAX_PAGE_SIZE)
        );
        if let Some(token) = page_token {
            endpoint.push_str(&format!("&pageToken={}", Self::encode_query(token)));
        }

        let response: MessageListResponse = self.get(&endpoint).await?;

        Ok(MessagePage {
            ids: response
                .messages
                .unwrap_or_default()
                .into_iter()
                .map(|m| MessageId::from(m.id))
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn fetch_message(&self, id: &MessageId) -> Result<EmailMessage> {
        self.require_auth()?;

        let endpoint = format!("/messages/{}?format=full", id.0);
        let response: GmailMessage = self.get(&endpoint).await?;
        Ok(Self::to_email_message(response))
    }

    async fn fetch_metadata(&self, id: &MessageId) -> Result<EmailMessage> {
        self.require_auth()?;

        let endpoint = format!(
            "/messages/{}?format=metadata\
             &metadataHeaders=From&metadataHeaders=Subject&metadataHeaders=Date",
            id.0
        );
        let response: GmailMessage = self.get(&endpoint).await?;
        Ok(Self::to_email_message(response))
    }

    async fn batch_delete(&self, ids: &[MessageId]) -> Result<()> {
        self.require_auth()?;

        if ids.is_empty() {
            return Ok(());
        }

        let body = BatchDeleteRequest {
            ids: ids.iter().map(|id| id.0.clone()).collect(),
        };
        self.post_no_response("/messages/batchDelete", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmail_store_creation() {
        let store = GmailStore::new(UserId::me());
        assert_eq!(store.user_id().0, "me");
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn operations_require_authentication() {
        let store = GmailStore::new(UserId::me());

        let result = store.search("category:promotions", 10, None).await;
        assert!(matches!(result, Err(MailStoreError::Authentication(_))));

        let result = store.fetch_message(&MessageId::from("m1")).await;
        assert!(matches!(result, Err(MailStoreError::Authentication(_))));

        let result = store.batch_delete(&[MessageId::from("m1")]).await;
        assert!(matches!(result, Err(MailStoreError::Authentication(_))));
    }

    #[test]
    fn query_encoding() {
        let encoded = GmailStore::encode_query("from:deals@acme.example older_than:14d");
        assert!(!encoded.contains(' '));
        assert!(encoded.contains("from%3Adeals"));
    }

    #[test]
    fn message_conversion_builds_body_tree() {
        let msg = GmailMessage {
            id: "m1".to_string(),
            snippet: Some("Big savings".to_string()),
            internal_date: None,
            payload: Some(GmailPayload {
                mime_type: Some("multipart/alternative".to_string()),
                headers: Some(vec![
                    GmailHeader {
                        name: "From".to_string(),
                        value: "Acme <deals@acme.example>".to_string(),
                    },
                    GmailHeader {
                        name: "List-Unsubscribe".to_string(),
                        value: "<https://acme.example/unsub>".to_string(),
                    },
                ]),
                body: None,
                parts: Some(vec![GmailPart {
                    mime_type: Some("text/html".to_string()),
                    body: Some(GmailBody {
                        data: Some("PGh0bWw-".to_string()),
                        size: None,
                        attachment_id: None,
                    }),
                    parts: None,
                    filename: None,
                }]),
            }),
        };

        let message = GmailStore::to_email_message(msg);
        assert_eq!(message.id.0, "m1");
        assert_eq!(message.snippet, "Big savings");
        assert_eq!(
            message.header("list-unsubscribe"),
            Some("<https://acme.example/unsub>")
        );

        let body = message.body.unwrap();
        assert_eq!(body.mime_type, "multipart/alternative");
        assert_eq!(body.parts.len(), 1);
        assert_eq!(body.parts[0].mime_type, "text/html");
        assert_eq!(body.parts[0].data.as_deref(), Some("PGh0bWw-"));
    }

    #[test]
    fn message_conversion_without_payload() {
        let msg = GmailMessage {
            id: "m2".to_string(),
            snippet: None,
            internal_date: None,
            payload: None,
        };

        let message = GmailStore::to_email_message(msg);
        assert!(message.headers.is_empty());
        assert!(message.body.is_none());
    }

    #[test]
    fn message_list_response_deserializes() {
        let json = r#"{
            "messages": [{"id": "a1", "threadId": "t1"}, {"id": "a2", "threadId": "t2"}],
            "nextPageToken": "tok",
            "resultSizeEstimate": 2
        }"#;

        let response: MessageListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.messages.unwrap().len(), 2);
        assert_eq!(response.next_page_token.as_deref(), Some("tok"));
    }
}
