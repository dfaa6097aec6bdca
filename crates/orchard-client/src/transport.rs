//! Game server transport.
//!
//! [`GameServer`] is the contract the session consumes: pull a snapshot,
//! perform an action, and the auth calls the binary uses to get a signed-in
//! cookie. The trait returns `Send` futures so the session can be generic
//! over it without boxing; [`HttpTransport`] is the real implementation and
//! tests provide scripted ones.
//!
//! Every state-returning endpoint answers with the same envelope
//! (`success`, `state`, `message`). A 401 from any endpoint means the
//! cookie session is gone.

use std::future::Future;

use orchard_types::{ActionResponse, Credentials, GameAction, SessionStatus, Snapshot};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Server endpoint that advances the game for the user and returns state.
const SYNC_ENDPOINT: &str = "/api/update_game";

/// The server operations the client depends on.
pub trait GameServer: Send + Sync {
    /// Pull the current snapshot. Safe to call repeatedly.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot, ClientError>> + Send;

    /// Perform a mutating action. `Ok(Some(_))` carries the updated state.
    fn perform(
        &self,
        action: &GameAction,
    ) -> impl Future<Output = Result<Option<Snapshot>, ClientError>> + Send;

    /// Whether the current cookie session is signed in.
    fn check_session(&self) -> impl Future<Output = Result<bool, ClientError>> + Send;

    /// Sign in.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Create an account. The server signs the new account in, so no
    /// separate [`GameServer::login`] is needed.
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Sign out.
    fn logout(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`GameServer`] over HTTP with a cookie-backed session.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the configured server.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.server_url.clone(),
        })
    }

    /// Absolute URL of an endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("GET {path} failed: {e}")))
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ClientError> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("POST {path} failed: {e}")))
    }
}

impl GameServer for HttpTransport {
    async fn fetch_snapshot(&self) -> Result<Snapshot, ClientError> {
        let envelope = read_envelope(self.get(SYNC_ENDPOINT).await?).await?;
        envelope
            .state
            .ok_or_else(|| ClientError::Decode("sync reply carried no state".to_owned()))
    }

    async fn perform(&self, action: &GameAction) -> Result<Option<Snapshot>, ClientError> {
        debug!(action = action.name(), "performing action");
        let response = self.post(action.endpoint(), &action.payload()).await?;
        Ok(read_envelope(response).await?.state)
    }

    async fn check_session(&self) -> Result<bool, ClientError> {
        let response = self.get("/api/check_session").await?;
        let status: SessionStatus = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("session probe: {e}")))?;
        Ok(status.logged_in)
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let body = serde_json::to_value(credentials)?;
        match read_envelope(self.post("/api/login", &body).await?).await {
            // A 401 here is a wrong password, not a lost session.
            Err(ClientError::Unauthenticated) => Err(ClientError::Rejected {
                message: "Invalid credentials".to_owned(),
            }),
            other => other.map(drop),
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let body = serde_json::to_value(credentials)?;
        read_envelope(self.post("/api/register", &body).await?)
            .await
            .map(drop)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        read_envelope(self.get("/api/logout").await?).await.map(drop)
    }
}

/// Decode the reply envelope and classify failures.
async fn read_envelope(response: reqwest::Response) -> Result<ActionResponse, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(format!("failed to read reply body: {e}")))?;
    classify_reply(status, &body)
}

fn classify_reply(status: StatusCode, body: &str) -> Result<ActionResponse, ClientError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthenticated);
    }
    match serde_json::from_str::<ActionResponse>(body) {
        Ok(envelope) if envelope.success => Ok(envelope),
        Ok(envelope) => Err(ClientError::Rejected {
            message: envelope.message.unwrap_or_else(|| status.to_string()),
        }),
        Err(e) if status.is_success() => Err(ClientError::Decode(e.to_string())),
        Err(_) => Err(ClientError::Transport(format!("server returned {status}"))),
    }
}
