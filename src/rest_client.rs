use std::fmt::Display;
use std::time::Instant;

use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::log;

use crate::models::{Participant, ScoreBody, ScoreMethod, ScoreUpdateBody};

/// A failed call against the scoreboard API.
#[derive(Debug)]
pub enum RequestError {
    Url(String),
    Network(reqwest::Error),
    Status { status: StatusCode, body: String },
    Parse(reqwest::Error),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Url(url) => write!(f, "invalid url {url}"),
            RequestError::Network(e) => write!(f, "network error: {e}"),
            RequestError::Status { status, body } => write!(f, "status {status}: {body}"),
            RequestError::Parse(e) => write!(f, "malformed response: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Network(e) | RequestError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Typed calls against `/api/scoreboard/{game_code}`.
#[derive(Clone)]
pub struct ScoreboardApi {
    client: Client,
    base_url: Url,
    game_code: String,
}

impl ScoreboardApi {
    pub fn new(base_url: &str, game_code: &str) -> Result<ScoreboardApi, RequestError> {
        let base_url = Url::parse(base_url).map_err(|_| RequestError::Url(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RequestError::Url(base_url.to_string()));
        }
        Ok(ScoreboardApi { client: Client::new(), base_url, game_code: game_code.to_string() })
    }

    pub fn game_code(&self) -> &str {
        &self.game_code
    }

    pub async fn get_scoreboard(&self) -> Result<Vec<Participant>, RequestError> {
        let url = self.board_url()?;
        self.call(Method::GET, url, None::<&()>).await
    }

    pub async fn add_participant(&self, name: &str, score: i64) -> Result<serde_json::Value, RequestError> {
        let url = self.participant_url(name)?;
        self.call_logged(Method::POST, url, Some(&ScoreBody { score })).await
    }

    pub async fn remove_participant(&self, name: &str) -> Result<serde_json::Value, RequestError> {
        let url = self.participant_url(name)?;
        self.call_logged(Method::DELETE, url, None::<&()>).await
    }

    pub async fn update_score(&self, name: &str, score: i64, method: ScoreMethod) -> Result<serde_json::Value, RequestError> {
        let url = self.participant_url(name)?;
        self.call_logged(Method::PUT, url, Some(&ScoreUpdateBody { score, method })).await
    }

    pub async fn clear_scores(&self) -> Result<Vec<Participant>, RequestError> {
        let url = self.board_url()?;
        let body = serde_json::json!({});
        self.call(Method::PUT, url, Some(&body)).await
    }

    pub async fn erase_scoreboard(&self) -> Result<Vec<Participant>, RequestError> {
        let url = self.board_url()?;
        self.call(Method::DELETE, url, None::<&()>).await
    }

    fn board_url(&self) -> Result<Url, RequestError> {
        self.url_with(&["api", "scoreboard", self.game_code.as_str()])
    }

    fn participant_url(&self, name: &str) -> Result<Url, RequestError> {
        self.url_with(&["api", "scoreboard", self.game_code.as_str(), "score", name])
    }

    fn url_with(&self, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, RequestError> {
        let before = Instant::now();
        let rsp = self.send(method.clone(), url.clone(), body).await?;
        let res = rsp.json().await.map_err(RequestError::Parse);
        log::debug!("[API] Call {method} {url} {:.2?}", before.elapsed());
        res
    }

    /// Any 2xx counts as success, the body is only kept for logging.
    async fn call_logged<B: Serialize>(&self, method: Method, url: Url, body: Option<&B>) -> Result<serde_json::Value, RequestError> {
        let before = Instant::now();
        let rsp = self.send(method.clone(), url.clone(), body).await?;
        let text = rsp.text().await.unwrap_or_default();
        log::debug!("[API] Call {method} {url} {:.2?}", before.elapsed());
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }

    async fn send<B: Serialize>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Response, RequestError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let rsp = request.send().await.map_err(RequestError::Network)?;
        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(RequestError::Status { status, body });
        }
        Ok(rsp)
    }
}
