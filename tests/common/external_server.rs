use std::{collections::HashMap, net::TcpListener, sync::Arc, time::Duration};

use axum::{Router, extract::{Path, State}, Json, response::{IntoResponse, Response}, routing::{get, post}};
use reqwest::StatusCode;
use scoreboard_client::models::Participant;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{sync::RwLock, task::JoinHandle};

type Rsp = Result<Json<Value>, (StatusCode, Json<Value>)>;
type MutationRsp = Result<Response, (StatusCode, Json<Value>)>;

#[derive(Default)]
pub struct AppState {
    pub boards: HashMap<String, Vec<Participant>>,
    pub requests: Vec<String>,
    pub fail_all: bool,
    pub fail_gets: bool,
    pub slow_next_get: Option<Duration>,
    pub plain_text_mutations: bool,
}

impl AppState {
    /// Single-participant routes answer `OK`, or an empty body for deletes, instead of JSON.
    fn mutation_rsp(&self, body: Value, plain: &'static str) -> Response {
        if self.plain_text_mutations {
            (StatusCode::OK, plain).into_response()
        } else {
            Json(body).into_response()
        }
    }

    fn sorted(&self, game_code: &str) -> Vec<Participant> {
        let mut board = self.boards.get(game_code).cloned().unwrap_or_default();
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }
}

#[derive(Deserialize)]
struct ScoreBody {
    #[serde(default)]
    score: i64,
    method: Option<String>,
}

fn error(status: StatusCode, msg: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": msg })))
}

/// Mock of the scoreboard backend, ordering and error codes as the real one.
pub struct ExternalServer {
    port: u16,
    handle: JoinHandle<()>,
    pub api_state: Arc<RwLock<AppState>>,
}

impl Drop for ExternalServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl ExternalServer {
    pub async fn start() -> ExternalServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("should bind");
        listener.set_nonblocking(true).expect("should be nonblocking");
        let port = listener.local_addr().expect("should have addr").port();

        let api_state = Arc::new(RwLock::new(AppState::default()));
        let app = Router::new()
            .route("/api/scoreboard/:game_code", get(ExternalServer::get_board)
                .put(ExternalServer::clear_board)
                .delete(ExternalServer::erase_board))
            .route("/api/scoreboard/:game_code/score/:name", post(ExternalServer::add_participant)
                .put(ExternalServer::update_score)
                .delete(ExternalServer::remove_participant))
            .with_state(api_state.clone());

        let handle = tokio::spawn(async move {
            axum::Server::from_tcp(listener)
                .expect("should listen")
                .serve(app.into_make_service())
                .await
                .unwrap();
        });
        ExternalServer { port, handle, api_state }
    }

    pub fn get_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub async fn add(&self, game_code: &str, name: &str, score: i64) {
        self.api_state.write().await.boards.entry(game_code.to_string()).or_default().push(Participant::new(name, score));
    }

    pub async fn board(&self, game_code: &str) -> Vec<Participant> {
        self.api_state.read().await.sorted(game_code)
    }

    pub async fn count(&self, request: &str) -> usize {
        self.api_state.read().await.requests.iter().filter(|e| e.as_str() == request).count()
    }

    pub async fn set_fail_all(&self, fail: bool) {
        self.api_state.write().await.fail_all = fail;
    }

    pub async fn set_fail_gets(&self, fail: bool) {
        self.api_state.write().await.fail_gets = fail;
    }

    pub async fn set_plain_text_mutations(&self, plain: bool) {
        self.api_state.write().await.plain_text_mutations = plain;
    }

    pub async fn slow_next_get(&self, delay: Duration) {
        self.api_state.write().await.slow_next_get = Some(delay);
    }

    async fn record(state: &Arc<RwLock<AppState>>, request: String) -> Result<(), (StatusCode, Json<Value>)> {
        let mut state = state.write().await;
        let is_get = request.starts_with("GET ");
        state.requests.push(request);
        if state.fail_all || (is_get && state.fail_gets) {
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "failing on purpose"))
        } else {
            Ok(())
        }
    }

    async fn get_board(Path(game_code): Path<String>, State(state): State<Arc<RwLock<AppState>>>) -> Rsp {
        ExternalServer::record(&state, format!("GET {game_code}")).await?;
        let (board, delay) = {
            let mut state = state.write().await;
            (state.sorted(&game_code), state.slow_next_get.take())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Json(json!(board)))
    }

    async fn clear_board(Path(game_code): Path<String>, State(state): State<Arc<RwLock<AppState>>>, Json(_): Json<Value>) -> Rsp {
        ExternalServer::record(&state, format!("PUT {game_code}")).await?;
        let mut state = state.write().await;
        for participant in state.boards.entry(game_code.clone()).or_default() {
            participant.score = 0;
        }
        Ok(Json(json!(state.sorted(&game_code))))
    }

    async fn erase_board(Path(game_code): Path<String>, State(state): State<Arc<RwLock<AppState>>>) -> Rsp {
        ExternalServer::record(&state, format!("DELETE {game_code}")).await?;
        let mut state = state.write().await;
        state.boards.remove(&game_code);
        Ok(Json(json!(state.sorted(&game_code))))
    }

    async fn add_participant(Path((game_code, name)): Path<(String, String)>, State(state): State<Arc<RwLock<AppState>>>, Json(body): Json<ScoreBody>) -> MutationRsp {
        ExternalServer::record(&state, format!("POST {game_code}/{name}")).await?;
        let mut state = state.write().await;
        let board = state.boards.entry(game_code).or_default();
        if board.iter().any(|e| e.name == name) {
            return Err(error(StatusCode::BAD_REQUEST, &format!("`{name}` already exists")));
        }
        board.push(Participant::new(&name, body.score));
        Ok(state.mutation_rsp(json!({ "name": name, "score": body.score }), "OK"))
    }

    async fn update_score(Path((game_code, name)): Path<(String, String)>, State(state): State<Arc<RwLock<AppState>>>, Json(body): Json<ScoreBody>) -> MutationRsp {
        ExternalServer::record(&state, format!("PUT {game_code}/{name}")).await?;
        let mut state = state.write().await;
        let board = state.boards.entry(game_code).or_default();
        let method = body.method.unwrap_or_else(|| "replace".to_string());
        let score = match (board.iter().position(|e| e.name == name), method.as_str()) {
            (None, _) => {
                board.push(Participant::new(&name, body.score));
                body.score
            },
            (Some(i), "replace") => {
                board[i].score = body.score;
                body.score
            },
            (Some(i), "add") => {
                board[i].score += body.score;
                board[i].score
            },
            (Some(_), _) => return Err(error(StatusCode::BAD_REQUEST, &format!("invalid method `{method}`"))),
        };
        Ok(state.mutation_rsp(json!({ "name": name, "score": score }), "OK"))
    }

    async fn remove_participant(Path((game_code, name)): Path<(String, String)>, State(state): State<Arc<RwLock<AppState>>>) -> MutationRsp {
        ExternalServer::record(&state, format!("DELETE {game_code}/{name}")).await?;
        let mut state = state.write().await;
        let board = state.boards.entry(game_code).or_default();
        let before = board.len();
        board.retain(|e| e.name != name);
        let action = if board.len() != before { "delete" } else { "pass" };
        Ok(state.mutation_rsp(json!({ "name": name, "action": action }), ""))
    }
}
