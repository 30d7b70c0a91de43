use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::log;

use crate::models::{Participant, PendingForm, ScoreMethod};
use crate::rest_client::{RequestError, ScoreboardApi};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Local copy of the remote scoreboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoreboard {
    pub game_code: String,
    pub participants: Vec<Participant>,
    pub synced_at: Option<DateTime<Utc>>,
    pub(crate) ticket: u64,
}

/// View-model bound to one game's scoreboard.
///
/// The participant list is only ever replaced with a full server response.
/// Responses carry the ticket taken when their request was issued, and a
/// response older than the one already applied is dropped.
pub struct ScoreboardClient {
    api: ScoreboardApi,
    board: watch::Sender<Scoreboard>,
    form: Mutex<PendingForm>,
    next_ticket: AtomicU64,
}

impl ScoreboardClient {
    pub fn new(api: ScoreboardApi) -> ScoreboardClient {
        let board = Scoreboard { game_code: api.game_code().to_string(), ..Default::default() };
        let (board, _) = watch::channel(board);
        ScoreboardClient { api, board, form: Mutex::new(PendingForm::default()), next_ticket: AtomicU64::new(1) }
    }

    pub fn game_code(&self) -> &str {
        self.api.game_code()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.board.borrow().participants.clone()
    }

    pub fn snapshot(&self) -> Scoreboard {
        self.board.borrow().clone()
    }

    /// Change notifications for any UI layer rendering the board.
    pub fn subscribe(&self) -> watch::Receiver<Scoreboard> {
        self.board.subscribe()
    }

    pub fn pending(&self) -> PendingForm {
        self.lock_form().clone()
    }

    pub fn set_pending_name(&self, name: &str) {
        self.lock_form().name = name.to_string();
    }

    pub fn set_pending_score(&self, score: i64) {
        self.lock_form().score = score;
    }

    pub async fn refresh(&self) -> Result<Vec<Participant>, RequestError> {
        let ticket = self.take_ticket();
        match self.api.get_scoreboard().await {
            Ok(participants) => {
                self.apply(ticket, participants.clone());
                Ok(participants)
            },
            Err(e) => {
                log::error!("[SCOREBOARD] Refresh failed {}: {e}", self.game_code());
                Err(e)
            }
        }
    }

    pub async fn add_participant(&self, name: &str, score: i64) -> Result<(), RequestError> {
        let res = self.api.add_participant(name, score).await;
        self.clear_form(true);
        self.after_mutation("add", name, res).await
    }

    pub async fn remove_participant(&self, name: &str) -> Result<(), RequestError> {
        let res = self.api.remove_participant(name).await;
        self.clear_form(false);
        self.after_mutation("remove", name, res).await
    }

    pub async fn adjust_score(&self, name: &str, delta: i64) -> Result<(), RequestError> {
        let res = self.api.update_score(name, delta, ScoreMethod::Add).await;
        self.clear_form(true);
        self.after_mutation("adjust", name, res).await
    }

    pub async fn set_score(&self, name: &str, value: i64) -> Result<(), RequestError> {
        let res = self.api.update_score(name, value, ScoreMethod::Replace).await;
        self.clear_form(true);
        self.after_mutation("set", name, res).await
    }

    /// Resets every score to zero, keeping the participants.
    pub async fn clear_all_scores(&self) -> Result<Vec<Participant>, RequestError> {
        let ticket = self.take_ticket();
        let res = self.api.clear_scores().await;
        self.after_board_change("clear", ticket, res).await
    }

    pub async fn erase_board(&self) -> Result<Vec<Participant>, RequestError> {
        let ticket = self.take_ticket();
        let res = self.api.erase_scoreboard().await;
        self.after_board_change("erase", ticket, res).await
    }

    /// Refreshes now and then on every `interval` until the handle is stopped or dropped.
    pub fn start_polling(self: Arc<Self>, interval: Duration) -> PollHandle {
        let interval = if interval.is_zero() {
            log::warn!("[POLL] Zero interval, using {:?}", DEFAULT_POLL_INTERVAL);
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let token = CancellationToken::new();
        let handle = {
            let token = token.clone();
            tokio::spawn(async move {
                log::info!("[POLL] Start polling {} every {:?}", self.game_code(), interval);
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            // failures are logged by refresh, polling goes on
                            _ = self.refresh().await;
                        }
                    }
                }
                log::info!("[POLL] Stopped polling {}", self.game_code());
            })
        };
        PollHandle { token, handle: Some(handle) }
    }

    async fn after_mutation(&self, action: &str, name: &str, res: Result<serde_json::Value, RequestError>) -> Result<(), RequestError> {
        match res {
            Ok(rsp) => {
                log::info!("[SCOREBOARD] {action} {name} {rsp}");
                _ = self.refresh().await;
                Ok(())
            },
            Err(e) => {
                log::error!("[SCOREBOARD] {action} {name} failed: {e}");
                Err(e)
            }
        }
    }

    async fn after_board_change(&self, action: &str, ticket: u64, res: Result<Vec<Participant>, RequestError>) -> Result<Vec<Participant>, RequestError> {
        match res {
            Ok(participants) => {
                log::info!("[SCOREBOARD] {action} {} -> {} participants", self.game_code(), participants.len());
                self.apply(ticket, participants.clone());
                _ = self.refresh().await;
                Ok(participants)
            },
            Err(e) => {
                log::error!("[SCOREBOARD] {action} {} failed: {e}", self.game_code());
                Err(e)
            }
        }
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Writes a newer response into the board. Subscribers are only woken when the list differs.
    fn apply(&self, ticket: u64, participants: Vec<Participant>) -> bool {
        let mut stale = false;
        self.board.send_if_modified(|board| {
            if ticket <= board.ticket {
                stale = true;
                return false;
            }
            board.ticket = ticket;
            board.synced_at = Some(Utc::now());
            if board.participants == participants {
                return false;
            }
            board.participants = participants;
            true
        });
        if stale {
            log::debug!("[SCOREBOARD] Dropped stale response {ticket}");
        }
        !stale
    }

    fn clear_form(&self, with_score: bool) {
        let mut form = self.lock_form();
        form.name.clear();
        if with_score {
            form.score = 0;
        }
    }

    fn lock_form(&self) -> std::sync::MutexGuard<'_, PendingForm> {
        // the form holds plain values, a poisoned lock is still usable
        self.form.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct PollHandle {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|e| !e.is_finished()).unwrap_or(false)
    }

    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            _ = handle.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
