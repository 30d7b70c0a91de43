use std::fmt::Display;
use std::str::FromStr;

use tracing::log;

use crate::models::ScoreMethod;
use crate::scoreboard_client::ScoreboardClient;
use crate::scoreboard_view::render_table;
use crate::share_service::{Clipboard, ClipboardShare};
use crate::LogResult;

/// One line of shell input. Names and scores left out fall back to the pending form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Name(String),
    Score(i64),
    Add { name: Option<String>, score: Option<i64> },
    Remove { name: Option<String> },
    Update { method: ScoreMethod, name: Option<String>, score: Option<i64> },
    Clear,
    Erase,
    Refresh,
    Share,
    Show,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommandError(pub String);

impl Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
commands:
  name <name>                 set the pending name
  score <n>                   set the pending score
  add [name [score]]          add a participant
  remove [name]               remove a participant
  plus [name [delta]]         add to a participant's score
  set [name [score]]          replace a participant's score
  update <add|replace> [name [score]]
  clear                       reset every score to zero
  erase                       delete the whole scoreboard
  refresh | show | share | help | quit";

fn parse_score(raw: &str) -> Result<i64, CommandError> {
    raw.parse().map_err(|_| CommandError(format!("invalid score `{raw}`, use integer.")))
}

fn parse_name_score<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<(Option<String>, Option<i64>), CommandError> {
    let name = args.next().map(|e| e.to_string());
    let score = args.next().map(parse_score).transpose()?;
    Ok((name, score))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Err(CommandError("empty command".to_string()));
        };
        let command = match cmd {
            "name" => {
                let name = parts.next().ok_or_else(|| CommandError("name requires a value".to_string()))?;
                Command::Name(name.to_string())
            },
            "score" => {
                let score = parts.next().ok_or_else(|| CommandError("score requires a value".to_string()))?;
                Command::Score(parse_score(score)?)
            },
            "add" => {
                let (name, score) = parse_name_score(&mut parts)?;
                Command::Add { name, score }
            },
            "remove" => Command::Remove { name: parts.next().map(|e| e.to_string()) },
            "plus" | "set" | "update" => {
                let method = match cmd {
                    "plus" => ScoreMethod::Add,
                    "set" => ScoreMethod::Replace,
                    _ => {
                        let raw = parts.next().unwrap_or_default();
                        raw.parse::<ScoreMethod>().map_err(|_| CommandError(format!("invalid method `{raw}`, use one of <add|replace>")))?
                    },
                };
                let (name, score) = parse_name_score(&mut parts)?;
                Command::Update { method, name, score }
            },
            "clear" => Command::Clear,
            "erase" => Command::Erase,
            "refresh" => Command::Refresh,
            "share" => Command::Share,
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError(format!("unknown command `{cmd}`"))),
        };
        if let Some(extra) = parts.next() {
            return Err(CommandError(format!("unexpected argument `{extra}`")));
        }
        Ok(command)
    }
}

pub enum Flow {
    Continue,
    Quit,
}

impl Command {
    /// Runs the command against the view-model. Request failures are logged, not returned.
    pub async fn execute<C: Clipboard>(self, client: &ScoreboardClient, share: &ClipboardShare<C>) -> Flow {
        match self {
            Command::Name(name) => client.set_pending_name(&name),
            Command::Score(score) => client.set_pending_score(score),
            Command::Add { name, score } => {
                let (name, score) = resolve(client, name, score);
                _ = client.add_participant(&name, score).await;
            },
            Command::Remove { name } => {
                let (name, _) = resolve(client, name, None);
                _ = client.remove_participant(&name).await;
            },
            Command::Update { method, name, score } => {
                let (name, score) = resolve(client, name, score);
                _ = match method {
                    ScoreMethod::Add => client.adjust_score(&name, score).await,
                    ScoreMethod::Replace => client.set_score(&name, score).await,
                };
            },
            Command::Clear => {
                _ = client.clear_all_scores().await;
            },
            Command::Erase => {
                _ = client.erase_board().await;
            },
            Command::Refresh => {
                _ = client.refresh().await;
            },
            Command::Share => {
                share.copy_link().await.ok_log("[CLI] Share failed");
            },
            Command::Show => println!("{}", render_table(&client.snapshot())),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

fn resolve(client: &ScoreboardClient, name: Option<String>, score: Option<i64>) -> (String, i64) {
    let pending = client.pending();
    let name = name.unwrap_or(pending.name);
    let score = score.unwrap_or(pending.score);
    log::debug!("[CLI] Resolved {name} {score}");
    (name, score)
}
