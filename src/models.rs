use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub score: i64,
}

impl Participant {
    pub fn new(name: &str, score: i64) -> Participant {
        Participant { name: name.to_string(), score }
    }
}

impl Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.score)
    }
}

/// How a `PUT` on a single participant treats the submitted score.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    Add,
    Replace,
}

impl Display for ScoreMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreMethod::Add => write!(f, "add"),
            ScoreMethod::Replace => write!(f, "replace"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseStringError;

impl FromStr for ScoreMethod {
    type Err = ParseStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ScoreMethod::Add),
            "replace" => Ok(ScoreMethod::Replace),
            _ => Err(ParseStringError)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoreBody {
    pub score: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoreUpdateBody {
    pub score: i64,
    pub method: ScoreMethod,
}

/// Input fields of the participant form, consumed by the mutating actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingForm {
    pub name: String,
    pub score: i64,
}
