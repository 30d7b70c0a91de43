use std::fmt::Display;
use tracing::log;

pub mod command;
pub mod config_handler;
pub mod models;
pub mod rest_client;
pub mod scoreboard_client;
pub mod scoreboard_view;
pub mod share_service;

pub trait LogResult<T, E: Display> {
    fn ok_log(self, msg: &str) -> Option<T>;
}

impl<T, E: Display> LogResult<T, E> for Result<T, E> {
    fn ok_log(self, msg: &str) -> Option<T> {
        match self {
            Ok(o) => Some(o),
            Err(e) => {
                log::error!("{}: {}", msg, e);
                None
            }
        }
    }
}
