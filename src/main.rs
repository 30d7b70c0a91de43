use std::sync::Arc;

use scoreboard_client::command::{Command, Flow};
use scoreboard_client::config_handler;
use scoreboard_client::rest_client::ScoreboardApi;
use scoreboard_client::scoreboard_client::ScoreboardClient;
use scoreboard_client::scoreboard_view::render_table;
use scoreboard_client::share_service::{ClipboardShare, SystemClipboard, Visibility, SUCCESS_MESSAGE_ID};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::log;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        // Set the RUST_LOG, if it hasn't been explicitly defined
        std::env::set_var("RUST_LOG", "info")
    }

    // Configure a custom event formatter
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .compact();
    tracing_subscriber::fmt()
        .event_format(format)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config_handler::get_config()?;
    let api = ScoreboardApi::new(&config.base_url, &config.game_code)?;
    let client = Arc::new(ScoreboardClient::new(api));
    let share = ClipboardShare::new(SystemClipboard, &config.page_url(), config.confirmation());

    let render_handle = {
        let mut board = client.subscribe();
        tokio::spawn(async move {
            println!("{}", render_table(&board.borrow_and_update()));
            while board.changed().await.is_ok() {
                let table = render_table(&board.borrow_and_update());
                println!("{table}");
            }
        })
    };
    let message_handle = {
        let mut visibility = share.subscribe();
        tokio::spawn(async move {
            while visibility.changed().await.is_ok() {
                if *visibility.borrow_and_update() == Visibility::Visible {
                    println!("[{SUCCESS_MESSAGE_ID}] Link copied to clipboard!");
                }
            }
        })
    };

    let poller = client.clone().start_polling(config.poll_interval());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if let Flow::Quit = command.execute(&client, &share).await {
                    break;
                }
            },
            Err(e) => log::warn!("[CLI] {e}"),
        }
    }

    poller.stop().await;
    render_handle.abort();
    message_handle.abort();
    log::info!("[CLI] Bye");
    Ok(())
}
