//! Play Wizard from a terminal.
//!
//! ```text
//! terminal-table [host[:port]] [--secure]
//! ```
//!
//! Type `ready`, `bid <n>`, `play <n>` (hand position, from 1) or `quit`.
//! Set `RUST_LOG=wizsync=debug` to watch the connection.

mod render;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wizsync::prelude::*;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Ready,
    Bid(i64),
    Play(usize),
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_lowercase();
    let arg = words.next();
    match (command.as_str(), arg) {
        ("ready" | "r", None) => Ok(Input::Ready),
        ("bid" | "b", Some(n)) => n.parse().map(Input::Bid).map_err(|_| format!("not a number: {n}")),
        ("play" | "p", Some(n)) => match n.parse::<usize>() {
            Ok(i) if i >= 1 => Ok(Input::Play(i)),
            _ => Err(format!("not a hand position: {n}")),
        },
        ("quit" | "q", None) => Ok(Input::Quit),
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut host = "localhost:8000".to_string();
    let mut secure = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--secure" => secure = true,
            other => host = other.to_string(),
        }
    }

    let (handle, mut events) = WizardSession::builder()
        .host(&host)
        .secure(secure)
        .start_websocket();
    println!("player {} joining {host}", handle.player_id());
    println!("{}", render::status(ConnectionState::Connecting));

    let color = std::env::var_os("NO_COLOR").is_none();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshot: Option<std::sync::Arc<GameSnapshot>> = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Connected => {
                        println!("{}", render::status(ConnectionState::Connected));
                    }
                    SessionEvent::Disconnected { reason } => {
                        println!("{} ({reason})", render::status(ConnectionState::Disconnected));
                    }
                    SessionEvent::Snapshot(next) => {
                        println!("\n{}", render::table(&next, color));
                        snapshot = Some(next);
                    }
                    SessionEvent::AffordancesChanged(allowed) => {
                        println!("{}", render::prompt(&allowed));
                    }
                    SessionEvent::SnapshotRejected { reason } => {
                        tracing::debug!(%reason, "frame ignored");
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let result = match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Ready) => handle.ready().await,
                    Ok(Input::Bid(n)) => handle.bid(n).await,
                    Ok(Input::Play(position)) => {
                        let held = snapshot.as_ref().and_then(|s| s.hand.get(position - 1)).cloned();
                        match held {
                            Some(card) => handle.play_card(card).await,
                            None => {
                                println!("no card at position {position}");
                                continue;
                            }
                        }
                    }
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                match result {
                    Ok(action) => tracing::info!(action = %action.kind(), "sent"),
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    if let Err(e) = handle.close().await {
        tracing::debug!(error = %e, "session already stopped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_commands() {
        assert_eq!(parse_input("ready"), Ok(Input::Ready));
        assert_eq!(parse_input("  BID 3 "), Ok(Input::Bid(3)));
        assert_eq!(parse_input("bid -1"), Ok(Input::Bid(-1)));
        assert_eq!(parse_input("p 2"), Ok(Input::Play(2)));
        assert_eq!(parse_input("q"), Ok(Input::Quit));
    }

    #[test]
    fn test_parse_input_rejects_bad_arguments() {
        assert!(parse_input("bid x").is_err());
        assert!(parse_input("play 0").is_err());
        assert!(parse_input("play").is_err());
        assert!(parse_input("dance").is_err());
    }
}
