//! Text rendering of the table for a terminal.
//!
//! Pure functions from session state to strings; `main` decides when to
//! print them.

use std::fmt::Write;

use wizsync::prelude::*;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// One card, e.g. `A♠`. Hearts and diamonds are red when `color` is set.
pub fn card(card: &Card, color: bool) -> String {
    if color && card.suit.is_red() {
        format!("{RED}{card}{RESET}")
    } else {
        card.to_string()
    }
}

pub fn status(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connected => "● connected",
        ConnectionState::Connecting => "○ connecting…",
        ConnectionState::Disconnected => "○ disconnected, retrying",
    }
}

/// The whole table: trump, trick, hand, score line.
///
/// Hand cards are numbered from 1 for the `play` command; playable ones
/// are starred.
pub fn table(snapshot: &GameSnapshot, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── {} ─ round of {} ──", snapshot.phase, snapshot.round_size);

    let trump = snapshot
        .trump_card
        .as_ref()
        .map_or_else(|| "none".to_string(), |c| card(c, color));
    let _ = writeln!(out, "trump: {trump}");

    let trick: Vec<String> = snapshot.played_cards.iter().map(|c| card(c, color)).collect();
    let _ = writeln!(
        out,
        "table: {}",
        if trick.is_empty() { "-".to_string() } else { trick.join(" ") }
    );

    let hand: Vec<String> = snapshot
        .hand
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mark = if c.playable { "*" } else { "" };
            format!("{}:{}{mark}", i + 1, card(c, color))
        })
        .collect();
    let _ = writeln!(
        out,
        "hand:  {}",
        if hand.is_empty() { "-".to_string() } else { hand.join(" ") }
    );

    let bid = snapshot
        .current_bid
        .map_or_else(|| "-".to_string(), |b| b.to_string());
    let _ = write!(
        out,
        "score: {}  bid: {bid}  tricks: {}{}",
        snapshot.score,
        snapshot.current_tricks_won,
        if snapshot.is_my_turn { "  << your turn" } else { "" }
    );
    out
}

/// A one-line hint of what can be typed right now.
pub fn prompt(allowed: &AllowedActions) -> String {
    let mut options = Vec::new();
    if allowed.ready {
        options.push("ready".to_string());
    }
    if let Some(range) = &allowed.bid {
        options.push(format!("bid {}-{}", range.start(), range.end()));
    }
    if !allowed.playable.is_empty() {
        options.push("play <n>".to_string());
    }
    if options.is_empty() {
        "waiting…".to_string()
    } else {
        format!("> {}", options.join(" | "))
    }
}
