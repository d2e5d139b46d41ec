// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge chat` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Each line is one guest turn through the text session controller; desk
//! changes (new tickets, the notification banner) are printed after the
//! reply.

use std::sync::Arc;

use colored::Colorize;
use concierge_agent::{AgentSettings, SessionContext, TextSessionController};
use concierge_config::ConciergeConfig;
use concierge_core::{ChatProvider, ConciergeError};
use concierge_gemini::GeminiChatProvider;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use crate::render;

/// REPL commands handled locally instead of being sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Reset,
    Tickets,
    Draft,
    Help,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line {
            "/quit" | "/exit" => Some(Self::Quit),
            "/reset" => Some(Self::Reset),
            "/tickets" => Some(Self::Tickets),
            "/draft" => Some(Self::Draft),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Runs the `concierge chat` interactive REPL.
pub async fn run_chat(config: ConciergeConfig) -> Result<(), ConciergeError> {
    let provider: Arc<dyn ChatProvider> = Arc::new(GeminiChatProvider::new(&config.gemini)?);
    let settings = AgentSettings::load(&config).await;
    let ctx = SessionContext::from_config(&config);
    let text = TextSessionController::new(ctx.clone(), provider, settings);

    let mut rl = DefaultEditor::new()
        .map_err(|e| ConciergeError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", config.agent.hotel_name.bold().green());
    println!(
        "Type {} to exit, {} for commands.\n",
        "/quit".yellow(),
        "/help".yellow()
    );
    for message in text.messages() {
        print_agent(&message.text);
    }

    let prompt = format!("{}> ", "guest".green());
    let mut seen_tickets = ctx.snapshot().tickets.len();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match Command::parse(trimmed) {
                    Some(Command::Quit) => break,
                    Some(Command::Reset) => {
                        text.reset_session();
                        println!("{}", "session reset".dimmed());
                        for message in text.messages() {
                            print_agent(&message.text);
                        }
                    }
                    Some(Command::Tickets) => print_tickets(&ctx),
                    Some(Command::Draft) => match ctx.snapshot().draft {
                        Some(draft) => println!("{}", render::draft(&draft)),
                        None => println!("{}", "no booking in progress".dimmed()),
                    },
                    Some(Command::Help) => print_help(),
                    None => match text.send_turn(trimmed).await {
                        Ok(Some(reply)) => print_agent(&reply.text),
                        Ok(None) => {}
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    },
                }

                seen_tickets = print_desk_changes(&ctx, seen_tickets);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    info!(tickets = ctx.snapshot().tickets.len(), "chat session ended");
    println!("{}", "goodbye".dimmed());
    Ok(())
}

fn print_agent(text: &str) {
    println!("{} {text}\n", "concierge:".cyan().bold());
}

fn print_help() {
    println!("  {}     clear the conversation and booking draft", "/reset".yellow());
    println!("  {}   list tickets recorded so far", "/tickets".yellow());
    println!("  {}     show the booking draft", "/draft".yellow());
    println!("  {}      leave", "/quit".yellow());
}

fn print_tickets(ctx: &SessionContext) {
    let tickets = ctx.snapshot().tickets;
    if tickets.is_empty() {
        println!("{}", "no tickets yet".dimmed());
    }
    for entry in &tickets {
        println!("{}", render::ticket(entry));
    }
}

/// Prints tickets recorded since `seen` and the live banner. Returns the new
/// ticket count.
pub(crate) fn print_desk_changes(ctx: &SessionContext, seen: usize) -> usize {
    let snapshot = ctx.snapshot();
    for entry in snapshot.tickets.iter().skip(seen) {
        println!("{}", render::ticket(entry).dimmed());
    }
    if let Some(banner) = &snapshot.notification {
        println!("{}", format!("[{banner}]").yellow());
        ctx.dismiss_notification();
    }
    snapshot.tickets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_test_utils::{TestHarness, tool_reply, text_reply};
    use serde_json::json;

    #[test]
    fn parses_local_commands() {
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(Command::parse("/reset"), Some(Command::Reset));
        assert_eq!(Command::parse("/tickets"), Some(Command::Tickets));
        assert_eq!(Command::parse("/draft"), Some(Command::Draft));
        assert_eq!(Command::parse("I need towels"), None);
        assert_eq!(Command::parse("/unknown"), None);
    }

    #[tokio::test]
    async fn desk_changes_are_counted_once() {
        let harness = TestHarness::builder()
            .with_chat_responses(vec![
                tool_reply(vec![(
                    "saveServiceRequest",
                    json!({"guestName": "J. Smith", "requestType": "housekeeping", "details": "towels"}),
                )]),
                text_reply("On their way."),
            ])
            .build();
        let text = harness.text_controller();
        text.send_turn("towels").await.unwrap();

        assert_eq!(print_desk_changes(&harness.ctx, 0), 1);
        assert_eq!(print_desk_changes(&harness.ctx, 1), 1);
    }
}
