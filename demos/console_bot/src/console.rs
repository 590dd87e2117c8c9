//! Turns terminal input into interactions and prints the responses.
//!
//! ```text
//! /ping                      slash command
//! /echo some text            slash command with a `text` option
//! complete echo he           autocomplete for `/echo`, typing "he"
//! button confirm:42          button press
//! select colors red blue     select menu
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use courier::core::{
    CommandOptionValue, InteractionData, InteractionResponse, OptionValue, ReplyResult, Responder,
};
use courier::prelude::Interaction;
use courier::runtime::InteractionSender;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

pub const USAGE: &str = "\
Commands:
  /<command> [text]         run a slash command
  complete <command> <text> request autocomplete suggestions
  button <custom_id>        press a button
  select <custom_id> <v>... pick values from a select menu
  quit                      disconnect";

/// Prints responses to stdout.
#[derive(Debug, Default)]
pub struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn respond(
        &self,
        interaction_id: &str,
        response: InteractionResponse,
    ) -> ReplyResult<()> {
        let line = match &response {
            InteractionResponse::Message(m) | InteractionResponse::FollowUp(m) => {
                let scope = if m.ephemeral { " (only you)" } else { "" };
                format!("{}{scope}", m.content)
            }
            InteractionResponse::UpdateMessage(m) => format!("[edited] {}", m.content),
            InteractionResponse::Deferred { .. } => "[thinking...]".to_string(),
            InteractionResponse::Autocomplete { choices } => {
                let names: Vec<_> = choices.iter().map(|c| c.name.as_str()).collect();
                format!("[suggestions] {}", names.join(", "))
            }
        };
        println!("<{interaction_id}> {line}");
        Ok(())
    }
}

/// What a line of input asks for.
#[derive(Debug, PartialEq)]
pub enum Input {
    Interaction(InteractionData),
    Help,
    Quit,
    Empty,
}

/// Parses one line of input.
pub fn parse_line(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    if let Some(rest) = line.strip_prefix('/') {
        let (name, text) = split_word(rest);
        if name.is_empty() {
            return Err("missing command name".to_string());
        }
        let mut data = InteractionData::command(name);
        if !text.is_empty()
            && let InteractionData::ChatInput { options, .. } = &mut data
        {
            options.push(CommandOptionValue::new(
                "text",
                OptionValue::String(text.to_string()),
            ));
        }
        return Ok(Input::Interaction(data));
    }

    let (verb, rest) = split_word(line);
    match verb {
        "help" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        "button" => match rest.split_whitespace().next() {
            Some(custom_id) => Ok(Input::Interaction(InteractionData::button(custom_id))),
            None => Err("usage: button <custom_id>".to_string()),
        },
        "select" => {
            let mut words = rest.split_whitespace();
            let custom_id = words.next().ok_or("usage: select <custom_id> <value>...")?;
            let values = words.map(str::to_string).collect();
            Ok(Input::Interaction(InteractionData::select_menu(
                custom_id, values,
            )))
        }
        "complete" => {
            let (command, typed) = split_word(rest);
            if command.is_empty() {
                return Err("usage: complete <command> <text>".to_string());
            }
            let focused =
                CommandOptionValue::new("text", OptionValue::String(typed.to_string())).focused();
            Ok(Input::Interaction(InteractionData::autocomplete(
                command,
                vec![focused],
            )))
        }
        other => Err(format!("unknown input '{other}', try 'help'")),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

/// Reads stdin until EOF or `quit`, sending each interaction to the gateway.
///
/// Dropping `events` on return closes the gateway's event stream.
pub async fn read_stdin(events: InteractionSender) {
    let responder: Arc<dyn Responder> = Arc::new(ConsoleResponder);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seq = 0u64;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        match parse_line(&line) {
            Ok(Input::Interaction(data)) => {
                seq += 1;
                let interaction = Interaction::new(format!("{seq}"), data, Arc::clone(&responder))
                    .with_user("console");
                if events.send(interaction).await.is_err() {
                    debug!("Gateway closed, no longer reading input");
                    break;
                }
            }
            Ok(Input::Help) => println!("{USAGE}"),
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier::core::InteractionKind;

    fn interaction(line: &str) -> InteractionData {
        match parse_line(line) {
            Ok(Input::Interaction(data)) => data,
            other => panic!("expected an interaction for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_slash_command() {
        let data = interaction("/echo hello  world");
        assert_eq!(data.kind(), InteractionKind::ChatInput);
        match data {
            InteractionData::ChatInput {
                command_name,
                options,
            } => {
                assert_eq!(command_name, "echo");
                assert_eq!(options[0].value, OptionValue::String("hello  world".into()));
            }
            _ => unreachable!(),
        }

        assert!(matches!(
            interaction("/ping"),
            InteractionData::ChatInput { ref options, .. } if options.is_empty()
        ));
        assert!(parse_line("/").is_err());
    }

    #[test]
    fn test_components() {
        assert_eq!(interaction("button confirm:42"), InteractionData::button("confirm:42"));
        assert_eq!(
            interaction("select colors red blue"),
            InteractionData::select_menu("colors", vec!["red".into(), "blue".into()])
        );
        assert!(parse_line("button").is_err());
    }

    #[test]
    fn test_autocomplete() {
        let data = interaction("complete echo he");
        assert_eq!(data.kind(), InteractionKind::Autocomplete);
    }

    #[test]
    fn test_other_input() {
        assert_eq!(parse_line("  "), Ok(Input::Empty));
        assert_eq!(parse_line("help"), Ok(Input::Help));
        assert_eq!(parse_line("quit"), Ok(Input::Quit));
        assert!(parse_line("dance").is_err());
    }
}
