//! The bot's actions, bound to the ids used in `commands/` and `components/`.

use courier::prelude::*;

const WORDS: &[&str] = &["hello", "help", "hey", "courier", "confirm", "colors"];

/// `/ping`
async fn ping(interaction: Arc<Interaction>, ctx: Arc<BotContext>) -> HandlerResult {
    let name = ctx
        .current_user()
        .map(|user| user.tag())
        .unwrap_or_else(|| "courier".to_string());
    interaction.reply(format!("Pong! ({name} is online)")).await?;
    Ok(())
}

/// `/echo text:<text>`
async fn echo(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    let text = interaction
        .option("text")
        .and_then(|value| value.as_str())
        .ok_or_else(|| HandlerError::msg("echo without text"))?
        .to_string();
    interaction.reply(text).await?;
    Ok(())
}

/// Suggests words starting with what the user typed so far.
async fn echo_complete(interaction: Arc<Interaction>) -> HandlerResult {
    let typed = interaction
        .focused_option()
        .map(|option| option.value.to_string())
        .unwrap_or_default()
        .to_lowercase();
    let choices = WORDS
        .iter()
        .filter(|word| word.starts_with(&typed))
        .map(|word| OptionChoice::new(*word, *word))
        .collect();
    interaction.autocomplete(choices).await?;
    Ok(())
}

/// Buttons with `confirm:<id>` tokens.
async fn confirm(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    let token = interaction.custom_id().unwrap_or_default();
    match routing_payload(token) {
        Some(id) if !id.is_empty() => interaction.update(format!("Confirmed #{id}")).await?,
        _ => interaction.reply_private("Nothing to confirm.").await?,
    }
    Ok(())
}

/// The `colors` select menu.
async fn colors(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    let picked = interaction.values();
    if picked.iter().any(|color| color == "black") {
        // Exercises the router's failure path.
        return Err(HandlerError::msg("black is not a color"));
    }
    interaction
        .reply(ReplyMessage::private(format!("You picked: {}", picked.join(", "))))
        .await?;
    Ok(())
}

pub fn table() -> ActionTable {
    ActionTable::new()
        .command("ping", ping)
        .command("echo", echo)
        .autocomplete("echo", echo_complete)
        .component("confirm", confirm)
        .component("colors", colors)
}
