//! End-to-end lifecycle tests: manifests on disk, an in-memory gateway and a
//! recording registrar.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use courier_core::testing::RecordingResponder;
use courier_core::{CurrentUser, Interaction, InteractionData, RegistrationBatch};
use courier_framework::{ActionTable, BotContext, HandlerError, HandlerResult};
use courier_runtime::{
    ChannelGateway, CommandRegistrar, CourierConfig, CourierRuntime, GatewayError,
    RegistrationScope, RuntimeError, StopReason, SyncOutcome, SyncResult,
};

#[derive(Default)]
struct RecordingRegistrar {
    calls: Mutex<Vec<(RegistrationScope, usize)>>,
}

#[async_trait]
impl CommandRegistrar for RecordingRegistrar {
    async fn bulk_overwrite(
        &self,
        scope: &RegistrationScope,
        batch: &RegistrationBatch,
    ) -> SyncResult<()> {
        self.calls.lock().push((scope.clone(), batch.len()));
        Ok(())
    }
}

async fn ping(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    interaction.reply("pong").await?;
    Ok(())
}

async fn confirm(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    let id = courier_framework::routing_payload(interaction.custom_id().unwrap_or_default())
        .unwrap_or_default()
        .to_string();
    interaction.update(format!("confirmed {id}")).await?;
    Ok(())
}

async fn broken(_interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
    Err(HandlerError::msg("database unavailable"))
}

fn actions() -> ActionTable {
    ActionTable::new()
        .command("ping", ping)
        .command("broken", broken)
        .component("confirm", confirm)
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn handler_dirs() -> TempDir {
    let root = TempDir::new().unwrap();
    let commands = root.path().join("commands");
    let components = root.path().join("components");
    fs::create_dir_all(&commands).unwrap();
    fs::create_dir_all(&components).unwrap();

    write(
        &commands,
        "ping.toml",
        "execute = \"ping\"\n\n[schema]\nname = \"ping\"\ndescription = \"Replies with pong\"\n",
    );
    write(
        &commands,
        "broken.json",
        r#"{ "execute": "broken", "schema": { "name": "broken", "description": "Always fails" } }"#,
    );
    // No `execute`: skipped at load time.
    write(
        &commands,
        "stale.toml",
        "[schema]\nname = \"stale\"\ndescription = \"Lost its action\"\n",
    );
    write(
        &components,
        "confirm.toml",
        "routing_key = \"confirm\"\nexecute = \"confirm\"\n",
    );
    root
}

fn config(root: &Path) -> CourierConfig {
    let mut config = CourierConfig::default();
    config.bot.auth_token = Some("token".to_string());
    config.bot.application_id = Some("100".to_string());
    config.bot.guild_id = Some("200".to_string());
    config.handlers.commands_dir = root.join("commands");
    config.handlers.components_dir = root.join("components");
    config
}

fn user() -> CurrentUser {
    CurrentUser {
        id: "100".to_string(),
        name: "courier".to_string(),
        discriminator: None,
    }
}

#[tokio::test]
async fn test_full_lifecycle() {
    let root = handler_dirs();
    let registrar = Arc::new(RecordingRegistrar::default());
    let (gateway, tx) = ChannelGateway::new(user(), 16);
    let gateway = Arc::new(gateway.require_token("token"));

    let runtime = CourierRuntime::new(config(root.path()))
        .actions(actions())
        .registrar(registrar.clone())
        .gateway(gateway.clone());
    let prepared = runtime.prepare().unwrap();

    assert_eq!(prepared.registry().counts(), (2, 1));
    assert_eq!(prepared.registry().warnings().len(), 1);
    assert!(!prepared.context().is_ready());

    let responders: Vec<_> = (0..4).map(|_| Arc::new(RecordingResponder::new())).collect();
    let events = [
        InteractionData::command("ping"),
        InteractionData::button("confirm:42"),
        InteractionData::command("missing"),
        InteractionData::command("broken"),
    ];
    for (i, (data, responder)) in events.into_iter().zip(&responders).enumerate() {
        let interaction = Interaction::new(format!("i{i}"), data, responder.clone());
        tx.send(interaction).await.unwrap();
    }
    drop(tx);

    let context = Arc::clone(prepared.context());
    let report = prepared
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.stop, StopReason::StreamClosed);
    assert_eq!(report.dispatched, 4);
    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.sync,
        Some(SyncOutcome::Registered { count: 2, .. })
    ));
    assert_eq!(
        registrar.calls.lock().as_slice(),
        &[(RegistrationScope::Guild("200".to_string()), 2)]
    );

    assert_eq!(responders[0].messages(), vec!["pong".to_string()]);
    assert_eq!(responders[1].messages(), vec!["confirmed 42".to_string()]);
    assert_eq!(responders[2].messages(), vec!["Command not found.".to_string()]);
    assert_eq!(
        responders[3].messages(),
        vec!["An error occurred while processing your interaction.".to_string()]
    );

    assert_eq!(gateway.presence().map(|a| a.name), Some("/help".to_string()));
    assert!(!context.is_ready());
}

#[tokio::test]
async fn test_rejected_token_is_fatal() {
    let root = handler_dirs();
    let (gateway, _tx) = ChannelGateway::new(user(), 1);
    let gateway = Arc::new(gateway.require_token("another-token"));

    let result = CourierRuntime::new(config(root.path()))
        .actions(actions())
        .registrar(Arc::new(RecordingRegistrar::default()))
        .gateway(gateway.clone())
        .run_until(std::future::pending::<()>())
        .await;

    assert!(matches!(
        result,
        Err(RuntimeError::Gateway(GatewayError::Authentication(_)))
    ));
    assert!(gateway.presence().is_none());
}

#[tokio::test]
async fn test_empty_handler_dirs_skip_sync() {
    let root = TempDir::new().unwrap();
    let registrar = Arc::new(RecordingRegistrar::default());
    let (gateway, tx) = ChannelGateway::new(user(), 1);
    drop(tx);

    let mut config = config(root.path());
    config.bot.guild_id = None;
    let report = CourierRuntime::new(config)
        .registrar(registrar.clone())
        .gateway(Arc::new(gateway))
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert!(matches!(report.sync, Some(SyncOutcome::Skipped)));
    assert!(registrar.calls.lock().is_empty());
}
