//! Command registry sync.
//!
//! At startup the command schemas of the registry are sent to the platform
//! in a single "replace all" call. The call is idempotent, so restarting the
//! bot converges the remote command set to the local one. Registration is
//! restricted to one guild when a guild id is configured (changes show up
//! immediately) and global otherwise (changes may take a while to spread).
//!
//! Sync never fails the process: every failure is logged and returned as
//! [`SyncOutcome::Failed`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{SyncError, SyncResult};
use courier_core::RegistrationBatch;

/// Where commands are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationScope {
    Global,
    Guild(String),
}

impl RegistrationScope {
    /// Guild scope if a guild id is given, global otherwise.
    pub fn from_guild(guild_id: Option<&str>) -> Self {
        match guild_id {
            Some(id) => Self::Guild(id.to_string()),
            None => Self::Global,
        }
    }
}

impl fmt::Display for RegistrationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// The remote "bulk replace" registration call.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    /// Replaces every command in `scope` with `batch`.
    async fn bulk_overwrite(
        &self,
        scope: &RegistrationScope,
        batch: &RegistrationBatch,
    ) -> SyncResult<()>;
}

/// The result of a sync.
#[derive(Debug)]
pub enum SyncOutcome {
    /// There were no commands, so no call was made.
    Skipped,
    /// The batch was registered.
    Registered {
        scope: RegistrationScope,
        count: usize,
    },
    /// The call failed.
    Failed {
        scope: RegistrationScope,
        error: SyncError,
    },
}

impl SyncOutcome {
    /// Whether the remote command set is now up to date.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Registers `batch` in `scope` with a single call.
pub async fn sync_commands(
    registrar: &dyn CommandRegistrar,
    batch: &RegistrationBatch,
    scope: RegistrationScope,
) -> SyncOutcome {
    if batch.is_empty() {
        info!("No commands to register");
        return SyncOutcome::Skipped;
    }

    let count = batch.len();
    match &scope {
        RegistrationScope::Guild(guild) => {
            info!(count, guild = %guild, "Registering commands to guild");
        }
        RegistrationScope::Global => {
            info!(count, "Registering commands globally, this may take a few minutes to spread");
        }
    }

    match registrar.bulk_overwrite(&scope, batch).await {
        Ok(()) => {
            info!(count, %scope, "Commands registered");
            SyncOutcome::Registered { scope, count }
        }
        Err(e) => {
            error!(error = %e, %scope, "Failed to register commands");
            SyncOutcome::Failed { scope, error: e }
        }
    }
}

/// Runs [`sync_commands`] on its own task.
pub fn spawn_sync(
    registrar: Arc<dyn CommandRegistrar>,
    batch: RegistrationBatch,
    scope: RegistrationScope,
) -> JoinHandle<SyncOutcome> {
    tokio::spawn(async move { sync_commands(registrar.as_ref(), &batch, scope).await })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use courier_core::CommandSchema;
    use parking_lot::Mutex;

    /// Records every call; optionally fails them.
    #[derive(Default)]
    pub(crate) struct RecordingRegistrar {
        pub calls: Mutex<Vec<(RegistrationScope, Vec<String>)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl CommandRegistrar for RecordingRegistrar {
        async fn bulk_overwrite(
            &self,
            scope: &RegistrationScope,
            batch: &RegistrationBatch,
        ) -> SyncResult<()> {
            let names = batch.names().into_iter().map(String::from).collect();
            self.calls.lock().push((scope.clone(), names));
            if self.fail {
                return Err(SyncError::Api {
                    status: 401,
                    body: "401: Unauthorized".to_string(),
                });
            }
            Ok(())
        }
    }

    fn batch(names: &[&str]) -> RegistrationBatch {
        names
            .iter()
            .map(|n| CommandSchema::new(*n, "test"))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let registrar = RecordingRegistrar::default();
        let outcome = sync_commands(&registrar, &batch(&[]), RegistrationScope::Global).await;

        assert!(matches!(outcome, SyncOutcome::Skipped));
        assert!(outcome.is_success());
        assert!(registrar.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_guild_scope() {
        let registrar = RecordingRegistrar::default();
        let scope = RegistrationScope::from_guild(Some("42"));
        let outcome = sync_commands(&registrar, &batch(&["ping", "echo"]), scope).await;

        assert!(matches!(
            outcome,
            SyncOutcome::Registered { count: 2, scope: RegistrationScope::Guild(ref g) } if g == "42"
        ));
        let calls = registrar.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec!["ping".to_string(), "echo".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_is_an_outcome() {
        let registrar = RecordingRegistrar {
            fail: true,
            ..Default::default()
        };
        let outcome = sync_commands(&registrar, &batch(&["ping"]), RegistrationScope::Global).await;

        assert!(!outcome.is_success());
        assert!(matches!(
            outcome,
            SyncOutcome::Failed {
                scope: RegistrationScope::Global,
                error: SyncError::Api { status: 401, .. }
            }
        ));
        assert_eq!(registrar.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_spawned_sync() {
        let registrar = Arc::new(RecordingRegistrar::default());
        let handle = spawn_sync(
            registrar.clone(),
            batch(&["ping"]),
            RegistrationScope::Global,
        );
        assert!(handle.await.unwrap().is_success());
        assert_eq!(registrar.calls.lock().len(), 1);
    }
}
