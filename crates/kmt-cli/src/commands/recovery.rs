use crate::cli::GlobalFlags;
use crate::cli::subcommands::RecoveryCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `kmt recovery`.
pub async fn handle(
    action: &RecoveryCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let service = &ctx.service;

    match action {
        RecoveryCommands::List => output(&service.list_deleted(&actor).await?, flags.format),
        RecoveryCommands::Delete { id } => {
            output(&service.soft_delete(&actor, id).await?, flags.format)
        }
        RecoveryCommands::Recover { id } => {
            output(&service.recover(&actor, id).await?, flags.format)
        }
        RecoveryCommands::Purge { id } => {
            let snapshot = service.purge(&actor, id).await?;
            output(
                &serde_json::json!({ "purged": true, "snapshot": snapshot }),
                flags.format,
            )
        }
    }
}
