use kmt_db::repos::ppe::PpeFilter;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::PpeCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `kmt ppe`.
pub async fn handle(action: &PpeCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    match action {
        PpeCommands::List { user, returned } => {
            let filter = PpeFilter {
                user_id: user.clone(),
                returned: *returned,
                limit: Some(ctx.limit(flags)),
            };
            let entries = ctx.service.list_ppe_register(&actor, &filter).await?;
            output(&entries, flags.format)
        }
        PpeCommands::Return { id, photo, remark } => {
            let entry = ctx
                .service
                .mark_ppe_returned(&actor, id, photo, remark.as_deref())
                .await?;
            output(&entry, flags.format)
        }
    }
}
