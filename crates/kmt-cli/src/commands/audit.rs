use kmt_core::enums::AuditAction;
use kmt_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `kmt audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let filter = AuditFilter {
        target_request_id: args.request.clone(),
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        actor_id: args.by.clone(),
        limit: Some(ctx.limit(flags)),
    };
    let entries = ctx.service.query_audit(&actor, &filter).await?;
    output(&entries, flags.format)
}
