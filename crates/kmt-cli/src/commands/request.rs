use chrono::Utc;
use kmt_core::entities::NewRequest;
use kmt_core::enums::{RequestCategory, RequestStatus};
use kmt_db::repos::request::RequestFilter;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RequestCommands;
use crate::commands::shared::parse::{parse_datetime, parse_enum};
use crate::context::AppContext;
use crate::output::output;

/// Handle `kmt request`.
pub async fn handle(
    action: &RequestCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let service = &ctx.service;

    let request = match action {
        RequestCommands::Create { area, ppe, items } => {
            let category = if *ppe {
                RequestCategory::Ppe
            } else {
                RequestCategory::Material
            };
            let items = NewRequest::items_from_json(items)?;
            service
                .create_request(&actor, &NewRequest::new(area, category, items))
                .await?
        }
        RequestCommands::Get { id } => service.get_request(&actor, id).await?,
        RequestCommands::List { area, status } => {
            let filter = RequestFilter {
                area: area.clone(),
                status: status
                    .as_deref()
                    .map(|value| parse_enum::<RequestStatus>(value, "status"))
                    .transpose()?,
                limit: Some(ctx.limit(flags)),
            };
            let requests = service.list_active(&actor, &filter).await?;
            return output(&requests, flags.format);
        }
        RequestCommands::Accept { id } => service.accept_request(&actor, id).await?,
        RequestCommands::Decline { id, reason } => {
            service.decline_request(&actor, id, reason).await?
        }
        RequestCommands::Complete {
            id,
            received_by,
            completed_at,
        } => {
            let completed_at = completed_at
                .as_deref()
                .map(|value| parse_datetime(value, "completed-at"))
                .transpose()?
                .unwrap_or_else(Utc::now);
            service
                .complete_request(&actor, id, received_by, completed_at)
                .await?
        }
        RequestCommands::Reassign { id } => service.reassign_request(&actor, id).await?,
        RequestCommands::Assign { id, to } => service.assign_request(&actor, id, to).await?,
    };

    output(&request, flags.format)
}
