//! Export projector over the request store.

use kmt_core::enums::RequestStatus;
use kmt_core::export::{DateRange, ExportRow, project};
use kmt_core::identity::Actor;

use crate::error::DatabaseError;
use crate::repos::request::RequestFilter;
use crate::service::KmtService;

/// Which requests to export.
#[derive(Debug, Default, Clone)]
pub struct ExportFilter {
    pub area: Option<String>,
    pub status: Option<RequestStatus>,
    pub date_range: DateRange,
}

impl KmtService {
    /// Project the actor's active requests into export rows.
    ///
    /// Reads only; the rows follow `list_active` order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the underlying list fails.
    pub async fn export_requests(
        &self,
        actor: &Actor,
        filter: &ExportFilter,
        explode_items: bool,
    ) -> Result<Vec<ExportRow>, DatabaseError> {
        let requests = self
            .list_active(
                actor,
                &RequestFilter {
                    area: filter.area.clone(),
                    status: filter.status,
                    limit: None,
                },
            )
            .await?;
        let rows = project(&requests, &filter.date_range, explode_items);
        tracing::debug!(actor = %actor.id, requests = requests.len(), rows = rows.len(), "export projected");
        Ok(rows)
    }
}
