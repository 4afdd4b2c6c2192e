//! Shared test utilities for kmt-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use kmt_core::entities::{MaterialRequest, NewRequest, RequestItem};
    use kmt_core::enums::{RequestCategory, Role};
    use kmt_core::identity::Actor;

    use crate::KmtDb;
    use crate::service::KmtService;

    /// Create an in-memory `KmtService`.
    pub async fn test_service() -> KmtService {
        let db = KmtDb::open_local(":memory:").await.unwrap();
        KmtService::from_db(db)
    }

    pub fn admin() -> Actor {
        Actor::new("usr-admin", Role::Admin, None)
    }

    pub fn supervisor(id: &str, area: &str) -> Actor {
        Actor::new(id, Role::Supervisor, Some(area))
    }

    pub fn staff(id: &str) -> Actor {
        Actor::new(id, Role::Staff, Some("Rustaq"))
    }

    /// Submit a single-item material request.
    pub async fn submit(svc: &KmtService, actor: &Actor, area: &str, item: &str) -> MaterialRequest {
        let new = NewRequest::new(area, RequestCategory::Material, vec![RequestItem::named(item, 1)]);
        svc.create_request(actor, &new).await.unwrap()
    }

    /// Submit a PPE request with one unit of each item.
    pub async fn submit_ppe(
        svc: &KmtService,
        actor: &Actor,
        area: &str,
        items: &[&str],
    ) -> MaterialRequest {
        let items = items.iter().map(|name| RequestItem::named(name, 1)).collect();
        let new = NewRequest::new(area, RequestCategory::Ppe, items);
        svc.create_request(actor, &new).await.unwrap()
    }
}
