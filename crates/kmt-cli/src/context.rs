use std::path::Path;

use anyhow::Context;
use kmt_config::{ActorConfig, KmtConfig};
use kmt_core::identity::Actor;
use kmt_db::service::KmtService;

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: KmtService,
    pub config: KmtConfig,
    actor: ActorConfig,
}

impl AppContext {
    /// Open the database and settle the acting user from flags over config.
    pub async fn init(config: KmtConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let db_path = flags
            .db
            .clone()
            .unwrap_or_else(|| config.database.path.clone());

        if db_path != ":memory:" {
            if let Some(parent) = Path::new(&db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let service = KmtService::new_local(&db_path)
            .await
            .with_context(|| format!("failed to open database at {db_path}"))?;
        tracing::debug!(db = %db_path, "kmt context ready");

        let actor = resolve_actor_config(&config.actor, flags);
        Ok(Self {
            service,
            config,
            actor,
        })
    }

    /// The acting user. Required by every command that reads or mutates requests.
    pub fn actor(&self) -> anyhow::Result<Actor> {
        self.actor.to_actor().context(
            "no acting user: pass --actor and --role, or set KMT_ACTOR__ID and KMT_ACTOR__ROLE",
        )
    }

    /// Limit precedence: global flag, then config.
    pub const fn limit(&self, flags: &GlobalFlags) -> u32 {
        match flags.limit {
            Some(limit) => limit,
            None => self.config.general.default_limit,
        }
    }
}

fn resolve_actor_config(base: &ActorConfig, flags: &GlobalFlags) -> ActorConfig {
    ActorConfig {
        id: flags.actor.clone().unwrap_or_else(|| base.id.clone()),
        role: flags.role.clone().unwrap_or_else(|| base.role.clone()),
        area: flags.actor_area.clone().unwrap_or_else(|| base.area.clone()),
    }
}

#[cfg(test)]
mod tests {
    use kmt_core::enums::Role;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn flags_override_configured_actor() {
        let base = ActorConfig {
            id: "usr-config".into(),
            role: "staff".into(),
            area: "Hazam".into(),
        };
        let flags = GlobalFlags {
            actor: Some("usr-flag".into()),
            role: Some("Supervisor".into()),
            ..GlobalFlags::default()
        };
        let actor = resolve_actor_config(&base, &flags).to_actor().unwrap();
        assert_eq!(actor, Actor::new("usr-flag", Role::Supervisor, Some("Hazam")));
    }

    #[test]
    fn missing_actor_is_reported() {
        let resolved = resolve_actor_config(&ActorConfig::default(), &GlobalFlags::default());
        assert!(resolved.to_actor().is_err());
    }

    #[tokio::test]
    async fn init_creates_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("kmt.db");
        let flags = GlobalFlags {
            db: Some(db.to_string_lossy().into_owned()),
            limit: Some(7),
            ..GlobalFlags::default()
        };
        let ctx = AppContext::init(KmtConfig::default(), &flags).await.unwrap();
        assert!(db.exists());
        assert_eq!(ctx.limit(&flags), 7);
        assert_eq!(ctx.limit(&GlobalFlags::default()), 50);
    }
}
