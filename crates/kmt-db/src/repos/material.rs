//! Material catalog repository.

use kmt_core::entities::Material;
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_core::ids::PREFIX_MATERIAL;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, now, parse_datetime};
use crate::service::KmtService;

fn row_to_material(row: &libsql::Row) -> Result<Material, DatabaseError> {
    Ok(Material {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        sku: get_opt_string(row, 2)?,
        category: get_opt_string(row, 3)?,
        unit: get_opt_string(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

impl KmtService {
    /// Add a catalog material. Supervisors and admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for staff, `Validation` for a blank name.
    pub async fn add_material(
        &self,
        actor: &Actor,
        name: &str,
        sku: Option<&str>,
        category: Option<&str>,
        unit: Option<&str>,
    ) -> Result<Material, DatabaseError> {
        if !actor.role.can_review() {
            return Err(CoreError::forbidden(&actor.id, "add materials").into());
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("material name must not be empty".into()).into());
        }

        let material = Material {
            id: self.db().generate_id(PREFIX_MATERIAL).await?,
            name: name.to_string(),
            sku: non_blank(sku),
            category: non_blank(category),
            unit: non_blank(unit),
            created_at: now(),
        };

        let tx = self.db().begin_write(&material.id).await?;
        let result = tx
            .execute(
                "INSERT INTO materials (id, name, sku, category, unit, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    material.id.as_str(),
                    material.name.as_str(),
                    material.sku.as_deref(),
                    material.category.as_deref(),
                    material.unit.as_deref(),
                    format_datetime(&material.created_at)
                ],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::info!(material_id = %material.id, name = %material.name, "material added");
        Ok(material)
    }

    /// Catalog materials in name order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_materials(&self, limit: u32) -> Result<Vec<Material>, DatabaseError> {
        let _read = self.db().read().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, sku, category, unit, created_at FROM materials
                 ORDER BY name COLLATE NOCASE, id LIMIT ?1",
                [i64::from(limit)],
            )
            .await?;
        let mut materials = Vec::new();
        while let Some(row) = rows.next().await? {
            materials.push(row_to_material(&row)?);
        }
        Ok(materials)
    }

    pub(crate) async fn material_exists(
        conn: &libsql::Connection,
        id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = conn
            .query("SELECT 1 FROM materials WHERE id = ?1", [id])
            .await?;
        Ok(rows.next().await?.is_some())
    }
}
