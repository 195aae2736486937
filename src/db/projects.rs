// src/db/projects.rs
use rusqlite::params;

use super::{Database, FieldCipher};
use crate::consts::LOCKED_PLACEHOLDER;
use crate::error::Result;
use crate::models::Project;

impl Database {
    pub async fn save_project(&self, cipher: &impl FieldCipher, project: &Project) -> Result<()> {
        let conn = self.conn().await;
        let name = cipher.seal(&project.name)?;
        conn.execute(
            "INSERT INTO projects (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name, icon = excluded.icon, color = excluded.color",
            params![project.id, name, project.icon, project.color],
        )?;
        Ok(())
    }

    pub async fn load_projects(&self, cipher: &impl FieldCipher) -> Result<Vec<Project>> {
        let conn = self.conn().await;
        let mut stmt = conn.prepare("SELECT id, name, icon, color FROM projects ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    color: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|mut p| {
                p.name = cipher.open(&p.name)?;
                Ok(p)
            })
            .collect()
    }

    /// Project names are encrypted: load all, compare in memory.
    /// The locked placeholder names no project.
    pub async fn find_project_by_name(
        &self,
        cipher: &impl FieldCipher,
        name: &str,
    ) -> Result<Option<Project>> {
        if name == LOCKED_PLACEHOLDER {
            return Ok(None);
        }
        let projects = self.load_projects(cipher).await?;
        Ok(projects.into_iter().find(|p| p.name == name))
    }

    /// Remove a project; its tasks keep existing without one
    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let conn = self.conn().await;
        let n = conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        Ok(n > 0)
    }
}
