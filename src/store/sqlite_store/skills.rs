use super::*;
use crate::store::SkillStore;
use rusqlite::OptionalExtension;

fn row_to_skill(row: &Row) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

impl SkillStore for SqliteStore {
    fn create_skill(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO skill (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    fn get_skill(&self, id: i64) -> Result<Option<Skill>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, name FROM skill WHERE id = ?1",
                params![id],
                row_to_skill,
            )
            .optional()?)
    }

    fn get_skill_by_name(&self, name: &str) -> Result<Option<Skill>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, name FROM skill WHERE name = ?1 COLLATE NOCASE",
                params![name],
                row_to_skill,
            )
            .optional()?)
    }

    fn list_skills(&self) -> Result<Vec<Skill>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name FROM skill ORDER BY name")?;
        let skills = stmt
            .query_map([], row_to_skill)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(skills)
    }

    fn update_skill(&self, id: i64, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE skill SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(changed > 0)
    }

    fn delete_skill(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM skill WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::JobStore;

    #[test]
    fn skill_crud() {
        let (store, _dir) = create_tmp_store();
        let rust = add_skill(&store, "Rust");
        add_skill(&store, "Go");

        assert_eq!(store.get_skill(rust).unwrap().unwrap().name, "Rust");
        assert_eq!(
            store.get_skill_by_name("rust").unwrap().map(|s| s.id),
            Some(rust)
        );
        assert!(store.create_skill("Rust").is_err());

        assert!(store.update_skill(rust, "Rust 2021").unwrap());
        let names: Vec<String> = store
            .list_skills()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Go", "Rust 2021"]);
    }

    #[test]
    fn deleting_skill_unlinks_jobs() {
        let (store, _dir) = create_tmp_store();
        let skill = add_skill(&store, "SQL");
        let job_id = store
            .create_job(&job_draft("DBA", None, vec![skill]), "test")
            .unwrap();
        assert_eq!(store.get_job(job_id).unwrap().unwrap().skills.len(), 1);

        assert!(store.delete_skill(skill).unwrap());
        assert!(store.get_job(job_id).unwrap().unwrap().skills.is_empty());
        assert!(!store.delete_skill(skill).unwrap());
    }
}
