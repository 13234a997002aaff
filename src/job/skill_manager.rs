use crate::error::{HiringError, HiringResult};
use crate::store::{FullStore, Skill};
use std::sync::Arc;

fn name_taken(name: &str) -> HiringError {
    HiringError::AlreadyExists(format!("Skill {} already exists", name))
}

pub struct SkillManager {
    store: Arc<dyn FullStore>,
}

impl SkillManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    fn normalized(name: &str) -> HiringResult<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HiringError::InvalidRequest(
                "Skill name must not be empty".to_string(),
            ));
        }
        Ok(name)
    }

    fn ensure_name_free(&self, name: &str, except: Option<i64>) -> HiringResult<()> {
        match self.store.get_skill_by_name(name)? {
            Some(existing) if Some(existing.id) != except => Err(name_taken(name)),
            _ => Ok(()),
        }
    }

    pub fn create_skill(&self, name: &str) -> HiringResult<Skill> {
        let name = Self::normalized(name)?;
        self.ensure_name_free(name, None)?;
        let id = self
            .store
            .create_skill(name)
            .map_err(|e| HiringError::on_write(e, || name_taken(name)))?;
        Ok(Skill {
            id,
            name: name.to_string(),
        })
    }

    pub fn update_skill(&self, id: i64, name: &str) -> HiringResult<Skill> {
        let name = Self::normalized(name)?;
        self.ensure_name_free(name, Some(id))?;
        let renamed = self
            .store
            .update_skill(id, name)
            .map_err(|e| HiringError::on_write(e, || name_taken(name)))?;
        if !renamed {
            return Err(HiringError::not_found("Skill", id));
        }
        Ok(Skill {
            id,
            name: name.to_string(),
        })
    }

    pub fn delete_skill(&self, id: i64) -> HiringResult<()> {
        if !self.store.delete_skill(id)? {
            return Err(HiringError::not_found("Skill", id));
        }
        Ok(())
    }

    pub fn list_skills(&self) -> HiringResult<Vec<Skill>> {
        Ok(self.store.list_skills()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn create_manager() -> (SkillManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("jobhunter.db")).unwrap());
        (SkillManager::new(store), temp_dir)
    }

    #[test]
    fn names_are_trimmed_and_unique() {
        let (manager, _dir) = create_manager();
        let rust = manager.create_skill("  Rust ").unwrap();
        assert_eq!(rust.name, "Rust");

        assert!(matches!(
            manager.create_skill("Rust"),
            Err(HiringError::AlreadyExists(_))
        ));
        assert!(matches!(
            manager.create_skill(""),
            Err(HiringError::InvalidRequest(_))
        ));
    }

    #[test]
    fn update_allows_same_name_and_rejects_taken_one() {
        let (manager, _dir) = create_manager();
        let rust = manager.create_skill("Rust").unwrap();
        manager.create_skill("Go").unwrap();

        assert!(manager.update_skill(rust.id, "Rust").is_ok());
        assert!(matches!(
            manager.update_skill(rust.id, "Go"),
            Err(HiringError::AlreadyExists(_))
        ));
        assert!(matches!(
            manager.update_skill(999, "Zig"),
            Err(HiringError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_skill() {
        let (manager, _dir) = create_manager();
        let rust = manager.create_skill("Rust").unwrap();
        manager.delete_skill(rust.id).unwrap();
        assert!(manager.list_skills().unwrap().is_empty());
        assert!(matches!(
            manager.delete_skill(rust.id),
            Err(HiringError::NotFound(_))
        ));
    }
}
