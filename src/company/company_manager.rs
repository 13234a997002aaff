use crate::error::{HiringError, HiringResult};
use crate::store::{Company, CompanyDraft, CompanyFilter, FullStore, PageRequest, Paged};
use crate::user::{Actor, Permission};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCompanyRequest {
    pub id: i64,
    #[serde(flatten)]
    pub company: CompanyDraft,
}

fn validate_draft(draft: &CompanyDraft) -> HiringResult<()> {
    if draft.name.trim().is_empty() {
        return Err(HiringError::InvalidRequest(
            "Company name must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub struct CompanyManager {
    store: Arc<dyn FullStore>,
}

impl CompanyManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    fn reload(&self, id: i64) -> HiringResult<Company> {
        self.store
            .get_company(id)?
            .ok_or_else(|| HiringError::not_found("Company", id))
    }

    pub fn create_company(&self, draft: CompanyDraft) -> HiringResult<Company> {
        validate_draft(&draft)?;
        let id = self.store.create_company(&draft)?;
        info!("Created company {} ({})", id, draft.name);
        self.reload(id)
    }

    /// Admins may edit any company, recruiters only their own.
    pub fn update_company(
        &self,
        request: UpdateCompanyRequest,
        actor: &Actor,
    ) -> HiringResult<Company> {
        if !actor.has_permission(Permission::ManageCompanies) && !actor.works_for(Some(request.id))
        {
            return Err(HiringError::Forbidden(
                "You can only edit your own company".to_string(),
            ));
        }
        validate_draft(&request.company)?;
        if !self.store.update_company(request.id, &request.company)? {
            return Err(HiringError::not_found("Company", request.id));
        }
        self.reload(request.id)
    }

    pub fn get_company(&self, id: i64) -> HiringResult<Company> {
        self.reload(id)
    }

    pub fn list_companies(
        &self,
        filter: &CompanyFilter,
        page: PageRequest,
    ) -> HiringResult<Paged<Company>> {
        Ok(self.store.list_companies(filter, page)?)
    }

    pub fn delete_company(&self, id: i64) -> HiringResult<()> {
        if !self.store.delete_company(id)? {
            return Err(HiringError::not_found("Company", id));
        }
        info!("Soft-deleted company {}", id);
        Ok(())
    }

    pub fn restore_company(&self, id: i64) -> HiringResult<Company> {
        if !self.store.restore_company(id)? {
            return Err(HiringError::not_found("Company", id));
        }
        info!("Restored company {}", id);
        self.reload(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteStore, UserStore};
    use crate::user::UserRole;
    use tempfile::TempDir;

    fn create_manager() -> (CompanyManager, Arc<SqliteStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("jobhunter.db")).unwrap());
        (CompanyManager::new(store.clone()), store, temp_dir)
    }

    fn draft(name: &str) -> CompanyDraft {
        CompanyDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn actor(role: UserRole, company_id: Option<i64>) -> Actor {
        Actor {
            user_id: 1,
            email: "someone@example.com".to_string(),
            role,
            company_id,
        }
    }

    #[test]
    fn create_requires_name() {
        let (manager, _store, _dir) = create_manager();
        assert!(matches!(
            manager.create_company(draft("  ")),
            Err(HiringError::InvalidRequest(_))
        ));
        let company = manager.create_company(draft("Acme")).unwrap();
        assert!(company.active);
    }

    #[test]
    fn recruiters_edit_only_their_company() {
        let (manager, _store, _dir) = create_manager();
        let acme = manager.create_company(draft("Acme")).unwrap();
        let globex = manager.create_company(draft("Globex")).unwrap();
        let recruiter = actor(UserRole::Recruiter, Some(acme.id));

        let updated = manager
            .update_company(
                UpdateCompanyRequest {
                    id: acme.id,
                    company: CompanyDraft {
                        name: "Acme Corp".to_string(),
                        address: Some("Hanoi".to_string()),
                        ..Default::default()
                    },
                },
                &recruiter,
            )
            .unwrap();
        assert_eq!(updated.name, "Acme Corp");
        assert_eq!(updated.address.as_deref(), Some("Hanoi"));

        let err = manager
            .update_company(
                UpdateCompanyRequest {
                    id: globex.id,
                    company: draft("Mine now"),
                },
                &recruiter,
            )
            .unwrap_err();
        assert!(matches!(err, HiringError::Forbidden(_)));

        let admin = actor(UserRole::Admin, None);
        assert!(manager
            .update_company(
                UpdateCompanyRequest {
                    id: globex.id,
                    company: draft("Globex Ltd"),
                },
                &admin,
            )
            .is_ok());
    }

    #[test]
    fn delete_and_restore_cascade_to_users() {
        let (manager, store, _dir) = create_manager();
        let acme = manager.create_company(draft("Acme")).unwrap();
        let user_id = store
            .create_user(&crate::store::NewUser {
                name: "Rita".to_string(),
                email: "rita@acme.com".to_string(),
                password_hash: None,
                age: None,
                gender: None,
                address: None,
                avatar: None,
                cv: None,
                role: UserRole::Recruiter,
                company_id: Some(acme.id),
            })
            .unwrap();

        manager.delete_company(acme.id).unwrap();
        assert!(!manager.get_company(acme.id).unwrap().active);
        assert!(!store.get_user(user_id).unwrap().unwrap().active);

        let restored = manager.restore_company(acme.id).unwrap();
        assert!(restored.active);
        assert!(store.get_user(user_id).unwrap().unwrap().active);

        assert!(matches!(
            manager.delete_company(999),
            Err(HiringError::NotFound(_))
        ));
    }
}
