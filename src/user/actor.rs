use super::{Permission, UserRole};
use crate::store::User;

/// The authenticated user on whose behalf a manager operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub company_id: Option<i64>,
}

impl Actor {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.permissions().contains(&permission)
    }

    /// True when the actor is a recruiter bound to `company_id`.
    pub fn works_for(&self, company_id: Option<i64>) -> bool {
        self.role == UserRole::Recruiter && company_id.is_some() && self.company_id == company_id
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recruiter(company_id: Option<i64>) -> Actor {
        Actor {
            user_id: 1,
            email: "r@acme.com".to_string(),
            role: UserRole::Recruiter,
            company_id,
        }
    }

    #[test]
    fn works_for_requires_matching_company() {
        assert!(recruiter(Some(3)).works_for(Some(3)));
        assert!(!recruiter(Some(3)).works_for(Some(4)));
        assert!(!recruiter(None).works_for(None));

        let admin = Actor {
            role: UserRole::Admin,
            ..recruiter(Some(3))
        };
        assert!(!admin.works_for(Some(3)));
        assert!(admin.has_permission(Permission::ApproveJobs));
    }
}
