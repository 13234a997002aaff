use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    ManageUsers,
    ManageCompanies,
    ManageSkills,
    PostJobs,
    ApproveJobs,
    ReviewResumes,
    ApplyToJobs,
    ManageSubscriptions,
    ViewStats,
    ViewCompanyStats,
    ServerAdmin,
}

impl Permission {
    pub fn as_int(self) -> i32 {
        match self {
            Permission::ManageUsers => 1,
            Permission::ManageCompanies => 2,
            Permission::ManageSkills => 3,
            Permission::PostJobs => 4,
            Permission::ApproveJobs => 5,
            Permission::ReviewResumes => 6,
            Permission::ApplyToJobs => 7,
            Permission::ManageSubscriptions => 8,
            Permission::ViewStats => 9,
            Permission::ViewCompanyStats => 10,
            Permission::ServerAdmin => 11,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Permission::ManageUsers),
            2 => Some(Permission::ManageCompanies),
            3 => Some(Permission::ManageSkills),
            4 => Some(Permission::PostJobs),
            5 => Some(Permission::ApproveJobs),
            6 => Some(Permission::ReviewResumes),
            7 => Some(Permission::ApplyToJobs),
            8 => Some(Permission::ManageSubscriptions),
            9 => Some(Permission::ViewStats),
            10 => Some(Permission::ViewCompanyStats),
            11 => Some(Permission::ServerAdmin),
            _ => None,
        }
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ManageCompanies,
    Permission::ManageSkills,
    Permission::PostJobs,
    Permission::ApproveJobs,
    Permission::ReviewResumes,
    Permission::ApplyToJobs,
    Permission::ManageSubscriptions,
    Permission::ViewStats,
    Permission::ViewCompanyStats,
    Permission::ServerAdmin,
];
const RECRUITER_PERMISSIONS: &[Permission] = &[
    Permission::PostJobs,
    Permission::ReviewResumes,
    Permission::ViewCompanyStats,
];
const CANDIDATE_PERMISSIONS: &[Permission] = &[Permission::ApplyToJobs];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Recruiter,
    Candidate,
}

impl UserRole {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::Recruiter => RECRUITER_PERMISSIONS,
            UserRole::Candidate => CANDIDATE_PERMISSIONS,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            UserRole::Admin => 1,
            UserRole::Recruiter => 2,
            UserRole::Candidate => 3,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(UserRole::Admin),
            2 => Some(UserRole::Recruiter),
            3 => Some(UserRole::Candidate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Recruiter => "Recruiter",
            UserRole::Candidate => "Candidate",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "recruiter" => Some(UserRole::Recruiter),
            "candidate" => Some(UserRole::Candidate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PERMISSIONS: [Permission; 11] = [
        Permission::ManageUsers,
        Permission::ManageCompanies,
        Permission::ManageSkills,
        Permission::PostJobs,
        Permission::ApproveJobs,
        Permission::ReviewResumes,
        Permission::ApplyToJobs,
        Permission::ManageSubscriptions,
        Permission::ViewStats,
        Permission::ViewCompanyStats,
        Permission::ServerAdmin,
    ];

    #[test]
    fn permission_roundtrip() {
        for permission in ALL_PERMISSIONS {
            assert_eq!(Permission::from_int(permission.as_int()), Some(permission));
        }
    }

    #[test]
    fn permission_from_int_invalid_values() {
        assert_eq!(Permission::from_int(0), None);
        assert_eq!(Permission::from_int(12), None);
        assert_eq!(Permission::from_int(-1), None);
    }

    #[test]
    fn admin_has_every_permission() {
        let admin_perms = UserRole::Admin.permissions();
        for permission in ALL_PERMISSIONS {
            assert!(admin_perms.contains(&permission));
        }
    }

    #[test]
    fn recruiter_permissions() {
        let perms = UserRole::Recruiter.permissions();
        assert!(perms.contains(&Permission::PostJobs));
        assert!(perms.contains(&Permission::ReviewResumes));
        assert!(perms.contains(&Permission::ViewCompanyStats));

        assert!(!perms.contains(&Permission::ApproveJobs));
        assert!(!perms.contains(&Permission::ViewStats));
        assert!(!perms.contains(&Permission::ApplyToJobs));
    }

    #[test]
    fn candidate_permissions() {
        assert_eq!(
            UserRole::Candidate.permissions(),
            &[Permission::ApplyToJobs]
        );
    }

    #[test]
    fn user_role_int_roundtrip() {
        for role in [UserRole::Admin, UserRole::Recruiter, UserRole::Candidate] {
            assert_eq!(UserRole::from_int(role.as_int()), Some(role));
        }
        assert_eq!(UserRole::from_int(0), None);
    }

    #[test]
    fn user_role_from_str_case_insensitive() {
        assert_eq!(UserRole::from_str("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("RECRUITER"), Some(UserRole::Recruiter));
        assert_eq!(UserRole::from_str("Candidate"), Some(UserRole::Candidate));
        assert_eq!(UserRole::from_str("guest"), None);
    }

    #[test]
    fn user_role_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Recruiter).unwrap(),
            "\"RECRUITER\""
        );
    }
}
