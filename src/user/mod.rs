mod actor;
pub mod auth;
pub mod permissions;
mod user_manager;

pub use actor::Actor;
pub use auth::PasswordHasherKind;
pub use permissions::{Permission, UserRole};
pub use user_manager::{
    CreateUserRequest, RegisterRecruiterRequest, UpdateUserRequest, UserManager,
};
