//! Applications and the hiring workflow.

mod resume_manager;

pub use resume_manager::{ApplyRequest, ResumeManager, StatusUpdate, FULLY_STAFFED_MESSAGE};
