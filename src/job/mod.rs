mod job_manager;
mod skill_manager;

pub use job_manager::JobManager;
pub use skill_manager::SkillManager;
