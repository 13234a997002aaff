mod company_manager;

pub use company_manager::{CompanyManager, UpdateCompanyRequest};
