//! Transactional email: HTML templates rendered in-process and handed to a
//! pluggable sender.

mod sender;
mod service;
pub mod templates;

pub use sender::{EmailMessage, EmailSender, HttpEmailSender, LogEmailSender};
pub use service::EmailService;
#[cfg(test)]
pub(crate) use service::testing;
pub use templates::DigestJob;
