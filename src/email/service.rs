use super::sender::{EmailMessage, EmailSender};
use super::templates::{self, DigestJob, Rendered};
use crate::server::metrics;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Renders templates and dispatches them through the configured sender.
#[derive(Clone)]
pub struct EmailService {
    sender: Arc<dyn EmailSender>,
}

impl EmailService {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    async fn deliver(&self, to: &str, rendered: Rendered) -> Result<()> {
        let message = EmailMessage {
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
        };
        let result = self.sender.send(&message).await;
        metrics::record_email(rendered.template, result.is_ok());
        if let Err(err) = &result {
            warn!("Failed to send '{}' email to {}: {:#}", rendered.template, to, err);
        }
        result
    }

    pub async fn send_interview_invitation(
        &self,
        to: &str,
        name: &str,
        job_title: &str,
        company_name: &str,
        confirmation_url: &str,
    ) -> Result<()> {
        let rendered =
            templates::interview_invitation(name, job_title, company_name, confirmation_url);
        self.deliver(to, rendered).await
    }

    pub async fn send_interview_passed(
        &self,
        to: &str,
        name: &str,
        job_title: &str,
        company_name: &str,
        confirmation_url: &str,
    ) -> Result<()> {
        let rendered = templates::interview_passed(name, job_title, company_name, confirmation_url);
        self.deliver(to, rendered).await
    }

    pub async fn send_interview_failed(
        &self,
        to: &str,
        name: &str,
        job_title: &str,
        company_name: &str,
    ) -> Result<()> {
        let rendered = templates::interview_failed(name, job_title, company_name);
        self.deliver(to, rendered).await
    }

    pub async fn send_hired(
        &self,
        to: &str,
        name: &str,
        job_title: &str,
        company_name: &str,
    ) -> Result<()> {
        let rendered = templates::hired(name, job_title, company_name);
        self.deliver(to, rendered).await
    }

    pub async fn send_job_digest(&self, to: &str, name: &str, jobs: &[DigestJob]) -> Result<()> {
        let rendered = templates::job_digest(name, jobs);
        self.deliver(to, rendered).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Keeps every message in memory; fails for addresses listed in `fail_for`.
    #[derive(Default)]
    pub struct RecordingEmailSender {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail_for: Mutex<Vec<String>>,
    }

    impl RecordingEmailSender {
        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingEmailSender {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            if self.fail_for.lock().unwrap().contains(&message.to) {
                anyhow::bail!("mailbox unavailable");
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingEmailSender;
    use super::*;

    #[tokio::test]
    async fn renders_and_sends() {
        let sender = Arc::new(RecordingEmailSender::default());
        let service = EmailService::new(sender.clone());

        service
            .send_hired("cand@example.com", "Cand", "Rust Dev", "Acme")
            .await
            .unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "cand@example.com");
        assert!(sent[0].html.contains("Rust Dev"));
    }

    #[tokio::test]
    async fn propagates_sender_failure() {
        let sender = Arc::new(RecordingEmailSender::default());
        sender
            .fail_for
            .lock()
            .unwrap()
            .push("bad@example.com".to_string());
        let service = EmailService::new(sender.clone());

        let result = service
            .send_interview_failed("bad@example.com", "Bad", "Rust Dev", "Acme")
            .await;
        assert!(result.is_err());
        assert!(sender.sent().is_empty());
    }
}
