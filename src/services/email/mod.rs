// Email service: renders templates and hands messages to the sender

pub mod builders;
pub mod sender;
pub mod types;

use self::types::EmailBuilder;
use crate::app_config::EmailConfig;
use anyhow::Result;
use builders::{WelcomeEmailBuilder, WELCOME_TEMPLATE};
use handlebars::Handlebars;
use sender::EmailSender;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    config: EmailConfig,
    templates: Arc<Handlebars<'static>>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        let sender =
            EmailSender::new_resend(config.resend_api_key.clone(), config.resend_api_url.clone())
                .with_max_retries(3)
                .with_retry_delay(std::time::Duration::from_secs(1));

        Ok(Self {
            sender,
            config,
            templates: Arc::new(templates),
        })
    }

    fn register_templates(templates: &mut Handlebars) -> Result<(), EmailError> {
        let welcome_template = include_str!("../../../templates/email/welcome_email.html");
        templates
            .register_template_string(WELCOME_TEMPLATE, welcome_template)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        Ok(())
    }

    /// Build the welcome email without sending it
    pub fn welcome_email(
        &self,
        to_email: &str,
        first_name: &str,
        pet_name: &str,
    ) -> Result<EmailMessage, EmailError> {
        WelcomeEmailBuilder::new(to_email, first_name, pet_name, &self.config, &self.templates)
            .build()
    }

    #[instrument(skip(self))]
    pub async fn send_welcome_email(
        &self,
        to_email: &str,
        first_name: &str,
        pet_name: &str,
    ) -> Result<(), EmailError> {
        info!("Sending welcome email to {}", to_email);
        let message = self.welcome_email(to_email, first_name, pet_name)?;
        self.sender.send_with_retry(message).await
    }

    /// Fire-and-forget: the send runs on the runtime and only its outcome is logged
    pub fn spawn_welcome_email(&self, to_email: String, first_name: String, pet_name: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service
                .send_welcome_email(&to_email, &first_name, &pet_name)
                .await
            {
                warn!("Welcome email to {} was not delivered: {}", to_email, e);
            }
        });
    }
}

pub use types::{EmailError, EmailMessage};

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            resend_api_key: "test_key".to_string(),
            resend_api_url: "https://api.resend.com/emails".to_string(),
            from_email: "no-reply@petsqrcode.com".to_string(),
            from_name: "PetsQRCode".to_string(),
            support_email: "support@petsqrcode.com".to_string(),
            website_base_url: "https://petsqrcode.com".to_string(),
        }
    }

    #[test]
    fn test_email_service_creation() {
        assert!(EmailService::new(create_test_config()).is_ok());
    }

    #[test]
    fn test_welcome_email_content() {
        let service = EmailService::new(create_test_config()).unwrap();
        let message = service
            .welcome_email("owner@example.com", "Ada", "Biscuit")
            .unwrap();

        assert_eq!(message.subject, "Welcome to PetsQRCode!");
        assert_eq!(message.from, "PetsQRCode <no-reply@petsqrcode.com>");
        assert_eq!(message.to, vec!["owner@example.com"]);
        assert!(message.html.contains("Ada"));
        assert!(message.html.contains("Biscuit"));
        assert!(message.html.contains("https://petsqrcode.com"));
        assert!(message.text.unwrap().contains("Biscuit's profile is ready"));
    }

    #[test]
    fn test_welcome_email_escapes_names() {
        let service = EmailService::new(create_test_config()).unwrap();
        let message = service
            .welcome_email("owner@example.com", "<b>Ada</b>", "Biscuit")
            .unwrap();
        assert!(!message.html.contains("<b>Ada</b>"));
    }
}
