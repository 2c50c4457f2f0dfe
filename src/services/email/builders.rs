// Email builders: one per email kind

use super::types::{EmailBuilder, EmailError, EmailMessage, WelcomeEmailData};
use crate::app_config::EmailConfig;
use handlebars::Handlebars;
use tracing::instrument;

pub const WELCOME_SUBJECT: &str = "Welcome to PetsQRCode!";
pub const WELCOME_TEMPLATE: &str = "welcome_email";

/// Welcome email sent once onboarding registers the first pet
pub struct WelcomeEmailBuilder<'a> {
    to_email: &'a str,
    first_name: &'a str,
    pet_name: &'a str,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'a>,
}

impl<'a> WelcomeEmailBuilder<'a> {
    pub fn new(
        to_email: &'a str,
        first_name: &'a str,
        pet_name: &'a str,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'a>,
    ) -> Self {
        Self {
            to_email,
            first_name,
            pet_name,
            config,
            templates,
        }
    }
}

impl<'a> EmailBuilder for WelcomeEmailBuilder<'a> {
    #[instrument(skip(self))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = WelcomeEmailData {
            first_name: self.first_name.to_string(),
            pet_name: self.pet_name.to_string(),
            website_base_url: self.config.website_base_url.clone(),
            support_email: self.config.support_email.clone(),
        };

        let html = self
            .templates
            .render(WELCOME_TEMPLATE, &data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let text = format!(
            "Hi {},\n\n\
            {}'s profile is ready. Manage it any time at {}/account.\n\n\
            Questions? Write to {}.\n\n\
            The {} Team",
            self.first_name,
            self.pet_name,
            self.config.website_base_url,
            self.config.support_email,
            self.config.from_name
        );

        Ok(EmailMessage::new(
            format!("{} <{}>", self.config.from_name, self.config.from_email),
            vec![self.to_email.to_string()],
            WELCOME_SUBJECT.to_string(),
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone()))
    }
}
