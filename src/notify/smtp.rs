use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use serde::Deserialize;

use super::{EmailMessage, NotifyError, Notifier};

/// SMTP relay and mailbox settings.
///
/// Credentials left unset here are read from `EMAIL_SENDER`,
/// `EMAIL_RECEIVER` and `EMAIL_PASSWORD` at send time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub password: Option<String>,
    pub signature: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            sender: None,
            receiver: None,
            password: None,
            signature: "-- BI Team, Titan".to_string(),
        }
    }
}

struct Credential {
    sender: String,
    receiver: String,
    password: String,
}

impl MailSettings {
    fn credential(&self) -> Result<Credential, NotifyError> {
        Ok(Credential {
            sender: resolve(&self.sender, "EMAIL_SENDER")?,
            receiver: resolve(&self.receiver, "EMAIL_RECEIVER")?,
            password: resolve(&self.password, "EMAIL_PASSWORD")?,
        })
    }
}

fn resolve(value: &Option<String>, env: &'static str) -> Result<String, NotifyError> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| std::env::var(env).ok().filter(|v| !v.trim().is_empty()))
        .ok_or(NotifyError::MissingCredential(env))
}

/// Sends plain-text mail over an implicit-TLS SMTP relay.
pub struct SmtpNotifier {
    settings: MailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let credential = self.settings.credential()?;

        let email = Message::builder()
            .from(credential.sender.parse()?)
            .to(credential.receiver.parse()?)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())?;

        let transport = SmtpTransport::relay(&self.settings.smtp_host)?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(credential.sender, credential.password))
            .build();

        tracing::debug!(
            host = %self.settings.smtp_host,
            port = self.settings.smtp_port,
            "sending email"
        );
        transport.send(&email)?;

        Ok(())
    }

    fn signature(&self) -> &str {
        &self.settings.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_values_win_over_environment() {
        let value = resolve(&Some("bi@example.com".into()), "NEXT_ACTION_BI_TEST_UNSET")
            .unwrap();
        assert_eq!(value, "bi@example.com");
    }

    #[test]
    fn blank_and_missing_values_are_reported_by_name() {
        let err = resolve(&Some("  ".into()), "NEXT_ACTION_BI_TEST_UNSET").unwrap_err();
        assert!(matches!(
            err,
            NotifyError::MissingCredential("NEXT_ACTION_BI_TEST_UNSET")
        ));
    }

    #[test]
    fn missing_credentials_fail_before_connecting() {
        let notifier = SmtpNotifier::new(MailSettings {
            sender: Some("bi@example.com".into()),
            receiver: Some("ops@example.com".into()),
            password: Some(String::new()),
            ..MailSettings::default()
        });

        // An empty configured password only passes if the environment has one.
        if std::env::var("EMAIL_PASSWORD").is_err() {
            let message = EmailMessage {
                subject: "s".into(),
                body: "b".into(),
            };
            assert!(matches!(
                notifier.send(&message),
                Err(NotifyError::MissingCredential("EMAIL_PASSWORD"))
            ));
        }
    }
}
