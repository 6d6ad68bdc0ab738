//! Notification module - assignment emails

use chrono::NaiveDate;
use thiserror::Error;

mod smtp;

pub use smtp::{MailSettings, SmtpNotifier};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Email credential {0} is missing")]
    MissingCredential(&'static str),
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("Failed to send email: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

/// An action handed to a team with a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub action: String,
    pub team: String,
    pub deadline: NaiveDate,
    pub message: String,
}

impl Assignment {
    /// Render the notification text. A blank message is left out.
    pub fn compose(&self, signature: &str) -> EmailMessage {
        let subject = format!(
            "[Assignment Notification] '{}' assigned to {}",
            self.action, self.team
        );

        let mut body = format!(
            "\nHello,\n\nYou assigned the following action item:\n\nAction: {}\nAssigned To Team: {}\nDeadline: {}\n\n",
            self.action, self.team, self.deadline
        );

        if !self.message.trim().is_empty() {
            body.push_str(&self.message);
            body.push_str("\n\n");
        }

        body.push_str(signature);
        body.push('\n');

        EmailMessage { subject, body }
    }
}

/// Message listing the next-action bullets and the user's own instructions.
pub fn personalized_message(bullets: &[String], instructions: &str) -> String {
    format!(
        "NEXT ACTIONS:\n{}\n\nOTHER INSTRUCTIONS:\n{}",
        bullets.join("\n"),
        instructions
    )
}

/// Delivers composed emails.
pub trait Notifier: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;

    fn signature(&self) -> &str;
}

/// Compose and send an assignment. Failures are logged and reported as `false`.
pub fn send_notification(
    notifier: &dyn Notifier,
    action: &str,
    team: &str,
    deadline: NaiveDate,
    message: &str,
) -> bool {
    let assignment = Assignment {
        action: action.to_string(),
        team: team.to_string(),
        deadline,
        message: message.to_string(),
    };
    let email = assignment.compose(notifier.signature());

    match notifier.send(&email) {
        Ok(()) => {
            tracing::info!(action, team, %deadline, "assignment email sent");
            true
        }
        Err(NotifyError::MissingCredential(name)) => {
            tracing::warn!("email credential {name} missing, add it to the settings or environment");
            false
        }
        Err(e) => {
            tracing::error!(action, team, "failed to send assignment email: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Outbox {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    impl Outbox {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl Notifier for Outbox {
        fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::MissingCredential("EMAIL_PASSWORD"));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn signature(&self) -> &str {
            "-- BI Team"
        }
    }

    fn deadline() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 12).unwrap()
    }

    #[test]
    fn compose_includes_header_lines_and_message() {
        let email = Assignment {
            action: "Saturday Sales Push".into(),
            team: "Marketing".into(),
            deadline: deadline(),
            message: "Call the regional leads".into(),
        }
        .compose("-- BI Team");

        assert_eq!(
            email.subject,
            "[Assignment Notification] 'Saturday Sales Push' assigned to Marketing"
        );
        assert!(email.body.contains("Action: Saturday Sales Push\n"));
        assert!(email.body.contains("Assigned To Team: Marketing\n"));
        assert!(email.body.contains("Deadline: 2025-09-12\n"));
        assert!(email.body.contains("Call the regional leads\n\n-- BI Team\n"));
    }

    #[test]
    fn blank_message_is_omitted() {
        let email = Assignment {
            action: "A".into(),
            team: "Sales".into(),
            deadline: deadline(),
            message: "   \n".into(),
        }
        .compose("-- BI Team");

        assert!(email.body.ends_with("Deadline: 2025-09-12\n\n-- BI Team\n"));
    }

    #[test]
    fn personalized_message_layout() {
        let bullets = vec!["First".to_string(), "Second".to_string()];
        assert_eq!(
            personalized_message(&bullets, "Weekly update please"),
            "NEXT ACTIONS:\nFirst\nSecond\n\nOTHER INSTRUCTIONS:\nWeekly update please"
        );
    }

    #[test]
    fn send_reports_success_and_failure() {
        let ok = Outbox::new(false);
        assert!(send_notification(&ok, "A", "Finance", deadline(), "msg"));
        let sent = ok.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("assigned to Finance"));

        let failing = Outbox::new(true);
        assert!(!send_notification(&failing, "A", "Finance", deadline(), "msg"));
    }
}
