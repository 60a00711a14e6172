// SPDX-License-Identifier: MIT

//! Outbound email notifications.
//!
//! All notification email is best-effort: sends run in the background and
//! failures are logged, never propagated to the primary operation. The
//! mailer is disabled entirely when SMTP is not configured.

use crate::config::Config;
use crate::error::{AppError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// What happened, and therefore what the email should say.
#[derive(Debug, Clone)]
pub enum Notice {
    Welcome,
    AddedToBoard { board_name: String },
    InvitedToBoard { board_name: String },
    RemovedFromBoard { board_name: String },
    TaskAssigned { board_name: String },
    TaskUnassigned { board_name: String },
    TaskCompleted { board_name: String, task_title: String },
    AccountDeleted,
}

impl Notice {
    pub fn subject(&self) -> String {
        match self {
            Notice::Welcome => "Welcome to Boardstack!".to_string(),
            Notice::AddedToBoard { board_name } => {
                format!("You have been added to {}", board_name)
            }
            Notice::InvitedToBoard { board_name } => {
                format!("You have been invited to {}", board_name)
            }
            Notice::RemovedFromBoard { board_name } => {
                format!("You have been removed from {}", board_name)
            }
            Notice::TaskAssigned { board_name } => {
                format!("New task assigned to you on {}", board_name)
            }
            Notice::TaskUnassigned { board_name } => {
                format!("You have been unassigned from a task on {}", board_name)
            }
            Notice::TaskCompleted { task_title, .. } => {
                format!("Task completed: {}", task_title)
            }
            Notice::AccountDeleted => "Your account has been deleted".to_string(),
        }
    }

    fn message(&self) -> String {
        match self {
            Notice::Welcome => {
                "Thank you for registering with <strong>Boardstack</strong>. \
                 We are glad to have you on board!"
                    .to_string()
            }
            Notice::AddedToBoard { board_name } => format!(
                "You have been added to the board <strong>{}</strong>.",
                board_name
            ),
            Notice::InvitedToBoard { board_name } => format!(
                "You have been invited to join the board <strong>{}</strong>. \
                 Register with this email address to accept.",
                board_name
            ),
            Notice::RemovedFromBoard { board_name } => format!(
                "You have been removed from the board <strong>{}</strong>.",
                board_name
            ),
            Notice::TaskAssigned { board_name } => format!(
                "You have been assigned a new task on the board <strong>{}</strong>.",
                board_name
            ),
            Notice::TaskUnassigned { board_name } => format!(
                "You have been unassigned from a task on the board <strong>{}</strong>.",
                board_name
            ),
            Notice::TaskCompleted {
                board_name,
                task_title,
            } => format!(
                "The task <strong>{}</strong> on your board <strong>{}</strong> \
                 was marked as completed.",
                task_title, board_name
            ),
            Notice::AccountDeleted => {
                "Your account and all associated data have been permanently deleted. \
                 A copy of your exported data is attached to this email."
                    .to_string()
            }
        }
    }

    /// Render the HTML body for a recipient.
    pub fn body_html(&self, recipient: &str) -> String {
        format!(
            "<html><body style=\"font-family: Arial, sans-serif; padding: 10px;\">\
             <div style=\"max-width: 600px; margin: 0 auto; border: 1px solid #ddd; \
             border-radius: 10px; padding: 20px;\">\
             <h2 style=\"color: #343a40;\">{}</h2>\
             <p style=\"font-size: 16px; color: #495057;\">Hello {},<br><br>{}</p>\
             <hr style=\"border: none; border-top: 1px solid #e9ecef;\">\
             <p style=\"font-size: 14px; color: #868e96;\">\
             If you did not expect this email, you can ignore it.</p>\
             <p style=\"font-size: 14px; color: #868e96;\">Regards,<br>The Boardstack Team</p>\
             </div></body></html>",
            self.subject(),
            recipient,
            self.message()
        )
    }
}

struct MailerInner {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

/// SMTP mailer handle.
#[derive(Clone)]
pub struct Mailer {
    inner: Option<Arc<MailerInner>>,
}

impl Mailer {
    /// Build a mailer from config; disabled unless host, email and password
    /// are all present.
    pub fn from_config(config: &Config) -> Self {
        let (Some(host), Some(email), Some(password)) = (
            config.smtp_host.as_deref(),
            config.smtp_email.clone(),
            config.smtp_password.clone(),
        ) else {
            return Self::disabled();
        };

        let transport = match AsyncSmtpTransport::<Tokio1Executor>::relay(host) {
            Ok(builder) => builder
                .credentials(Credentials::new(email.clone(), password))
                .build(),
            Err(e) => {
                tracing::error!(error = %e, host, "Invalid SMTP relay, mailer disabled");
                return Self::disabled();
            }
        };

        Self {
            inner: Some(Arc::new(MailerInner {
                transport,
                from: email,
            })),
        }
    }

    /// A mailer that silently drops everything (tests, missing SMTP config).
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Send a notification in the background. Never blocks the caller,
    /// never fails the primary operation.
    pub fn notify(&self, recipient: &str, notice: Notice) {
        let Some(inner) = self.inner.clone() else {
            tracing::debug!(recipient, ?notice, "Mailer disabled, dropping notification");
            return;
        };

        let recipient = recipient.to_string();
        tokio::spawn(async move {
            if let Err(e) = send_html(&inner, &recipient, &notice).await {
                tracing::error!(error = %e, recipient, "Failed to send notification email");
            }
        });
    }

    /// Send an email with a ZIP attachment, awaiting the result. Used for
    /// the account-deletion export, where the caller wants the outcome but
    /// still treats failure as non-fatal.
    pub async fn send_with_zip(
        &self,
        recipient: &str,
        notice: Notice,
        filename: &str,
        archive: Vec<u8>,
    ) -> Result<()> {
        let Some(inner) = &self.inner else {
            tracing::debug!(recipient, "Mailer disabled, dropping attachment email");
            return Ok(());
        };

        let attachment = Attachment::new(filename.to_string()).body(
            archive,
            ContentType::parse("application/zip")
                .map_err(|e| AppError::Internal(anyhow::anyhow!("content type: {}", e)))?,
        );

        let message = Message::builder()
            .from(parse_mailbox(&inner.from)?)
            .to(parse_mailbox(recipient)?)
            .subject(notice.subject())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(notice.body_html(recipient)))
                    .singlepart(attachment),
            )
            .map_err(|e| AppError::Internal(anyhow::anyhow!("build email: {}", e)))?;

        inner
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("smtp send: {}", e)))?;

        tracing::info!(recipient, filename, "Sent email with attachment");
        Ok(())
    }
}

async fn send_html(inner: &MailerInner, recipient: &str, notice: &Notice) -> Result<()> {
    let message = Message::builder()
        .from(parse_mailbox(&inner.from)?)
        .to(parse_mailbox(recipient)?)
        .subject(notice.subject())
        .singlepart(SinglePart::html(notice.body_html(recipient)))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("build email: {}", e)))?;

    inner
        .transport
        .send(message)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("smtp send: {}", e)))?;

    tracing::info!(recipient, subject = %notice.subject(), "Sent notification email");
    Ok(())
}

fn parse_mailbox(address: &str) -> Result<lettre::message::Mailbox> {
    address
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid email address {}: {}", address, e)))
}
