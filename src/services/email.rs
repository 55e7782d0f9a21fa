//! Email notifications for the borrow workflow

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::item::BorrowedItemDetails,
};

/// Transport seam for workflow notifications. Workflow code talks to this
/// trait so delivery can be faked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("FabTrack");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace("\n", "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            // Use STARTTLS for secure connection
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(
                username.clone(),
                password.clone(),
            ))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.send_email(to, subject, body).await
    }
}

// ---------------------------------------------------------------------------
// Notification content
// ---------------------------------------------------------------------------

fn submission_item_lines(items: &[BorrowedItemDetails]) -> String {
    let mut out = String::new();
    for item in items {
        let desc = item
            .description
            .as_ref()
            .map(|d| format!(" | Description: \"{}\"", d))
            .unwrap_or_default();
        out.push_str(&format!(
            " - {} (Qty: {}{})\n",
            item.equipment_name, item.quantity, desc
        ));
    }
    out
}

fn approval_item_lines(items: &[BorrowedItemDetails]) -> String {
    let mut out = String::new();
    for item in items {
        let sn = item
            .serial_number
            .as_ref()
            .map(|sn| format!(" (SN: {})", sn))
            .unwrap_or_default();
        let desc = item
            .description
            .as_ref()
            .map(|d| format!(" | Description: \"{}\"", d))
            .unwrap_or_default();
        out.push_str(&format!(
            " - {} x{}{}{}\n",
            item.equipment_name, item.quantity, sn, desc
        ));
    }
    out
}

/// Submission confirmation sent to the student
pub fn submission_confirmation(
    student_name: &str,
    request_id: i32,
    items: &[BorrowedItemDetails],
    collection: DateTime<Utc>,
) -> (String, String) {
    let subject = format!("Borrow Request #{} Submitted", request_id);
    let body = format!(
        "Dear {},\n\n\
         Your borrow request #{} has been submitted with the following items:\n\n\
         {}\n\
         You will need to collect the items at the Fab Lab on: {}\n\n\
         Regards,\n\
         FabTrack",
        student_name,
        request_id,
        submission_item_lines(items),
        collection
    );
    (subject, body)
}

/// New-request alert sent to each admin
pub fn admin_alert(
    student_name: &str,
    request_id: i32,
    items: &[BorrowedItemDetails],
    collection: DateTime<Utc>,
) -> (String, String) {
    let subject = format!("New Borrow Request #{}", request_id);
    let body = format!(
        "A new borrow request #{} has been submitted by {} with the following items:\n\n\
         {}\
         Requested pick-up date/time: {}\n\n\
         Please prepare the component(s) for pickup and verify issuance.\n\n\
         Regards,\n\
         FabTrack",
        request_id,
        student_name,
        submission_item_lines(items),
        collection
    );
    (subject, body)
}

/// Approval notice sent to the student, with finalized items and deadline
pub fn approval_notice(
    student_name: &str,
    request_id: i32,
    return_date: DateTime<Utc>,
    items: &[BorrowedItemDetails],
) -> (String, String) {
    let subject = format!("Borrow Request #{} Approved", request_id);
    let body = format!(
        "Dear {},\n\n\
         Your borrow request #{} has been approved.\n\
         Return deadline: {}\n\n\
         Approved items:\n\
         {}\n\
         Please return items by the deadline.\n\n\
         Regards,\n\
         FabTrack",
        student_name,
        request_id,
        return_date,
        approval_item_lines(items)
    );
    (subject, body)
}

/// Return confirmation sent to the student
pub fn return_confirmation(student_name: &str, request_id: i32) -> (String, String) {
    let subject = format!("Borrow Request #{} Returned", request_id);
    let body = format!(
        "Dear {},\n\n\
         Your borrow request #{} has been marked as returned by the admin.\n\
         If you have any questions, please contact the lab staff.\n\n\
         Regards,\n\
         FabTrack",
        student_name, request_id
    );
    (subject, body)
}

/// Due-date reminder sent to the student
pub fn return_reminder(
    student_name: &str,
    request_id: i32,
    return_date: DateTime<Utc>,
) -> (String, String) {
    let subject = "Equipment Return Reminder".to_string();
    let body = format!(
        "Dear {},\n\n\
         This is a reminder that your borrow request #{} is due on {}.\n\n\
         Regards,\n\
         FabTrack",
        student_name, request_id, return_date
    );
    (subject, body)
}

/// Send the submission notices: a confirmation to the student, then the
/// alert to every admin.
pub async fn dispatch_submission_notices(
    notifier: &dyn Notifier,
    student_name: &str,
    student_email: &str,
    admin_emails: &[String],
    request_id: i32,
    items: &[BorrowedItemDetails],
    collection: DateTime<Utc>,
) -> AppResult<()> {
    let (subject, body) = submission_confirmation(student_name, request_id, items, collection);
    notifier.send(student_email, &subject, &body).await?;

    let (subject, body) = admin_alert(student_name, request_id, items, collection);
    for admin in admin_emails {
        notifier.send(admin, &subject, &body).await?;
    }

    Ok(())
}
