//! Borrow request workflow service
//!
//! Coordinates the request lifecycle (submit, approve, return), the due-date
//! reminder sweep, and the notifications each step fans out. State changes
//! and their audit entries commit together in the repository layer; emails
//! go out only after the commit and never roll it back.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{AuditEntryDetails, NewAuditEntry},
        borrow::{
            ApproveRequest, BorrowRequest, BorrowRequestDetails, ReminderSweep, SubmitRequest,
        },
        enums::{AuditAction, RequestStatus},
        item::BorrowedItemDetails,
        user::{Role, UserClaims, UserPublic},
    },
    policy::{self, RequestScope},
    repository::Repository,
    services::email::{self, Notifier},
};

#[derive(Clone)]
pub struct BorrowService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
}

impl BorrowService {
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Submit a new borrow request with its item lines.
    ///
    /// The request and its audit entry commit atomically; the confirmation
    /// to the student and the alert to each admin are sent afterwards and a
    /// delivery failure does not undo the submission.
    pub async fn submit_request(
        &self,
        user_id: i32,
        submission: SubmitRequest,
    ) -> AppResult<(BorrowRequest, Vec<BorrowedItemDetails>)> {
        submission
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let student = self.repository.users.get_by_id(user_id).await?;
        if student.role != Role::Student {
            return Err(AppError::Validation("Invalid student or role".to_string()));
        }

        let admin_emails = self.repository.users.admin_emails().await?;
        if admin_emails.is_empty() {
            return Err(AppError::Validation("No admin found".to_string()));
        }

        let details = format!("{} requested some item(s)", student.name);
        let (request, items) = self
            .repository
            .borrows
            .create_with_items(user_id, &submission, &details)
            .await?;

        let notifier = Arc::clone(&self.notifier);
        let student_name = student.name.clone();
        let student_email = student.email.clone();
        let items_for_mail = items.clone();
        let request_id = request.id;
        let collection = submission.collection_date_time;
        tokio::spawn(async move {
            if let Err(e) = email::dispatch_submission_notices(
                notifier.as_ref(),
                &student_name,
                &student_email,
                &admin_emails,
                request_id,
                &items_for_mail,
                collection,
            )
            .await
            {
                tracing::warn!(
                    "Failed to send notifications for borrow request {}: {}",
                    request_id,
                    e
                );
            }
        });

        Ok((request, items))
    }

    /// Approve a pending request, applying per-item decisions.
    ///
    /// Denied lines are removed; if every line is denied the request is
    /// voided and no notice goes out. Only a Pending request can be
    /// approved, so a second concurrent approval loses with a conflict.
    pub async fn approve_request(
        &self,
        request_id: i32,
        payload: ApproveRequest,
    ) -> AppResult<BorrowRequest> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let details = format!(
            "Admin approved request #{}, ReturnDate: {}",
            request_id, payload.return_date
        );
        let (request, items) = self
            .repository
            .borrows
            .apply_approval(request_id, &payload, &details)
            .await?;

        // A voided request carries no return date and gets no notice.
        if let Some(return_date) = request.return_date {
            let owner = self.repository.users.get_public(request.user_id).await?;
            let (subject, body) =
                email::approval_notice(&owner.name, request.id, return_date, &items);
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.send(&owner.email, &subject, &body).await {
                    tracing::warn!(
                        "Failed to send approval notice for request {}: {}",
                        request_id,
                        e
                    );
                }
            });
        }

        Ok(request)
    }

    /// Record the return of an approved request's equipment.
    ///
    /// Any state where the return cannot apply (unknown id, still pending,
    /// already returned) reports the same invalid-state error.
    pub async fn return_equipment(&self, request_id: i32) -> AppResult<BorrowRequest> {
        let owner = self
            .repository
            .borrows
            .owner_public(request_id)
            .await?
            .ok_or_else(|| AppError::InvalidState("Invalid return request".to_string()))?;

        let entry = NewAuditEntry::new(
            owner.id,
            Some(request_id),
            AuditAction::Return,
            format!(
                "{} returned borrow request #{}",
                return_actor_label(&owner),
                request_id
            ),
        );
        let request = self
            .repository
            .borrows
            .mark_returned(request_id, &entry)
            .await?;

        let (subject, body) = email::return_confirmation(&owner.name, request.id);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&owner.email, &subject, &body).await {
                tracing::warn!(
                    "Failed to send return confirmation for request {}: {}",
                    request_id,
                    e
                );
            }
        });

        Ok(request)
    }

    /// Remind every borrower whose approved request falls due within the
    /// next two days (or is already overdue).
    ///
    /// Reminders are sent inline: a failed delivery skips that request and
    /// the sweep moves on, so one bad address cannot starve the rest. Each
    /// successful send is recorded with an audit entry. Requests stay
    /// eligible until returned, so consecutive sweeps remind again.
    pub async fn send_due_reminders(&self) -> AppResult<ReminderSweep> {
        let cutoff = reminder_cutoff(Utc::now());
        let due = self.repository.borrows.due_for_reminder(cutoff).await?;

        let mut reminders_sent = 0u32;
        for request in due {
            let Some(return_date) = request.return_date else {
                continue;
            };
            let owner = match self.repository.users.get_public(request.user_id).await {
                Ok(owner) => owner,
                Err(e) => {
                    tracing::warn!("Skipping reminder for request {}: {}", request.id, e);
                    continue;
                }
            };

            let (subject, body) = email::return_reminder(&owner.name, request.id, return_date);
            if let Err(e) = self.notifier.send(&owner.email, &subject, &body).await {
                tracing::warn!("Failed to send reminder for request {}: {}", request.id, e);
                continue;
            }

            let entry = NewAuditEntry::new(
                owner.id,
                Some(request.id),
                AuditAction::Notify,
                format!("Reminder sent to {} for request #{}", owner.name, request.id),
            );
            self.repository
                .borrows
                .record_reminder(request.id, &entry)
                .await?;
            reminders_sent += 1;
        }

        Ok(ReminderSweep {
            reminders_sent,
            cutoff,
        })
    }

    /// List requests visible to the caller (admins see all, students their own)
    pub async fn list_requests(&self, claims: &UserClaims) -> AppResult<Vec<BorrowRequestDetails>> {
        let owner = match policy::request_scope(claims) {
            RequestScope::All => None,
            RequestScope::OwnedBy(id) => Some(id),
        };
        self.repository.borrows.list(owner, None).await
    }

    /// List pending requests visible to the caller
    pub async fn list_pending(&self, claims: &UserClaims) -> AppResult<Vec<BorrowRequestDetails>> {
        let owner = match policy::request_scope(claims) {
            RequestScope::All => None,
            RequestScope::OwnedBy(id) => Some(id),
        };
        self.repository
            .borrows
            .list(owner, Some(RequestStatus::Pending))
            .await
    }

    /// Item lines of one request, readable by admins and the owner
    pub async fn items_for_request(
        &self,
        claims: &UserClaims,
        request_id: i32,
    ) -> AppResult<Vec<BorrowedItemDetails>> {
        let request = self.repository.borrows.get_by_id(request_id).await?;
        if !policy::can_view_request_items(claims, request.user_id) {
            return Err(AppError::Authorization(
                "Access denied: insufficient permissions".to_string(),
            ));
        }
        self.repository.borrows.items_for_request(request_id).await
    }

    /// Full audit trail, newest first
    pub async fn audit_log(&self) -> AppResult<Vec<AuditEntryDetails>> {
        self.repository.audit.list().await
    }
}

/// End of day, two calendar days from now. A request due any time up to
/// this instant is eligible for a reminder.
pub(crate) fn reminder_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let due_day = now.date_naive() + Duration::days(2);
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&due_day.and_time(end_of_day))
}

/// How the return audit entry names the actor
fn return_actor_label(owner: &UserPublic) -> &str {
    if owner.role == Role::Admin {
        "the admin"
    } else {
        owner.name.as_str()
    }
}
