use std::fmt;
use tracing::{info, warn};

use crate::domain::notification::{Category, NewNotification, Notification, Priority, UserId};
use crate::infra::api::{ApiError, NotificationApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Body,
    Recipient,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::Title => "title",
            FormField::Body => "body",
            FormField::Recipient => "recipient",
        };
        f.write_str(name)
    }
}

/// Field-level validation failure. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    field: FormField,
    message: String,
}

impl ValidationError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn title() -> Self {
        Self::new(FormField::Title, "title is required")
    }

    pub fn body() -> Self {
        Self::new(FormField::Body, "body is required")
    }

    pub fn recipient() -> Self {
        Self::new(FormField::Recipient, "recipient is required")
    }

    pub fn field(&self) -> FormField {
        self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("server rejected notification: {0}")]
    Server(#[from] ApiError),
}

/// Create-notification form.
///
/// Validation happens locally and blocks the request. A successful submit
/// resets every field to its default; a server failure keeps the entered
/// values and records a form-level message.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchForm {
    category: Category,
    title: String,
    body: String,
    recipient: Option<UserId>,
    link: String,
    priority: Priority,
    send_email: bool,
    field_error: Option<ValidationError>,
    form_error: Option<String>,
    submitting: bool,
}

impl Default for DispatchForm {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchForm {
    pub fn new() -> Self {
        Self {
            category: Category::general(),
            title: String::new(),
            body: String::new(),
            recipient: None,
            link: String::new(),
            priority: Priority::Normal,
            send_email: false,
            field_error: None,
            form_error: None,
            submitting: false,
        }
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
        self.clear_errors();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.clear_errors();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.clear_errors();
    }

    pub fn set_recipient(&mut self, recipient: Option<UserId>) {
        self.recipient = recipient;
        self.clear_errors();
    }

    pub fn set_link(&mut self, link: impl Into<String>) {
        self.link = link.into();
        self.clear_errors();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.clear_errors();
    }

    pub fn set_send_email(&mut self, send_email: bool) {
        self.send_email = send_email;
        self.clear_errors();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn recipient(&self) -> Option<UserId> {
        self.recipient
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn send_email(&self) -> bool {
        self.send_email
    }

    pub fn field_error(&self) -> Option<&ValidationError> {
        self.field_error.as_ref()
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_pristine(&self) -> bool {
        *self == Self::new()
    }

    fn clear_errors(&mut self) {
        self.field_error = None;
        self.form_error = None;
    }

    /// Checks title, body and recipient in that order and builds the
    /// request body. An empty link is sent as absent.
    pub fn validate(&self) -> Result<NewNotification, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::title());
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::body());
        }
        let recipient = self.recipient.ok_or_else(ValidationError::recipient)?;

        let link = self.link.trim();
        Ok(NewNotification {
            category: self.category.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            recipient_id: recipient,
            priority: self.priority,
            link: (!link.is_empty()).then(|| link.to_string()),
            send_email: self.send_email,
        })
    }

    pub async fn submit(&mut self, api: &dyn NotificationApi) -> Result<Notification, DispatchError> {
        self.clear_errors();
        let request = match self.validate() {
            Ok(request) => request,
            Err(err) => {
                self.field_error = Some(err.clone());
                return Err(err.into());
            }
        };

        self.submitting = true;
        let result = api.create(&request).await;
        self.submitting = false;

        match result {
            Ok(created) => {
                info!(
                    notification_id = %created.id,
                    recipient_id = %request.recipient_id,
                    "notification dispatched"
                );
                *self = Self::new();
                Ok(created)
            }
            Err(err) => {
                warn!(error = ?err, recipient_id = %request.recipient_id, "failed to dispatch notification");
                self.form_error = Some(format!("failed to send notification: {}", err));
                Err(err.into())
            }
        }
    }
}
