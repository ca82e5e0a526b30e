pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod jobs;

pub use crate::app::bell::{BellWidget, ScrollMetrics, ViewState};
pub use crate::app::cache::{LoadOutcome, NotificationCache};
pub use crate::app::counter::UnreadCounter;
pub use crate::app::dispatch::{DispatchError, DispatchForm, ValidationError};
pub use crate::domain::notification::{Notification, NotificationId};
pub use crate::infra::api::{ApiError, NotificationApi};
pub use crate::infra::client::HttpNotificationApi;
