pub mod notification;
pub mod timestamp;
