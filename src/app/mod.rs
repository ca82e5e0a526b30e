pub mod bell;
pub mod cache;
pub mod counter;
pub mod dispatch;
