pub mod unread_poller;
