pub mod auth;
pub mod init;
pub mod notes;
pub mod sharing;
