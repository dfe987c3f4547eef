pub mod mailbox;
pub mod upload;
