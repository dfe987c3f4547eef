pub mod config;
pub mod dispatch;
pub mod filter;
pub mod imap_service;
pub mod listener;
pub mod message;
pub mod parser;
pub mod watcher;

pub use config::{ImapConfig, ListenerConfig};
pub use dispatch::{Dispatcher, UploadCallback};
pub use filter::FilterSettings;
pub use listener::MailListener;
pub use message::{Attachment, IncomingMessage, MailEvent};
