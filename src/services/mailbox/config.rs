use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use super::dispatch::UploadCallback;
use super::filter::FilterSettings;
use crate::services::upload::UploadCredentials;

/// IMAP account settings.
#[derive(Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub mailbox: String,
}

impl fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mailbox", &self.mailbox)
            .finish()
    }
}

/// Everything one listener instance needs. Immutable once built.
#[derive(Clone)]
pub struct ListenerConfig {
    pub imap: ImapConfig,
    pub flickr: UploadCredentials,
    pub filter: FilterSettings,
    /// Delete the local copy of an attachment after a successful upload.
    pub cleanup: bool,
    pub poll_interval: u64,
    /// Where attachment MIME parts are materialized.
    pub attachment_dir: PathBuf,
    /// Invoked once per attempted upload with the outcome.
    pub on_upload: Option<UploadCallback>,
}

impl fmt::Debug for ListenerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerConfig")
            .field("imap", &self.imap)
            .field("flickr", &self.flickr)
            .field("filter", &self.filter)
            .field("cleanup", &self.cleanup)
            .field("poll_interval", &self.poll_interval)
            .field("attachment_dir", &self.attachment_dir)
            .field("on_upload", &self.on_upload.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ListenerConfig {
    /// Build the configuration from the environment (.env aware).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            imap: ImapConfig {
                host: Self::env_required("IMAP_HOST")?,
                port: Self::env_parse("IMAP_PORT", 993)?,
                username: Self::env_required("IMAP_USERNAME")?,
                password: Self::env_required("IMAP_PASSWORD")?,
                mailbox: Self::env_or("IMAP_MAILBOX", "INBOX"),
            },
            flickr: UploadCredentials {
                consumer_key: Self::env_required("FLICKR_CONSUMER_KEY")?,
                consumer_secret: Self::env_required("FLICKR_CONSUMER_SECRET")?,
                oauth_token: Self::env_required("FLICKR_OAUTH_TOKEN")?,
                oauth_token_secret: Self::env_required("FLICKR_OAUTH_TOKEN_SECRET")?,
            },
            filter: FilterSettings {
                subjects: FilterSettings::parse_list(&Self::env_or("FILTER_SUBJECTS", "")),
                strict: Self::env_flag("FILTER_STRICT"),
                senders: FilterSettings::parse_list(&Self::env_or("FILTER_FROM", "")),
            },
            cleanup: Self::env_flag("CLEANUP"),
            poll_interval: Self::env_parse("POLL_INTERVAL", 60)?,
            attachment_dir: Self::env_or("ATTACHMENT_DIR", "attachments").into(),
            on_upload: None,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.imap.port == 0 {
            anyhow::bail!("Invalid IMAP port: {}", self.imap.port);
        }
        if self.imap.host.is_empty() {
            anyhow::bail!("IMAP host cannot be empty");
        }
        if self.imap.mailbox.is_empty() {
            anyhow::bail!("Mailbox name cannot be empty");
        }

        if self.poll_interval == 0 {
            anyhow::bail!("Poll interval must be greater than 0");
        }
        if self.poll_interval > 3600 {
            warn!(
                "Poll interval {} is very long (>1 hour), is this intended?",
                self.poll_interval
            );
        }

        if self.attachment_dir.to_str().is_none_or(|s| s.is_empty()) {
            anyhow::bail!("Attachment directory path is invalid");
        }

        Ok(())
    }

    /// Read an environment variable or use a default value.
    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Read and parse an environment variable, falling back to a default.
    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        match std::env::var(key) {
            Ok(val) => val
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
            Err(_) => Ok(default),
        }
    }

    /// Read a required environment variable.
    fn env_required(key: &str) -> Result<String> {
        std::env::var(key).context(format!("{} not set in environment", key))
    }

    /// 1/true (any case) switch the flag on; everything else is off.
    fn env_flag(key: &str) -> bool {
        match std::env::var(key) {
            Ok(val) => val == "1" || val.eq_ignore_ascii_case("true"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_config_from_env() {
        std::env::set_var("IMAP_HOST", "imap.example.com");
        std::env::set_var("IMAP_USERNAME", "test@example.com");
        std::env::set_var("IMAP_PASSWORD", "password123");
        std::env::set_var("FLICKR_CONSUMER_KEY", "ck");
        std::env::set_var("FLICKR_CONSUMER_SECRET", "cs");
        std::env::set_var("FLICKR_OAUTH_TOKEN", "ot");
        std::env::set_var("FLICKR_OAUTH_TOKEN_SECRET", "os");
        std::env::set_var("FILTER_SUBJECTS", "upload,flickr");
        std::env::set_var("FILTER_STRICT", "0");
        std::env::set_var("CLEANUP", "1");

        let config = ListenerConfig::from_env().unwrap();
        assert_eq!(config.imap.host, "imap.example.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.mailbox, "INBOX");
        assert_eq!(
            config.filter.subjects,
            Some(vec!["upload".to_string(), "flickr".to_string()])
        );
        assert!(!config.filter.strict);
        assert!(config.cleanup);
        assert_eq!(config.poll_interval, 60);

        // Secrets never leak through Debug.
        let debugged = format!("{:?}", config);
        assert!(!debugged.contains("password123"));
        assert!(!debugged.contains("\"cs\""));
    }
}
