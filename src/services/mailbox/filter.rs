use super::message::IncomingMessage;

/// Optional sender and subject filters from the listener configuration.
///
/// `None` means the corresponding filter is not configured and passes
/// everything.
#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    /// Subject keywords. An attachment qualifies when the subject
    /// matches at least one of them.
    pub subjects: Option<Vec<String>>,
    /// Strict subject matching: exact equality instead of
    /// case-insensitive substring containment.
    pub strict: bool,
    /// Sender allow-list, matched case-insensitively as a substring of
    /// the message's first sender address.
    pub senders: Option<Vec<String>>,
}

impl FilterSettings {
    /// Parse a comma-separated filter list, as the config carries it.
    /// Empty input yields `None` (filter not configured).
    pub fn parse_list(raw: &str) -> Option<Vec<String>> {
        let entries: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if entries.is_empty() {
            None
        } else {
            Some(entries)
        }
    }

    /// Decide, for every attachment of the message, whether it should
    /// be uploaded.
    ///
    /// Flags are settled here so that attachment handling never needs
    /// message-level state.
    pub fn evaluate(&self, message: &mut IncomingMessage) {
        if !self.sender_allowed(&message.from) {
            return;
        }

        let qualifies = self.subject_matches(&message.subject);
        for attachment in &mut message.attachments {
            attachment.should_upload = qualifies;
        }
    }

    fn sender_allowed(&self, from: &[String]) -> bool {
        let Some(allowed) = &self.senders else {
            return true;
        };
        let Some(first) = from.first() else {
            return false;
        };
        let first = first.to_lowercase();
        allowed.iter().any(|entry| first.contains(&entry.to_lowercase()))
    }

    fn subject_matches(&self, subject: &str) -> bool {
        let Some(keywords) = &self.subjects else {
            return true;
        };
        if subject.is_empty() {
            return false;
        }
        keywords
            .iter()
            .any(|keyword| matches(subject, keyword, self.strict))
    }
}

fn matches(subject: &str, keyword: &str, strict: bool) -> bool {
    if strict {
        subject == keyword
    } else {
        subject.to_lowercase().contains(&keyword.to_lowercase())
    }
}
