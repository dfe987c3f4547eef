use mail_parser::{Address, Message, MimeHeaders};

/// A raw attachment part lifted out of a parsed mail, before it is
/// materialized to disk.
#[derive(Debug, Clone)]
pub struct MimePart {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Header and part extraction on top of `mail_parser`.
pub struct MailParser;

impl MailParser {
    /// Sender addresses in header order.
    pub fn sender_addresses(parsed: &Message) -> Vec<String> {
        match parsed.from() {
            Some(Address::List(list)) => list
                .iter()
                .filter_map(|a| a.address())
                .map(str::to_string)
                .collect(),
            Some(Address::Group(groups)) => groups
                .iter()
                .flat_map(|g| g.addresses.iter())
                .filter_map(|a| a.address())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn subject(parsed: &Message) -> String {
        parsed.subject().unwrap_or("").to_string()
    }

    /// Collect every named attachment part. Parts without a filename
    /// (inline bodies) are skipped; parts without a declared content
    /// type fall back to a guess from the filename.
    pub fn attachment_parts(parsed: &Message) -> Vec<MimePart> {
        let mut parts = Vec::new();

        for part in parsed.attachments() {
            let Some(filename) = part.attachment_name() else {
                continue;
            };

            let content_type = part
                .content_type()
                .map(|ct| {
                    if let Some(subtype) = ct.subtype() {
                        format!("{}/{}", ct.c_type, subtype)
                    } else {
                        ct.c_type.to_string()
                    }
                })
                .unwrap_or_else(|| {
                    mime_guess::from_path(filename)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string()
                });

            parts.push(MimePart {
                filename: filename.to_string(),
                content_type,
                data: part.contents().to_vec(),
            });
        }

        parts
    }
}
