use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mailpix")]
#[command(
    about = "Watch an IMAP mailbox and upload image attachments to Flickr",
    long_about = None
)]
pub struct Cli {
    /// Mailbox to watch instead of the configured one
    #[arg(long)]
    pub mailbox: Option<String>,

    /// Polling interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Delete local attachment copies after successful upload
    #[arg(long, default_value = "false")]
    pub cleanup: bool,

    /// Skip the credential check against the photo service on startup
    #[arg(long, default_value = "false")]
    pub no_verify: bool,
}
