//! Letterbox CLI - send and read password-protected letters
//!
//! Letters are sealed locally with PBKDF2 + AES-256-GCM and kept either in a
//! local directory or in a remote PostgREST-style letter store.

use clap::{ArgGroup, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use letterbox::config::StoreConfig;
use letterbox::error::{ErrorCategory, ErrorKind, LetterboxError, Result};
use letterbox::letter::{Draft, LetterId};
use letterbox::letter_ops;
use letterbox::passphrase::{
    CachingPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};
use letterbox::share;
use letterbox::store::{FileStore, LetterStore, RestStore};

#[derive(Parser)]
#[command(name = "letterbox")]
#[command(version)]
#[command(about = "Password-protected letters shared by link.", long_about = None)]
struct Cli {
    /// Read the password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Keep letters in this local directory instead of a remote store.
    /// Takes precedence over --endpoint.
    #[arg(long, global = true, value_name = "DIR", env = "LETTERBOX_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Base URL of the remote letter store
    #[arg(long, global = true, value_name = "URL", env = "LETTERBOX_ENDPOINT")]
    endpoint: Option<String>,

    /// Access token for the remote letter store
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env = "LETTERBOX_ACCESS_TOKEN",
        hide_env_values = true
    )]
    access_token: Option<String>,

    /// Origin that share links point at
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "LETTERBOX_ORIGIN",
        default_value = "http://localhost:5173"
    )]
    origin: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a letter and print its share link
    #[command(alias = "s")]
    #[command(group(ArgGroup::new("content").required(true).args(["body", "body_file"])))]
    Send {
        /// Sender's name (stored in plaintext)
        #[arg(long, value_name = "NAME")]
        from: String,

        /// Recipient's name (stored in plaintext)
        #[arg(long, value_name = "NAME")]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Letter body
        #[arg(long)]
        body: Option<String>,

        /// Read the letter body from a file
        #[arg(long, value_name = "FILE")]
        body_file: Option<PathBuf>,
    },

    /// Show who a letter is from and to, without unlocking it
    Show {
        /// Share link or bare letter id
        link: String,
    },

    /// Unlock and print a letter
    #[command(alias = "r")]
    Read {
        /// Share link or bare letter id
        link: String,
    },

    /// Print the share link for a letter id
    Link {
        /// Letter id
        id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Send {
            from,
            to,
            subject,
            body,
            body_file,
        } => {
            let body = match (body, body_file) {
                (Some(body), _) => body.clone(),
                (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
                    LetterboxError::with_kind_and_source(
                        ErrorCategory::User,
                        ErrorKind::Io,
                        format!("failed to read from {}", path.display()),
                        e,
                    )
                })?,
                (None, None) => String::new(),
            };
            let draft = Draft {
                sender_name: from.clone(),
                recipient_name: to.clone(),
                subject: subject.clone(),
                body,
            };
            // Catch blank fields before prompting for a password.
            draft.validate()?;

            let (password, confirmation) = read_new_password(cli.passphrase_stdin)?;
            let store = open_store(&cli)?;
            let id = letter_ops::send_letter(&*store, &draft, &password, &confirmation)?;
            println!("{}", share::share_link(&cli.origin, &id));
        }
        Commands::Show { link } => {
            let id = share::parse_share_link(link)?;
            let store = open_store(&cli)?;
            let summary = letter_ops::fetch_letter(&*store, &id)?.summary();
            println!("From: {}", summary.sender_name);
            println!("To: {}", summary.recipient_name);
            println!("Sent: {}", summary.created_at.to_rfc3339());
            if let Some(read_at) = summary.read_at {
                println!("First opened: {}", read_at.to_rfc3339());
            }
        }
        Commands::Read { link } => {
            let id = share::parse_share_link(link)?;
            let store = open_store(&cli)?;
            let letter = letter_ops::fetch_letter(&*store, &id)?;
            let password = password_reader(cli.passphrase_stdin, "Password: ").read_passphrase()?;
            let unlocked = letter_ops::unlock_letter(&*store, &letter, &password)?;
            println!("From: {}", unlocked.sender_name);
            println!("To: {}", unlocked.recipient_name);
            println!("Sent: {}", unlocked.created_at.to_rfc3339());
            println!("Subject: {}", unlocked.subject);
            println!();
            println!("{}", unlocked.body);
        }
        Commands::Link { id } => {
            let id = LetterId::parse(id.as_str())?;
            println!("{}", share::share_link(&cli.origin, &id));
        }
    }
    Ok(())
}

fn open_store(cli: &Cli) -> Result<Box<dyn LetterStore>> {
    if let Some(dir) = &cli.store_dir {
        return Ok(Box::new(FileStore::open(dir)?));
    }
    match (&cli.endpoint, &cli.access_token) {
        (Some(endpoint), Some(token)) => {
            let config = StoreConfig::new(endpoint.as_str(), token.as_str())?;
            Ok(Box::new(RestStore::new(config)?))
        }
        _ => Err(LetterboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::Config,
            "no letter store configured; pass --store-dir, or --endpoint and --access-token",
        )),
    }
}

fn password_reader(use_stdin: bool, prompt: &str) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::with_prompt(prompt))
    }
}

/// Read a new password and its confirmation. From stdin the password is
/// read once and doubles as its own confirmation.
fn read_new_password(use_stdin: bool) -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if use_stdin {
        let mut reader = CachingPassphraseReader::new(password_reader(true, ""));
        let password = reader.read_passphrase()?;
        let confirmation = reader.read_passphrase()?;
        Ok((password, confirmation))
    } else {
        let password = password_reader(false, "Password: ").read_passphrase()?;
        let confirmation = password_reader(false, "Confirm password: ").read_passphrase()?;
        Ok((password, confirmation))
    }
}
