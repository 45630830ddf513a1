//! yopass CLI - share secrets through a Yopass service
//!
//! Secrets are encrypted locally; the service only ever sees the envelope.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use yopass_client::passphrase::{
    DEFAULT_PASSPHRASE_LENGTH, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
    generate_passphrase,
};
use yopass_client::{
    Client, DEFAULT_BASE_URL, ErrorCategory, Expiration, Result, Timeout, YopassError, file_ops,
    parse_secret_url,
};

#[derive(Parser)]
#[command(name = "yopass")]
#[command(version)]
#[command(about = "Share secrets through Yopass, encrypted on this machine.", long_about = None)]
struct Cli {
    /// Base URL of the Yopass API
    #[arg(long, global = true, env = "YOPASS_API", default_value = DEFAULT_BASE_URL)]
    api: String,

    /// Request timeout in seconds, or connect,read pair (e.g. 3,10)
    #[arg(long, global = true, env = "YOPASS_TIMEOUT", value_parser = parse_timeout)]
    timeout: Option<Timeout>,

    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a message and store it, printing the share link
    #[command(alias = "s")]
    Store {
        /// File holding the message; stdin when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// How long the service keeps the secret: 1h, 1d or 1w
        #[arg(short, long, default_value = "1h")]
        expiration: Expiration,

        /// Allow the secret to be read more than once
        #[arg(long)]
        reusable: bool,

        /// Generate a passphrase and include it in the printed link
        #[arg(short, long)]
        generate_passphrase: bool,

        /// Length of the generated passphrase
        #[arg(long, default_value_t = DEFAULT_PASSPHRASE_LENGTH, requires = "generate_passphrase")]
        length: usize,
    },

    /// Fetch and decrypt a secret
    #[command(alias = "f")]
    Fetch {
        /// Share link, or bare secret identifier
        secret: String,

        /// File to write the secret to; stdout when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the share link for a stored secret
    Url {
        /// Secret identifier returned by store
        id: String,
    },

    /// Print a random passphrase
    Passphrase {
        /// Number of characters
        #[arg(long, default_value_t = DEFAULT_PASSPHRASE_LENGTH)]
        length: usize,
    },
}

fn parse_timeout(value: &str) -> std::result::Result<Timeout, String> {
    value.parse::<Timeout>().map_err(|e| e.to_string())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e.chain());
        process::exit(1);
    }
}

fn init_tracing() {
    // Quiet by default; RUST_LOG=yopass_client=debug shows request flow.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn build_client(api: &str, timeout: Option<Timeout>) -> Result<Client> {
    let client = Client::new(api)?;
    match timeout {
        Some(timeout) => client.with_timeout(timeout),
        None => Ok(client),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Store {
            input,
            expiration,
            reusable,
            generate_passphrase: generate,
            length,
        } => {
            if input.is_none() && cli.passphrase_stdin && !generate {
                return Err(YopassError::new(
                    ErrorCategory::User,
                    "--input is required when the passphrase is read from stdin",
                ));
            }
            let client = build_client(&cli.api, cli.timeout)?;
            let message = file_ops::read_message(input.as_deref())?;
            let passphrase = if generate {
                Zeroizing::new(generate_passphrase(length))
            } else {
                passphrase_reader(cli.passphrase_stdin).read_passphrase()?
            };

            let id = client.try_store(&message, &passphrase, expiration, !reusable)?;
            if id.is_empty() {
                return Err(YopassError::new(
                    ErrorCategory::Remote,
                    "Yopass did not return a secret identifier",
                ));
            }
            // A passphrase the user chose is theirs to hand over separately.
            let shown = if generate { passphrase.as_str() } else { "" };
            println!("{}", client.secret_url(&id, shown));
        }
        Commands::Fetch { secret, output } => {
            let client = build_client(&cli.api, cli.timeout)?;
            let (id, password) = match parse_secret_url(&secret) {
                Ok(shared) => (shared.id, shared.password.map(Zeroizing::new)),
                // Anything that looks like a link must be a share link.
                Err(e) if secret.contains("://") => return Err(e),
                Err(_) => (secret, None),
            };
            let password = match password {
                Some(password) => password,
                None => passphrase_reader(cli.passphrase_stdin).read_passphrase()?,
            };

            let plaintext = client.try_fetch(&id, &password)?;
            file_ops::write_secret(output.as_deref(), plaintext.as_bytes())?;
        }
        Commands::Url { id } => {
            let client = build_client(&cli.api, cli.timeout)?;
            let password = passphrase_reader(cli.passphrase_stdin).read_passphrase()?;
            println!("{}", client.secret_url(&id, &password));
        }
        Commands::Passphrase { length } => {
            println!("{}", generate_passphrase(length));
        }
    }

    Ok(())
}

fn passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
