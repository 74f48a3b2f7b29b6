//! Push Tester CLI - send one test web push notification and report the result.
//!
//! This is the main binary entry point. See the `push_tester` library
//! for the core functionality.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use push_tester::commands::{self, config::SaveOptions, send::SendOptions};
use push_tester::Config;

/// mimalloc as the global allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "push-tester")]
#[command(version)]
#[command(about = "Send a test web push notification with a VAPID identity")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one test notification
    Send(SendArgs),
    /// Inspect or change the saved identity and subscription
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// VAPID key utilities
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Push subscription utilities
    Subscription {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
}

#[derive(Args)]
struct SubscriptionFields {
    /// Subscription JSON, `@file` or `-` for stdin
    #[arg(long, conflicts_with_all = ["endpoint", "p256dh", "auth"])]
    subscription: Option<String>,
    /// Push service endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Subscription p256dh key
    #[arg(long)]
    p256dh: Option<String>,
    /// Subscription auth secret
    #[arg(long)]
    auth: Option<String>,
}

#[derive(Args)]
struct VapidFields {
    /// VAPID public key (base64url)
    #[arg(long)]
    public_key: Option<String>,
    /// VAPID private key (base64url)
    #[arg(long)]
    private_key: Option<String>,
    /// Contact email or https URL
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args)]
struct SendArgs {
    #[command(flatten)]
    subscription: SubscriptionFields,
    #[command(flatten)]
    vapid: VapidFields,
    /// Notification title
    #[arg(long)]
    title: Option<String>,
    /// Notification body
    #[arg(long)]
    body: Option<String>,
    /// Icon URL
    #[arg(long)]
    icon: Option<String>,
    /// Badge URL
    #[arg(long)]
    badge: Option<String>,
    /// Notification tag
    #[arg(long)]
    tag: Option<String>,
    /// Custom data (JSON object, `@file` or `-`)
    #[arg(long)]
    data: Option<String>,
    /// Don't save the identity and subscription
    #[arg(long)]
    no_save: bool,
    /// Request timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,
    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the saved configuration
    Show {
        /// Print the private key unmasked
        #[arg(long)]
        reveal: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the saved configuration
    Save {
        #[command(flatten)]
        vapid: VapidFields,
        #[command(flatten)]
        subscription: SubscriptionFields,
    },
    /// Remove the saved configuration
    Clear,
}

#[derive(Subcommand)]
enum KeysAction {
    /// Generate a VAPID keypair
    Generate {
        /// Save the pair as the current identity
        #[arg(long)]
        save: bool,
        /// Subject to save with the pair
        #[arg(long, requires = "save")]
        subject: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SubscriptionAction {
    /// Parse a browser PushSubscription JSON
    Parse {
        /// Subscription JSON, `@file` or `-` for stdin
        input: String,
        /// Save as the current subscription
        #[arg(long)]
        save: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl From<SendArgs> for SendOptions {
    fn from(args: SendArgs) -> Self {
        Self {
            subscription: args.subscription.subscription,
            endpoint: args.subscription.endpoint,
            p256dh: args.subscription.p256dh,
            auth: args.subscription.auth,
            public_key: args.vapid.public_key,
            private_key: args.vapid.private_key,
            subject: args.vapid.subject,
            title: args.title,
            body: args.body,
            icon: args.icon,
            badge: args.badge,
            tag: args.tag,
            data: args.data,
            save: !args.no_save,
            timeout_secs: args.timeout,
            json: args.json,
        }
    }
}

fn init_logging() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);

    // Stdout carries command output; logs go to stderr or PUSH_TESTER_LOG_FILE.
    if let Ok(path) = std::env::var("PUSH_TESTER_LOG_FILE") {
        let log_file = std::fs::File::create(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create log file at {path}: {e}"))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .format_timestamp_secs();
    } else {
        builder.target(env_logger::Target::Stderr);
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {:?}", panic_info);
        default_hook(panic_info);
    }));

    let cli = Cli::parse();
    let config = Config::load()?;

    let succeeded = match cli.command {
        Commands::Send(args) => commands::send::run(&config, args.into()).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show { reveal, json } => commands::config::show(&config, reveal, json)?,
            ConfigAction::Save {
                vapid,
                subscription,
            } => commands::config::save(
                &config,
                SaveOptions {
                    subscription: subscription.subscription,
                    endpoint: subscription.endpoint,
                    p256dh: subscription.p256dh,
                    auth: subscription.auth,
                    public_key: vapid.public_key,
                    private_key: vapid.private_key,
                    subject: vapid.subject,
                },
            )?,
            ConfigAction::Clear => commands::config::clear(&config)?,
        },
        Commands::Keys { action } => match action {
            KeysAction::Generate {
                save,
                subject,
                json,
            } => commands::keys::generate(&config, save, subject, json)?,
        },
        Commands::Subscription { action } => match action {
            SubscriptionAction::Parse { input, save, json } => {
                commands::subscription::run(&config, &input, save, json)?
            }
        },
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_args_map_to_options() {
        let cli = Cli::parse_from([
            "push-tester",
            "send",
            "--endpoint",
            "https://e",
            "--subject",
            "a@b.com",
            "--no-save",
            "--timeout",
            "5",
        ]);
        let Commands::Send(args) = cli.command else {
            panic!("expected send");
        };
        let options = SendOptions::from(args);

        assert_eq!(options.endpoint.as_deref(), Some("https://e"));
        assert_eq!(options.subject.as_deref(), Some("a@b.com"));
        assert!(!options.save);
        assert_eq!(options.timeout_secs, Some(5));
    }

    #[test]
    fn test_subscription_conflicts_with_fields() {
        let result = Cli::try_parse_from([
            "push-tester",
            "send",
            "--subscription",
            "{}",
            "--endpoint",
            "https://e",
        ]);
        assert!(result.is_err());
    }
}
