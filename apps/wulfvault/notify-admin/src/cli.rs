use clap::{Args, Parser, Subcommand};
use domain_notifications::{MailgunRegion, ProviderKind};

#[derive(Parser, Debug)]
#[command(name = "wulfvault-notify")]
#[command(about = "Manage WulfVault email delivery providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Store a provider configuration and make it the active one
    Configure(ConfigureArgs),

    /// Show the active provider configuration. Secrets are never printed.
    Show,

    /// Send a diagnostic email through the active provider
    SendTest {
        /// Recipient address
        #[arg(long)]
        to: String,
    },

    /// Encrypt a value with the email master key and print the ciphertext
    EncryptSecret {
        /// Plaintext to encrypt. Prefer the environment variable over argv.
        #[arg(env = "SECRET_VALUE", hide_env_values = true)]
        value: String,
    },
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Provider: smtp, mailgun, sendgrid or brevo
    pub provider: ProviderKind,

    /// Sender address
    #[arg(long)]
    pub from_email: String,

    /// Sender display name. Defaults to the product name at send time.
    #[arg(long, default_value = "")]
    pub from_name: String,

    /// API key for Mailgun, SendGrid or Brevo
    #[arg(long, env = "EMAIL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "")]
    pub smtp_host: String,

    #[arg(long, default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, default_value = "")]
    pub smtp_username: String,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Talk plain SMTP without TLS. Only for relays on a trusted network.
    #[arg(long)]
    pub no_tls: bool,

    #[arg(long, default_value = "")]
    pub mailgun_domain: String,

    /// Mailgun region: us or eu
    #[arg(long, default_value = "us")]
    pub mailgun_region: MailgunRegion,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        temp_env::with_vars_unset(["EMAIL_API_KEY", "SMTP_PASSWORD", "SECRET_VALUE"], || {
            Cli::try_parse_from(args).unwrap()
        })
    }

    #[test]
    fn test_configure_smtp() {
        let cli = parse(&[
            "wulfvault-notify",
            "configure",
            "smtp",
            "--from-email",
            "noreply@vault.example.com",
            "--smtp-host",
            "mail.example.com",
            "--smtp-port",
            "465",
            "--smtp-password",
            "hunter2",
        ]);

        match cli.command {
            Commands::Configure(args) => {
                assert_eq!(args.provider, ProviderKind::Smtp);
                assert_eq!(args.smtp_port, 465);
                assert_eq!(args.smtp_password.as_deref(), Some("hunter2"));
                assert!(!args.no_tls);
                assert_eq!(args.mailgun_region, MailgunRegion::Us);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_configure_mailgun_region_is_case_insensitive() {
        let cli = parse(&[
            "wulfvault-notify",
            "configure",
            "Mailgun",
            "--from-email",
            "noreply@vault.example.com",
            "--mailgun-domain",
            "mg.example.com",
            "--mailgun-region",
            "EU",
        ]);

        match cli.command {
            Commands::Configure(args) => {
                assert_eq!(args.provider, ProviderKind::Mailgun);
                assert_eq!(args.mailgun_region, MailgunRegion::Eu);
                assert!(args.api_key.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = temp_env::with_vars_unset(["EMAIL_API_KEY", "SMTP_PASSWORD"], || {
            Cli::try_parse_from(["wulfvault-notify", "configure", "postmark", "--from-email", "a@b.se"])
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_send_test_requires_recipient() {
        assert!(Cli::try_parse_from(["wulfvault-notify", "send-test"]).is_err());

        let cli = parse(&["wulfvault-notify", "send-test", "--to", "admin@example.com"]);
        assert!(matches!(cli.command, Commands::SendTest { to } if to == "admin@example.com"));
    }

    #[test]
    fn test_encrypt_secret_reads_env() {
        let cli = temp_env::with_var("SECRET_VALUE", Some("SG.from-env"), || {
            Cli::try_parse_from(["wulfvault-notify", "encrypt-secret"]).unwrap()
        });
        assert!(matches!(cli.command, Commands::EncryptSecret { value } if value == "SG.from-env"));
    }
}
