//! oauth2-cli
//!
//! Obtain, show and remove an OAuth2 access token from the command line.
//!
//! ```bash
//! oauth2-cli --discovery-url https://idp/.well-known/openid-configuration --client-id my-cli login
//! oauth2-cli --client-id my-cli token
//! oauth2-cli --client-id my-cli logout
//! ```

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use oauth2_cli::{
    get_user_message, ConfigBuilder, ConfigurationError, DefaultDiscoveryClient,
    DeviceAuthorization, GrantType, InMemoryTokenStorage, OAuth2Client, OAuth2Error, OAuth2Result,
    ReqwestHttpTransport, TokenStorage,
};

#[derive(Parser)]
#[command(name = "oauth2-cli")]
#[command(version)]
#[command(about = "Log in to an OAuth2 provider and keep the access token")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider metadata URL (.well-known/openid-configuration)
    #[arg(long, env = "OAUTH2_DISCOVERY_URL", global = true)]
    discovery_url: Option<Url>,

    /// OAuth2 client ID; also names the keychain entry
    #[arg(long, env = "OAUTH2_CLIENT_ID", global = true)]
    client_id: Option<String>,

    /// Client secret for confidential clients
    #[arg(long, env = "OAUTH2_CLIENT_SECRET", hide_env_values = true, global = true)]
    client_secret: Option<String>,

    /// Device authorization endpoint, overrides discovery
    #[arg(long, env = "OAUTH2_DEVICE_AUTHORIZATION_ENDPOINT", global = true)]
    device_authorization_endpoint: Option<String>,

    /// Token endpoint, overrides discovery
    #[arg(long, env = "OAUTH2_TOKEN_ENDPOINT", global = true)]
    token_endpoint: Option<String>,

    /// Requested scope (repeatable)
    #[arg(long = "scope", env = "OAUTH2_SCOPES", value_delimiter = ' ', global = true)]
    scopes: Vec<String>,

    /// Audience parameter
    #[arg(long, env = "OAUTH2_AUDIENCE", global = true)]
    audience: Option<String>,

    /// Grant type: device_code or client_credentials
    #[arg(long, env = "OAUTH2_GRANT_TYPE", global = true)]
    grant_type: Option<GrantType>,

    /// Keep the token in memory instead of the OS keychain
    #[arg(long, global = true)]
    memory_storage: bool,

    /// Do not open the verification page in a browser
    #[arg(long, global = true)]
    no_browser: bool,

    /// Do not print the verification page as a QR code
    #[arg(long, global = true)]
    no_qr: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured grant and store the token
    Login,
    /// Print the stored token
    Token,
    /// Remove the stored token
    Logout,
}

impl Cli {
    fn init_logging(&self) {
        let default_level = match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    fn storage(&self) -> OAuth2Result<Arc<dyn TokenStorage>> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ConfigurationError::MissingField { field: "client_id" })?;

        if self.memory_storage {
            return Ok(Arc::new(InMemoryTokenStorage::new()));
        }
        keychain_storage(client_id)
    }

    async fn login(&self) -> OAuth2Result<()> {
        let transport = Arc::new(ReqwestHttpTransport::new()?);

        let mut builder = ConfigBuilder::new();
        if let Some(url) = &self.discovery_url {
            let discovery = DefaultDiscoveryClient::new(Arc::clone(&transport));
            builder = builder.discover(&discovery, url).await;
        }
        if let Some(client_id) = &self.client_id {
            builder = builder.client_id(client_id);
        }
        if let Some(secret) = &self.client_secret {
            builder = builder.client_secret(secret);
        }
        if let Some(endpoint) = &self.device_authorization_endpoint {
            builder = builder.device_authorization_endpoint(endpoint);
        }
        if let Some(endpoint) = &self.token_endpoint {
            builder = builder.token_endpoint(endpoint);
        }
        if !self.scopes.is_empty() {
            builder = builder.scopes(self.scopes.iter().filter(|scope| !scope.is_empty()));
        }
        if let Some(audience) = &self.audience {
            builder = builder.audience(audience);
        }
        if let Some(grant_type) = self.grant_type {
            builder = builder.grant_type(grant_type);
        }
        let config = builder.storage(self.storage()?).build()?;

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let open_browser = !self.no_browser;
        let show_qr = !self.no_qr;
        let prompt = move |authorization: &DeviceAuthorization| {
            if show_qr {
                match render_qr(authorization.prompt_uri()) {
                    Some(qr) => eprintln!("{}", qr),
                    None => tracing::debug!("verification URI does not fit in a QR code"),
                }
            }
            eprintln!("To sign in, visit: {}", authorization.verification_uri);
            eprintln!("and enter the code: {}", authorization.user_code);
            if open_browser {
                if let Err(e) = webbrowser::open(authorization.prompt_uri()) {
                    tracing::warn!(error = %e, "could not open browser");
                }
            }
            eprintln!("Waiting for authorization...");
        };

        let client = OAuth2Client::with_transport(config, transport);
        let token = client.login(&prompt, &cancel).await?;

        match (token.valid_for(), token.expires_at(chrono::Utc::now())) {
            (Some(valid_for), Some(expires_at)) => eprintln!(
                "Logged in. Token valid for {} seconds (until {}).",
                valid_for.as_secs(),
                expires_at
            ),
            (Some(valid_for), None) => {
                eprintln!("Logged in. Token valid for {} seconds.", valid_for.as_secs())
            }
            _ => eprintln!("Logged in."),
        }
        Ok(())
    }

    async fn run(&self) -> OAuth2Result<()> {
        match self.command {
            Commands::Login => self.login().await,
            Commands::Token => {
                let token = self.storage()?.get().await?;
                println!("{}", token);
                Ok(())
            }
            Commands::Logout => {
                self.storage()?.delete().await?;
                eprintln!("Logged out.");
                Ok(())
            }
        }
    }
}

#[cfg(feature = "keyring")]
fn keychain_storage(client_id: &str) -> OAuth2Result<Arc<dyn TokenStorage>> {
    Ok(Arc::new(oauth2_cli::KeyringTokenStorage::new(client_id)?))
}

#[cfg(not(feature = "keyring"))]
fn keychain_storage(_client_id: &str) -> OAuth2Result<Arc<dyn TokenStorage>> {
    tracing::warn!("built without keychain support, token is kept in memory");
    Ok(Arc::new(InMemoryTokenStorage::new()))
}

/// Half-block terminal rendering of `uri`, light modules on a dark background.
fn render_qr(uri: &str) -> Option<String> {
    use qrcode::render::unicode::Dense1x2;

    let code = qrcode::QrCode::with_error_correction_level(uri, qrcode::EcLevel::L).ok()?;
    Some(
        code.render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .build(),
    )
}

fn report(error: &OAuth2Error) {
    eprintln!("Error: {}", get_user_message(error));
    eprintln!("  {}", error);
    tracing::debug!(code = error.error_code(), error = ?error, "command failed");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
