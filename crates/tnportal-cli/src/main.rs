mod display;
mod flow;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tnportal_client::ApiClient;
use tnportal_core::config::{BASE_URL_VAR, DEBUG_VAR, TIMEOUT_VAR};
use tnportal_core::{PortalConfig, Route, Session, login};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use flow::{DateEdits, ReviewStep, UploadStep};

#[derive(Parser)]
#[command(name = "tnportal", version, about = "Submit an absence certificate to the TN portal")]
struct Cli {
    /// API base URL.
    #[arg(long, env = BASE_URL_VAR, global = true)]
    base_url: Option<String>,

    /// Request timeout in milliseconds, covering the whole upload stream.
    #[arg(long, env = TIMEOUT_VAR, global = true)]
    timeout_ms: Option<String>,

    /// Log requests, responses and stream events.
    #[arg(
        long,
        env = DEBUG_VAR,
        global = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    debug: bool,

    #[arg(long, env = "TNPORTAL_USERNAME", global = true)]
    username: Option<String>,

    #[arg(long, env = "TNPORTAL_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the resolved API configuration.
    Config,
    /// Upload a document and print the review state.
    Upload { file: PathBuf },
    /// Review a previous upload, optionally correct the dates, and confirm.
    Review {
        /// Page state printed by `upload`.
        #[arg(long)]
        state: String,
        #[command(flatten)]
        edits: DateEdits,
    },
    /// Upload, review and confirm in one go.
    Submit {
        file: PathBuf,
        #[command(flatten)]
        edits: DateEdits,
    },
}

impl Cli {
    fn config(&self) -> anyhow::Result<PortalConfig> {
        let config = PortalConfig::from_lookup(|name| match name {
            BASE_URL_VAR => self.base_url.clone(),
            TIMEOUT_VAR => self.timeout_ms.clone(),
            DEBUG_VAR => self.debug.then(|| "true".to_string()),
            _ => None,
        })?;
        Ok(config)
    }

    fn sign_in(&self) -> anyhow::Result<Session> {
        let mut session = Session::default();
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            anyhow::bail!(
                "sign-in required: pass --username and --password \
                 (or set TNPORTAL_USERNAME / TNPORTAL_PASSWORD)"
            );
        };
        login::sign_in(&mut session, username, password)?;
        Ok(session)
    }
}

fn redirect_error(redirect: tnportal_core::Redirect) -> anyhow::Error {
    anyhow::anyhow!(
        "{} requires sign-in (redirected to {})",
        redirect.from.path(),
        redirect.to.path()
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "tnportal=debug,tnportal_client=debug,tnportal_core=debug"
    } else {
        "tnportal=warn,tnportal_client=warn,tnportal_core=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    tracing::info!("tnportal v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.config()?;

    match &cli.command {
        Command::Config => {
            println!("  {:<26} {}", "API base URL", config.api_base_url);
            println!("  {:<26} {}ms", "API timeout", config.api_timeout.as_millis());
            println!("  {:<26} {}", "API debug", config.debug);
        }
        Command::Upload { file } => {
            let session = cli.sign_in()?;
            let client = ApiClient::new(&config)?;
            let step = session
                .enter(Route::Upload, || UploadStep::new(&client))
                .map_err(redirect_error)?;
            let state = step.run(file).await?;
            println!("{state}");
        }
        Command::Review { state, edits } => {
            let session = cli.sign_in()?;
            let client = ApiClient::new(&config)?;
            let confirmed = review_and_confirm(&session, &client, state, edits).await?;
            let page = session
                .enter(Route::UploadConfirmation, || confirmed)
                .map_err(redirect_error)?;
            flow::show_confirmation(&page)?;
        }
        Command::Submit { file, edits } => {
            let session = cli.sign_in()?;
            let client = ApiClient::new(&config)?;
            let review_state = session
                .enter(Route::Upload, || UploadStep::new(&client))
                .map_err(redirect_error)?
                .run(file)
                .await
                .with_context(|| format!("uploading {}", file.display()))?;
            let confirmed = review_and_confirm(&session, &client, &review_state, edits).await?;
            let page = session
                .enter(Route::UploadConfirmation, || confirmed)
                .map_err(redirect_error)?;
            flow::show_confirmation(&page)?;
        }
    }

    Ok(())
}

async fn review_and_confirm(
    session: &Session,
    client: &ApiClient,
    state: &str,
    edits: &DateEdits,
) -> anyhow::Result<String> {
    let mut step = session
        .enter(Route::UploadReview, || ReviewStep::new(client, state))
        .map_err(redirect_error)?;
    step.apply(edits)?;
    step.show();
    step.confirm().await
}
