use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use hello_client::config::{ClientConfig, ConfigError};
use hello_client::csrf::RequestConfig;
use hello_client::error::{ErrorCode, describe};
use hello_client::form::{FormRecord, FormSubmitter, FormTarget, FormVariant, ImageUpload, SubmitError, view};
use hello_client::requests::poller::DEFAULT_TITLE;
use hello_client::requests::{DisplayMode, RequestPoller};
use reqwest::Method;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error("cannot read image {path}: {source}")]
    ReadImage { path: PathBuf, source: std::io::Error },
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Submit(e) => e.error_code(),
            Self::ReadImage { .. } => "E_READ_IMAGE",
            Self::InvalidMethod(_) => "E_INVALID_METHOD",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Config(e) => e.retryable(),
            Self::Submit(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hello-client", about = "Contact form and request-log client")]
struct Cli {
    /// Overrides `HELLO_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `HELLO_CSRF_TOKEN` / `HELLO_COOKIE`.
    #[arg(long)]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and submit the person form.
    Submit(SubmitArgs),
    /// Poll the request log and print the table whenever it changes.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long, default_value = "/edit/")]
    action: String,

    #[arg(long, default_value = "POST")]
    method: String,

    /// Use the edit-form flow (current image widget, clear checkbox).
    #[arg(long, default_value_t = false)]
    edit: bool,

    #[arg(long)]
    name: String,

    #[arg(long)]
    surname: String,

    #[arg(long, help = "YYYY-MM-DD")]
    date_of_birth: String,

    #[arg(long)]
    email: String,

    #[arg(long, default_value = "")]
    bio: String,

    #[arg(long)]
    jabber: Option<String>,

    #[arg(long, default_value = "")]
    skype_id: String,

    #[arg(long, default_value = "")]
    other: String,

    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    clear_image: bool,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Render `Up`/`Down` labels instead of adjust buttons.
    #[arg(long, default_value_t = false)]
    read_only: bool,

    /// Report the viewer as focused (`viewed=yes`).
    #[arg(long, default_value_t = false)]
    focused: bool,

    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Overrides `HELLO_POLL_INTERVAL_MS`.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Refresh once, print and exit.
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        error!(code = e.error_code(), "{}", describe(e));
    }
    result
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if cli.csrf_token.is_some() {
        config.csrf_token = cli.csrf_token;
    }
    let http = config.http_client()?;

    match cli.command {
        Command::Submit(args) => run_submit(&config, http, args).await,
        Command::Watch(args) => run_watch(&config, http, args).await,
    }
}

async fn run_submit(config: &ClientConfig, http: reqwest::Client, args: SubmitArgs) -> Result<(), CliError> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(args.method.clone()))?;
    let image = match &args.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };
    let record = FormRecord {
        name: args.name,
        surname: args.surname,
        date_of_birth: args.date_of_birth,
        email: args.email,
        bio: args.bio,
        jabber: args.jabber,
        skype_id: args.skype_id,
        other: args.other,
        image,
        clear_image: args.clear_image,
    };

    let request = RequestConfig::bootstrap(&http, config).await?;
    let variant = if args.edit { FormVariant::Edit } else { FormVariant::Create };
    let submitter = FormSubmitter::new(
        http,
        request,
        FormTarget { action: args.action, method },
        variant,
        config.banner_hide_delay,
    );

    match submitter.submit(&record).await {
        Ok(saved) => {
            let preview = view::lock(&submitter.view()).image_preview.clone();
            println!("saved");
            println!("image: {}", preview.as_deref().unwrap_or("(none)"));
            info!(image = %saved.image, "person saved");
            Ok(())
        }
        Err(e) => {
            if let Some(errors) = e.field_errors() {
                for (field, messages) in errors {
                    for message in messages {
                        eprintln!("{field}: {message}");
                    }
                }
            }
            Err(e.into())
        }
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadImage { path: path.to_path_buf(), source })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
    Ok(ImageUpload::new(file_name, content_type, bytes))
}

async fn run_watch(config: &ClientConfig, http: reqwest::Client, args: WatchArgs) -> Result<(), CliError> {
    let mode = if args.read_only { DisplayMode::ReadOnly } else { DisplayMode::Interactive };
    let poller = Arc::new(RequestPoller::new(http, config, mode, &args.title)?);
    poller.set_focused(args.focused);

    if args.once {
        poller.refresh().await;
        print!("{}", poller.snapshot());
        return Ok(());
    }

    let interval = args.interval_ms.map_or(config.poll_interval, Duration::from_millis);
    let mut rx = poller.subscribe();
    let handle = poller.clone().start(interval);
    let mut last_printed = None;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if last_printed.as_ref() != Some(&snapshot) {
                    print!("{snapshot}");
                    last_printed = Some(snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(())
}
