use std::process::ExitCode;

use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use tracing::{error, info};

use meetsync_zoom_connector::client::ZoomClient;
use meetsync_zoom_connector::config::ZoomConfig;
use meetsync_zoom_connector::sync::{self, ExportOptions, MeetingType};
use shared::sink::{DocumentSink, ElasticsearchSink, StreamSink};
use shared::{telemetry, CancelFlag, Error};

/// Exports one day of Zoom meeting metrics into the document index, or as
/// JSON lines on stdout.
#[derive(Debug, Parser)]
#[command(name = "meetsync-zoom-connector", version, about)]
struct Cli {
    /// Day to export, YYYY-MM-DD. Defaults to yesterday.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Which report variant to read.
    #[arg(long, value_enum, default_value_t = MeetingTypeArg::Completed)]
    meeting_type: MeetingTypeArg,

    /// Where the documents go.
    #[arg(long, value_enum, default_value_t = DestinationArg::Index)]
    destination: DestinationArg,

    /// Zoom API key; defaults to $ZOOM_KEY.
    #[arg(long)]
    key: Option<String>,

    /// Zoom API secret; defaults to $ZOOM_SECRET.
    #[arg(long)]
    secret: Option<String>,

    /// Document store URL; defaults to $ES_HOST.
    #[arg(long)]
    es_url: Option<String>,

    /// Log level used when $RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeetingTypeArg {
    Completed,
    Live,
}

impl From<MeetingTypeArg> for MeetingType {
    fn from(arg: MeetingTypeArg) -> Self {
        match arg {
            MeetingTypeArg::Completed => MeetingType::Completed,
            MeetingTypeArg::Live => MeetingType::Live,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DestinationArg {
    /// Upsert into the document store.
    Index,
    /// JSON lines on stdout.
    Stdout,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::init(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Interrupted) => {
            info!("Interrupted, stopping; documents already written are kept");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = ZoomConfig::from_env(cli.key, cli.secret)?;
    let date = cli.date.unwrap_or_else(yesterday);
    let options = ExportOptions {
        date,
        meeting_type: cli.meeting_type.into(),
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
                cancel.cancel();
            }
        });
    }

    let client = ZoomClient::new(&config);

    let mut sink: Box<dyn DocumentSink> = match cli.destination {
        DestinationArg::Index => {
            let url = cli
                .es_url
                .or_else(|| std::env::var("ES_HOST").ok())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(
                        "missing document store URL (set ES_HOST or pass --es-url)".to_string(),
                    )
                })?;
            Box::new(ElasticsearchSink::connect(&url).await?)
        }
        DestinationArg::Stdout => Box::new(StreamSink::stdout()),
    };

    info!("Starting export for {}", options.date);
    let stats = sync::run(&client, &config, options, sink.as_mut(), &cancel).await?;
    info!(
        "Export complete: {} meetings, {} sessions",
        stats.meetings, stats.sessions
    );
    Ok(())
}

fn yesterday() -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap_or_else(|| Utc::now().date_naive())
}
