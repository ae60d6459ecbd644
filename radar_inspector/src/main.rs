use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use radar_core::{load_radar_config_from_env, RadarState};
use radar_runtime::{GeminiClient, GeminiConfig, TextGenerator};
use radar_schema::sample_items;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};

mod app;
mod editor;
mod ui;
mod worker;

use app::InspectorApp;
use worker::{Job, JobResult, Worker};

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Market context radar terminal editor", long_about = None)]
struct Cli {
    /// Chart title shown in the header and on exports.
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    subtitle: Option<String>,
    /// Spreadsheet (.csv, .xlsx, .xls, .ods) to import on startup.
    #[arg(long)]
    import: Option<PathBuf>,
    /// Radar configuration JSON. Falls back to RADAR_CONFIG_PATH, then the builtin.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Placement seed. Defaults to the configured seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Model used for AI insights.
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    api_base: Option<String>,
    /// Directory that receives PNG and PDF exports.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (config, metadata) = load_radar_config_from_env(cli.config.as_deref());
    match metadata.path() {
        Some(path) => info!("Radar config loaded from {}", path.display()),
        None => info!("Using builtin radar config"),
    }

    let seed = cli.seed.unwrap_or(config.seed);
    let mut state = RadarState::new(config, sample_items(), seed);
    if let Some(title) = cli.title.as_deref() {
        state.set_title(title);
    }
    if let Some(subtitle) = cli.subtitle.as_deref() {
        state.set_subtitle(subtitle);
    }

    let mut gemini = GeminiConfig::default();
    if let Some(model) = cli.model {
        gemini = gemini.with_model(model);
    }
    if let Some(base) = cli.api_base {
        gemini = gemini.with_base_url(base);
    }
    if gemini.api_key.is_empty() {
        warn!("No GEMINI_API_KEY or API_KEY set; AI insights will report an error");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(gemini)?);

    let (job_tx, mut job_rx) = unbounded_channel::<Job>();
    let (result_tx, result_rx) = unbounded_channel::<JobResult>();
    let worker = Worker::new(generator, cli.export_dir, result_tx);

    let initial_import = cli.import;
    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let app = InspectorApp::new(state, job_tx, result_rx, log_rx, initial_import)?;
        app.run()
    });

    // The UI thread owns the only job sender; the pump ends when it exits.
    while let Some(job) = job_rx.recv().await {
        worker.dispatch(job);
    }

    info!("Inspector requested shutdown");
    ui_handle
        .join()
        .map_err(|_| eyre!("inspector UI thread panicked"))?
}
