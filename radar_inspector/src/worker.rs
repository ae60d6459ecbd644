use std::path::PathBuf;
use std::sync::Arc;

use radar_core::{export_to_dir, ExportError, ExportKind, ExportTicket, InsightTicket};
use radar_runtime::{get_insight, import_workbook, LoadError, TextGenerator};
use radar_schema::MarketItem;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Background work requested by the UI thread.
#[derive(Debug)]
pub enum Job {
    Import { path: PathBuf },
    Insight { ticket: InsightTicket, text: String },
    Export { ticket: ExportTicket },
}

/// Outcome of a [`Job`], applied back onto the radar state by the UI thread.
#[derive(Debug)]
pub enum JobResult {
    Imported {
        path: PathBuf,
        result: Result<Vec<MarketItem>, LoadError>,
    },
    Insight {
        ticket: InsightTicket,
        text: String,
    },
    Exported {
        kind: ExportKind,
        result: Result<PathBuf, ExportError>,
    },
}

/// Runs jobs on the tokio runtime. File and raster work goes to the blocking pool.
pub struct Worker {
    generator: Arc<dyn TextGenerator>,
    export_dir: PathBuf,
    results: UnboundedSender<JobResult>,
}

impl Worker {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        export_dir: PathBuf,
        results: UnboundedSender<JobResult>,
    ) -> Self {
        Self {
            generator,
            export_dir,
            results,
        }
    }

    pub fn dispatch(&self, job: Job) {
        let results = self.results.clone();
        match job {
            Job::Import { path } => {
                debug!(path = %path.display(), "job.import");
                tokio::spawn(async move {
                    let read_path = path.clone();
                    let result = tokio::task::spawn_blocking(move || import_workbook(&read_path))
                        .await
                        .unwrap_or_else(|err| Err(LoadError::Interrupted(err.to_string())));
                    send(&results, JobResult::Imported { path, result });
                });
            }
            Job::Insight { ticket, text } => {
                let generator = Arc::clone(&self.generator);
                tokio::spawn(async move {
                    let text = get_insight(generator.as_ref(), &text).await;
                    send(&results, JobResult::Insight { ticket, text });
                });
            }
            Job::Export { ticket } => {
                let dir = self.export_dir.clone();
                let kind = ticket.kind;
                debug!(kind = %kind, "job.export");
                tokio::spawn(async move {
                    let result = tokio::task::spawn_blocking(move || {
                        export_to_dir(&ticket.snapshot, ticket.kind, &dir)
                    })
                    .await
                    .unwrap_or_else(|err| Err(ExportError::Interrupted(err.to_string())));
                    send(&results, JobResult::Exported { kind, result });
                });
            }
        }
    }
}

fn send(results: &UnboundedSender<JobResult>, result: JobResult) {
    if results.send(result).is_err() {
        warn!("Inspector closed before a job finished");
    }
}
