use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use radar_core::{ExportKind, RadarState};
use radar_runtime::{parse_command_line, InspectorCommand, LoadError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::editor::{EditOutcome, EditTarget, LineEditor};
use crate::ui::{cell_to_chart, draw_ui, hit_slop, HitTarget, UiState, CHART_SIDE};
use crate::worker::{Job, JobResult};

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    state: RadarState,
    jobs: UnboundedSender<Job>,
    results: UnboundedReceiver<JobResult>,
    log_receiver: Receiver<String>,
    initial_import: Option<PathBuf>,
}

impl InspectorApp {
    pub fn new(
        state: RadarState,
        jobs: UnboundedSender<Job>,
        results: UnboundedReceiver<JobResult>,
        log_receiver: Receiver<String>,
        initial_import: Option<PathBuf>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::default(),
            state,
            jobs,
            results,
            log_receiver,
            initial_import,
        })
    }

    pub fn run(mut self) -> Result<()> {
        if let Some(path) = self.initial_import.take() {
            self.start_import(path);
        }
        let mut last_draw = Instant::now() - Duration::from_secs(1);
        let mut dirty = true;

        loop {
            while let Ok(result) = self.results.try_recv() {
                self.apply_result(result);
                dirty = true;
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
                dirty = true;
            }

            if dirty && last_draw.elapsed() >= Duration::from_millis(50) {
                self.terminal
                    .draw(|frame| draw_ui(frame, &mut self.ui_state, &self.state))?;
                last_draw = Instant::now();
                dirty = false;
            }

            if event::poll(Duration::from_millis(50))? {
                let keep_running = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        true
                    }
                    _ => true,
                };
                dirty = true;
                if !keep_running {
                    break;
                }
            }
        }

        crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Returns `false` when the inspector should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Some(editor) = self.ui_state.editor.as_mut() {
            let target = editor.target();
            match editor.handle_key(key) {
                EditOutcome::Pending => {}
                EditOutcome::Cancel => self.ui_state.editor = None,
                EditOutcome::Commit(text) => {
                    self.ui_state.editor = None;
                    self.commit_edit(target, &text);
                }
            }
            return true;
        }

        if self.state.insight().is_some() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
            ) {
                self.state.close_insight();
            }
            return true;
        }

        if self.ui_state.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.ui_state.show_help = false;
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char(':') | KeyCode::Char('/') => self.open_editor(EditTarget::Command, ""),
            KeyCode::Char('e') => {
                let title = self.state.title().to_string();
                self.open_editor(EditTarget::Title, &title);
            }
            KeyCode::Char('s') => {
                let subtitle = self.state.subtitle().to_string();
                self.open_editor(EditTarget::Subtitle, &subtitle);
            }
            KeyCode::Char('i') => self.open_editor(EditTarget::Command, "import "),
            KeyCode::Char('p') => self.start_export(ExportKind::Png),
            KeyCode::Char('d') => self.start_export(ExportKind::Pdf),
            KeyCode::Char('c') => {
                let index = self.state.save_checkpoint("");
                info!(index, "Checkpoint saved");
            }
            KeyCode::Char('x') => self.state.dismiss_error(),
            KeyCode::Char('?') => self.ui_state.show_help = true,
            _ => {}
        }
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let hit = self.bubble_at(column, row);
                self.state
                    .track_pointer(hit, f64::from(column), f64::from(row));
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.state.insight().is_some() {
                    self.state.close_insight();
                    return;
                }
                if let Some(id) = self.bubble_at(column, row) {
                    self.request_insight(id);
                    return;
                }
                match self.ui_state.target_at(column, row) {
                    Some(HitTarget::Item(id)) => self.request_insight(id),
                    Some(HitTarget::Title) => {
                        let title = self.state.title().to_string();
                        self.open_editor(EditTarget::Title, &title);
                    }
                    Some(HitTarget::Subtitle) => {
                        let subtitle = self.state.subtitle().to_string();
                        self.open_editor(EditTarget::Subtitle, &subtitle);
                    }
                    Some(HitTarget::Restore(index)) => self.revert(index),
                    None => {}
                }
            }
            _ => {}
        }
    }

    fn bubble_at(&self, column: u16, row: u16) -> Option<i64> {
        let area = self.ui_state.chart_area()?;
        let (x, y) = cell_to_chart(area, column, row)?;
        self.state
            .scene(CHART_SIDE)
            .hit_test(x, y, hit_slop(area))
            .map(|bubble| bubble.item_id)
    }

    fn open_editor(&mut self, target: EditTarget, initial: &str) {
        self.state.leave_bubble();
        self.ui_state.editor = Some(LineEditor::new(target, initial));
    }

    fn commit_edit(&mut self, target: EditTarget, text: &str) {
        match target {
            EditTarget::Title => {
                self.state.set_title(text);
            }
            EditTarget::Subtitle => {
                self.state.set_subtitle(text);
            }
            EditTarget::Command => self.run_command(text),
        }
    }

    fn run_command(&mut self, line: &str) {
        let command = match parse_command_line(line) {
            Ok(command) => command,
            Err(err) => {
                warn!("Command rejected: {}", err);
                self.ui_state.set_notice(format!("Command rejected: {err}"));
                return;
            }
        };
        debug!(?command, "command.parsed");
        match command {
            InspectorCommand::Import { path } => self.start_import(path),
            InspectorCommand::Export { kind } => self.start_export(kind),
            InspectorCommand::Title(title) => {
                self.state.set_title(&title);
            }
            InspectorCommand::Subtitle(subtitle) => {
                self.state.set_subtitle(&subtitle);
            }
            InspectorCommand::Checkpoint(name) => {
                let index = self.state.save_checkpoint(&name);
                info!(index, "Checkpoint saved");
            }
            InspectorCommand::Revert { index } => self.revert(index),
            InspectorCommand::Insight { id } => self.request_insight(id),
            InspectorCommand::CloseInsight => self.state.close_insight(),
            InspectorCommand::Dismiss => self.state.dismiss_error(),
            InspectorCommand::Help => self.ui_state.show_help = true,
        }
    }

    fn start_import(&mut self, path: PathBuf) {
        self.state.begin_import();
        info!(path = %path.display(), "Importing");
        self.dispatch(Job::Import { path });
    }

    fn start_export(&mut self, kind: ExportKind) {
        match self.state.begin_export(kind) {
            Some(ticket) => self.dispatch(Job::Export { ticket }),
            None => self
                .ui_state
                .set_notice("An export is already running; wait for it to finish"),
        }
    }

    fn request_insight(&mut self, id: i64) {
        let Some(ticket) = self.state.select_item(id) else {
            self.ui_state.set_notice(format!("No item with id {id}"));
            return;
        };
        let text = self
            .state
            .insight()
            .map(|view| view.item.text.clone())
            .unwrap_or_default();
        self.dispatch(Job::Insight { ticket, text });
    }

    fn revert(&mut self, index: usize) {
        match self.state.revert_to(index) {
            Ok(true) => self
                .ui_state
                .set_notice(format!("Restored checkpoint {index}")),
            Ok(false) => self
                .ui_state
                .set_notice(format!("Checkpoint {index} is already active")),
            Err(err) => self.ui_state.set_notice(err.to_string()),
        }
    }

    fn dispatch(&mut self, job: Job) {
        if let Err(err) = self.jobs.send(job) {
            warn!("Worker unavailable: {}", err);
            // Release whatever the job had claimed so the UI does not stay busy.
            match err.0 {
                Job::Import { .. } => self.state.fail_import("Failed to read the file."),
                Job::Export { ticket } => self.state.finish_export(
                    ticket.kind,
                    Err(radar_core::ExportError::Interrupted(
                        "worker unavailable".to_string(),
                    )),
                ),
                Job::Insight { ticket, .. } => {
                    self.state
                        .resolve_insight(ticket, "AI insight is unavailable.".to_string());
                }
            }
        }
    }

    fn apply_result(&mut self, result: JobResult) {
        match result {
            JobResult::Imported { path, result } => match result {
                Ok(items) => {
                    self.state.complete_import(&path, Ok(items));
                    self.ui_state
                        .set_notice(format!("Imported {}", path.display()));
                }
                Err(LoadError::Rows(err)) => {
                    self.state.complete_import(&path, Err(err));
                }
                Err(err) => self.state.fail_import(err.to_string()),
            },
            JobResult::Insight { ticket, text } => {
                self.state.resolve_insight(ticket, text);
            }
            JobResult::Exported { kind, result } => {
                if let Ok(path) = &result {
                    self.ui_state
                        .set_notice(format!("Saved {kind} to {}", path.display()));
                }
                self.state.finish_export(kind, result);
            }
        }
    }
}
