//! Next Action BI Main Application
//! Main window with the data panel and the recommendation board.

use crate::catalog::ActionCatalog;
use crate::data::{self, LoadError};
use crate::gui::{ActionBoard, BoardAction, DataPanel, DataPanelAction};
use crate::notify::{self, Notifier, SmtpNotifier};
use crate::session::{PopupKey, SessionState, StatusMessage};
use crate::settings::AppSettings;
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Dataset loading result from background thread
enum LoadResult {
    Complete(Arc<DataFrame>),
    Error(String),
}

/// Email result from background thread
struct SendResult {
    action: String,
    success: bool,
}

/// Main application window.
pub struct NextActionApp {
    catalog: ActionCatalog,
    session: SessionState,
    notifier: Arc<dyn Notifier>,
    data_panel: DataPanel,
    board: ActionBoard,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async email sending
    send_tx: Sender<SendResult>,
    send_rx: Receiver<SendResult>,
    pending_sends: usize,
}

impl NextActionApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        catalog: ActionCatalog,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(settings.mail.clone()));
        Self::with_notifier(settings, catalog, notifier)
    }

    pub fn with_notifier(
        settings: AppSettings,
        catalog: ActionCatalog,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (send_tx, send_rx) = channel();
        let mut app = Self {
            catalog,
            session: SessionState::new(),
            notifier,
            data_panel: DataPanel::new(settings.data_path.clone(), settings.preview_rows),
            board: ActionBoard::new(),
            load_rx: None,
            is_loading: false,
            send_tx,
            send_rx,
            pending_sends: 0,
        };
        app.start_load(settings.data_path);
        app
    }

    /// Load the dataset through the shared metrics cache in a background thread.
    fn start_load(&mut self, path: PathBuf) {
        if self.is_loading {
            return; // Already loading
        }

        self.data_panel.data_path = path.clone();
        self.data_panel.set_status("Loading dataset...", false);
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match data::load_data(&path) {
                Ok(table) => LoadResult::Complete(table),
                Err(e) => {
                    tracing::error!(path = %path.display(), "dataset load failed: {e}");
                    LoadResult::Error(describe_load_error(&e))
                }
            };
            let _ = tx.send(result);
        });
    }

    fn handle_browse(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Sales data", &["xlsx", "xlsm", "xls", "ods", "csv"])
            .pick_file()
        {
            self.data_panel.clear();
            self.start_load(path);
        }
    }

    fn handle_reload(&mut self) {
        let path = self.data_panel.data_path.clone();
        data::global().invalidate(&path);
        self.start_load(path);
    }

    /// Check for dataset loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(table)) => {
                self.data_panel.set_table(&table);
                self.is_loading = false;
            }
            Ok(LoadResult::Error(error)) => {
                self.data_panel.clear();
                self.data_panel.set_status(&format!("Error: {error}"), true);
                self.is_loading = false;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                // Put receiver back, still loading
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.data_panel.set_status("Error: loader stopped unexpectedly", true);
                self.is_loading = false;
            }
        }
    }

    /// Compose the assignment for `key` and send it in a background thread.
    fn start_send(&mut self, key: PopupKey) {
        let bullets = self.catalog.next_actions(&key.action);
        let (instructions, team) = self
            .session
            .popover(&key)
            .map(|p| (p.instructions.clone(), p.team))
            .unwrap_or_default();
        let team = self.catalog.team(team).to_string();
        let message = notify::personalized_message(bullets, &instructions);
        let deadline = chrono::Local::now().date_naive();

        let notifier = Arc::clone(&self.notifier);
        let tx = self.send_tx.clone();
        self.pending_sends += 1;

        thread::spawn(move || {
            let success =
                notify::send_notification(notifier.as_ref(), &key.action, &team, deadline, &message);
            let _ = tx.send(SendResult {
                action: key.action,
                success,
            });
        });
    }

    /// Check for email results
    fn check_send_results(&mut self) {
        while let Ok(result) = self.send_rx.try_recv() {
            self.pending_sends = self.pending_sends.saturating_sub(1);
            self.session
                .set_status(StatusMessage::for_result(&result.action, result.success));
        }
    }
}

fn describe_load_error(e: &LoadError) -> String {
    if e.is_not_found() {
        format!("{e}. Pick a sales file with Browse.")
    } else {
        e.to_string()
    }
}

impl eframe::App for NextActionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_send_results();

        // Request repaint while background work is running
        if self.is_loading || self.pending_sends > 0 {
            ctx.request_repaint();
        }

        // Left panel - Data Panel
        SidePanel::left("data_panel")
            .min_width(320.0)
            .max_width(460.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.data_panel.show(ui, self.is_loading) {
                        DataPanelAction::Browse => self.handle_browse(),
                        DataPanelAction::Reload => self.handle_reload(),
                        DataPanelAction::None => {}
                    }
                });
            });

        // Central panel - Action Board
        egui::CentralPanel::default().show(ctx, |ui| {
            self.board.show(ui, &self.catalog, &mut self.session);
        });

        if let BoardAction::Send(key) = self.board.show_popovers(ctx, &self.catalog, &mut self.session) {
            self.start_send(key);
        }
    }
}
