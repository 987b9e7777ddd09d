// src/runner.rs
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::{
    browser::Browser,
    config::{AppOptions, BrowserOptions},
    data::StatisticsSnapshot,
    diff::compute_deltas,
    error::Result,
    file::write_atomic,
    notify::Notifier,
    progress::{Progress, Stage},
    report::{render_charts, render_text, Chart},
    session::SessionDriver,
    specs::dashboard,
    store::SnapshotStore,
};

/// How a run ended. Every variant still carries a deliverable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Statistics were extracted and reported.
    Reported,
    LoginFailed(String),
    ExtractionFailed(String),
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub message: String,
    pub charts: Vec<Chart>,
    pub status: RunStatus,
    /// Saving the snapshot failed; the report itself is still valid.
    pub persist_error: Option<String>,
}

impl RunReport {
    fn failure(snap: &StatisticsSnapshot, status: RunStatus) -> Self {
        Self {
            message: render_text(snap, &Default::default()),
            charts: Vec::new(),
            status,
            persist_error: None,
        }
    }
}

/// Options for turning a snapshot into a report.
#[derive(Clone, Copy, Debug)]
pub struct ReportOptions {
    /// Replace the stored record with this snapshot.
    pub save: bool,
    pub charts: bool,
}

/* ---------------- One run ---------------- */

/// Login, read the dashboard, diff against the last record, save, render.
/// Never fails: login and extraction problems come back as a status with
/// an error message ready to deliver.
pub fn run_once(
    opts: &AppOptions,
    browser: &mut dyn Browser,
    store: &SnapshotStore,
    mut progress: Option<&mut dyn Progress>,
) -> RunReport {
    if let Some(p) = progress.as_deref_mut() {
        p.begin(Stage::ALL.len());
    }
    let report = pipeline(opts, browser, store, progress.as_deref_mut().map(|p| p as &mut dyn Progress));
    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    report
}

fn pipeline(
    opts: &AppOptions,
    browser: &mut dyn Browser,
    store: &SnapshotStore,
    mut progress: Option<&mut dyn Progress>,
) -> RunReport {
    let mut session = SessionDriver::new(&opts.site, &opts.browser);
    match session.login(browser) {
        Ok(outcome) => say(&mut progress, &format!("Login: {outcome:?}")),
        Err(e) => {
            say(&mut progress, &format!("Login failed: {e}"));
            let snap = StatisticsSnapshot::failed(format!("Login failed: {e}"), "");
            return RunReport::failure(&snap, RunStatus::LoginFailed(e.to_string()));
        }
    }
    done(&mut progress, Stage::Login);

    let html = match read_page(&session, browser) {
        Ok(html) => html,
        Err(e) => {
            error!("Runner: could not read the dashboard: {e}");
            say(&mut progress, &format!("Dashboard unreadable: {e}"));
            let snap = StatisticsSnapshot::failed(e.to_string(), "");
            return RunReport::failure(&snap, RunStatus::ExtractionFailed(e.to_string()));
        }
    };
    done(&mut progress, Stage::Render);

    let snap = dashboard::extract(&html);
    done(&mut progress, Stage::Extract);
    if snap.is_error() || snap.groups.is_empty() {
        if let Some(path) = dump_page(opts, &snap) {
            say(&mut progress, &format!("Page dumped to {}", path.display()));
        }
    }

    let report = report_snapshot(
        &snap,
        store,
        ReportOptions { save: true, charts: opts.output.charts },
    );
    if let Some(e) = &report.persist_error {
        say(&mut progress, &format!("Snapshot not saved: {e}"));
    }
    done(&mut progress, Stage::Diff);
    done(&mut progress, Stage::Report);
    report
}

fn say(progress: &mut Option<&mut dyn Progress>, msg: &str) {
    if let Some(p) = progress.as_deref_mut() {
        p.log(msg);
    }
}

fn done(progress: &mut Option<&mut dyn Progress>, stage: Stage) {
    if let Some(p) = progress.as_deref_mut() {
        p.stage_done(stage);
    }
}

fn read_page(session: &SessionDriver, browser: &mut dyn Browser) -> Result<String> {
    session.wait_for_dashboard(browser)?;
    browser.rendered_html()
}

/// Diff `snap` against the stored record, optionally save it, and render
/// the message and charts. Used by live runs and offline parsing alike.
pub fn report_snapshot(snap: &StatisticsSnapshot, store: &SnapshotStore, opts: ReportOptions) -> RunReport {
    if let Some(err) = &snap.extraction_error {
        return RunReport::failure(snap, RunStatus::ExtractionFailed(err.clone()));
    }

    let previous = store.load();
    let deltas = compute_deltas(snap, previous.as_ref());

    let persist_error = if opts.save {
        store.save(snap).err().map(|e| e.to_string())
    } else {
        None
    };

    let message = render_text(snap, &deltas);
    let charts = if opts.charts {
        render_charts(snap).unwrap_or_else(|e| {
            error!("Runner: {e}");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    RunReport { message, charts, status: RunStatus::Reported, persist_error }
}

/// Write the raw page to the configured dump path; returns the path on success.
fn dump_page<'a>(opts: &'a AppOptions, snap: &StatisticsSnapshot) -> Option<&'a Path> {
    let path = opts.output.dump_html.as_deref()?;
    match write_atomic(path, snap.raw_html.as_bytes()) {
        Ok(()) => {
            info!("Runner: page dumped to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Runner: could not dump page to {}: {e}", path.display());
            None
        }
    }
}

/* ---------------- Background runs ---------------- */

/// Opens a browser for one run.
pub type Connect = Box<dyn FnOnce(&BrowserOptions) -> Result<Box<dyn Browser>> + Send>;

/// Runs the pipeline on a worker thread, at most one at a time.
pub struct Runner {
    opts: AppOptions,
    in_flight: Arc<AtomicBool>,
}

// Clears the in-flight flag however the worker ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Runner {
    pub fn new(opts: AppOptions) -> Self {
        Self { opts, in_flight: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a run and hand its report to `notifier`. Returns `None` when a
    /// run is already in flight.
    pub fn try_spawn(
        &self,
        connect: Connect,
        mut notifier: Box<dyn Notifier + Send>,
        mut progress: Option<Box<dyn Progress + Send>>,
    ) -> Option<JoinHandle<RunReport>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Runner: a run is already in flight");
            return None;
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let opts = self.opts.clone();
        let handle = thread::spawn(move || {
            let _guard = guard;
            let store = SnapshotStore::new(&opts.store.snapshot_path);

            let report = match connect(&opts.browser) {
                Ok(mut browser) => {
                    let sink = progress.as_deref_mut().map(|p| p as &mut dyn Progress);
                    let report = run_once(&opts, browser.as_mut(), &store, sink);
                    if let Err(e) = browser.close() {
                        warn!("Runner: closing browser: {e}");
                    }
                    report
                }
                Err(e) => {
                    error!("Runner: could not start browser: {e}");
                    let snap = StatisticsSnapshot::failed(e.to_string(), "");
                    RunReport::failure(&snap, RunStatus::ExtractionFailed(e.to_string()))
                }
            };

            if let Err(e) = notifier.deliver(&report.message, &report.charts) {
                error!("Runner: delivery failed: {e}");
            }
            report
        });
        Some(handle)
    }
}
