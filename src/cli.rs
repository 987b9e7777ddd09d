// src/cli.rs
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};

use crate::config::consts::{DEFAULT_OUT_DIR, HTML_DUMP_FILE, SNAPSHOT_FILE, STATS_URL, WEBDRIVER_HOST, WEBDRIVER_PORT};
use crate::browser::Browser;
use crate::config::{AppOptions, BrowserOptions};
use crate::core::webdriver::WebDriver;
use crate::notify::{DirNotifier, Notifier, StdoutNotifier};
use crate::progress::CliProgress;
use crate::runner::{self, ReportOptions, RunStatus, Runner};
use crate::specs::dashboard;
use crate::store::SnapshotStore;

#[derive(Parser, Debug)]
#[command(name = "dox_stats")]
#[command(about = "Scrape the statistics dashboard and report what changed since the last run")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Dashboard page
    #[arg(long, env = "STATS_URL", default_value = STATS_URL, global = true)]
    pub url: String,

    #[arg(long, env = "STATS_LOGIN", default_value = "", hide_default_value = true, global = true)]
    pub login: String,

    #[arg(long, env = "STATS_PASSWORD", default_value = "", hide_env_values = true, hide_default_value = true, global = true)]
    pub password: String,

    /// "true" runs Chrome without a window
    #[arg(long, env = "SELENIUM_HEADLESS", default_value = "true", value_parser = parse_flag, global = true)]
    pub headless: bool,

    /// Chrome binary (driver default when unset)
    #[arg(long, env = "CHROME_BIN", global = true)]
    pub chrome_bin: Option<PathBuf>,

    /// WebDriver endpoint, e.g. http://127.0.0.1:9515
    #[arg(long, env = "WEBDRIVER_URL", global = true)]
    pub webdriver: Option<String>,

    /// Last-snapshot file
    #[arg(long, env = "STATS_FILE", default_value = SNAPSHOT_FILE, global = true)]
    pub store: PathBuf,

    /// Directory for report.html and chart images
    #[arg(short, long, env = "STATS_OUT_DIR", default_value = DEFAULT_OUT_DIR, global = true)]
    pub out: PathBuf,

    /// Append log lines to this file instead of stderr
    #[arg(long, env = "STATS_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// One full run against the live dashboard (default)
    Run {
        /// Print the report instead of writing the output directory
        #[arg(long)]
        stdout: bool,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,

        /// Write the rendered page here when nothing could be extracted
        /// (bare flag: last_page.html in the output directory)
        #[arg(long, value_name = "FILE", num_args = 0..=1)]
        dump_html: Option<Option<PathBuf>>,
    },

    /// Extract from a saved page and diff it against the stored snapshot
    Parse {
        file: PathBuf,

        /// Replace the stored snapshot with this one
        #[arg(long)]
        save: bool,

        /// Also write chart images to the output directory
        #[arg(long)]
        charts: bool,
    },

    /// Print the stored snapshot
    Show,
}

/// "true" (any case) is true, everything else false.
fn parse_flag(s: &str) -> Result<bool, String> {
    Ok(s.trim().eq_ignore_ascii_case("true"))
}

/// Where `--dump-html` writes, if anywhere.
fn dump_path(out_dir: &Path, arg: Option<Option<PathBuf>>) -> Option<PathBuf> {
    arg.map(|path| path.unwrap_or_else(|| out_dir.join(HTML_DUMP_FILE)))
}

/// `http://host:port[/]` or `host:port` -> (host, port).
pub fn parse_webdriver_url(url: &str) -> Option<(String, u16)> {
    let rest = url.trim();
    let rest = rest.strip_prefix("http://").unwrap_or(rest);
    let rest = rest.split('/').next()?;
    match rest.rsplit_once(':') {
        Some((host, port)) => Some((s!(host), port.parse().ok()?)),
        None if !rest.is_empty() => Some((s!(rest), WEBDRIVER_PORT)),
        None => None,
    }
}

impl GlobalArgs {
    pub fn to_options(&self) -> color_eyre::Result<AppOptions> {
        let mut opts = AppOptions::default();

        opts.site.url = self.url.clone();
        opts.site.login = self.login.clone();
        opts.site.password = self.password.clone();

        opts.browser.headless = self.headless;
        opts.browser.chrome_bin = self.chrome_bin.clone().filter(|p| !p.as_os_str().is_empty());
        let (host, port) = match &self.webdriver {
            Some(url) => parse_webdriver_url(url).ok_or_else(|| eyre!("Invalid WebDriver URL: {url}"))?,
            None => (s!(WEBDRIVER_HOST), WEBDRIVER_PORT),
        };
        opts.browser.webdriver_host = host;
        opts.browser.webdriver_port = port;

        opts.store.snapshot_path = self.store.clone();
        opts.output.dir = self.out.clone();
        opts.log.verbose = self.verbose;
        opts.log.file = self.log_file.clone();
        Ok(opts)
    }
}

pub fn run() -> color_eyre::Result<()> {
    let cli = Cli::parse();
    let mut opts = cli.global.to_options()?;
    crate::logging::init(&opts.log).wrap_err("Could not set up logging")?;
    log::debug!("Options: {opts:?}");

    match cli.command.unwrap_or(Command::Run { stdout: false, no_charts: false, dump_html: None }) {
        Command::Run { stdout, no_charts, dump_html } => {
            opts.output.charts = !no_charts;
            opts.output.dump_html = dump_path(&opts.output.dir, dump_html);
            run_live(opts, stdout)
        }
        Command::Parse { file, save, charts } => parse_file(&opts, &file, save, charts),
        Command::Show => show(&opts),
    }
}

fn run_live(opts: AppOptions, stdout: bool) -> color_eyre::Result<()> {
    if opts.site.login.is_empty() || opts.site.password.is_empty() {
        return Err(eyre!("STATS_LOGIN and STATS_PASSWORD must be set"));
    }

    let notifier: Box<dyn Notifier + Send> = if stdout {
        Box::new(StdoutNotifier::new())
    } else {
        Box::new(DirNotifier::new(&opts.output.dir))
    };

    let runner = Runner::new(opts);
    let handle = runner
        .try_spawn(
            Box::new(connect_webdriver),
            notifier,
            Some(Box::new(CliProgress::new())),
        )
        .ok_or_else(|| eyre!("A run is already in progress"))?;
    let report = handle.join().map_err(|_| eyre!("Run thread panicked"))?;

    if let Some(e) = &report.persist_error {
        eprintln!("Warning: snapshot not saved: {e}");
    }
    match report.status {
        RunStatus::Reported => Ok(()),
        RunStatus::LoginFailed(reason) => Err(eyre!("Login failed: {reason}")),
        RunStatus::ExtractionFailed(reason) => Err(eyre!("Extraction failed: {reason}")),
    }
}

fn connect_webdriver(opts: &BrowserOptions) -> crate::error::Result<Box<dyn Browser>> {
    Ok(Box::new(WebDriver::connect(opts)?))
}

fn parse_file(opts: &AppOptions, file: &Path, save: bool, charts: bool) -> color_eyre::Result<()> {
    let html = fs::read_to_string(file).wrap_err_with(|| format!("Could not read {}", file.display()))?;
    let snap = dashboard::extract(&html);

    let store = SnapshotStore::new(&opts.store.snapshot_path);
    let report = runner::report_snapshot(&snap, &store, ReportOptions { save, charts });

    println!("{}", report.message);
    if charts && !report.charts.is_empty() {
        let mut notifier = DirNotifier::new(&opts.output.dir);
        notifier.deliver(&report.message, &report.charts)?;
        for path in notifier.written() {
            eprintln!("Wrote {}", path.display());
        }
    }
    if let Some(e) = &report.persist_error {
        eprintln!("Warning: snapshot not saved: {e}");
    }
    Ok(())
}

fn show(opts: &AppOptions) -> color_eyre::Result<()> {
    let store = SnapshotStore::new(&opts.store.snapshot_path);
    let Some(rec) = store.load() else {
        println!("no snapshot at {}", store.path().display());
        return Ok(());
    };

    println!("Snapshot taken {}", rec.timestamp.format("%Y-%m-%d %H:%M:%S"));
    for (_, group) in rec.groups() {
        println!("\n{}", group.name);
        for (label, value) in group.metrics.iter() {
            println!("  {label}: {value}");
        }
        for (name, entries) in group.non_empty_subgroups() {
            println!("  {name}");
            for (label, value) in entries.iter() {
                println!("    {label}: {value}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webdriver_url_forms() {
        assert_eq!(parse_webdriver_url("http://localhost:4444/"), Some((s!("localhost"), 4444)));
        assert_eq!(parse_webdriver_url("10.0.0.2:9515"), Some((s!("10.0.0.2"), 9515)));
        assert_eq!(parse_webdriver_url("chrome"), Some((s!("chrome"), WEBDRIVER_PORT)));
        assert_eq!(parse_webdriver_url("http://host:x"), None);
    }

    #[test]
    fn headless_flag_is_true_only_for_true() {
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("1"), Ok(false));
        assert_eq!(parse_flag("false"), Ok(false));
    }

    #[test]
    fn defaults_map_onto_options() {
        let cli = Cli::try_parse_from(["dox_stats", "show"]).unwrap();
        let opts = cli.global.to_options().unwrap();
        assert_eq!(opts.browser.webdriver_port, WEBDRIVER_PORT);
        assert_eq!(opts.store.snapshot_path, PathBuf::from(SNAPSHOT_FILE));
        assert!(matches!(cli.command, Some(Command::Show)));
    }

    fn dump_arg(args: &[&str]) -> Option<PathBuf> {
        let cli = Cli::try_parse_from(args).unwrap();
        let opts = cli.global.to_options().unwrap();
        match cli.command {
            Some(Command::Run { dump_html, .. }) => dump_path(&opts.output.dir, dump_html),
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn bare_dump_flag_lands_in_the_output_directory() {
        assert_eq!(dump_arg(&["dox_stats", "run"]), None);
        assert_eq!(
            dump_arg(&["dox_stats", "--out", "reports", "run", "--dump-html"]),
            Some(PathBuf::from("reports").join(HTML_DUMP_FILE))
        );
        assert_eq!(
            dump_arg(&["dox_stats", "run", "--dump-html", "page.html"]),
            Some(PathBuf::from("page.html"))
        );
    }
}
