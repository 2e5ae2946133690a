mod app;
mod async_loader;
mod batch;
mod compare;
mod config;
mod diff;
mod event;
mod report;
mod text;
mod theme;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use std::time::Duration;

use app::{App, AppCommand, Source};
use batch::Filter;
use compare::{load_pairs_file, pair_from_arg, pairs_from_dirs, Comparator, FilePair};
use config::Config;
use event::{AppEvent, EventHandler, WatchSet};
use theme::ThemeMode;

const LOG_PATH: &str = "/tmp/diffie.log";

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// diffie - side-by-side diffs for one or many file pairs
#[derive(Parser, Debug)]
#[command(name = "diffie")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Two files to compare
    #[arg(num_args = 0..=2, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Additional pair as FILE1,FILE2 (repeatable)
    #[arg(short = 'p', long = "pair", value_name = "FILE1,FILE2")]
    pairs: Vec<String>,

    /// JSON file listing pairs
    #[arg(long, value_name = "FILE")]
    pairs_file: Option<PathBuf>,

    /// Compare two directory trees, pairing files by relative path
    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"])]
    dirs: Vec<PathBuf>,

    /// Show an existing unified diff instead of comparing files
    #[arg(long, value_name = "FILE", conflicts_with_all = ["files", "pairs", "pairs_file", "dirs"])]
    patch: Option<PathBuf>,

    /// Resolve relative paths against this directory and refuse to leave it
    #[arg(long, value_name = "DIR")]
    base_path: Option<PathBuf>,

    /// Context lines around each change
    #[arg(long, value_name = "N")]
    context: Option<u32>,

    /// Print a report instead of starting the viewer
    #[arg(long, value_name = "FORMAT")]
    report: Option<ReportFormat>,

    /// Which pairs to include
    #[arg(long, default_value = "all")]
    filter: Filter,

    /// Report width in columns (defaults to the terminal width)
    #[arg(long, value_name = "N")]
    width: Option<usize>,

    /// Start in unified view
    #[arg(long)]
    unified: bool,

    /// Wrap long lines
    #[arg(long)]
    wrap: bool,

    /// Hide line numbers
    #[arg(long)]
    no_line_numbers: bool,

    /// Color theme (auto-detected when omitted)
    #[arg(long)]
    theme: Option<ThemeMode>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(theme) = self.theme {
            config.set_theme(theme);
        }
        if let Some(base) = &self.base_path {
            config.base_path = Some(base.clone());
        }
        if let Some(context) = self.context {
            config.context_lines = context;
        }
        if self.unified {
            config.view.unified = true;
        }
        if self.wrap {
            config.view.word_wrap = true;
        }
        if self.no_line_numbers {
            config.view.line_numbers = false;
        }
    }

    /// Collect pairs from every source, numbered in order
    fn collect_pairs(&self) -> Result<Vec<FilePair>> {
        let mut pairs = Vec::new();
        match self.files.as_slice() {
            [] => {}
            [left, right] => pairs.push(FilePair::new(0, left, right)),
            _ => bail!("Expected two files to compare"),
        }
        for arg in &self.pairs {
            pairs.push(pair_from_arg(0, arg)?);
        }
        if let Some(path) = &self.pairs_file {
            pairs.extend(load_pairs_file(path)?);
        }
        if let [left, right] = self.dirs.as_slice() {
            pairs.extend(pairs_from_dirs(left, right)?);
        }

        if pairs.is_empty() {
            bail!("Nothing to compare. Pass FILE1 FILE2, -p, --pairs-file, --dirs or --patch");
        }
        for (i, pair) in pairs.iter_mut().enumerate() {
            pair.index = i;
        }
        Ok(pairs)
    }

    fn watch_set(&self, comparator: &Comparator, pairs: &[FilePair]) -> WatchSet {
        if let Some(patch) = &self.patch {
            return WatchSet {
                files: vec![patch.clone()],
                trees: Vec::new(),
            };
        }
        let mut set = WatchSet {
            files: Vec::new(),
            trees: self.dirs.clone(),
        };
        if self.dirs.is_empty() {
            set.files = pairs
                .iter()
                .flat_map(|p| [&p.file1, &p.file2])
                .filter_map(|f| comparator.resolve(f).ok())
                .collect();
        }
        set
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    init_logging(args.report.is_some())?;

    let mut config = Config::from_env();
    if args.report.is_none() && args.theme.is_none() {
        config.set_theme(ThemeMode::detect());
    }
    args.apply(&mut config);
    let comparator = Comparator::new(config.base_path.clone(), config.context_lines);

    if let Some(format) = args.report {
        return print_report(&args, &comparator, format);
    }

    let (source, pairs) = match &args.patch {
        Some(path) => (Source::Patch { path: path.clone() }, Vec::new()),
        None => {
            let pairs = args.collect_pairs()?;
            let source = Source::Pairs {
                comparator: comparator.clone(),
                pairs: pairs.clone(),
            };
            (source, pairs)
        }
    };
    let watch = args.watch_set(&comparator, &pairs);

    let mut app = App::new(config, source)?;
    app.set_filter(args.filter);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::with_file_watcher(Duration::from_millis(100), &watch);

    let result = run_app(&mut terminal, &mut app, &events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.map(|_| ExitCode::SUCCESS)
}

/// The viewer logs to a file so output never corrupts the screen
fn init_logging(to_stderr: bool) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if !to_stderr {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_PATH)
            .with_context(|| format!("Failed to open log file: {}", LOG_PATH))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn print_report(args: &Args, comparator: &Comparator, format: ReportFormat) -> Result<ExitCode> {
    let report = match &args.patch {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read patch: {}", path.display()))?;
            let view = batch::PairView::from_patch(&path.display().to_string(), &text);
            batch::BatchReport {
                totals: view.stats,
                pairs: vec![view],
                errors: Vec::new(),
            }
        }
        None => batch::run(comparator, args.collect_pairs()?),
    };

    let output = match format {
        ReportFormat::Text => {
            let width = args
                .width
                .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| w as usize))
                .unwrap_or(120);
            report::render_text(&report, width, args.filter)
        }
        ReportFormat::Json => serde_json::to_string_pretty(&report::render_json(&report))?,
    };
    println!("{}", output);

    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_app<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            app.render(frame);
        })?;

        match events.next()? {
            AppEvent::Key(key) => {
                app.handle_key(key)?;
            }
            AppEvent::Mouse(mouse) => {
                app.handle_mouse(mouse)?;
            }
            AppEvent::Tick => {
                app.handle_tick();
            }
            AppEvent::FileChanged => {
                // Coalesce a burst of saves into one refresh
                let mut pending = Vec::new();
                while let Some(evt) = events.try_next() {
                    if !matches!(evt, AppEvent::FileChanged) {
                        pending.push(evt);
                    }
                }
                refresh_logged(app);
                for evt in pending {
                    match evt {
                        AppEvent::Key(key) => app.handle_key(key)?,
                        AppEvent::Mouse(mouse) => app.handle_mouse(mouse)?,
                        AppEvent::Tick => app.handle_tick(),
                        AppEvent::FileChanged => {}
                    }
                }
            }
        }

        match app.take_command() {
            AppCommand::None => {}
            AppCommand::OpenEditor { path, line } => {
                events.pause();

                disable_raw_mode()?;
                execute!(
                    terminal.backend_mut(),
                    LeaveAlternateScreen,
                    DisableMouseCapture
                )?;
                terminal.show_cursor()?;

                let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
                let status = editor_command(&editor, &path, line)
                    .stdin(std::process::Stdio::inherit())
                    .stdout(std::process::Stdio::inherit())
                    .stderr(std::process::Stdio::inherit())
                    .status();
                if let Err(e) = status {
                    log::warn!("Failed to start editor {}: {}", editor, e);
                }

                enable_raw_mode()?;
                execute!(
                    terminal.backend_mut(),
                    EnterAlternateScreen,
                    EnableMouseCapture
                )?;
                terminal.hide_cursor()?;
                terminal.clear()?;

                events.resume();
                refresh_logged(app);
            }
        }
    }

    Ok(())
}

/// A file that vanished mid-edit must not take the viewer down
fn refresh_logged(app: &mut App) {
    if let Err(e) = app.refresh() {
        log::warn!("Refresh failed: {:#}", e);
    }
}

/// Editor invocation that jumps to `line` where the editor supports it
fn editor_command(editor: &str, path: &str, line: Option<usize>) -> Command {
    let mut cmd = Command::new(editor);
    match line {
        Some(n) if editor.contains("hx") || editor.contains("helix") => {
            cmd.arg(format!("{}:{}", path, n));
        }
        Some(n) if editor.contains("vi") || editor.contains("emacs") || editor.contains("nano") => {
            cmd.arg(format!("+{}", n)).arg(path);
        }
        _ => {
            cmd.arg(path);
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("diffie").chain(args.iter().copied())).unwrap()
    }

    fn cmd_args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn pairs_from_all_sources_are_renumbered() {
        let dir = tempfile::tempdir().unwrap();
        let pairs_file = dir.path().join("pairs.json");
        std::fs::write(&pairs_file, r#"[{"file1":"x1","file2":"x2"}]"#).unwrap();

        let args = parse(&[
            "a",
            "b",
            "-p",
            "c,d",
            "--pairs-file",
            pairs_file.to_str().unwrap(),
        ]);
        let pairs = args.collect_pairs().unwrap();
        let indices: Vec<_> = pairs.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(pairs[1].file1, PathBuf::from("c"));
        assert_eq!(pairs[2].file2, PathBuf::from("x2"));
    }

    #[test]
    fn single_file_is_rejected() {
        let args = parse(&["a"]);
        assert!(args.collect_pairs().is_err());
    }

    #[test]
    fn nothing_to_compare_is_an_error() {
        assert!(parse(&[]).collect_pairs().is_err());
    }

    #[test]
    fn patch_conflicts_with_files() {
        let result = Args::try_parse_from(["diffie", "a", "b", "--patch", "x.diff"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::from_lookup(|_| None);
        let args = parse(&[
            "--unified",
            "--wrap",
            "--no-line-numbers",
            "--context",
            "7",
            "--theme",
            "light",
        ]);
        args.apply(&mut config);
        assert!(config.view.unified);
        assert!(config.view.word_wrap);
        assert!(!config.view.line_numbers);
        assert_eq!(config.context_lines, 7);
        assert_eq!(config.theme, ThemeMode::Light);
    }

    #[test]
    fn report_and_filter_values_parse() {
        let args = parse(&["a", "b", "--report", "json", "--filter", "changed"]);
        assert_eq!(args.report, Some(ReportFormat::Json));
        assert_eq!(args.filter, Filter::Changed);
    }

    #[test]
    fn watch_set_uses_trees_for_dirs() {
        let args = parse(&["--dirs", "left", "right"]);
        let set = args.watch_set(&Comparator::default(), &[]);
        assert_eq!(set.trees, vec![PathBuf::from("left"), PathBuf::from("right")]);
        assert!(set.files.is_empty());
    }

    #[test]
    fn editor_line_arguments() {
        let vim = editor_command("nvim", "f.rs", Some(3));
        assert_eq!(cmd_args(&vim), vec![OsStr::new("+3"), OsStr::new("f.rs")]);

        let hx = editor_command("hx", "f.rs", Some(3));
        assert_eq!(cmd_args(&hx), vec![OsStr::new("f.rs:3")]);

        let code = editor_command("code", "f.rs", Some(3));
        assert_eq!(cmd_args(&code), vec![OsStr::new("f.rs")]);

        let plain = editor_command("vim", "f.rs", None);
        assert_eq!(cmd_args(&plain), vec![OsStr::new("f.rs")]);
    }
}
