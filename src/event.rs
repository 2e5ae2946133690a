use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Terminal key press
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// A compared file changed on disk
    FileChanged,
    /// Tick for periodic updates
    Tick,
}

/// What the file watcher should observe
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    /// Individual files; their parent directories are watched
    pub files: Vec<PathBuf>,
    /// Whole trees (directory comparisons), filtered by .gitignore
    pub trees: Vec<PathBuf>,
}

impl WatchSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.trees.is_empty()
    }
}

/// Decides whether a changed path is relevant
struct ChangeFilter {
    files: HashSet<PathBuf>,
    trees: Vec<(PathBuf, Option<Gitignore>)>,
}

impl ChangeFilter {
    fn new(set: &WatchSet) -> Self {
        let files = set.files.iter().map(|f| absolute(f)).collect();
        let trees = set
            .trees
            .iter()
            .map(|root| {
                let root = absolute(root);
                let mut builder = GitignoreBuilder::new(&root);
                let gitignore_path = root.join(".gitignore");
                if gitignore_path.exists() {
                    let _ = builder.add(&gitignore_path);
                }
                (root, builder.build().ok())
            })
            .collect();
        Self { files, trees }
    }

    fn is_relevant(&self, path: &Path) -> bool {
        if self.files.contains(path) {
            return true;
        }
        self.trees.iter().any(|(root, gitignore)| {
            let Ok(rel) = path.strip_prefix(root) else {
                return false;
            };
            if rel.starts_with(".git") {
                return false;
            }
            !gitignore
                .as_ref()
                .is_some_and(|gi| gi.matched(rel, path.is_dir()).is_ignore())
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Event handler that runs in a separate thread
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
    paused: Arc<AtomicBool>,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl EventHandler {
    pub fn with_file_watcher(tick_rate: Duration, watch: &WatchSet) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();
        let paused = Arc::new(AtomicBool::new(false));
        let paused_clone = paused.clone();

        let watcher = if watch.is_empty() {
            None
        } else {
            Self::setup_watcher(watch, tx.clone())
        };

        // Spawn event polling thread
        thread::spawn(move || loop {
            if paused_clone.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(50));
                continue;
            }

            if event::poll(tick_rate).unwrap_or(false) {
                if paused_clone.load(Ordering::Relaxed) {
                    continue;
                }

                let sent = match event::read() {
                    Ok(Event::Key(key)) => event_tx.send(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => event_tx.send(AppEvent::Mouse(mouse)),
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            } else if !paused_clone.load(Ordering::Relaxed)
                && event_tx.send(AppEvent::Tick).is_err()
            {
                break;
            }
        });

        Self {
            rx,
            _tx: tx,
            paused,
            _watcher: watcher,
        }
    }

    fn setup_watcher(
        watch: &WatchSet,
        tx: mpsc::Sender<AppEvent>,
    ) -> Option<Debouncer<RecommendedWatcher>> {
        let filter = ChangeFilter::new(watch);

        let debouncer = new_debouncer(Duration::from_millis(300), move |res: DebounceEventResult| {
            match res {
                Ok(events) => {
                    let changed = events.iter().any(|event| {
                        matches!(event.kind, DebouncedEventKind::Any) && filter.is_relevant(&event.path)
                    });
                    if changed {
                        let _ = tx.send(AppEvent::FileChanged);
                    }
                }
                Err(e) => log::debug!("Watcher error: {:?}", e),
            }
        });

        let mut debouncer = match debouncer {
            Ok(d) => d,
            Err(e) => {
                log::warn!("File watcher unavailable: {}", e);
                return None;
            }
        };

        // Editors often replace files on save, so watch the directory
        let mut dirs: HashSet<PathBuf> = HashSet::new();
        for file in &watch.files {
            let file = absolute(file);
            if let Some(parent) = file.parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
        for dir in dirs {
            if let Err(e) = debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive) {
                log::debug!("Cannot watch {}: {}", dir.display(), e);
            }
        }
        for tree in &watch.trees {
            if let Err(e) = debouncer.watcher().watch(tree, RecursiveMode::Recursive) {
                log::debug!("Cannot watch {}: {}", tree.display(), e);
            }
        }

        Some(debouncer)
    }

    /// Get the next event (blocking)
    pub fn next(&self) -> Result<AppEvent> {
        Ok(self.rx.recv()?)
    }

    /// Take a queued event without blocking
    pub fn try_next(&self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }

    /// Pause event polling (for spawning external processes)
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
        // Give the polling thread time to stop
        thread::sleep(Duration::from_millis(150));
    }

    /// Resume event polling
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }
}

/// Key input helper
pub struct KeyInput;

impl KeyInput {
    fn is_plain(key: &KeyEvent, c: char) -> bool {
        key.code == KeyCode::Char(c) && key.modifiers == KeyModifiers::NONE
    }

    /// Uppercase letters arrive with SHIFT on most terminals, bare on some
    fn is_shifted(key: &KeyEvent, c: char) -> bool {
        key.code == KeyCode::Char(c)
            && (key.modifiers == KeyModifiers::SHIFT || key.modifiers == KeyModifiers::NONE)
    }

    pub fn is_quit(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'q')
            || (key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL)
    }

    pub fn is_down(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('j') | KeyCode::Down) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_up(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('k') | KeyCode::Up) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_fast_down(key: &KeyEvent) -> bool {
        Self::is_shifted(key, 'J')
    }

    pub fn is_fast_up(key: &KeyEvent) -> bool {
        Self::is_shifted(key, 'K')
    }

    pub fn is_tab(key: &KeyEvent) -> bool {
        key.code == KeyCode::Tab && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_shift_tab(key: &KeyEvent) -> bool {
        key.code == KeyCode::BackTab
            || (key.code == KeyCode::Tab && key.modifiers == KeyModifiers::SHIFT)
    }

    pub fn is_page_down(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('d') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageDown
    }

    pub fn is_page_up(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('u') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageUp
    }

    pub fn is_top(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'g') || key.code == KeyCode::Home
    }

    pub fn is_bottom(key: &KeyEvent) -> bool {
        Self::is_shifted(key, 'G') || key.code == KeyCode::End
    }

    pub fn is_enter(key: &KeyEvent) -> bool {
        key.code == KeyCode::Enter
    }

    pub fn is_escape(key: &KeyEvent) -> bool {
        key.code == KeyCode::Esc
    }

    pub fn is_help(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('?')
    }

    pub fn is_yank(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'y')
    }

    pub fn is_open(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'o')
    }

    pub fn is_refresh(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'r')
    }

    pub fn is_cycle_filter(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'f')
    }

    pub fn is_toggle_view_mode(key: &KeyEvent) -> bool {
        Self::is_plain(key, 's')
    }

    pub fn is_toggle_wrap(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'w')
    }

    pub fn is_toggle_line_numbers(key: &KeyEvent) -> bool {
        Self::is_plain(key, 'n')
    }

    pub fn is_toggle_raw(key: &KeyEvent) -> bool {
        Self::is_shifted(key, 'R')
    }

    pub fn is_next_change(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char(']')
    }

    pub fn is_prev_change(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('[')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn uppercase_keys_accept_shift_or_bare() {
        assert!(KeyInput::is_bottom(&key(KeyCode::Char('G'), KeyModifiers::SHIFT)));
        assert!(KeyInput::is_bottom(&key(KeyCode::Char('G'), KeyModifiers::NONE)));
        assert!(KeyInput::is_toggle_raw(&key(KeyCode::Char('R'), KeyModifiers::SHIFT)));
        assert!(!KeyInput::is_refresh(&key(KeyCode::Char('R'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn quit_and_paging() {
        assert!(KeyInput::is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(KeyInput::is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!KeyInput::is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(KeyInput::is_page_down(&key(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!KeyInput::is_page_down(&key(KeyCode::Char('d'), KeyModifiers::NONE)));
    }

    #[test]
    fn change_filter_matches_watched_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        let filter = ChangeFilter::new(&WatchSet {
            files: vec![a.clone()],
            trees: vec![],
        });
        assert!(filter.is_relevant(&absolute(&a)));
        assert!(!filter.is_relevant(&absolute(&b)));
    }

    #[test]
    fn change_filter_honors_gitignore_in_trees() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        let root = absolute(dir.path());

        let filter = ChangeFilter::new(&WatchSet {
            files: vec![],
            trees: vec![dir.path().to_path_buf()],
        });
        assert!(filter.is_relevant(&root.join("src/main.rs")));
        assert!(!filter.is_relevant(&root.join("debug.log")));
        assert!(!filter.is_relevant(&root.join(".git/index")));
    }
}
