//! Console handlers
//!
//! Rust-side implementations behind the callback trampolines. A single
//! handler is installed process-wide since R itself is a process-wide
//! singleton.

use parking_lot::RwLock;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Output stream selected by `ptr_R_WriteConsoleEx`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Regular output (`otype == 0`)
    Output,
    /// Warnings and errors (`otype != 0`)
    Error,
}

impl ConsoleStream {
    pub fn from_otype(otype: i32) -> Self {
        if otype == 0 {
            ConsoleStream::Output
        } else {
            ConsoleStream::Error
        }
    }
}

/// Save action passed to `ptr_R_CleanUp` (R's `SA_TYPE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    NoRestore,
    Restore,
    Default,
    NoSave,
    Save,
    SaveAsk,
    Suicide,
    Unknown(i32),
}

impl SaveAction {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => SaveAction::NoRestore,
            1 => SaveAction::Restore,
            2 => SaveAction::Default,
            3 => SaveAction::NoSave,
            4 => SaveAction::Save,
            5 => SaveAction::SaveAsk,
            6 => SaveAction::Suicide,
            other => SaveAction::Unknown(other),
        }
    }
}

/// One file handed to `ptr_R_ShowFiles`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownFile {
    pub path: PathBuf,
    pub header: String,
}

/// Console - receiver of R's console and lifecycle callbacks
///
/// Every method has a default, so implementors override only what they
/// intercept.
pub trait Console: Send + Sync {
    /// Text printed by R
    fn write(&self, text: &str, stream: ConsoleStream) {
        match stream {
            ConsoleStream::Output => {
                let mut out = std::io::stdout();
                let _ = out.write_all(text.as_bytes());
            },
            ConsoleStream::Error => {
                let mut err = std::io::stderr();
                let _ = err.write_all(text.as_bytes());
            },
        }
    }

    /// Message box style notification
    fn show_message(&self, message: &str) {
        println!("R wants to display a message:");
        println!("{}", message);
    }

    /// Read one line of input; `None` signals EOF to R
    fn read(&self, prompt: &str, _add_history: bool) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }

    fn reset(&self) {}

    /// Ask for a file name; `None` means cancelled
    fn choose_file(&self, _new: bool) -> Option<String> {
        self.read("File name: ", false)
            .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
            .filter(|name| !name.is_empty())
    }

    /// Display files; returns false if any could not be shown
    fn show_files(&self, files: &[ShownFile], title: &str, delete: bool, _pager: &str) -> bool {
        if !title.is_empty() {
            self.write(&format!("{}\n", title), ConsoleStream::Output);
        }

        let mut ok = true;
        for file in files {
            self.write(&format!("{}\n", file.header), ConsoleStream::Output);
            match std::fs::read_to_string(&file.path) {
                Ok(content) => self.write(&content, ConsoleStream::Output),
                Err(e) => {
                    log::warn!("cannot show {}: {}", file.path.display(), e);
                    ok = false;
                },
            }
            if delete {
                let _ = std::fs::remove_file(&file.path);
            }
        }
        ok
    }

    /// R is quitting
    fn cleanup(&self, save: SaveAction, status: i32, run_last: bool) {
        log::debug!(
            "R cleanup requested (save: {:?}, status: {}, run_last: {})",
            save,
            status,
            run_last
        );
    }

    /// Give the host a chance to pump its event loop
    fn process_events(&self) {}

    /// R entered (`true`) or left (`false`) a busy computation
    fn busy(&self, _busy: bool) {}
}

/// StdConsole - terminal defaults
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {}

lazy_static::lazy_static! {
    static ref CONSOLE: RwLock<Arc<dyn Console>> = RwLock::new(Arc::new(StdConsole));
}

/// Currently installed console
pub fn console() -> Arc<dyn Console> {
    CONSOLE.read().clone()
}

/// Install a console, returning the previous one
pub fn set_console(console: Arc<dyn Console>) -> Arc<dyn Console> {
    std::mem::replace(&mut *CONSOLE.write(), console)
}
