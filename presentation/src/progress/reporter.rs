//! Progress reporting while a turn is in flight

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use live_application::TurnProgressNotifier;
use live_domain::FileReference;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown from ingestion until the reply completes
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_message(&self, message: String) {
        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        let bar = spinner.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(Self::spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        bar.set_message(message);
    }

    fn println(&self, line: String) {
        match self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgressNotifier for ProgressReporter {
    fn on_ingest_start(&self, files: usize, uploading: bool) {
        let verb = if uploading { "Uploading" } else { "Reading" };
        self.set_message(format!("{verb} {files} attachment(s)..."));
    }

    fn on_file_done(&self, reference: &FileReference, success: bool) {
        let mark = if success { "v".green() } else { "x".red() };
        self.println(format!("  {} {}", mark, reference.display_name()));
    }

    fn on_turn_sent(&self, _parts: usize) {
        self.set_message("Waiting for reply...".to_string());
    }

    fn on_tool_call(&self, _call: &serde_json::Value) {
        self.set_message("Waiting for reply (tool call received)...".to_string());
    }

    fn on_reply_done(&self) {
        if let Some(bar) = self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            bar.finish_and_clear();
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TurnProgressNotifier for SimpleProgress {
    fn on_ingest_start(&self, files: usize, uploading: bool) {
        let verb = if uploading { "uploading" } else { "reading" };
        println!("{} {} {} attachment(s)", "->".cyan(), verb, files);
    }

    fn on_file_done(&self, reference: &FileReference, success: bool) {
        if success {
            println!("  {} {}", "v".green(), reference.display_name());
        } else {
            println!("  {} {} (failed)", "x".red(), reference.display_name());
        }
    }
}
