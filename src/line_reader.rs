use log::{debug, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Interactive line source for the REPL, with history kept in a file
/// between sessions.
pub struct LineReader {
    editor: DefaultEditor,
    history_file: String,
    prompt: String,
}

pub enum LineReadStatus {
    Line(String),
    Done,
}

impl Drop for LineReader {
    fn drop(&mut self) {
        if let Err(e) = self.editor.save_history(&self.history_file) {
            warn!("Could not save history to {}: {}", self.history_file, e);
        }
    }
}

impl LineReader {
    pub fn new(history_file: &str, prompt: &str) -> Result<LineReader, ReadlineError> {
        let mut editor = DefaultEditor::new()?;

        // A missing history file is normal on first use.
        if editor.load_history(history_file).is_err() {
            debug!("No history loaded from {}", history_file);
        }

        Ok(LineReader {
            editor,
            history_file: history_file.into(),
            prompt: prompt.into(),
        })
    }

    /// Next line typed by the user; `Done` on EOF, Ctrl‑C or a terminal error.
    pub fn readline(&mut self) -> LineReadStatus {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                    warn!("Could not record history entry: {}", e);
                }
                LineReadStatus::Line(line)
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => LineReadStatus::Done,
            Err(e) => {
                warn!("Readline failed: {}", e);
                LineReadStatus::Done
            }
        }
    }
}
