//! Interactive multi-file selection and yes/no prompts.
//!
//! Both read through [`LineSource`] so they work against the line editor
//! in the REPL and against scripted input in tests.

use std::path::PathBuf;

/// Result of reading one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D or a closed input
    Eof,
}

pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> ReadLine;
}

impl LineSource for rustyline::DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> ReadLine {
        match self.readline(prompt) {
            Ok(line) => ReadLine::Line(line),
            Err(rustyline::error::ReadlineError::Interrupted) => ReadLine::Interrupted,
            Err(_) => ReadLine::Eof,
        }
    }
}

/// Outcome of the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen { paths: Vec<PathBuf>, message: String },
    Cancelled,
}

/// Ask for paths one per line until an empty line, then for the message.
///
/// Ctrl-C or end of input at either prompt cancels the whole selection.
pub fn pick_files(source: &mut dyn LineSource) -> Selection {
    println!("Enter file paths, one per line. Empty line to finish, Ctrl-C to cancel.");

    let mut paths = Vec::new();
    loop {
        match source.read_line("file> ") {
            ReadLine::Line(line) => {
                let path = unquote(line.trim());
                if path.is_empty() {
                    break;
                }
                paths.push(PathBuf::from(path));
            }
            ReadLine::Interrupted | ReadLine::Eof => return Selection::Cancelled,
        }
    }

    match source.read_line("message> ") {
        ReadLine::Line(message) => Selection::Chosen {
            paths,
            message: message.trim().to_string(),
        },
        ReadLine::Interrupted | ReadLine::Eof => Selection::Cancelled,
    }
}

/// Strip one pair of matching surrounding quotes, as left by drag-and-drop.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
pub fn ask_yes_no(source: &mut dyn LineSource, question: &str) -> bool {
    match source.read_line(&format!("{question} [y/N] ")) {
        ReadLine::Line(answer) => is_yes(&answer),
        ReadLine::Interrupted | ReadLine::Eof => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<ReadLine>);

    impl Scripted {
        fn lines(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| ReadLine::Line(l.to_string())).collect())
        }
    }

    impl LineSource for Scripted {
        fn read_line(&mut self, _prompt: &str) -> ReadLine {
            self.0.pop_front().unwrap_or(ReadLine::Eof)
        }
    }

    #[test]
    fn collects_paths_then_message() {
        let mut source = Scripted::lines(&["a.txt", "\"my docs/b.pdf\"", "", "Compare these "]);
        assert_eq!(
            pick_files(&mut source),
            Selection::Chosen {
                paths: vec![PathBuf::from("a.txt"), PathBuf::from("my docs/b.pdf")],
                message: "Compare these".into(),
            }
        );
    }

    #[test]
    fn no_paths_is_still_a_selection() {
        let mut source = Scripted::lines(&["", "just text"]);
        assert_eq!(
            pick_files(&mut source),
            Selection::Chosen {
                paths: vec![],
                message: "just text".into(),
            }
        );
    }

    #[test]
    fn ctrl_c_cancels() {
        let mut source = Scripted(VecDeque::from([
            ReadLine::Line("a.txt".into()),
            ReadLine::Interrupted,
        ]));
        assert_eq!(pick_files(&mut source), Selection::Cancelled);

        let mut source = Scripted(VecDeque::from([
            ReadLine::Line("".into()),
            ReadLine::Interrupted,
        ]));
        assert_eq!(pick_files(&mut source), Selection::Cancelled);
    }

    #[test]
    fn eof_cancels() {
        let mut source = Scripted::lines(&["a.txt"]);
        assert_eq!(pick_files(&mut source), Selection::Cancelled);
    }

    #[test]
    fn yes_no_answers() {
        assert!(ask_yes_no(&mut Scripted::lines(&["y"]), "Reconnect?"));
        assert!(ask_yes_no(&mut Scripted::lines(&[" YES "]), "Reconnect?"));
        assert!(!ask_yes_no(&mut Scripted::lines(&["n"]), "Reconnect?"));
        assert!(!ask_yes_no(&mut Scripted::lines(&[""]), "Reconnect?"));
        assert!(!ask_yes_no(&mut Scripted(VecDeque::new()), "Reconnect?"));
    }

    #[test]
    fn unquote_only_matching_pairs() {
        assert_eq!(unquote("'x y'"), "x y");
        assert_eq!(unquote("\"x"), "\"x");
        assert_eq!(unquote("plain"), "plain");
    }
}
