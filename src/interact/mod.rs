use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process::Command;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Error type for terminal interaction
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("interrupted")]
    Interrupted,
    #[error("end of input")]
    Eof,
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Scoped raw-mode guard. Raw mode is released on drop, so every exit path
/// out of a single-keystroke read, early return or error alike, restores
/// the terminal.
struct RawMode;

impl RawMode {
    fn enable() -> Result<RawMode, InputError> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Other,
}

/// Read exactly one keystroke in raw mode. Ctrl-C surfaces as
/// `InputError::Interrupted` rather than killing the process, so callers can
/// unwind cleanly with the terminal already restored.
pub fn getch() -> Result<Key, InputError> {
    let _guard = RawMode::enable()?;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Err(InputError::Interrupted);
            }
            return Ok(match key.code {
                KeyCode::Char(c) => Key::Char(c),
                KeyCode::Enter => Key::Enter,
                _ => Key::Other,
            });
        }
    }
}

/// Ask a yes/no question answered with a single keystroke. Enter takes the
/// default; anything other than y/n/Enter reprints the prompt and retries.
pub fn prompt_for_confirmation(message: &str, default: bool) -> Result<bool, InputError> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        print!("{} {} ", message, hint);
        io::stdout().flush()?;
        let key = getch()?;
        println!();
        match key {
            Key::Char('y') | Key::Char('Y') => return Ok(true),
            Key::Char('n') | Key::Char('N') => return Ok(false),
            Key::Enter => return Ok(default),
            _ => continue,
        }
    }
}

// Home row first, then the rest of the alphabet, then digits. 36 keys caps
// the number of options a single keystroke can address.
const HOME_ROW: &str = "asdfghjkl";

pub fn selection_keys() -> Vec<char> {
    let mut keys: Vec<char> = HOME_ROW.chars().collect();
    keys.extend(('a'..='z').filter(|c| !HOME_ROW.contains(*c)));
    keys.extend('0'..='9');
    keys
}

/// Present options each bound to a single key, then read one raw keystroke.
/// Returns the index of the chosen option, or None when the key is unbound.
/// Empty input yields None without reading anything. Callers must pass at
/// most 36 options.
pub fn single_select(options: &[String]) -> Result<Option<usize>, InputError> {
    if options.is_empty() {
        return Ok(None);
    }
    let keys = selection_keys();
    debug_assert!(options.len() <= keys.len());
    for (key, option) in keys.iter().zip(options) {
        println!("[{}] {}", key, option);
    }
    print!("choose> ");
    io::stdout().flush()?;
    let key = getch()?;
    println!();
    match key {
        Key::Char(c) => Ok(keys
            .iter()
            .take(options.len())
            .position(|k| *k == c)),
        _ => Ok(None),
    }
}

/// Present options by numeric index and read one line of comma- or
/// space-delimited indices. Malformed input reprints and retries.
pub fn multiple_select(options: &[String]) -> Result<Vec<usize>, InputError> {
    if options.is_empty() {
        return Ok(Vec::new());
    }
    for (i, option) in options.iter().enumerate() {
        println!("[{}] {}", i, option);
    }
    loop {
        let line = match prompt_line("choose (e.g. 0,2)> ")? {
            Some(line) => line,
            None => return Ok(Vec::new()),
        };
        let parsed: Result<Vec<usize>, _> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect();
        match parsed {
            Ok(indices) if indices.iter().all(|i| *i < options.len()) => return Ok(indices),
            _ => println!("could not parse that selection, try again"),
        }
    }
}

/// Print a prompt and read one line. Returns None for a blank line and
/// `InputError::Eof` when stdin is closed.
pub fn prompt_line(prompt: &str) -> Result<Option<String>, InputError> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    let n = io::stdin().lock().read_line(&mut line)?;
    if n == 0 {
        return Err(InputError::Eof);
    }
    let line = line.trim();
    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line.to_string()))
    }
}

/// Collect a block of text via $EDITOR, seeded with `initial`. Falls back to
/// a plain line prompt when no editor is configured.
pub fn edit_text(initial: &str) -> Result<Option<String>, InputError> {
    let editor = match env::var("EDITOR") {
        Ok(e) if !e.is_empty() => e,
        _ => return prompt_line("> "),
    };
    let file = tempfile::Builder::new()
        .prefix("kard-")
        .suffix(".md")
        .tempfile()?;
    fs::write(file.path(), initial)?;
    let status = Command::new(&editor).arg(file.path()).status()?;
    if !status.success() {
        return Ok(None);
    }
    let text = fs::read_to_string(file.path())?;
    let text = text.trim_end();
    if text.is_empty() || text == initial.trim_end() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selection_keys_count_and_uniqueness() {
        let keys = selection_keys();
        assert_eq!(keys.len(), 36);
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 36);
    }

    #[test]
    fn test_selection_keys_home_row_first() {
        let keys = selection_keys();
        assert_eq!(&keys[..9], &['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l']);
        // Remaining letters come in alphabetical order before digits.
        assert_eq!(keys[9], 'b');
        assert_eq!(keys[26], '0');
        assert_eq!(keys[35], '9');
    }

    #[test]
    fn test_single_select_empty_returns_none_without_blocking() {
        assert!(single_select(&[]).unwrap().is_none());
    }

    #[test]
    fn test_multiple_select_empty_returns_empty_without_blocking() {
        assert!(multiple_select(&[]).unwrap().is_empty());
    }
}
