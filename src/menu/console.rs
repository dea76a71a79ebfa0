//! Console implementations of the picker and input box.
//!
//! A numbered list on stdout, a selection read from stdin. No highlight
//! events exist on a line-based console, so previews never fire here.

use std::io::{BufRead, Write};

use super::{InputBox, MenuItem, PickOutcome, Picker};
use crate::Result;

pub struct ConsolePicker;

impl Picker for ConsolePicker {
    fn pick(
        &mut self,
        title: &str,
        items: &[MenuItem],
        _on_highlight: &mut dyn FnMut(usize),
    ) -> Result<PickOutcome> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", title)?;
        for (index, item) in items.iter().enumerate() {
            match &item.description {
                Some(description) => {
                    writeln!(out, "  {:>3}) {}  - {}", index + 1, item.label, description)?
                }
                None => writeln!(out, "  {:>3}) {}", index + 1, item.label)?,
            }
            if let Some(detail) = &item.detail {
                for line in detail.lines() {
                    writeln!(out, "       {}", line)?;
                }
            }
        }
        write!(out, "select (empty to cancel): ")?;
        out.flush()?;
        drop(out);

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(PickOutcome::Dismissed);
        }
        match trimmed.parse::<usize>() {
            Ok(number) if (1..=items.len()).contains(&number) => {
                Ok(PickOutcome::Confirmed(number - 1))
            }
            _ => {
                eprintln!("no such item: {}", trimmed);
                Ok(PickOutcome::Dismissed)
            }
        }
    }
}

pub struct ConsoleInput;

impl InputBox for ConsoleInput {
    fn input(
        &mut self,
        prompt: &str,
        initial: &str,
        validate: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Result<Option<String>> {
        let stdin = std::io::stdin();
        loop {
            if initial.is_empty() {
                print!("{}: ", prompt);
            } else {
                print!("{} [{}]: ", prompt, initial);
            }
            std::io::stdout().flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let text = line.trim_end_matches('\n');
            if text.is_empty() {
                return Ok(None);
            }
            match validate(text) {
                Some(message) => eprintln!("{}", message),
                None => return Ok(Some(text.to_string())),
            }
        }
    }
}
