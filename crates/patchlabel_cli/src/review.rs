//! Interactive review loop over stdin-style input.

use crate::view::{take_rendered, PageBuffer};
use patchlabel_core::Controller;
use std::io::{BufRead, Write};

/// One parsed review command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReviewCommand {
    Next,
    Prev,
    GoTo(u64),
    Label(u64, String),
    Delete(u64),
    Open(String),
    Show,
    Status,
    Help,
    Quit,
}

pub(crate) const REVIEW_HELP: &str = "commands: n (next)  p (prev)  g <index>  l <index> <text>  \
d <index>  o <path>  s (show)  t (status)  h (help)  q (quit)";

fn parse_index(raw: Option<&str>) -> Result<u64, String> {
    let raw = raw.ok_or_else(|| "missing index".to_string())?;
    raw.parse()
        .map_err(|_| format!("'{}' is not a record index", raw))
}

/// Parse one input line.
///
/// # Errors
/// Returns a message for unknown commands and missing or non-numeric
/// arguments.
pub(crate) fn parse_review_command(line: &str) -> Result<ReviewCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (line, ""),
    };
    let mut args = rest.splitn(2, char::is_whitespace);
    let first = args.next().filter(|arg| !arg.is_empty());
    match verb {
        "n" | "next" => Ok(ReviewCommand::Next),
        "p" | "prev" => Ok(ReviewCommand::Prev),
        "g" | "goto" => parse_index(first).map(ReviewCommand::GoTo),
        "l" | "label" => {
            let index = parse_index(first)?;
            let text = args.next().unwrap_or("").to_string();
            Ok(ReviewCommand::Label(index, text))
        }
        "d" | "delete" => parse_index(first).map(ReviewCommand::Delete),
        "o" | "open" if !rest.is_empty() => Ok(ReviewCommand::Open(rest.to_string())),
        "o" | "open" => Err("missing dataset path".to_string()),
        "s" | "show" => Ok(ReviewCommand::Show),
        "t" | "status" => Ok(ReviewCommand::Status),
        "h" | "help" | "?" => Ok(ReviewCommand::Help),
        "q" | "quit" | "exit" => Ok(ReviewCommand::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn apply(controller: &mut Controller, command: ReviewCommand) -> Result<Option<String>, String> {
    let outcome = match command {
        ReviewCommand::Next => controller.next_page().map(|_| None),
        ReviewCommand::Prev => controller.prev_page().map(|_| None),
        ReviewCommand::GoTo(index) => controller.go_to(index).map(|_| None),
        ReviewCommand::Label(index, text) => controller
            .edit_label(index, &text)
            .map(|_| Some(format!("label {} set to {:?}", index, text))),
        ReviewCommand::Delete(index) => controller
            .mark_deleted(index)
            .map(|_| Some(format!("record {} marked deleted", index))),
        ReviewCommand::Open(path) => controller.open(&path, Some(0)).map(|_| None),
        ReviewCommand::Show => controller.show_current_page().map(|_| None),
        ReviewCommand::Status | ReviewCommand::Help | ReviewCommand::Quit => Ok(None),
    };
    outcome.map_err(|err| err.to_string())
}

/// Run the review loop until `q` or end of input.
///
/// Command errors are reported and the loop continues.
///
/// # Errors
/// Returns an error only when reading input or writing output fails.
pub(crate) fn run_review<R, W>(
    controller: &mut Controller,
    pages: &PageBuffer,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", REVIEW_HELP)?;
    write_page(&mut output, pages)?;
    write_status(&mut output, controller)?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_review_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "error: {}", message)?;
                continue;
            }
        };
        match command {
            ReviewCommand::Quit => break,
            ReviewCommand::Help => {
                writeln!(output, "{}", REVIEW_HELP)?;
                continue;
            }
            _ => {}
        }

        match apply(controller, command) {
            Ok(Some(message)) => writeln!(output, "{}", message)?,
            Ok(None) => {}
            Err(message) => writeln!(output, "error: {}", message)?,
        }
        write_page(&mut output, pages)?;
        write_status(&mut output, controller)?;
    }
    Ok(())
}

pub(crate) fn write_page<W: Write>(output: &mut W, pages: &PageBuffer) -> std::io::Result<()> {
    if let Some(lines) = take_rendered(pages) {
        if lines.is_empty() {
            writeln!(output, "(no records on this page)")?;
        }
        for line in lines {
            writeln!(output, "{}", line)?;
        }
    }
    Ok(())
}

fn write_status<W: Write>(output: &mut W, controller: &Controller) -> std::io::Result<()> {
    match controller.status_text() {
        Some(status) => writeln!(output, "[{}]", status),
        None => writeln!(output, "[no dataset open]"),
    }
}
