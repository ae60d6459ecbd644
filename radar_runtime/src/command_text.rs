use std::num::ParseIntError;
use std::path::PathBuf;

use radar_core::ExportKind;
use thiserror::Error;

/// Commands accepted by the inspector's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorCommand {
    Import { path: PathBuf },
    Export { kind: ExportKind },
    Title(String),
    Subtitle(String),
    Checkpoint(String),
    Revert { index: usize },
    Insight { id: i64 },
    CloseInsight,
    Dismiss,
    Help,
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid export format '{0}' (expected png or pdf)")]
    InvalidExportFormat(String),
}

pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("import <path>", "load items from a .csv/.xlsx/.xls/.ods file"),
    ("export png|pdf", "write the current view to the export directory"),
    ("title <text>", "rename the radar"),
    ("subtitle <text>", "change the subtitle"),
    ("checkpoint [name]", "save the current items to history"),
    ("revert <index>", "restore a history checkpoint"),
    ("insight <id>", "ask for commentary on an item"),
    ("close", "close the insight panel"),
    ("dismiss", "clear the error banner"),
];

pub fn parse_command_line(input: &str) -> Result<InspectorCommand, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };
    let rest_or = |name: &'static str| {
        if rest.is_empty() {
            Err(CommandParseError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "import" | "open" => Ok(InspectorCommand::Import {
            path: PathBuf::from(rest_or("path")?),
        }),
        "export" | "download" => {
            let format = rest
                .split_whitespace()
                .next()
                .ok_or(CommandParseError::MissingArgument("format"))?;
            let kind = match format.to_ascii_lowercase().as_str() {
                "png" => ExportKind::Png,
                "pdf" => ExportKind::Pdf,
                other => return Err(CommandParseError::InvalidExportFormat(other.to_string())),
            };
            Ok(InspectorCommand::Export { kind })
        }
        "title" => Ok(InspectorCommand::Title(rest_or("title")?)),
        "subtitle" => Ok(InspectorCommand::Subtitle(rest_or("subtitle")?)),
        "checkpoint" | "save" => Ok(InspectorCommand::Checkpoint(rest.to_string())),
        "revert" | "restore" => {
            let index_str = rest
                .split_whitespace()
                .next()
                .ok_or(CommandParseError::MissingArgument("index"))?;
            let index = index_str
                .parse::<usize>()
                .map_err(|source| CommandParseError::InvalidInteger {
                    value: index_str.to_string(),
                    context: "revert index",
                    source,
                })?;
            Ok(InspectorCommand::Revert { index })
        }
        "insight" => {
            let id_str = rest
                .split_whitespace()
                .next()
                .ok_or(CommandParseError::MissingArgument("id"))?;
            let id = id_str
                .parse::<i64>()
                .map_err(|source| CommandParseError::InvalidInteger {
                    value: id_str.to_string(),
                    context: "insight id",
                    source,
                })?;
            Ok(InspectorCommand::Insight { id })
        }
        "close" => Ok(InspectorCommand::CloseInsight),
        "dismiss" => Ok(InspectorCommand::Dismiss),
        "help" | "?" => Ok(InspectorCommand::Help),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}
