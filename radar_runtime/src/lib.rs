//! Runtime adapters for the market radar.
//!
//! Everything that touches the outside world lives here: the generative-text
//! client behind the insight modal, spreadsheet reading for imports, and the
//! text parser for the inspector's command prompt. `radar_core` stays
//! synchronous and pure.

pub mod command_text;
pub mod insight;
pub mod workbook;

pub use command_text::{parse_command_line, CommandParseError, InspectorCommand, COMMAND_HELP};
pub use insight::{
    get_insight, insight_prompt, GeminiClient, GeminiConfig, InsightError, TextGenerator,
    API_KEY_ENV_VARS, DEFAULT_API_BASE, DEFAULT_MODEL,
};
pub use workbook::{import_workbook, read_workbook, LoadError, WorkbookError};
