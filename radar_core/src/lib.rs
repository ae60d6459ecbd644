//! Core model for the market context radar.
//!
//! Placement, item storage, history, spreadsheet row validation, chart layout
//! and export rendering. Everything here is synchronous and free of terminal
//! or network concerns; [`RadarState`] ties the pieces together.

pub mod chart;
pub mod config;
pub mod export;
pub mod geometry;
pub mod history;
pub mod import;
pub mod lists;
pub mod state;
pub mod store;

pub use chart::{Bubble, Point, RadarScene, Ring};
pub use config::{
    load_radar_config_from_env, ConfigError, Corner, RadarConfig, RadarConfigMetadata,
    CONFIG_PATH_ENV,
};
pub use export::{
    capture_region, encode_pdf, encode_png, export_filename, export_to_dir, ExportError,
    ExportKind, ExportSnapshot,
};
pub use geometry::{place, polar_of, polar_to_position};
pub use history::{History, HistoryError};
pub use import::{parse_rows, ImportError, REQUIRED_COLUMNS};
pub use lists::{category_list, CategoryList, LEFT_COLUMN, RIGHT_COLUMN};
pub use state::{
    ExportTicket, InsightStatus, InsightTicket, InsightView, RadarState, DEFAULT_SUBTITLE,
    DEFAULT_TITLE,
};
pub use store::{group_by_category, ItemStore, Layout};
