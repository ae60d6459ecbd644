//! Static chart geometry and export settings.
//!
//! Loaded from `radar_config.json` with support for an environment variable
//! override. Every category and impact level has exactly one entry, so wedge
//! and band lookups cannot fail once a config has been constructed.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use radar_schema::{Category, Impact, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::A4_LANDSCAPE_MM;

pub const BUILTIN_RADAR_CONFIG: &str = include_str!("data/radar_config.json");
pub const CONFIG_PATH_ENV: &str = "RADAR_CONFIG_PATH";

/// Root configuration for the radar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub seed: u64,
    /// Bubble radius as a fraction of the chart side.
    pub bubble_radius: f64,
    pub categories: CategoryTable,
    pub impacts: ImpactTable,
    pub export: ExportSettings,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            seed: 20240611,
            bubble_radius: 0.0185,
            categories: CategoryTable::default(),
            impacts: ImpactTable::default(),
            export: ExportSettings::default(),
        }
    }
}

impl RadarConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_RADAR_CONFIG).expect("builtin radar config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RadarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        RadarConfig::from_json_str(&contents)
    }

    pub fn category(&self, category: Category) -> &CategoryStyle {
        self.categories.get(category)
    }

    pub fn impact(&self, impact: Impact) -> &ImpactBand {
        self.impacts.get(impact)
    }

    /// Checks the geometric invariants placement relies on.
    ///
    /// Wedges must be non-empty, lie within `[0, 360]` and be pairwise
    /// disjoint; they are not required to cover the whole circle. Bands must
    /// be non-empty, stay inside the chart and be strictly nested from Near
    /// outwards.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in Category::ALL {
            let [min, max] = self.category(category).angle_range;
            if !(min.is_finite() && max.is_finite()) || min < 0.0 || max > 360.0 {
                return Err(ConfigError::WedgeOutOfRange { category, min, max });
            }
            if min >= max {
                return Err(ConfigError::EmptyWedge { category, min, max });
            }
        }
        for (index, first) in Category::ALL.iter().enumerate() {
            for second in &Category::ALL[index + 1..] {
                let [a0, a1] = self.category(*first).angle_range;
                let [b0, b1] = self.category(*second).angle_range;
                if a0 < b1 && b0 < a1 {
                    return Err(ConfigError::OverlappingWedges {
                        first: *first,
                        second: *second,
                    });
                }
            }
        }

        let mut previous: Option<(Impact, f64)> = None;
        for impact in Impact::ALL {
            let [min, max] = self.impact(impact).radius_range;
            if !(min.is_finite() && max.is_finite()) || min < 0.0 || max > 50.0 {
                return Err(ConfigError::BandOutOfRange { impact, min, max });
            }
            if min >= max {
                return Err(ConfigError::EmptyBand { impact, min, max });
            }
            if let Some((inner, inner_max)) = previous {
                if min < inner_max {
                    return Err(ConfigError::BandsOutOfOrder {
                        inner,
                        outer: impact,
                    });
                }
            }
            previous = Some((impact, max));
        }

        if !(self.bubble_radius > 0.0 && self.bubble_radius < 0.25) {
            return Err(ConfigError::InvalidBubbleRadius(self.bubble_radius));
        }
        if self.export.scale == 0 || self.export.scale > 8 {
            return Err(ConfigError::InvalidExportScale(self.export.scale));
        }
        let margin = self.export.page_margin_mm;
        let max_margin = A4_LANDSCAPE_MM.0.min(A4_LANDSCAPE_MM.1) / 2.0;
        if !(margin.is_finite() && margin >= 0.0 && margin < max_margin) {
            return Err(ConfigError::InvalidPageMargin {
                margin,
                max: max_margin,
            });
        }
        Ok(())
    }
}

/// Corner of the chart a quadrant label is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn is_right(self) -> bool {
        matches!(self, Corner::TopRight | Corner::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::BottomRight)
    }
}

/// Presentation and wedge for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub label: String,
    pub color: Rgb,
    /// Half-open `[min, max)` in degrees, counter-clockwise from the positive x axis.
    pub angle_range: [f64; 2],
    pub label_corner: Corner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(rename = "macro")]
    pub macro_environment: CategoryStyle,
    pub competition: CategoryStyle,
    pub buyer: CategoryStyle,
    pub technology: CategoryStyle,
}

impl CategoryTable {
    pub fn get(&self, category: Category) -> &CategoryStyle {
        match category {
            Category::Macro => &self.macro_environment,
            Category::Competition => &self.competition,
            Category::Buyer => &self.buyer,
            Category::Technology => &self.technology,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let style = |category: Category, color: Rgb, angle_range: [f64; 2], corner: Corner| {
            CategoryStyle {
                label: category.label().to_string(),
                color,
                angle_range,
                label_corner: corner,
            }
        };
        Self {
            macro_environment: style(
                Category::Macro,
                Rgb(0x47, 0xa1, 0xad),
                [190.0, 260.0],
                Corner::BottomLeft,
            ),
            competition: style(
                Category::Competition,
                Rgb(0xf2, 0x61, 0x7a),
                [280.0, 350.0],
                Corner::BottomRight,
            ),
            buyer: style(
                Category::Buyer,
                Rgb(0xcc, 0x85, 0x0a),
                [100.0, 170.0],
                Corner::TopLeft,
            ),
            technology: style(
                Category::Technology,
                Rgb(0x6b, 0x9e, 0x78),
                [10.0, 80.0],
                Corner::TopRight,
            ),
        }
    }
}

/// Radial band for one impact horizon, in percent of the chart side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactBand {
    pub label: String,
    pub radius_range: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactTable {
    pub near: ImpactBand,
    pub medium: ImpactBand,
    pub long: ImpactBand,
}

impl ImpactTable {
    pub fn get(&self, impact: Impact) -> &ImpactBand {
        match impact {
            Impact::Near => &self.near,
            Impact::Medium => &self.medium,
            Impact::Long => &self.long,
        }
    }
}

impl Default for ImpactTable {
    fn default() -> Self {
        let band = |label: &str, radius_range: [f64; 2]| ImpactBand {
            label: label.to_string(),
            radius_range,
        };
        Self {
            near: band("Near-term impact", [5.0, 16.0]),
            medium: band("Medium-term impact", [18.0, 32.0]),
            long: band("Longer-term impact", [35.0, 49.0]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Raster scale factor applied to the capture region.
    pub scale: u32,
    pub page_margin_mm: f32,
    pub background: Rgb,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 2,
            page_margin_mm: 15.0,
            background: Rgb::WHITE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse radar config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read radar config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("wedge for {category} must lie within [0, 360], got [{min}, {max})")]
    WedgeOutOfRange { category: Category, min: f64, max: f64 },
    #[error("wedge for {category} is empty: [{min}, {max})")]
    EmptyWedge { category: Category, min: f64, max: f64 },
    #[error("wedges for {first} and {second} overlap")]
    OverlappingWedges { first: Category, second: Category },
    #[error("band for {impact} must lie within [0, 50], got [{min}, {max})")]
    BandOutOfRange { impact: Impact, min: f64, max: f64 },
    #[error("band for {impact} is empty: [{min}, {max})")]
    EmptyBand { impact: Impact, min: f64, max: f64 },
    #[error("band for {outer} must start outside the band for {inner}")]
    BandsOutOfOrder { inner: Impact, outer: Impact },
    #[error("bubble radius {0} must be in (0, 0.25)")]
    InvalidBubbleRadius(f64),
    #[error("export scale {0} must be between 1 and 8")]
    InvalidExportScale(u32),
    #[error("page margin {margin} mm must be at least 0 and below {max} mm")]
    InvalidPageMargin { margin: f32, max: f32 },
}

/// Metadata about where the active configuration came from.
#[derive(Debug, Clone)]
pub struct RadarConfigMetadata {
    path: Option<PathBuf>,
}

impl RadarConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the radar configuration from an explicit path, `RADAR_CONFIG_PATH`,
/// or the builtin defaults, in that order.
pub fn load_radar_config_from_env(
    override_path: Option<&Path>,
) -> (Arc<RadarConfig>, RadarConfigMetadata) {
    let candidate = override_path
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

    if let Some(path) = candidate {
        match RadarConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "market_radar::config",
                    path = %path.display(),
                    "radar_config.loaded=file"
                );
                return (Arc::new(config), RadarConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "market_radar::config",
                    path = %path.display(),
                    error = %err,
                    "radar_config.load_failed"
                );
            }
        }
    }

    let config = RadarConfig::builtin();
    tracing::info!(target: "market_radar::config", "radar_config.loaded=builtin");
    (config, RadarConfigMetadata::new(None))
}
