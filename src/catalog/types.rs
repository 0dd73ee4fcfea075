//! Unified printer record types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Printing technology of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Technology {
    /// Filament (fused deposition modeling)
    #[serde(rename = "FDM")]
    Fdm,
    /// Resin (SLA/DLP/MSLA)
    #[serde(rename = "SLA")]
    Sla,
}

impl Technology {
    pub const ALL: [Technology; 2] = [Technology::Fdm, Technology::Sla];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Fdm => "FDM",
            Technology::Sla => "SLA",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream project an entry was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    OrcaSlicer,
    #[serde(rename = "UVtools")]
    UvTools,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::OrcaSlicer, Source::UvTools];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::OrcaSlicer => "OrcaSlicer",
            Source::UvTools => "UVtools",
        }
    }

    /// Technology every entry of this source carries
    pub fn technology(&self) -> Technology {
        match self {
            Source::OrcaSlicer => Technology::Fdm,
            Source::UvTools => Technology::Sla,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build volume in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildVolume {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BuildVolume {
    /// Creates a volume with every axis rounded to 0.01 mm
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: round2(x),
            y: round2(y),
            z: round2(z),
        }
    }

    /// Name of the first axis that is not a finite positive length
    pub fn invalid_axis(&self) -> Option<&'static str> {
        [("x", self.x), ("y", self.y), ("z", self.z)]
            .into_iter()
            .find(|(_, v)| !v.is_finite() || *v <= 0.0)
            .map(|(axis, _)| axis)
    }
}

/// One printer in the unified catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterEntry {
    pub brand: String,
    pub model: String,
    pub technology: Technology,
    pub volume: BuildVolume,
    pub image_url: Option<String>,
    pub source: Source,
}

impl PrinterEntry {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        source: Source,
        volume: BuildVolume,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            technology: source.technology(),
            volume,
            image_url: None,
            source,
        }
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Identity used for deduplication across the whole catalog
    pub fn catalog_key(&self) -> CatalogKey {
        CatalogKey::new(&self.brand, &self.model, self.technology)
    }
}

/// Normalized (brand, model, technology) identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    brand: String,
    model: String,
    technology: Technology,
}

impl CatalogKey {
    pub fn new(brand: &str, model: &str, technology: Technology) -> Self {
        Self {
            brand: normalize_name(brand),
            model: normalize_name(model),
            technology,
        }
    }
}

/// Lowercases, trims and folds spaces and hyphens to underscores
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
