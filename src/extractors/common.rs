//! Helpers shared by extractors: value coercion, volume checks, per-source dedupe

use super::SkipReason;
use crate::catalog::BuildVolume;
use serde_json::Value;
use std::collections::HashSet;

/// Slicer beds narrower than this are treated as bogus definitions
pub const MIN_BED_SIZE_MM: f64 = 10.0;

/// Reads a number from a JSON value that may be a number, a numeric string,
/// or a single-element array of either
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("mm").trim().parse().ok(),
        Value::Array(items) => items.first().and_then(coerce_f64),
        _ => None,
    }
}

/// Width and depth of a bed polygon given as `"XxY"` points
///
/// Accepts a JSON array of point strings or a single comma-separated string.
/// Returns `None` when fewer than four points parse.
pub fn polygon_extent(value: &Value) -> Option<(f64, f64)> {
    let points: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => return None,
    };

    let parsed: Vec<(f64, f64)> = points.iter().filter_map(|p| parse_point(p)).collect();
    if parsed.len() < 4 {
        return None;
    }

    let (min_x, max_x, min_y, max_y) = parsed.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_x, max_x, min_y, max_y), &(x, y)| {
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    );

    Some((max_x - min_x, max_y - min_y))
}

fn parse_point(point: &str) -> Option<(f64, f64)> {
    let (x, y) = point.trim().split_once(['x', 'X'])?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Builds a volume, reporting the first missing or non-positive axis
pub fn checked_volume(
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
) -> Result<BuildVolume, SkipReason> {
    let x = x.ok_or(SkipReason::MissingVolume("x"))?;
    let y = y.ok_or(SkipReason::MissingVolume("y"))?;
    let z = z.ok_or(SkipReason::MissingVolume("z"))?;

    let volume = BuildVolume::new(x, y, z);
    if let Some(axis) = volume.invalid_axis() {
        let value = match axis {
            "x" => volume.x,
            "y" => volume.y,
            _ => volume.z,
        };
        return Err(SkipReason::InvalidVolume { axis, value });
    }

    Ok(volume)
}

/// Rejects slicer profiles whose bed width is below [`MIN_BED_SIZE_MM`]
pub fn check_bed_width(volume: &BuildVolume) -> Result<(), SkipReason> {
    if volume.x < MIN_BED_SIZE_MM {
        return Err(SkipReason::TooSmall {
            axis: "x",
            value: volume.x,
        });
    }
    Ok(())
}

/// Case-insensitive brand/model set used to drop repeats within one source
#[derive(Debug, Default)]
pub struct SeenModels {
    keys: HashSet<String>,
}

impl SeenModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if this brand/model was already recorded
    pub fn insert(&mut self, brand: &str, model: &str) -> bool {
        self.keys
            .insert(format!("{}|{}", brand.to_lowercase(), model.to_lowercase()))
    }
}
