//! FDM printers from OrcaSlicer machine profiles
//!
//! Layout: `resources/profiles/<Brand>/machine/*.json`, falling back to the
//! brand directory itself when there is no `machine` folder. Profiles form an
//! `inherits` chain inside a brand; volume fields are looked up along it so
//! nozzle variants that only override a few keys still resolve.

use super::common::{
    check_bed_width, checked_volume, coerce_f64, polygon_extent, SeenModels,
};
use super::{ExtractError, Extraction, PrinterExtractor, SkipReason};
use crate::catalog::{PrinterEntry, Source};
use crate::upstream::{FetchError, GitHubRepo, Upstream, UpstreamEntry};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

pub const PROFILES_PATH: &str = "resources/profiles";

const MAX_INHERIT_DEPTH: usize = 16;

/// Upper bound on in-flight upstream requests per brand
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Names containing these are accessories or variants, not printers
const BLACKLIST_KEYWORDS: &[&str] = &[
    "hotend",
    "hot end",
    "all-metal",
    "nozzle",
    "plate",
    "kit",
    "extruder",
    "sheet",
    "smooth",
    "textured",
    "satin",
    "cool",
    "engineering",
    "high temp",
    "hardened",
    "chamber",
    "auxiliary",
];

pub fn default_repo() -> GitHubRepo {
    GitHubRepo::new("SoftFever", "OrcaSlicer", "main")
}

/// A parsed machine profile
#[derive(Debug, Clone)]
struct Profile {
    file_name: String,
    name: String,
    data: Map<String, Value>,
}

impl Profile {
    fn parse(file_name: &str, body: &str) -> Result<Self, SkipReason> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| SkipReason::Malformed(e.to_string()))?;
        let Value::Object(data) = value else {
            return Err(SkipReason::Malformed("top level is not an object".to_string()));
        };

        let name = data
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(file_name).to_string());

        Ok(Self {
            file_name: file_name.to_string(),
            name,
            data,
        })
    }

    /// Base profiles marked `"instantiation": "false"` are never shown as printers
    fn is_template(&self) -> bool {
        match self.data.get("instantiation") {
            Some(Value::String(s)) => s.eq_ignore_ascii_case("false"),
            Some(Value::Bool(b)) => !b,
            _ => false,
        }
    }

    fn parent(&self) -> Option<&str> {
        self.data
            .get("inherits")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Profiles of one brand, indexed by name for `inherits` resolution
struct BrandProfiles {
    profiles: Vec<Profile>,
    by_name: HashMap<String, usize>,
}

impl BrandProfiles {
    fn new(profiles: Vec<Profile>) -> Self {
        let mut by_name = HashMap::new();
        for (idx, profile) in profiles.iter().enumerate() {
            by_name.entry(profile.name.clone()).or_insert(idx);
        }
        Self { profiles, by_name }
    }

    /// Looks a key up on the profile, then along its `inherits` chain
    fn lookup<'a>(&'a self, profile: &'a Profile, key: &str) -> Option<&'a Value> {
        let mut current = profile;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Some(value) = current.data.get(key) {
                return Some(value);
            }
            let parent = current.parent()?;
            current = &self.profiles[*self.by_name.get(parent)?];
        }
        None
    }

    fn volume(&self, profile: &Profile) -> (Option<f64>, Option<f64>, Option<f64>) {
        let (mut x, mut y) = match self
            .lookup(profile, "printable_area")
            .and_then(polygon_extent)
        {
            Some((w, d)) if w > 0.0 => (Some(w), Some(d)),
            _ => (None, None),
        };
        if x.is_none() {
            x = self.lookup(profile, "bed_width").and_then(coerce_f64);
            y = self.lookup(profile, "bed_depth").and_then(coerce_f64);
        }

        let z = self
            .lookup(profile, "printable_height")
            .and_then(coerce_f64)
            .or_else(|| {
                self.lookup(profile, "machine_max_print_height")
                    .and_then(coerce_f64)
            });

        (x, y, z)
    }

    fn is_machine(&self, profile: &Profile) -> bool {
        self.lookup(profile, "printable_area").is_some()
            || self.lookup(profile, "printable_height").is_some()
    }
}

pub struct OrcaSlicerExtractor {
    upstream: Arc<dyn Upstream>,
    resolve_images: bool,
}

impl OrcaSlicerExtractor {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            resolve_images: true,
        }
    }

    pub fn with_images(mut self, resolve_images: bool) -> Self {
        self.resolve_images = resolve_images;
        self
    }

    async fn brands(&self) -> Result<Vec<String>, FetchError> {
        let entries = self.upstream.list_dir(PROFILES_PATH).await?;
        Ok(entries
            .into_iter()
            .filter(UpstreamEntry::is_dir)
            .map(|e| e.name)
            .collect())
    }

    async fn machine_files(&self, brand: &str) -> Result<Vec<UpstreamEntry>, FetchError> {
        let machine_dir = format!("{}/{}/machine", PROFILES_PATH, brand);
        let entries = match self.upstream.list_dir(&machine_dir).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                self.upstream
                    .list_dir(&format!("{}/{}", PROFILES_PATH, brand))
                    .await?
            }
            Err(e) => return Err(e),
        };

        Ok(entries
            .into_iter()
            .filter(|e| e.is_file() && e.name.ends_with(".json"))
            .collect())
    }

    async fn load_profiles(
        &self,
        files: &[UpstreamEntry],
        extraction: &mut Extraction,
    ) -> Vec<Profile> {
        let reads: Vec<_> = files.iter().map(|f| self.upstream.read_text(&f.path)).collect();
        let bodies: Vec<_> = stream::iter(reads)
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;

        let mut profiles = Vec::with_capacity(files.len());
        for (file, body) in files.iter().zip(bodies) {
            let parsed = body
                .map_err(|e| SkipReason::Unreadable(e.to_string()))
                .and_then(|body| Profile::parse(&file.name, &body));
            match parsed {
                Ok(profile) => profiles.push(profile),
                Err(reason) => extraction.skip(file.path.clone(), reason),
            }
        }
        profiles
    }

    /// Turns one brand's profiles into entries, without image URLs
    fn brand_entries(
        brand: &str,
        profiles: &BrandProfiles,
        seen: &mut SeenModels,
        extraction: &mut Extraction,
    ) -> Vec<PrinterEntry> {
        let mut entries = Vec::new();

        for profile in &profiles.profiles {
            if profile.is_template() || !profiles.is_machine(profile) {
                debug!(brand, file = %profile.file_name, "Not a printer definition");
                continue;
            }

            let raw_name = profiles
                .lookup(profile, "printer_model")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(profile.name.as_str());

            let model = base_model_name(raw_name, brand);
            if model.is_empty() {
                extraction.skip(
                    profile.file_name.clone(),
                    SkipReason::Malformed("empty model name".to_string()),
                );
                continue;
            }

            // Checked after nozzle suffixes are gone
            if is_blacklisted(&model) {
                extraction.skip(raw_name, SkipReason::Blacklisted);
                continue;
            }

            let (x, y, z) = profiles.volume(profile);
            let checked = checked_volume(x, y, z)
                .and_then(|volume| check_bed_width(&volume).map(|_| volume));
            let volume = match checked {
                Ok(volume) => volume,
                Err(reason) => {
                    extraction.skip(format!("{} {}", brand, model), reason);
                    continue;
                }
            };

            if !seen.insert(brand, &model) {
                extraction.skip(format!("{} {}", brand, model), SkipReason::Duplicate);
                continue;
            }

            entries.push(PrinterEntry::new(brand, model, Source::OrcaSlicer, volume));
        }

        entries
    }

    async fn find_image(&self, brand: &str, model: &str) -> Option<String> {
        let spaced = format!("{} {}", brand, model);
        let candidates = [
            format!("{}/{}/{}_cover.png", PROFILES_PATH, brand, spaced),
            format!(
                "{}/{}/{}_cover.png",
                PROFILES_PATH,
                brand,
                spaced.replace(' ', "_")
            ),
        ];

        for candidate in &candidates {
            if let Some(url) = self.upstream.public_url(candidate).await {
                return Some(url);
            }
        }
        None
    }
}

#[async_trait]
impl PrinterExtractor for OrcaSlicerExtractor {
    fn source(&self) -> Source {
        Source::OrcaSlicer
    }

    fn upstream(&self) -> String {
        self.upstream.describe()
    }

    async fn extract(&self) -> Result<Extraction, ExtractError> {
        info!(upstream = %self.upstream.describe(), "Extracting FDM printers from OrcaSlicer");

        let brands = self.brands().await?;
        info!("Found {} brands", brands.len());

        let mut extraction = Extraction::new(Source::OrcaSlicer);
        let mut seen = SeenModels::new();

        for brand in &brands {
            let files = match self.machine_files(brand).await {
                Ok(files) => files,
                Err(e) => {
                    warn!(brand = %brand, error = %e, "Skipping brand, cannot list profiles");
                    continue;
                }
            };

            let profiles = BrandProfiles::new(self.load_profiles(&files, &mut extraction).await);
            let mut entries = Self::brand_entries(brand, &profiles, &mut seen, &mut extraction);

            if self.resolve_images {
                let lookups: Vec<_> = entries
                    .iter()
                    .map(|e| self.find_image(&e.brand, &e.model))
                    .collect();
                let images: Vec<_> = stream::iter(lookups)
                        .buffered(MAX_CONCURRENT_REQUESTS)
                        .collect()
                        .await;
                for (entry, image) in entries.iter_mut().zip(images) {
                    entry.image_url = image;
                }
            }

            debug!(brand = %brand, printers = entries.len(), "Brand processed");
            for entry in entries {
                extraction.push(entry);
            }
        }

        if extraction.entries.is_empty() {
            return Err(ExtractError::NoData(Source::OrcaSlicer));
        }

        info!(
            printers = extraction.entries.len(),
            skipped = extraction.skipped_count(),
            "Extracted FDM printers"
        );
        Ok(extraction)
    }
}

pub fn is_blacklisted(name: &str) -> bool {
    let lower = name.to_lowercase();
    BLACKLIST_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Strips the brand prefix and nozzle annotations from a profile name
pub fn base_model_name(raw: &str, brand: &str) -> String {
    static NOZZLE_SUFFIX: OnceLock<Regex> = OnceLock::new();
    static NOZZLE_NOTE: OnceLock<Regex> = OnceLock::new();

    let mut name = raw.trim();
    if let (Some(prefix), Some(rest)) = (name.get(..brand.len()), name.get(brand.len()..)) {
        if prefix.eq_ignore_ascii_case(brand) && rest.starts_with(' ') {
            name = rest.trim();
        }
    }

    let suffix = NOZZLE_SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)\s+\d+(\.\d+)?\s*(mm)?\s*nozzle").expect("valid nozzle suffix regex")
    });
    let note = NOZZLE_NOTE
        .get_or_init(|| Regex::new(r"(?i)\s*\(.*nozzle.*\)").expect("valid nozzle note regex"));

    let name = suffix.replace_all(name, "");
    let name = note.replace_all(&name, "");
    name.trim().to_string()
}

fn file_stem(file_name: &str) -> &str {
    file_name.strip_suffix(".json").unwrap_or(file_name)
}
