// ============================================================
// Layer 4 — Manifest Loader
// ============================================================
// Loads the labelled photo collection from a directory shaped as:
//
//   <root>/labels.json   — the label manifest (see ManifestEntry)
//   <root>/<image files> — photos referenced by the manifest
//
// Each manifest entry carries all three label parts for one
// photo; the loader decodes the image, runs the preprocessing
// transform, and pairs pixels with a LabelBundle. A manifest
// entry naming an unknown attribute or an unreadable image fails
// the whole load — partial datasets would silently skew training.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data::dataset::AestheticSample;
use crate::data::transform::{self, CROP_TO};
use crate::domain::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::domain::labels::LabelBundle;

/// One row of the label manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Image file name, relative to the manifest directory.
    pub image: String,
    /// Binary aesthetic judgment.
    pub binary: bool,
    /// Integer rating in 1..=10, stored as a one-hot histogram.
    pub score: u8,
    /// Names of the attributes that hold for this photo.
    #[serde(default)]
    pub attributes: Vec<String>,
}

pub struct ManifestLoader {
    root: PathBuf,
    /// Seed for the random-crop augmentation, so a run's dataset
    /// is reproducible end to end.
    seed: u64,
}

impl ManifestLoader {
    pub fn new(root: impl Into<PathBuf>, seed: u64) -> Self {
        Self { root: root.into(), seed }
    }

    /// Load every manifest entry into a preprocessed sample.
    pub fn load_all(&self) -> Result<Vec<AestheticSample>> {
        let manifest_path = self.root.join("labels.json");
        let manifest = fs::read_to_string(&manifest_path)
            .with_context(|| format!("cannot read label manifest '{}'", manifest_path.display()))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&manifest)
            .with_context(|| format!("malformed label manifest '{}'", manifest_path.display()))?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(entries.len());

        for entry in &entries {
            let image_path = self.root.join(&entry.image);
            let image = image::open(&image_path)
                .with_context(|| format!("cannot decode image '{}'", image_path.display()))?;
            let pixels = transform::prepare(&image, &mut rng);

            let labels = LabelBundle::from_rating(
                entry.binary,
                entry.score,
                attribute_flags(&entry.attributes)?,
            )
            .with_context(|| format!("bad labels for '{}'", entry.image))?;

            samples.push(AestheticSample { pixels, size: CROP_TO as usize, labels });
        }

        tracing::info!("Loaded {} labelled photos from '{}'", samples.len(), self.root.display());
        Ok(samples)
    }
}

/// Turn a list of attribute names into schema-ordered flags.
fn attribute_flags(names: &[String]) -> Result<[bool; ATTRIBUTE_COUNT]> {
    let mut flags = [false; ATTRIBUTE_COUNT];
    for name in names {
        match Attribute::from_name(name) {
            Some(attribute) => flags[attribute.index()] = true,
            None => bail!("unknown attribute '{name}' in manifest"),
        }
    }
    Ok(flags)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_photo(dir: &TempDir, name: &str) {
        let img = image::RgbImage::from_pixel(64, 48, image::Rgb([10, 200, 30]));
        img.save(dir.path().join(name)).unwrap();
    }

    #[test]
    fn loads_entries_with_labels_and_pixels() {
        let dir = TempDir::new().unwrap();
        write_photo(&dir, "a.png");
        fs::write(
            dir.path().join("labels.json"),
            r#"[{"image": "a.png", "binary": true, "score": 8,
                 "attributes": ["lighting", "symmetry"]}]"#,
        )
        .unwrap();

        let samples = ManifestLoader::new(dir.path(), 42).load_all().unwrap();
        assert_eq!(samples.len(), 1);

        let sample = &samples[0];
        assert_eq!(sample.size, CROP_TO as usize);
        assert_eq!(sample.pixels.len(), 3 * sample.size * sample.size);
        assert!(sample.labels.binary);
        assert_eq!(sample.labels.score[7], 1.0);
        assert!(sample.labels.attributes[Attribute::Lighting.index()]);
        assert!(sample.labels.attributes[Attribute::Symmetry.index()]);
        assert!(!sample.labels.attributes[Attribute::Content.index()]);
    }

    #[test]
    fn unknown_attribute_name_fails_the_load() {
        let dir = TempDir::new().unwrap();
        write_photo(&dir, "a.png");
        fs::write(
            dir.path().join("labels.json"),
            r#"[{"image": "a.png", "binary": false, "score": 4, "attributes": ["bokeh"]}]"#,
        )
        .unwrap();

        let err = ManifestLoader::new(dir.path(), 42).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("unknown attribute 'bokeh'"));
    }

    #[test]
    fn missing_image_file_fails_the_load() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"[{"image": "missing.png", "binary": false, "score": 4}]"#,
        )
        .unwrap();

        let err = ManifestLoader::new(dir.path(), 42).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("missing.png"));
    }
}
