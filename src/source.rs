//! Share record sources.
//!
//! A source yields one JSON document: a reserved `keys` entry holding the
//! threshold parameters, and one entry per share keyed by its index.
//!
//! ```json
//! {
//!     "keys": { "n": 3, "k": 2 },
//!     "1": { "base": "10", "value": "4" },
//!     "2": { "base": "2", "value": "111" }
//! }
//! ```
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{decode_points, Point, Reconstruction, Scheme, ShareRecord, SssError};

pub const KEYS_ENTRY: &str = "keys";

/// Declared share count (n) and reconstruction threshold (k)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Thresholds {
    pub n: usize,
    pub k: usize,
}

/// The contents of one source: thresholds plus raw share records in document
/// order. Repeated keys are kept so the decoder can reject them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareSet {
    pub thresholds: Thresholds,
    pub records: Vec<(String, ShareRecord)>,
}

impl ShareSet {
    pub fn from_json(text: &str) -> Result<Self, SssError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn decode_points(&self) -> Result<Vec<Point>, SssError> {
        decode_points(
            self.records
                .iter()
                .map(|(index, record)| (index.as_str(), record)),
        )
    }
}

impl<'de> Deserialize<'de> for ShareSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ShareSetVisitor;

        impl<'de> Visitor<'de> for ShareSetVisitor {
            type Value = ShareSet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of share records with a `keys` entry")
            }

            fn visit_map<A>(self, mut map: A) -> Result<ShareSet, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut thresholds = None;
                let mut records = Vec::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == KEYS_ENTRY {
                        if thresholds.is_some() {
                            return Err(de::Error::duplicate_field(KEYS_ENTRY));
                        }
                        thresholds = Some(map.next_value()?);
                    } else {
                        let record: ShareRecord = map.next_value()?;
                        records.push((key, record));
                    }
                }

                let thresholds = thresholds.ok_or_else(|| de::Error::missing_field(KEYS_ENTRY))?;
                Ok(ShareSet {
                    thresholds,
                    records,
                })
            }
        }

        deserializer.deserialize_map(ShareSetVisitor)
    }
}

/// Anything that can produce a share set: a file, a socket, a document store
pub trait ShareSource {
    /// Human-readable name used in logs and error context
    fn describe(&self) -> String;
    fn load(&self) -> Result<ShareSet, SssError>;
}

/// JSON share file on disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ShareSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<ShareSet, SssError> {
        let text = std::fs::read_to_string(&self.path)?;
        ShareSet::from_json(&text)
    }
}

/// JSON text held in memory
pub struct MemorySource {
    label: String,
    text: String,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl ShareSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> Result<ShareSet, SssError> {
        ShareSet::from_json(&self.text)
    }
}

/// Per-run reconstruction settings
#[derive(Clone, Debug, Default)]
pub struct ReconstructOptions {
    /// Replaces the `k` declared by the source
    pub threshold: Option<usize>,
    pub strict: bool,
    pub verify: bool,
    pub enforce_share_count: bool,
}

/// Loads, decodes and reconstructs the secret held by one source.
///
/// Any failure aborts this source only; nothing partial is returned.
pub fn reconstruct_from_source<S>(
    source: &S,
    options: &ReconstructOptions,
) -> Result<Reconstruction, SssError>
where
    S: ShareSource + ?Sized,
{
    let set = source.load()?;
    log::debug!(
        "loaded {} share records from {}",
        set.records.len(),
        source.describe()
    );

    let points = set.decode_points()?;
    let threshold = options.threshold.unwrap_or(set.thresholds.k);

    Scheme::new(threshold, set.thresholds.n)?
        .with_strict(options.strict)
        .with_verification(options.verify)
        .with_share_count_enforced(options.enforce_share_count)
        .reconstruct_secret(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    const MIXED_BASES: &str = r#"{
        "keys": { "n": 3, "k": 2 },
        "1": { "base": "10", "value": "4" },
        "2": { "base": "2", "value": "111" },
        "3": { "base": "16", "value": "c" }
    }"#;

    #[test]
    fn test_parse_share_set() {
        let set = ShareSet::from_json(MIXED_BASES).unwrap();

        assert_eq!(set.thresholds, Thresholds { n: 3, k: 2 });
        assert_eq!(set.records.len(), 3);
        assert_eq!(set.records[1], ("2".to_string(), ShareRecord::new("2", "111")));
    }

    #[test]
    fn test_keys_entry_may_come_last() {
        let set = ShareSet::from_json(
            r#"{ "5": { "base": "10", "value": "1" }, "keys": { "n": 1, "k": 1 } }"#,
        )
        .unwrap();

        assert_eq!(set.thresholds, Thresholds { n: 1, k: 1 });
        assert_eq!(set.records.len(), 1);
    }

    #[test]
    fn test_missing_keys_entry() {
        let result = ShareSet::from_json(r#"{ "1": { "base": "10", "value": "4" } }"#);
        assert!(matches!(result, Err(SssError::Json(_))));
    }

    #[test]
    fn test_repeated_keys_entry() {
        let result =
            ShareSet::from_json(r#"{ "keys": { "n": 1, "k": 1 }, "keys": { "n": 2, "k": 1 } }"#);
        assert!(matches!(result, Err(SssError::Json(_))));
    }

    #[test]
    fn test_repeated_share_key_is_kept() {
        let text = r#"{
            "keys": { "n": 2, "k": 2 },
            "1": { "base": "10", "value": "4" },
            "1": { "base": "10", "value": "5" }
        }"#;
        let set = ShareSet::from_json(text).unwrap();
        assert_eq!(set.records.len(), 2);

        assert!(matches!(
            set.decode_points(),
            Err(SssError::DuplicateIndex { x: 1 })
        ));
    }

    #[test]
    fn test_record_needs_base_and_value() {
        let result =
            ShareSet::from_json(r#"{ "keys": { "n": 1, "k": 1 }, "1": { "value": "4" } }"#);
        assert!(matches!(result, Err(SssError::Json(_))));
    }

    #[test]
    fn test_reconstruct_from_memory() {
        let source = MemorySource::new("mixed", MIXED_BASES);
        let reconstruction =
            reconstruct_from_source(&source, &ReconstructOptions::default()).unwrap();

        assert_eq!(reconstruction.secret, BigInt::from(1));
        assert!(reconstruction.is_exact());
    }

    #[test]
    fn test_threshold_override() {
        let source = MemorySource::new("mixed", MIXED_BASES);

        let options = ReconstructOptions {
            threshold: Some(1),
            ..Default::default()
        };
        // k = 1 returns the lowest share unchanged
        let reconstruction = reconstruct_from_source(&source, &options).unwrap();
        assert_eq!(reconstruction.secret, BigInt::from(4));

        let options = ReconstructOptions {
            threshold: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            reconstruct_from_source(&source, &options),
            Err(SssError::InsufficientPoints {
                threshold: 4,
                point_count: 3
            })
        ));
    }

    #[test]
    fn test_declared_count_is_informational() {
        let text = r#"{
            "keys": { "n": 1, "k": 2 },
            "1": { "base": "10", "value": "4" },
            "2": { "base": "2", "value": "111" },
            "3": { "base": "16", "value": "c" }
        }"#;
        let source = MemorySource::new("k above n", text);

        let reconstruction =
            reconstruct_from_source(&source, &ReconstructOptions::default()).unwrap();
        assert_eq!(reconstruction.secret, BigInt::from(1));

        let options = ReconstructOptions {
            enforce_share_count: true,
            ..Default::default()
        };
        assert!(matches!(
            reconstruct_from_source(&source, &options),
            Err(SssError::ShareCountMismatch {
                declared: 1,
                supplied: 3
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let source = FileSource::new("/nonexistent/shares.json");
        assert!(matches!(
            reconstruct_from_source(&source, &ReconstructOptions::default()),
            Err(SssError::Io(_))
        ));
    }
}
