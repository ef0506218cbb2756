use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::Normalizer;

/// MD5 of normalized content, kept as 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_normalized(normalized: &str) -> Self {
        let mut context = md5::Context::new();
        context.consume(normalized.as_bytes());
        Self(format!("{:x}", context.compute()))
    }

    /// Fingerprint of a paragraph keyed by its owning article title. Free
    /// paragraphs outside any article pass an empty title.
    pub fn of_paragraph(normalizer: &Normalizer, article_title: &str, text: &str) -> Self {
        Self::of_normalized(&normalizer.normalize(&format!("{article_title} {text}")))
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let valid = trimmed.len() == 32 && trimmed.chars().all(|ch| ch.is_ascii_hexdigit());
        valid.then(|| Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every fingerprint committed by any processed document. Grows forever.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    hashes: BTreeSet<Fingerprint>,
}

impl FingerprintIndex {
    pub fn from_hashes(hashes: impl IntoIterator<Item = Fingerprint>) -> Self {
        Self {
            hashes: hashes.into_iter().collect(),
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.hashes.contains(fingerprint)
    }

    pub fn insert(&mut self, fingerprint: Fingerprint) {
        self.hashes.insert(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.hashes.iter()
    }
}
