use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use serde::Deserialize;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::util::read_json;

/// Term rewrites applied before folding. `standardization_map` maps variant
/// terms onto a canonical one (`discente` → `aluno`); `acronyms` expands
/// abbreviations and wins when both maps carry the same key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizationDictionaries {
    #[serde(default)]
    pub acronyms: HashMap<String, String>,
    #[serde(default)]
    pub standardization_map: HashMap<String, String>,
}

impl NormalizationDictionaries {
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            warn!(path = %path.display(), "dictionaries file missing; normalization runs without term rewrites");
            return Self::default();
        }

        match read_json::<Self>(path) {
            Ok(dictionaries) => {
                info!(
                    path = %path.display(),
                    acronyms = dictionaries.acronyms.len(),
                    standardization_terms = dictionaries.standardization_map.len(),
                    "loaded normalization dictionaries"
                );
                dictionaries
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to load dictionaries; normalization runs without term rewrites");
                Self::default()
            }
        }
    }
}

#[derive(Debug)]
struct TermRewrite {
    pattern: Regex,
    replacement: String,
}

/// Derives comparison keys: dehyphenate, rewrite dictionary terms, casefold,
/// accent-fold, drop punctuation and symbols, collapse whitespace.
#[derive(Debug)]
pub struct Normalizer {
    hyphen_break: Regex,
    rewrites: Vec<TermRewrite>,
}

impl Normalizer {
    pub fn new(dictionaries: &NormalizationDictionaries) -> Result<Self> {
        let mut combined = dictionaries.standardization_map.clone();
        for (key, value) in &dictionaries.acronyms {
            combined.insert(key.clone(), value.clone());
        }

        let mut keys = combined
            .keys()
            .filter(|key| !key.trim().is_empty())
            .cloned()
            .collect::<Vec<String>>();
        // Longest first so "BCC" is rewritten before a shorter "BC".
        keys.sort_by(|left, right| {
            right
                .chars()
                .count()
                .cmp(&left.chars().count())
                .then_with(|| left.cmp(right))
        });

        let mut rewrites = Vec::with_capacity(keys.len());
        for key in keys {
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&key)))
                .with_context(|| format!("failed to compile rewrite pattern for term: {key}"))?;
            let replacement = combined.get(&key).cloned().unwrap_or_default();
            rewrites.push(TermRewrite {
                pattern,
                replacement,
            });
        }

        Ok(Self {
            hyphen_break: Regex::new(r"-\n\s*").context("failed to compile hyphen break regex")?,
            rewrites,
        })
    }

    #[cfg(test)]
    pub fn plain() -> Result<Self> {
        Self::new(&NormalizationDictionaries::default())
    }

    pub fn normalize(&self, raw_text: &str) -> String {
        let joined = self.hyphen_break.replace_all(raw_text, "");
        let mut text = joined.replace('\n', " ");

        for rewrite in &self.rewrites {
            text = rewrite
                .pattern
                .replace_all(&text, NoExpand(&rewrite.replacement))
                .into_owned();
        }

        let folded = text
            .to_lowercase()
            .nfkd()
            .filter(|character| !is_combining_mark(*character))
            .filter(|character| character.is_alphanumeric() || character.is_whitespace())
            .collect::<String>();

        folded.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_accents_and_punctuation() {
        let normalizer = Normalizer::plain().expect("normalizer builds");
        assert_eq!(
            normalizer.normalize("Art. 5º  O aluno DEVERÁ cumprir a exigência!"),
            "art 5o o aluno devera cumprir a exigencia"
        );
        assert_eq!(normalizer.normalize("§ 1º – Parágrafo"), "1o paragrafo");
    }

    #[test]
    fn joins_hyphenated_line_breaks() {
        let normalizer = Normalizer::plain().expect("normalizer builds");
        assert_eq!(normalizer.normalize("gradua-\n  ção\nplena"), "graduacao plena");
    }

    #[test]
    fn rewrites_whole_words_longest_key_first() {
        let mut dictionaries = NormalizationDictionaries::default();
        dictionaries
            .acronyms
            .insert("PPC".to_string(), "Projeto Pedagógico de Curso".to_string());
        dictionaries
            .acronyms
            .insert("BC".to_string(), "Banco Central".to_string());
        dictionaries
            .acronyms
            .insert("BCC".to_string(), "Bacharelado em Ciência da Computação".to_string());
        dictionaries
            .standardization_map
            .insert("discente".to_string(), "aluno".to_string());

        let normalizer = Normalizer::new(&dictionaries).expect("normalizer builds");
        assert_eq!(
            normalizer.normalize("O discente do BCC segue o ppc; DISCENTES não."),
            "o aluno do bacharelado em ciencia da computacao segue o projeto pedagogico de curso discentes nao"
        );
    }

    #[test]
    fn acronyms_override_standardization_for_same_key() {
        let mut dictionaries = NormalizationDictionaries::default();
        dictionaries
            .standardization_map
            .insert("TCC".to_string(), "trabalho final".to_string());
        dictionaries
            .acronyms
            .insert("TCC".to_string(), "Trabalho de Conclusão de Curso".to_string());

        let normalizer = Normalizer::new(&dictionaries).expect("normalizer builds");
        assert_eq!(
            normalizer.normalize("TCC"),
            "trabalho de conclusao de curso"
        );
    }

    #[test]
    fn missing_dictionary_file_yields_empty_dictionaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dictionaries =
            NormalizationDictionaries::load_or_default(Some(&dir.path().join("absent.json")));
        assert!(dictionaries.acronyms.is_empty());
        assert!(dictionaries.standardization_map.is_empty());
    }
}
