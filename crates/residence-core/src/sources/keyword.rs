//! Keyword-based text inference
//!
//! Scans clinical free text for comuna names from the catalog vocabulary and
//! for street addresses introduced by a street keyword. The score reflects
//! how often the winning comuna is mentioned and how many other comunas
//! compete with it.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::catalog::fold_name;
use crate::evidence::{Evidence, Origin};
use crate::ports::{ConnectorError, ConnectorResult, TextInferenceEngine};

/// Version reported in `Evidence::model_version`
pub const KEYWORD_MODEL_VERSION: &str = "keyword-1";

/// Tokens that introduce a street address
const STREET_KEYWORDS: &[&str] = &[
    "calle",
    "avenida",
    "av",
    "av.",
    "avda",
    "avda.",
    "pasaje",
    "psje",
    "psje.",
    "pje",
    "pje.",
    "camino",
    "población",
    "poblacion",
    "pob.",
];

/// Words kept after a street keyword before giving up on a number
const MAX_ADDRESS_WORDS: usize = 6;

/// Score for a single mention, raised per extra mention
const BASE_SCORE: f64 = 0.6;
const PER_MENTION: f64 = 0.1;
const MAX_SCORE: f64 = 0.9;

struct VocabularyEntry {
    words: Vec<String>,
    code: String,
}

#[derive(Default)]
struct Tally {
    mentions: usize,
    /// (text index, word index) of the first mention
    first_seen: Option<(usize, usize)>,
}

/// Text inference engine driven by the catalog vocabulary.
pub struct KeywordTextInference {
    /// Longest names first so "santiago centro" wins over "santiago"
    vocabulary: Vec<VocabularyEntry>,
}

impl KeywordTextInference {
    /// Build from `(name, code)` pairs; names are folded here.
    pub fn new<I, N, C>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: Into<String>,
    {
        let mut vocabulary: Vec<VocabularyEntry> = vocabulary
            .into_iter()
            .filter_map(|(name, code)| {
                let folded = fold_name(name.as_ref());
                if folded.is_empty() {
                    return None;
                }
                Some(VocabularyEntry {
                    words: folded.split(' ').map(str::to_string).collect(),
                    code: code.into(),
                })
            })
            .collect();
        vocabulary.sort_by(|a, b| {
            let a_key = (Reverse(a.words.len()), &a.words);
            let b_key = (Reverse(b.words.len()), &b.words);
            a_key.cmp(&b_key)
        });
        Self { vocabulary }
    }

    fn tally_mentions(&self, texts: &[&str]) -> HashMap<String, Tally> {
        let mut tallies: HashMap<String, Tally> = HashMap::new();

        for (text_idx, text) in texts.iter().enumerate() {
            let folded = fold_name(text);
            let words: Vec<&str> = folded.split(' ').filter(|w| !w.is_empty()).collect();
            let mut used = vec![false; words.len()];

            for entry in &self.vocabulary {
                let n = entry.words.len();
                if n > words.len() {
                    continue;
                }
                for start in 0..=(words.len() - n) {
                    if used[start..start + n].iter().any(|u| *u) {
                        continue;
                    }
                    if words[start..start + n]
                        .iter()
                        .zip(&entry.words)
                        .all(|(w, v)| *w == v.as_str())
                    {
                        used[start..start + n].iter_mut().for_each(|u| *u = true);
                        let tally = tallies.entry(entry.code.clone()).or_default();
                        tally.mentions += 1;
                        let seen = (text_idx, start);
                        if tally.first_seen.map_or(true, |first| seen < first) {
                            tally.first_seen = Some(seen);
                        }
                    }
                }
            }
        }

        tallies
    }
}

impl TextInferenceEngine for KeywordTextInference {
    fn infer(&self, texts: &[String], deadline_ms: u64) -> ConnectorResult<Evidence> {
        if deadline_ms == 0 {
            return Err(ConnectorError::Timeout { budget_ms: 0 });
        }

        let texts: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            let detail = "no text to analyze".to_string();
            return Err(ConnectorError::DataQuality(detail));
        }

        let tallies = self.tally_mentions(&texts);
        let total: usize = tallies.values().map(|t| t.mentions).sum();

        // Most mentions wins; earliest first mention breaks ties
        let winner = tallies
            .iter()
            .max_by_key(|(_, t)| (t.mentions, Reverse(t.first_seen)))
            .map(|(code, t)| (code.clone(), t.mentions));

        let Some((code, mentions)) = winner else {
            let detail = "no comuna mentioned in text".to_string();
            return Err(ConnectorError::NotFound(detail));
        };

        let share = mentions as f64 / total as f64;
        let raw = BASE_SCORE + PER_MENTION * (mentions - 1) as f64;
        let score = raw.min(MAX_SCORE) * share;

        let mut evidence = Evidence::new(Origin::TextInference)
            .with_comuna(code)
            .with_model(score, KEYWORD_MODEL_VERSION);
        evidence.address = texts.iter().find_map(|t| extract_address(t));

        Ok(evidence)
    }
}

/// First street address in `text`: a street keyword followed by words up to
/// and including the first token with a digit.
pub fn extract_address(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    for (i, token) in tokens.iter().enumerate() {
        let keyword = token.trim_end_matches([',', ';', ':']).to_lowercase();
        if !STREET_KEYWORDS.contains(&keyword.as_str()) {
            continue;
        }

        let mut parts = vec![token.trim_end_matches([',', ';', ':'])];
        for next in tokens[i + 1..].iter().take(MAX_ADDRESS_WORDS) {
            let clean = next.trim_end_matches([',', ';', ':', '.']);
            if clean.is_empty() {
                break;
            }
            parts.push(clean);
            if clean.chars().any(|c| c.is_ascii_digit()) || next.ends_with([',', ';', '.']) {
                break;
            }
        }

        if parts.len() >= 2 {
            return Some(parts.join(" "));
        }
    }

    None
}
