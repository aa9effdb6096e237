//! Word-polarity sentiment engine
//!
//! Scores text by summing the weights of known words, flipping the sign of a
//! word preceded by a negator, and squashing the sum into `[-1, 1]`.

use sentiscope_core::{InferenceEngine, InferenceError, RawPrediction};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Normalization constant for the squashing function
const ALPHA: f64 = 15.0;

/// Compound scores inside `(-NEUTRAL_BAND, NEUTRAL_BAND)` are neutral
const NEUTRAL_BAND: f64 = 0.05;

/// How many tokens a negator reaches forward
const NEGATION_WINDOW: usize = 3;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without", "hardly",
    "cannot", "isn't", "aren't", "wasn't", "weren't", "don't", "doesn't", "didn't", "won't",
    "can't", "couldn't", "shouldn't", "wouldn't",
];

const DEFAULT_LEXICON: &[(&str, f64)] = &[
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 3.2),
    ("wonderful", 3.1),
    ("amazing", 2.8),
    ("positive", 2.3),
    ("success", 2.7),
    ("successful", 2.8),
    ("win", 2.8),
    ("wins", 2.7),
    ("gain", 2.0),
    ("gains", 2.0),
    ("growth", 1.6),
    ("improve", 1.9),
    ("improved", 2.1),
    ("recovery", 1.6),
    ("hope", 1.9),
    ("happy", 2.7),
    ("love", 3.2),
    ("best", 3.2),
    ("benefit", 2.0),
    ("strong", 2.3),
    ("peace", 2.5),
    ("safe", 1.9),
    ("celebrate", 2.7),
    ("praise", 2.6),
    ("support", 1.7),
    ("agreement", 2.2),
    ("record", 0.8),
    ("boost", 1.7),
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("poor", -2.1),
    ("negative", -2.7),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("loss", -1.3),
    ("losses", -1.7),
    ("decline", -1.6),
    ("crisis", -3.1),
    ("war", -2.9),
    ("attack", -2.1),
    ("killed", -3.5),
    ("death", -2.9),
    ("dead", -3.3),
    ("fear", -2.2),
    ("angry", -2.3),
    ("hate", -2.7),
    ("worst", -3.1),
    ("danger", -2.4),
    ("threat", -2.4),
    ("weak", -1.9),
    ("collapse", -2.6),
    ("fraud", -2.8),
    ("violence", -3.1),
    ("disaster", -3.1),
    ("sad", -2.1),
    ("warning", -1.4),
];

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Failed to read lexicon {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse lexicon {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lexicon {0} contains no words")]
    Empty(PathBuf),

    #[error("Invalid weight for '{word}' in lexicon")]
    InvalidWeight { word: String },
}

/// [`InferenceEngine`] over a word-weight lexicon
#[derive(Debug, Clone)]
pub struct LexiconEngine {
    weights: HashMap<String, f64>,
}

impl Default for LexiconEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LexiconEngine {
    /// Engine over the bundled English lexicon
    pub fn builtin() -> Self {
        let weights = DEFAULT_LEXICON
            .iter()
            .map(|(word, weight)| (word.to_string(), *weight))
            .collect();
        Self { weights }
    }

    /// Build from explicit weights; words are lowercased
    pub fn from_weights(weights: HashMap<String, f64>) -> Result<Self, LexiconError> {
        let mut normalized = HashMap::with_capacity(weights.len());
        for (word, weight) in weights {
            if !weight.is_finite() {
                return Err(LexiconError::InvalidWeight { word });
            }
            normalized.insert(word.trim().to_lowercase(), weight);
        }
        Ok(Self { weights: normalized })
    }

    /// Load a `{"word": weight}` JSON lexicon
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        info!("Loading lexicon from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let weights: HashMap<String, f64> =
            serde_json::from_str(&content).map_err(|source| LexiconError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if weights.is_empty() {
            return Err(LexiconError::Empty(path.to_path_buf()));
        }

        let engine = Self::from_weights(weights)?;
        info!("Lexicon loaded ({} words)", engine.len());
        Ok(engine)
    }

    /// Built-in lexicon when `path` is absent, otherwise the file at `path`
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, LexiconError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("Using built-in lexicon");
                Ok(Self::builtin())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Compound polarity of `text` in `[-1, 1]` and the number of scored words
    pub fn polarity(&self, text: &str) -> (f64, usize) {
        let tokens = tokenize(text);
        let mut sum = 0.0;
        let mut matched = 0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(weight) = self.weights.get(token.as_str()) else {
                continue;
            };

            let negated = tokens[i.saturating_sub(NEGATION_WINDOW)..i]
                .iter()
                .any(|t| NEGATORS.contains(&t.as_str()));

            sum += if negated { -weight } else { *weight };
            matched += 1;
        }

        (sum / (sum * sum + ALPHA).sqrt(), matched)
    }
}

impl InferenceEngine for LexiconEngine {
    fn classify(&self, text: &str) -> Result<RawPrediction, InferenceError> {
        let (compound, matched) = self.polarity(text);
        debug!("Lexicon compound {:.3} over {} scored words", compound, matched);

        if !compound.is_finite() {
            return Err(InferenceError::Malformed(format!(
                "non-finite polarity {}",
                compound
            )));
        }

        let prediction = if compound >= NEUTRAL_BAND {
            RawPrediction::new("POSITIVE", 0.5 + compound / 2.0)
        } else if compound <= -NEUTRAL_BAND {
            RawPrediction::new("NEGATIVE", 0.5 - compound / 2.0)
        } else {
            RawPrediction::new("NEUTRAL", 1.0 - compound.abs())
        };

        Ok(prediction)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .filter(|token| !token.is_empty())
        .map(|token| token.replace('\u{2019}', "'").to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn label(engine: &LexiconEngine, text: &str) -> String {
        engine.classify(text).unwrap().label
    }

    #[test]
    fn test_builtin_polarity() {
        let engine = LexiconEngine::builtin();

        assert_eq!(label(&engine, "What a wonderful, great day"), "POSITIVE");
        assert_eq!(label(&engine, "The crisis turned into a disaster"), "NEGATIVE");
        assert_eq!(label(&engine, "The committee met on Tuesday"), "NEUTRAL");
    }

    #[test]
    fn test_scores_are_bounded() {
        let engine = LexiconEngine::builtin();
        let text = "great ".repeat(500);

        let prediction = engine.classify(&text).unwrap();
        assert_eq!(prediction.label, "POSITIVE");
        assert!(prediction.score > 0.9 && prediction.score <= 1.0);

        let neutral = engine.classify("").unwrap();
        assert_eq!(neutral.label, "NEUTRAL");
        assert_eq!(neutral.score, 1.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let engine = LexiconEngine::builtin();

        assert_eq!(label(&engine, "This is good"), "POSITIVE");
        assert_eq!(label(&engine, "This is not good"), "NEGATIVE");
        assert_eq!(label(&engine, "It wasn\u{2019}t a good result"), "NEGATIVE");
    }

    #[test]
    fn test_case_insensitive() {
        let engine = LexiconEngine::builtin();
        assert_eq!(label(&engine, "GREAT NEWS"), "POSITIVE");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"Sunny": 2.0, "rain": -1.5}}"#).unwrap();

        let engine = LexiconEngine::load(file.path()).unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(label(&engine, "a sunny morning"), "POSITIVE");
        assert_eq!(label(&engine, "rain again"), "NEGATIVE");
    }

    #[test]
    fn test_load_failures() {
        assert!(matches!(
            LexiconEngine::load("/nonexistent/lexicon.json"),
            Err(LexiconError::Io { .. })
        ));

        let mut malformed = NamedTempFile::new().unwrap();
        write!(malformed, "not json").unwrap();
        assert!(matches!(
            LexiconEngine::load(malformed.path()),
            Err(LexiconError::Parse { .. })
        ));

        let mut empty = NamedTempFile::new().unwrap();
        write!(empty, "{{}}").unwrap();
        assert!(matches!(
            LexiconEngine::load(empty.path()),
            Err(LexiconError::Empty(_))
        ));
    }

    #[test]
    fn test_load_or_builtin() {
        let engine = LexiconEngine::load_or_builtin(None).unwrap();
        assert_eq!(engine.len(), DEFAULT_LEXICON.len());
    }
}
