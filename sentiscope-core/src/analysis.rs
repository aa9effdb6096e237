//! Analysis result types and label mapping

use crate::error::InferenceError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical three-way sentiment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification label after mapping from the engine's vocabulary
///
/// Unrecognized engine labels are kept verbatim instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Canonical(Sentiment),
    Raw(String),
}

impl Label {
    /// Map a raw engine label onto the canonical categories
    ///
    /// Covers the common model vocabularies: plain names and their short
    /// forms, `LABEL_n` indices of three-class heads, and 1-5 star ratings.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        let sentiment = match normalized.as_str() {
            "negative" | "neg" | "label_0" | "1 star" | "2 stars" => Some(Sentiment::Negative),
            "neutral" | "neu" | "label_1" | "3 stars" => Some(Sentiment::Neutral),
            "positive" | "pos" | "label_2" | "4 stars" | "5 stars" => Some(Sentiment::Positive),
            _ => None,
        };

        match sentiment {
            Some(s) => Label::Canonical(s),
            None => Label::Raw(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Canonical(s) => s.as_str(),
            Label::Raw(raw) => raw,
        }
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        match self {
            Label::Canonical(s) => Some(*s),
            Label::Raw(_) => None,
        }
    }
}

impl From<Sentiment> for Label {
    fn from(s: Sentiment) -> Self {
        Label::Canonical(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Label::from_raw(&raw))
    }
}

/// Raw output of an inference engine, before label mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub score: f64,
}

impl RawPrediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Outcome of one analysis
///
/// `served_from_cache` is a per-response annotation. Values held by the cache
/// always carry `false`; the orchestrator sets it on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub label: Label,
    /// Confidence in [0, 1]
    #[serde(deserialize_with = "deserialize_score")]
    pub score: f64,
    pub served_from_cache: bool,
}

impl AnalysisResult {
    /// Build a fresh result from the engine's raw output
    ///
    /// Scores slightly outside [0, 1] are clamped; NaN is malformed.
    pub fn from_prediction(prediction: RawPrediction) -> Result<Self, InferenceError> {
        if prediction.score.is_nan() {
            return Err(InferenceError::Malformed(format!(
                "score is NaN for label '{}'",
                prediction.label
            )));
        }

        Ok(Self {
            label: Label::from_raw(&prediction.label),
            score: prediction.score.clamp(0.0, 1.0),
            served_from_cache: false,
        })
    }

    /// NaN scores become 0.0
    pub fn new(label: impl Into<Label>, score: f64) -> Self {
        Self {
            label: label.into(),
            score: bounded_score(score),
            served_from_cache: false,
        }
    }

    /// Copy of this result annotated with its provenance
    pub fn tagged(&self, served_from_cache: bool) -> Self {
        Self {
            served_from_cache,
            ..self.clone()
        }
    }
}

fn bounded_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(bounded_score)
}

/// Keep at most `budget` characters of `text`
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
