// src/extract/fields.rs

//! Per-field text patterns for review blocks.
//!
//! Every parser here degrades to `None` (or a default at the call site)
//! rather than failing.

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::utils::char_len;

/// Markers that show up in genuine Japanese review prose.
const SENTENCE_MARKERS: [&str; 4] = ["です", "でした", "ました", "ている"];

/// Compiled regexes for field recovery.
#[derive(Debug)]
pub(crate) struct FieldPatterns {
    dates: Vec<Regex>,
    number: Regex,
    rating_marker: Regex,
    reviewer: Regex,
    title: Regex,
}

/// Age bracket and gender recovered from a "50代/男性" style label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReviewerInfo {
    pub age_group: String,
    pub gender: String,
}

impl ReviewerInfo {
    pub fn display_name(&self) -> String {
        format!("{}・{}", self.age_group, self.gender)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::config(format!("invalid pattern '{pattern}': {e}")))
}

impl FieldPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dates: vec![
                compile(r"(\d{4})年(\d{1,2})月(\d{1,2})日")?,
                compile(r"(\d{4})[年/\-](\d{1,2})[月/\-](\d{1,2})")?,
                compile(r"(\d{4})\.(\d{1,2})\.(\d{1,2})")?,
            ],
            number: compile(r"(\d+(?:\.\d+)?)")?,
            rating_marker: compile(r"(\d)[レ点]")?,
            reviewer: compile(r"(\d+代)/([男女]性)")?,
            title: compile(r"([^0-9]{5,40})20\d{2}年")?,
        })
    }

    /// First valid calendar date, trying each pattern in order.
    pub fn date(&self, text: &str) -> Option<NaiveDate> {
        self.dates.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let year = caps.get(1)?.as_str().parse().ok()?;
            let month = caps.get(2)?.as_str().parse().ok()?;
            let day = caps.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    }

    /// Rating from a labelled fragment, then from an "N点"/"Nレ" marker.
    ///
    /// Values above 5 are read as 10-point and halved.
    pub fn rating(&self, fragment: Option<&str>, full_text: &str) -> Option<f64> {
        let from_fragment = fragment.and_then(|text| {
            self.number
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        });

        let value = from_fragment.or_else(|| {
            self.rating_marker
                .captures(full_text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        })?;

        Some(if value > 5.0 { value / 2.0 } else { value })
    }

    pub fn reviewer(&self, text: &str) -> Option<ReviewerInfo> {
        let caps = self.reviewer.captures(text)?;
        Some(ReviewerInfo {
            age_group: caps.get(1)?.as_str().to_string(),
            gender: caps.get(2)?.as_str().to_string(),
        })
    }

    /// Text preceding the first "20xx年" date.
    pub fn title(&self, text: &str) -> Option<String> {
        let caps = self.title.captures(text)?;
        let title = caps.get(1)?.as_str().trim();
        (!title.is_empty()).then(|| title.to_string())
    }
}

/// Whether a candidate comment reads like real review prose.
pub(crate) fn looks_like_comment(text: &str) -> bool {
    char_len(text) > 30 && SENTENCE_MARKERS.iter().any(|m| text.contains(m))
}

/// Join the first three substantial sentences of a block's text.
pub(crate) fn comment_from_sentences(full_text: &str) -> Option<String> {
    if char_len(full_text) <= 50 {
        return None;
    }

    let sentences: Vec<&str> = full_text
        .split(['。', '\n'])
        .map(str::trim)
        .filter(|s| char_len(s) > 20)
        .take(3)
        .collect();

    if sentences.is_empty() {
        return None;
    }
    Some(format!("{}。", sentences.join("。")))
}
