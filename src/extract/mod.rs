// src/extract/mod.rs

//! Heuristic review extraction from listing-page markup.
//!
//! Used when a platform offers no structured review data. The extractor
//! locates review blocks with an ordered list of [`SelectorStrategy`]s and
//! recovers each field with its own fallback chain, so a missing field never
//! aborts the page.

mod fields;
mod strategy;

pub use strategy::SelectorStrategy;

use chrono::{NaiveDate, NaiveTime};
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{Language, RawReview, Source};
use crate::utils::{char_len, truncate_text};
use fields::{FieldPatterns, comment_from_sentences, looks_like_comment};
use strategy::parse_or_skip;

/// Blocks a strategy must exceed before it is trusted.
pub const DEFAULT_MIN_MATCHES: usize = 5;

const COMMENT_SELECTORS: [&str; 4] = [
    r#"div[class*="rightSection"]"#,
    r#"div[class*="reviewContent"]"#,
    r#"div[class*="comment"]"#,
    r#"p[class*="text"]"#,
];
const TITLE_SELECTOR: &str = r#"h3[class*="title"], h4[class*="title"], div[class*="title"]"#;
const RATING_SELECTOR: &str = r#"[class*="rating"], [class*="star"], [class*="score"]"#;

const DEFAULT_RATING: f64 = 3.0;
const DEFAULT_TITLE: &str = "楽天トラベルでの宿泊";
const DEFAULT_REVIEWER: &str = "楽天ユーザー";

/// Where the markup came from; stamped onto every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractContext {
    pub source: Source,
    pub hotel_id: String,
    pub url: Option<String>,
    pub language: Option<Language>,
    /// Blocks considered at most
    pub limit: Option<usize>,
}

impl ExtractContext {
    pub fn new(source: Source, hotel_id: impl Into<String>) -> Self {
        Self {
            source,
            hotel_id: hotel_id.into(),
            url: None,
            language: None,
            limit: None,
        }
    }
}

/// Turns review-listing markup into raw review records.
#[derive(Debug)]
pub struct ReviewExtractor {
    strategies: Vec<(String, Selector)>,
    comment_selectors: Vec<Selector>,
    title_selector: Option<Selector>,
    rating_selector: Option<Selector>,
    min_matches: usize,
    patterns: FieldPatterns,
}

impl ReviewExtractor {
    /// Build an extractor; invalid strategy selectors are skipped.
    pub fn new(strategies: &[SelectorStrategy]) -> Result<Self> {
        let strategies: Vec<(String, Selector)> = strategies
            .iter()
            .filter_map(|s| parse_or_skip(&s.selector).map(|sel| (s.name.clone(), sel)))
            .collect();

        if strategies.is_empty() {
            return Err(AppError::config("no usable review block selectors"));
        }

        Ok(Self {
            strategies,
            comment_selectors: COMMENT_SELECTORS.iter().filter_map(|s| parse_or_skip(s)).collect(),
            title_selector: parse_or_skip(TITLE_SELECTOR),
            rating_selector: parse_or_skip(RATING_SELECTOR),
            min_matches: DEFAULT_MIN_MATCHES,
            patterns: FieldPatterns::new()?,
        })
    }

    /// Extractor over the review-card layouts.
    pub fn cards() -> Result<Self> {
        Self::new(&SelectorStrategy::cards())
    }

    /// Extractor over the loose fallback layouts; accepts any match.
    pub fn generic() -> Result<Self> {
        Ok(Self::new(&SelectorStrategy::generic())?.with_min_matches(0))
    }

    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches;
        self
    }

    /// Extract every usable review from `markup`.
    ///
    /// Returns an empty list when no strategy finds enough blocks.
    pub fn extract(&self, markup: &str, ctx: &ExtractContext) -> Vec<RawReview> {
        let document = Html::parse_document(markup);

        let Some((name, blocks)) = self.select_blocks(&document) else {
            log::warn!(
                "No review containers found for {} hotel {}",
                ctx.source,
                ctx.hotel_id
            );
            return Vec::new();
        };
        log::info!("Found {} review blocks with strategy '{}'", blocks.len(), name);

        let reviews: Vec<RawReview> = blocks
            .into_iter()
            .take(ctx.limit.unwrap_or(usize::MAX))
            .enumerate()
            .filter_map(|(idx, block)| self.parse_block(block, ctx, idx))
            .collect();

        log::info!("Extracted {} reviews", reviews.len());
        reviews
    }

    fn select_blocks<'a>(&self, document: &'a Html) -> Option<(&str, Vec<ElementRef<'a>>)> {
        self.strategies.iter().find_map(|(name, selector)| {
            let blocks: Vec<ElementRef<'a>> = document.select(selector).collect();
            log::debug!("Strategy '{}' matched {} blocks", name, blocks.len());
            (blocks.len() > self.min_matches).then_some((name.as_str(), blocks))
        })
    }

    fn parse_block(&self, block: ElementRef<'_>, ctx: &ExtractContext, idx: usize) -> Option<RawReview> {
        let full_text = joined_text(block, " ");

        let Some(comment) = self.comment(block, &full_text) else {
            log::debug!(
                "Block {} has no usable comment, skipping: {}",
                idx,
                truncate_text(&full_text, 40)
            );
            return None;
        };

        let title = self
            .title_selector
            .as_ref()
            .and_then(|sel| block.select(sel).next())
            .map(|el| joined_text(el, ""))
            .filter(|t| !t.is_empty())
            .or_else(|| self.patterns.title(&full_text))
            .filter(|t| char_len(t) > 3)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let rating_fragment = self
            .rating_selector
            .as_ref()
            .and_then(|sel| block.select(sel).next())
            .map(|el| joined_text(el, " "));
        let rating = self
            .patterns
            .rating(rating_fragment.as_deref(), &full_text)
            .unwrap_or(DEFAULT_RATING);

        let posted = self.patterns.date(&full_text).unwrap_or_else(default_date);
        let review_date = posted.and_time(NaiveTime::MIN).and_utc();

        let reviewer = self.patterns.reviewer(&full_text);
        let reviewer_name = reviewer
            .as_ref()
            .map(|r| r.display_name())
            .unwrap_or_else(|| DEFAULT_REVIEWER.to_string());

        let id = review_id(ctx, idx, review_date.timestamp(), &comment);

        Some(RawReview {
            id,
            title: Some(title),
            comment,
            rating,
            reviewer_name: Some(reviewer_name),
            age_group: reviewer.as_ref().map(|r| r.age_group.clone()),
            gender: reviewer.map(|r| r.gender),
            review_date: Some(review_date),
            language: ctx.language,
            url: ctx.url.clone(),
            ..RawReview::default()
        })
    }

    fn comment(&self, block: ElementRef<'_>, full_text: &str) -> Option<String> {
        let comment = self
            .comment_selectors
            .iter()
            .filter_map(|sel| block.select(sel).next())
            .map(|el| joined_text(el, ""))
            .find(|text| looks_like_comment(text))
            .or_else(|| comment_from_sentences(full_text))?;

        (char_len(&comment) > 20).then_some(comment)
    }
}

fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Trimmed text nodes of an element joined with `sep`.
fn joined_text(element: ElementRef<'_>, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// `{source}_{hotel}_{index}_{timestamp}_{digest}`, stable for the same block.
fn review_id(ctx: &ExtractContext, idx: usize, timestamp: i64, comment: &str) -> String {
    let digest = hex::encode(Sha256::digest(comment.as_bytes()));
    format!(
        "{}_{}_{}_{}_{}",
        ctx.source,
        ctx.hotel_id,
        idx,
        timestamp,
        &digest[..8]
    )
}
