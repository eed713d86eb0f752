// src/analysis/keywords.rs

//! Frequency-based keyword extraction.
//!
//! Tokens are whitespace-delimited after sentence punctuation is blanked
//! out, so unsegmented Japanese text yields whole phrases rather than words.

use std::collections::{BTreeMap, HashMap};

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{KeywordResult, KeywordTrend, Review, Sentiment, round_to};

const PUNCTUATION: [char; 8] = ['。', '、', '！', '？', '.', ',', '!', '?'];
const TRAILING_PARTICLES: [char; 10] = ['は', 'が', 'を', 'に', 'で', 'と', 'も', 'か', 'ら', 'ま'];

/// Configuration for keyword extraction.
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    /// Minimum token length in characters (default: 2)
    pub min_token_length: usize,
    /// Minimum occurrences across the input set (default: 2)
    pub min_frequency: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_token_length: 2,
            min_frequency: 2,
        }
    }
}

/// Ranks the most frequent tokens across a set of reviews.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    config: KeywordConfig,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KeywordConfig) -> Self {
        Self { config }
    }

    pub fn with_min_frequency(min_frequency: usize) -> Self {
        Self::with_config(KeywordConfig {
            min_frequency,
            ..KeywordConfig::default()
        })
    }

    /// Split text into normalized keyword tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let blanked: String = text
            .chars()
            .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
            .collect();

        blanked
            .to_lowercase()
            .split_whitespace()
            .map(strip_particle)
            .filter(|word| word.graphemes(true).count() >= self.config.min_token_length)
            .filter(|word| !is_stopword(word))
            .map(String::from)
            .collect()
    }

    /// Top `top_n` keywords across `reviews`.
    pub fn extract(&self, reviews: &[Review], top_n: usize) -> Result<Vec<KeywordResult>> {
        if top_n == 0 {
            return Err(AppError::KeywordExtraction(
                "top_n must be at least 1".into(),
            ));
        }
        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for review in reviews {
            for token in self.tokenize(&review.comment) {
                *frequencies.entry(token).or_default() += 1;
            }
        }

        let survivors: Vec<(String, usize)> = frequencies
            .into_iter()
            .filter(|(_, freq)| *freq >= self.config.min_frequency)
            .collect();

        let Some(max_freq) = survivors.iter().map(|(_, freq)| *freq).max() else {
            return Ok(Vec::new());
        };

        let mut results: Vec<KeywordResult> = survivors
            .into_iter()
            .map(|(keyword, frequency)| KeywordResult {
                category: Some(categorize(&keyword)),
                score: round_to(frequency as f64 / max_freq as f64, 3),
                keyword,
                frequency,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        results.truncate(top_n);

        log::debug!(
            "Extracted {} keywords from {} reviews",
            results.len(),
            reviews.len()
        );
        Ok(results)
    }

    /// Keywords from reviews carrying `label`, each tagged with that label.
    ///
    /// Every token counts here, whatever the configured minimum frequency.
    pub fn extract_by_sentiment(
        &self,
        reviews: &[Review],
        label: Sentiment,
        top_n: usize,
    ) -> Result<Vec<KeywordResult>> {
        let filtered: Vec<Review> = reviews
            .iter()
            .filter(|r| r.sentiment_label() == Some(label))
            .cloned()
            .collect();

        let extractor = Self::with_config(KeywordConfig {
            min_frequency: 1,
            ..self.config.clone()
        });
        let mut results = extractor.extract(&filtered, top_n)?;
        for result in &mut results {
            result.category = Some(label);
        }
        Ok(results)
    }
}

/// Top `top_n` keywords with the default configuration.
pub fn extract_keywords(reviews: &[Review], top_n: usize) -> Result<Vec<KeywordResult>> {
    KeywordExtractor::new().extract(reviews, top_n)
}

/// Monthly counts of reviews whose comment mentions `keyword`.
pub fn keyword_trend(reviews: &[Review], keyword: &str) -> KeywordTrend {
    let mut mentions_by_month: BTreeMap<String, usize> = BTreeMap::new();
    for review in reviews.iter().filter(|r| r.comment.contains(keyword)) {
        let month = review.review_date.format("%Y-%m").to_string();
        *mentions_by_month.entry(month).or_default() += 1;
    }

    KeywordTrend {
        keyword: keyword.to_string(),
        total_mentions: mentions_by_month.values().sum(),
        mentions_by_month,
    }
}

fn strip_particle(word: &str) -> &str {
    match word.chars().last() {
        Some(last) if TRAILING_PARTICLES.contains(&last) => &word[..word.len() - last.len_utf8()],
        _ => word,
    }
}

/// Lexicon category of a keyword; anything unlisted is neutral.
fn categorize(keyword: &str) -> Sentiment {
    const POSITIVE: &[&str] = &[
        "良い", "素晴らしい", "綺麗", "快適", "満足", "最高", "美味しい", "清潔", "親切", "丁寧",
        "便利", "広い", "新しい", "good", "great", "excellent", "clean", "comfortable", "nice",
        "beautiful", "friendly", "helpful",
    ];
    const NEGATIVE: &[&str] = &[
        "悪い", "汚い", "狭い", "古い", "不満", "残念", "うるさい", "高い", "不便", "遅い", "問題",
        "bad", "poor", "dirty", "small", "old", "noisy", "expensive", "disappointing",
    ];

    if POSITIVE.contains(&keyword) {
        Sentiment::Positive
    } else if NEGATIVE.contains(&keyword) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Check if a word is too generic to be a useful keyword.
fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        // Japanese domain nouns and fillers
        "ホテル", "宿", "部屋", "料理", "食事", "朝食", "夕食", "風呂", "温泉", "スタッフ", "フロント",
        "サービス", "施設", "宿泊", "利用", "予約", "こと", "もの", "ため", "よう", "そう", "とても",
        "すごく", "かなり", "ちょっと", "少し", "とき", "ところ", "場合", "方", "人", "お客様",
        // English domain nouns
        "hotel", "room", "staff", "service", "stay", "food", "breakfast",
        // English common words
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "it", "its", "we", "our",
        "i", "my", "you", "they", "this", "that", "there", "have", "has", "had", "do", "did",
        "will", "would", "could", "should", "can", "of", "to", "in", "for", "on", "with", "at",
        "by", "from", "as", "or", "and", "but", "if", "so", "than", "very", "not", "no", "all",
        "some", "bit",
    ];
    STOPWORDS.contains(&word)
}
