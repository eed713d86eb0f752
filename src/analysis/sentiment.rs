// src/analysis/sentiment.rs

//! Lexicon-based sentiment scoring.

use crate::error::{AppError, Result};
use crate::models::{Review, Sentiment, SentimentDistribution, SentimentScore, round_to};

/// Score above which a review is positive (below the negation, negative).
const LABEL_THRESHOLD: f64 = 0.2;

const POSITIVE_TERMS: &[&str] = &[
    // Japanese
    "良い", "良かった", "最高", "素晴らしい", "快適", "綺麗", "清潔", "親切", "丁寧", "満足",
    "おすすめ", "オススメ", "便利", "美味しい", "きれい", "キレイ", "良好", "心地よい",
    "おもてなし", "感動", "完璧", "素敵", "すてき", "広い", "新しい", "清潔感", "コスパ", "お得",
    "安い", "静か", "落ち着く", "癒", "リラックス",
    // English
    "excellent", "great", "amazing", "wonderful", "perfect", "clean", "comfortable", "friendly",
    "helpful", "delicious", "convenient", "spacious", "recommend", "beautiful", "relaxing",
    // Chinese
    "干净", "舒适", "方便", "推荐", "满意",
    // Korean
    "깨끗", "편리", "추천", "최고", "만족",
];

const NEGATIVE_TERMS: &[&str] = &[
    // Japanese
    "悪い", "悪かった", "最悪", "ダメ", "だめ", "汚い", "不便", "不満", "残念", "がっかり",
    "ガッカリ", "期待外れ", "古い", "狭い", "うるさい", "高い", "不親切", "不潔", "臭い",
    "におい", "ニオイ", "壊れ", "故障", "対応が悪", "最低", "ひどい", "酷い", "失望", "二度と",
    "もう来ない", "不快", "不衛生", "カビ", "ゴキブリ", "虫", "ボロボロ", "ぼろぼろ",
    // English
    "disappoint", "dirty", "noisy", "rude", "broken", "terrible", "worst", "smell",
    "not working", "problematic", "below expectations",
    // Chinese
    "脏", "吵", "失望", "差劲",
    // Korean
    "불친절", "더럽", "시끄럽", "실망",
];

/// Classifies review text by counting lexicon hits.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    positive: &'static [&'static str],
    negative: &'static [&'static str],
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_TERMS,
            negative: NEGATIVE_TERMS,
        }
    }

    /// Score a piece of text.
    ///
    /// Each distinct lexicon term counts once, however often it occurs.
    pub fn score_text(&self, text: &str) -> Result<SentimentScore> {
        if text.trim().is_empty() {
            return Err(AppError::SentimentAnalysis(
                "cannot score an empty comment".into(),
            ));
        }

        let lowered = text.to_lowercase();
        let positive = count_hits(self.positive, &lowered);
        let negative = count_hits(self.negative, &lowered);
        let total = positive + negative;

        if total == 0 {
            return Ok(SentimentScore {
                label: Sentiment::Neutral,
                score: 0.0,
                confidence: 0.5,
            });
        }

        let raw = (positive as f64 - negative as f64) / (2.0 * total as f64);
        let score = round_to(raw.clamp(-1.0, 1.0), 3);
        let label = if score > LABEL_THRESHOLD {
            Sentiment::Positive
        } else if score < -LABEL_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };
        let confidence = round_to((0.7 + 0.05 * total as f64).min(0.95), 3);

        Ok(SentimentScore {
            label,
            score,
            confidence,
        })
    }

    fn score_review(&self, review: &Review) -> Result<SentimentScore> {
        self.score_text(&review.comment).map_err(|e| match e {
            AppError::SentimentAnalysis(msg) => {
                AppError::SentimentAnalysis(format!("review {}: {}", review.review_id, msg))
            }
            other => other,
        })
    }

    /// Score one review in place, overwriting any earlier result.
    pub fn analyze(&self, review: &mut Review) -> Result<()> {
        review.sentiment = Some(self.score_review(review)?);
        Ok(())
    }

    /// Score every review in place.
    ///
    /// All comments are scored before any review is written, so a failure
    /// leaves the whole batch untouched.
    pub fn analyze_reviews(&self, reviews: &mut [Review]) -> Result<()> {
        log::info!("Analyzing sentiment for {} reviews", reviews.len());
        let scores = reviews
            .iter()
            .map(|review| self.score_review(review))
            .collect::<Result<Vec<_>>>()?;
        for (review, score) in reviews.iter_mut().zip(scores) {
            review.sentiment = Some(score);
        }
        log::debug!("Sentiment distribution: {:?}", sentiment_distribution(reviews));
        Ok(())
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn count_hits(terms: &[&str], text: &str) -> usize {
    terms.iter().filter(|term| text.contains(*term)).count()
}

/// Label counts over scored reviews.
pub fn sentiment_distribution(reviews: &[Review]) -> SentimentDistribution {
    let mut dist = SentimentDistribution::default();
    for label in reviews.iter().filter_map(Review::sentiment_label) {
        dist.record(label);
    }
    dist
}

/// Mean score over scored reviews, 3 decimals; 0.0 when none are scored.
pub fn average_sentiment(reviews: &[Review]) -> f64 {
    let scores: Vec<f64> = reviews.iter().filter_map(Review::sentiment_score).collect();
    if scores.is_empty() {
        return 0.0;
    }
    round_to(scores.iter().sum::<f64>() / scores.len() as f64, 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatingScale, RawReview, Source};

    fn review(comment: &str) -> Review {
        let raw = RawReview {
            id: "t".into(),
            comment: comment.into(),
            rating: 4.0,
            ..RawReview::default()
        };
        Review::from_raw(&raw, Source::Jalan, RatingScale::FivePoint, "h", "Hotel")
    }

    #[test]
    fn test_three_positive_hits() {
        let score = SentimentAnalyzer::new().score_text("清潔で快適、最高の宿").unwrap();
        assert_eq!(score.label, Sentiment::Positive);
        assert_eq!(score.score, 0.5);
        assert_eq!(score.confidence, 0.85);
    }

    #[test]
    fn test_no_hits_is_neutral() {
        let score = SentimentAnalyzer::new().score_text("チェックインは15時").unwrap();
        assert_eq!(score.label, Sentiment::Neutral);
        assert_eq!(score.score, 0.0);
        assert_eq!(score.confidence, 0.5);
    }

    #[test]
    fn test_negative_and_mixed() {
        let analyzer = SentimentAnalyzer::new();

        let negative = analyzer.score_text("部屋が狭いし汚い。残念でした").unwrap();
        assert_eq!(negative.label, Sentiment::Negative);
        assert_eq!(negative.score, -0.5);

        // one positive, one negative
        let mixed = analyzer.score_text("Clean room but noisy street").unwrap();
        assert_eq!(mixed.label, Sentiment::Neutral);
        assert_eq!(mixed.score, 0.0);
        assert_eq!(mixed.confidence, 0.8);
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let analyzer = SentimentAnalyzer::new();
        let once = analyzer.score_text("最高").unwrap();
        let many = analyzer.score_text("最高最高最高").unwrap();
        assert_eq!(once, many);
    }

    #[test]
    fn test_blank_comment_is_rejected() {
        let err = SentimentAnalyzer::new().score_text("   ").unwrap_err();
        assert!(matches!(err, AppError::SentimentAnalysis(_)));
    }

    #[test]
    fn test_blank_comment_leaves_batch_unscored() {
        let mut reviews = vec![review("Great clean room"), review("   "), review("Dirty")];

        let err = SentimentAnalyzer::new().analyze_reviews(&mut reviews).unwrap_err();
        assert!(matches!(err, AppError::SentimentAnalysis(_)));
        assert!(reviews.iter().all(|r| r.sentiment.is_none()));
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let analyzer = SentimentAnalyzer::new();
        let mut reviews = vec![
            review("Great location and friendly staff"),
            review("Dirty bathroom, very disappointing"),
            review("普通のホテルです"),
        ];

        analyzer.analyze_reviews(&mut reviews).unwrap();
        let first: Vec<_> = reviews.iter().map(|r| r.sentiment).collect();
        analyzer.analyze_reviews(&mut reviews).unwrap();
        let second: Vec<_> = reviews.iter().map(|r| r.sentiment).collect();

        assert_eq!(first, second);
        for score in first.into_iter().flatten() {
            assert!((-1.0..=1.0).contains(&score.score));
            assert!((0.0..=1.0).contains(&score.confidence));
        }
    }

    #[test]
    fn test_aggregates() {
        let analyzer = SentimentAnalyzer::new();
        let mut reviews = vec![
            review("最高でした"),
            review("最悪でした"),
            review("普通のホテルです"),
        ];
        assert_eq!(average_sentiment(&reviews), 0.0);
        assert_eq!(sentiment_distribution(&reviews).total(), 0);

        analyzer.analyze_reviews(&mut reviews).unwrap();
        let dist = sentiment_distribution(&reviews);
        assert_eq!(dist.positive, 1);
        assert_eq!(dist.negative, 1);
        assert_eq!(dist.neutral, 1);
        assert_eq!(average_sentiment(&reviews), 0.0);
    }
}
