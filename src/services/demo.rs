// src/services/demo.rs

//! Deterministic demo data for sources running without live credentials.
//!
//! Every value is derived from a SHA-256 digest of the source, hotel id and
//! record index, so the same inputs always produce the same reviews.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sha2::{Digest, Sha256};

use crate::models::{FetchOptions, HotelCandidate, Language, RatingScale, RawReview, Source};

struct Template {
    title: &'static str,
    comment: &'static str,
    /// On the 0-5 scale
    rating: f64,
}

const JA_TEMPLATES: &[Template] = &[
    Template {
        title: "最高の滞在でした",
        comment: "チェックインからチェックアウトまで、スタッフの方々の対応が素晴らしかったです。部屋も清潔で広々としており、快適に過ごせました。朝食のバイキングも種類が豊富で美味しかったです。",
        rating: 5.0,
    },
    Template {
        title: "コスパ最高",
        comment: "この価格でこのクオリティは驚きました。部屋は少しコンパクトでしたが、必要な設備は全て揃っていて不便は感じませんでした。大浴場で仕事の疲れが癒されました。",
        rating: 4.5,
    },
    Template {
        title: "出張で利用",
        comment: "駅から近く、周辺にコンビニや飲食店も多く便利でした。部屋にはデスクとWi-Fiがあり、仕事もしやすかったです。朝食も7時から利用できるので助かりました。",
        rating: 4.0,
    },
    Template {
        title: "普通のホテル",
        comment: "可もなく不可もなくといった感じです。特別な印象は残りませんでしたが、価格相応だと思います。立地は観光メインの方には向いていると思います。",
        rating: 3.5,
    },
    Template {
        title: "期待外れでした",
        comment: "写真で見た印象と実際の部屋にかなりギャップがありました。部屋も期待していたより狭く、チェックイン時の待ち時間が長かったのが残念でした。",
        rating: 2.5,
    },
];

const EN_TEMPLATES: &[Template] = &[
    Template {
        title: "Excellent stay!",
        comment: "Great location near the station. Clean rooms and friendly staff. Would definitely stay again. Breakfast was delicious with many options.",
        rating: 4.5,
    },
    Template {
        title: "Good value for money",
        comment: "The hotel offers great value. Rooms are a bit small but well-maintained. Staff was very helpful and spoke good English.",
        rating: 4.0,
    },
    Template {
        title: "Perfect for business trip",
        comment: "Convenient location for business travelers. Fast WiFi and comfortable work desk. Quiet rooms ensured good rest.",
        rating: 4.5,
    },
    Template {
        title: "Decent stay",
        comment: "The hotel is okay for the price. Room was tidy but a bit dated. Location is handy for exploring the area.",
        rating: 3.5,
    },
    Template {
        title: "Below expectations",
        comment: "Room was smaller than photos suggested and the air conditioning was not working properly. Noise from the street was problematic.",
        rating: 2.5,
    },
];

const ZH_TEMPLATES: &[Template] = &[
    Template {
        title: "非常满意",
        comment: "酒店位置很好，离车站很近，交通方便。房间干净舒适，服务人员态度友好，早餐种类丰富。",
        rating: 4.5,
    },
    Template {
        title: "性价比高",
        comment: "房间虽然不大，但是设施齐全，干净整洁。周边有很多餐厅和便利店，推荐给大家。",
        rating: 4.0,
    },
    Template {
        title: "一般",
        comment: "隔音效果不好，晚上有点吵，让人有些失望。不过前台处理问题还算及时。",
        rating: 3.0,
    },
];

const KO_TEMPLATES: &[Template] = &[
    Template {
        title: "최고의 숙소",
        comment: "역에서 가까워서 이동이 편리했습니다. 객실도 깨끗하고 직원들도 친절해서 만족스러웠어요. 다음에도 꼭 다시 오고 싶습니다.",
        rating: 5.0,
    },
    Template {
        title: "가성비 좋아요",
        comment: "객실은 조금 좁지만 깨끗하게 관리되고 있었습니다. 주변에 편의점과 식당이 많아서 추천합니다.",
        rating: 4.0,
    },
    Template {
        title: "아쉬웠어요",
        comment: "방음이 잘 안 되어서 밤에 시끄럽고 조금 실망했습니다. 체크인 대기 시간도 길었습니다.",
        rating: 2.5,
    },
];

fn templates(language: Language) -> &'static [Template] {
    match language {
        Language::Ja => JA_TEMPLATES,
        Language::En => EN_TEMPLATES,
        Language::Zh => ZH_TEMPLATES,
        Language::Ko => KO_TEMPLATES,
    }
}

const AGE_GROUPS: &[&str] = &["20-29", "30-39", "40-49", "50-59", "60+"];
const GENDERS: &[Option<&str>] = &[Some("male"), Some("female"), None];
const TRIP_TYPES: &[&str] = &["leisure", "business", "family", "couple", "solo"];
const ROOM_TYPES: &[&str] = &["Standard", "Superior", "Deluxe", "Suite"];

/// Per-source shape of the demo data.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoProfile {
    pub source: Source,
    pub id_prefix: &'static str,
    pub scale: RatingScale,
    pub reviewer_prefix: &'static str,
    pub detail_keys: &'static [&'static str],
    /// `{id}` is replaced with the hotel id
    pub url_pattern: &'static str,
    /// Most records one call produces
    pub max_reviews: usize,
    pub default_languages: &'static [Language],
    /// Platform-scale rating reported by demo search
    pub hotel_rating: f64,
    pub hotel_review_count: u32,
}

impl DemoProfile {
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Rakuten => Self {
                source,
                id_prefix: "rakuten_demo",
                scale: RatingScale::FivePoint,
                reviewer_prefix: "楽天ユーザー",
                detail_keys: &["service", "location", "room", "facility", "meal"],
                url_pattern: "https://travel.rakuten.co.jp/HOTEL/{id}/review.html",
                max_reviews: 100,
                default_languages: &[Language::Ja],
                hotel_rating: 4.5,
                hotel_review_count: 200,
            },
            Source::Jalan => Self {
                source,
                id_prefix: "jalan_demo",
                scale: RatingScale::FivePoint,
                reviewer_prefix: "じゃらんユーザー",
                detail_keys: &["room", "bath", "breakfast", "dinner", "service", "cleanliness"],
                url_pattern: "https://www.jalan.net/yad{id}/kuchikomi/",
                max_reviews: 10,
                default_languages: &[Language::Ja],
                hotel_rating: 4.2,
                hotel_review_count: 150,
            },
            Source::Booking => Self {
                source,
                id_prefix: "booking_demo",
                scale: RatingScale::TenPoint,
                reviewer_prefix: "Guest_",
                detail_keys: &[
                    "cleanliness",
                    "comfort",
                    "location",
                    "facilities",
                    "staff",
                    "value_for_money",
                ],
                url_pattern: "https://www.booking.com/hotel/jp/{id}.html",
                max_reviews: 50,
                default_languages: &[Language::En, Language::Ja],
                hotel_rating: 8.5,
                hotel_review_count: 180,
            },
            Source::Expedia => Self {
                source,
                id_prefix: "expedia_demo",
                scale: RatingScale::FivePoint,
                reviewer_prefix: "Traveler",
                detail_keys: &["cleanliness", "service", "comfort", "location"],
                url_pattern: "https://www.expedia.com/hotel/{id}/reviews",
                max_reviews: 50,
                default_languages: &[Language::En],
                hotel_rating: 4.3,
                hotel_review_count: 250,
            },
            Source::Agoda => Self {
                source,
                id_prefix: "agoda_demo",
                scale: RatingScale::TenPoint,
                reviewer_prefix: "AgodaGuest",
                detail_keys: &["cleanliness", "facilities", "staff", "value_for_money"],
                url_pattern: "https://www.agoda.com/hotel/{id}/reviews",
                max_reviews: 50,
                default_languages: &[Language::En, Language::Zh, Language::Ko],
                hotel_rating: 8.8,
                hotel_review_count: 320,
            },
        }
    }

    pub fn hotel_url(&self, hotel_id: &str) -> String {
        self.url_pattern.replace("{id}", hotel_id)
    }

    /// The caller's query as the single search match.
    pub fn search_match(&self, query: &str) -> HotelCandidate {
        let digest = hex::encode(Sha256::digest(query.trim().as_bytes()));
        let id = format!("{}_hotel_{}", self.source, &digest[..10]);
        HotelCandidate {
            url: self.hotel_url(&id),
            id,
            name: query.trim().to_string(),
            rating: self.hotel_rating,
            review_count: self.hotel_review_count,
            address: None,
        }
    }

    /// Generate demo records for a hotel.
    ///
    /// `min(options.limit, max_reviews)` records are spread across the
    /// requested languages in proportion, the remainder going to the first.
    /// Posted dates fall within the year before `anchor`.
    pub fn reviews(
        &self,
        hotel_id: &str,
        options: &FetchOptions,
        anchor: DateTime<Utc>,
    ) -> Vec<RawReview> {
        let languages: Vec<Language> = match &options.languages {
            Some(requested) if !requested.is_empty() => requested.clone(),
            _ => self.default_languages.to_vec(),
        };
        let count = options.limit.min(self.max_reviews);

        let share = count / languages.len();
        let remainder = count % languages.len();

        let mut reviews = Vec::with_capacity(count);
        for (lang_idx, language) in languages.iter().enumerate() {
            let n = if lang_idx == 0 { share + remainder } else { share };
            for _ in 0..n {
                let index = reviews.len();
                reviews.push(self.review(hotel_id, index, *language, anchor));
            }
        }

        log::debug!(
            "Generated {} {} demo reviews for {}",
            reviews.len(),
            self.source,
            hotel_id
        );
        reviews
    }

    fn review(
        &self,
        hotel_id: &str,
        index: usize,
        language: Language,
        anchor: DateTime<Utc>,
    ) -> RawReview {
        let seed = Seed::new(self.source, hotel_id, index);
        let pool = templates(language);
        let template = &pool[seed.pick(0, pool.len())];

        let to_scale = |rating: f64| match self.scale {
            RatingScale::FivePoint => rating,
            RatingScale::TenPoint => rating * 2.0,
        };

        let details: BTreeMap<String, f64> = self
            .detail_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                // jitter in [-0.5, 0.5] around the overall rating
                let jitter = seed.pick(10 + i, 101) as f64 / 100.0 - 0.5;
                let value = (template.rating + jitter).clamp(1.0, 5.0);
                (key.to_string(), to_scale((value * 10.0).round() / 10.0))
            })
            .collect();

        let review_date = anchor - Duration::days(1 + seed.pick(1, 365) as i64);
        let stay_date = (review_date - Duration::days(3 + seed.pick(2, 28) as i64)).date_naive();

        RawReview {
            id: format!("{}_{}_{}", self.id_prefix, hotel_id, index),
            title: (index % 3 != 2).then(|| template.title.to_string()),
            comment: template.comment.to_string(),
            rating: to_scale(template.rating),
            rating_details: Some(details),
            reviewer_name: Some(format!("{}{}", self.reviewer_prefix, 1000 + seed.pick(3, 9000))),
            age_group: Some(AGE_GROUPS[seed.pick(4, AGE_GROUPS.len())].to_string()),
            gender: GENDERS[seed.pick(5, GENDERS.len())].map(String::from),
            stay_date: Some(stay_date),
            review_date: Some(review_date),
            trip_type: Some(TRIP_TYPES[seed.pick(6, TRIP_TYPES.len())].to_string()),
            room_type: Some(ROOM_TYPES[seed.pick(7, ROOM_TYPES.len())].to_string()),
            helpful_count: Some(seed.pick(8, 21) as u32),
            language: Some(language),
            url: Some(self.hotel_url(hotel_id)),
        }
    }
}

/// Midnight UTC of the current day; demo data is stable within a day.
pub fn today_anchor() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Digest-backed source of stable pseudo-random choices.
struct Seed([u8; 32]);

impl Seed {
    fn new(source: Source, hotel_id: &str, index: usize) -> Self {
        let digest = Sha256::digest(format!("{source}:{hotel_id}:{index}").as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Value in `0..modulo` drawn from the digest at `slot`.
    fn pick(&self, slot: usize, modulo: usize) -> usize {
        let start = (slot * 2) % 31;
        let value = u16::from_be_bytes([self.0[start], self.0[start + 1]]) as usize;
        value % modulo.max(1)
    }
}
