use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Backend sends `null` for missing text and keyword columns.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row of the article list. Replaced wholesale on every fetch.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ArticleSummary {
    pub id: u32,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "published_date")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

impl ArticleSummary {
    /// Confidence as a whole percentage, clamped to 0..=100.
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence_score
            .map(|score| (score.clamp(0.0, 1.0) * 100.0).round() as u8)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// One page of `GET /articles/`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ArticlePage {
    pub articles: Vec<ArticleSummary>,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct TodayArticles {
    pub articles: Vec<ArticleSummary>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Stats {
    pub total_articles: u64,
    pub today_articles: u64,
    /// Uncategorized rows arrive under the key "null".
    #[serde(default, rename = "category_counts")]
    pub category_count_by_name: BTreeMap<String, u64>,
}

impl Stats {
    pub fn category_total(&self) -> usize {
        self.category_count_by_name.len()
    }
}

/// Result of `POST /scheduler/collect`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CollectionSummary {
    pub collected: u64,
    pub saved: u64,
    #[serde(default)]
    pub medical: Option<u64>,
    #[serde(default)]
    pub skipped: Option<u64>,
}

/// Result of `POST /scheduler/collect-historical`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct HistoricalSummary {
    pub period: String,
    pub collected: u64,
    pub saved: u64,
    pub skipped: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SchedulerStatus {
    pub status: String,
    #[serde(default)]
    pub collection_time: Option<String>,
    #[serde(default)]
    pub max_articles_per_day: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryList {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourceList {
    pub sources: Vec<String>,
}
