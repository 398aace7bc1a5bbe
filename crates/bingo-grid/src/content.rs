//! The buzzword content pool.
//!
//! Content is a static YAML table compiled into the binary. Each item
//! carries a category, a popularity score (0-100) and a pain level (1-10).
//! Every random operation takes the caller's RNG so selection stays
//! reproducible for seeded grids without touching shared state.

use std::collections::BTreeMap;

use bingo_types::Theme;
use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Embedded content table.
const EMBEDDED_CONTENT: &str = include_str!("../data/buzzwords.yaml");

/// Popularity at or above which an item from another category counts as
/// related to anything.
const RELATED_POPULARITY_FLOOR: u32 = 80;

/// Metadata for one content category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// How often the category turns up, 0-100.
    pub popularity: u32,
    /// How annoying the category is, 1-10.
    pub pain_level: u32,
}

/// One phrase that can appear on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Text placed on the cell.
    pub text: String,
    /// Category key.
    pub category: String,
    /// How often the phrase turns up, 0-100.
    pub popularity: u32,
    /// How annoying the phrase is, 1-10.
    pub pain_level: u32,
    /// Alternative spellings.
    #[serde(default)]
    pub variants: Vec<String>,
    /// When the phrase is typically heard.
    #[serde(default)]
    pub context: Option<String>,
}

/// Aggregate figures for one category, as returned by
/// [`ContentPool::category_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Category key.
    pub category: String,
    /// Display name (falls back to the key).
    pub name: String,
    /// Number of items.
    pub count: usize,
    /// Mean popularity, rounded to the nearest integer.
    pub average_popularity: u32,
    /// Mean pain level, rounded to one decimal place.
    pub average_pain_level: Decimal,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    categories: BTreeMap<String, CategoryInfo>,
    buzzwords: Vec<ContentItem>,
}

/// Read-only collection of content items indexed by category.
#[derive(Debug, Clone)]
pub struct ContentPool {
    categories: BTreeMap<String, CategoryInfo>,
    items: Vec<ContentItem>,
}

impl ContentPool {
    /// Load the table compiled into the crate.
    pub fn embedded() -> Result<Self, GridError> {
        Self::from_yaml(EMBEDDED_CONTENT)
    }

    /// Parse a content table.
    pub fn from_yaml(raw: &str) -> Result<Self, GridError> {
        let file: ContentFile = serde_yml::from_str(raw)?;
        tracing::debug!(
            categories = file.categories.len(),
            items = file.buzzwords.len(),
            "Loaded content pool"
        );
        Ok(Self {
            categories: file.categories,
            items: file.buzzwords,
        })
    }

    /// Every item, in table order.
    pub fn all(&self) -> &[ContentItem] {
        &self.items
    }

    /// Category metadata keyed by category.
    pub const fn categories(&self) -> &BTreeMap<String, CategoryInfo> {
        &self.categories
    }

    /// Items in `category`, in table order.
    pub fn by_category(&self, category: &str) -> Vec<&ContentItem> {
        self.items.iter().filter(|i| i.category == category).collect()
    }

    /// Uniform sample of up to `count` items outside `exclude`.
    pub fn random_sample<R: Rng + ?Sized>(
        &self,
        count: usize,
        exclude: &[String],
        rng: &mut R,
    ) -> Vec<&ContentItem> {
        let mut candidates = self.without(exclude);
        candidates.shuffle(rng);
        candidates.truncate(count);
        candidates
    }

    /// Popularity-weighted sample of up to `count` items outside
    /// `exclude`, without replacement.
    pub fn weighted_sample<R: Rng + ?Sized>(
        &self,
        count: usize,
        exclude: &[String],
        rng: &mut R,
    ) -> Vec<&ContentItem> {
        weighted_pick(self.without(exclude), count, rng)
    }

    /// Up to `count` items for a themed card.
    ///
    /// Draws a weighted sample from the theme's categories. When those
    /// categories hold fewer than `count` items, the shortfall is filled
    /// with the most popular items from other categories. `Mixed` falls
    /// back to an unrestricted weighted sample.
    pub fn themed<R: Rng + ?Sized>(&self, theme: Theme, count: usize, rng: &mut R) -> Vec<&ContentItem> {
        let categories = theme.categories();
        if categories.is_empty() {
            return self.weighted_sample(count, &[], rng);
        }

        let in_theme: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|i| categories.contains(&i.category.as_str()))
            .collect();
        let mut selected = weighted_pick(in_theme, count, rng);

        let missing = count.saturating_sub(selected.len());
        if missing > 0 {
            selected.extend(
                self.ranked_by(|i| i.popularity)
                    .into_iter()
                    .filter(|i| !categories.contains(&i.category.as_str()))
                    .take(missing),
            );
        }
        selected
    }

    /// Case-insensitive substring search over text, context and variants.
    pub fn search(&self, query: &str) -> Vec<&ContentItem> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|i| {
                i.text.to_lowercase().contains(&needle)
                    || i.context.as_ref().is_some_and(|c| c.to_lowercase().contains(&needle))
                    || i.variants.iter().any(|v| v.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The `n` most popular items; ties keep table order.
    pub fn most_popular(&self, n: usize) -> Vec<&ContentItem> {
        let mut ranked = self.ranked_by(|i| i.popularity);
        ranked.truncate(n);
        ranked
    }

    /// The `n` most painful items; ties keep table order.
    pub fn most_painful(&self, n: usize) -> Vec<&ContentItem> {
        let mut ranked = self.ranked_by(|i| i.pain_level);
        ranked.truncate(n);
        ranked
    }

    /// Up to `n` items that tend to appear alongside `item`: others from
    /// its category first, then popular items from other categories.
    pub fn related(&self, item: &ContentItem, n: usize) -> Vec<&ContentItem> {
        let mut related: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|i| i.category == item.category && i.text != item.text)
            .take(n)
            .collect();

        let missing = n.saturating_sub(related.len());
        if missing > 0 {
            related.extend(
                self.ranked_by(|i| i.popularity)
                    .into_iter()
                    .filter(|i| i.category != item.category && i.popularity >= RELATED_POPULARITY_FLOOR)
                    .take(missing),
            );
        }
        related
    }

    /// Per-category counts and averages, for categories that have items.
    pub fn category_stats(&self) -> Result<Vec<CategoryStats>, GridError> {
        let mut grouped: BTreeMap<&str, Vec<&ContentItem>> = BTreeMap::new();
        for item in &self.items {
            grouped.entry(item.category.as_str()).or_default().push(item);
        }

        grouped
            .into_iter()
            .map(|(category, items)| {
                let count = Decimal::from(items.len());
                let popularity_sum: u32 = items.iter().map(|i| i.popularity).sum();
                let pain_sum: u32 = items.iter().map(|i| i.pain_level).sum();

                let average_popularity = Decimal::from(popularity_sum)
                    .checked_div(count)
                    .ok_or(GridError::ArithmeticOverflow)?
                    .round();
                let average_pain_level = Decimal::from(pain_sum)
                    .checked_div(count)
                    .ok_or(GridError::ArithmeticOverflow)?
                    .round_dp(1);

                Ok(CategoryStats {
                    category: category.to_owned(),
                    name: self
                        .categories
                        .get(category)
                        .map_or_else(|| category.to_owned(), |c| c.name.clone()),
                    count: items.len(),
                    average_popularity: average_popularity
                        .to_u32()
                        .ok_or(GridError::ArithmeticOverflow)?,
                    average_pain_level,
                })
            })
            .collect()
    }

    /// Popularity of the item whose text matches `text` (case-insensitive).
    pub fn popularity_of(&self, text: &str) -> Option<u32> {
        let wanted = text.to_lowercase();
        self.items
            .iter()
            .find(|i| i.text.to_lowercase() == wanted)
            .map(|i| i.popularity)
    }

    fn without(&self, exclude: &[String]) -> Vec<&ContentItem> {
        self.items
            .iter()
            .filter(|i| !exclude.contains(&i.category))
            .collect()
    }

    fn ranked_by(&self, key: impl Fn(&ContentItem) -> u32) -> Vec<&ContentItem> {
        let mut ranked: Vec<&ContentItem> = self.items.iter().collect();
        ranked.sort_by_key(|i| std::cmp::Reverse(key(i)));
        ranked
    }
}

/// Weighted sampling without replacement. Items with zero total weight
/// left are taken uniformly.
fn weighted_pick<'a, R: Rng + ?Sized>(
    mut remaining: Vec<&'a ContentItem>,
    count: usize,
    rng: &mut R,
) -> Vec<&'a ContentItem> {
    let mut selected = Vec::with_capacity(count.min(remaining.len()));

    while selected.len() < count && !remaining.is_empty() {
        let total: u32 = remaining.iter().map(|i| i.popularity).sum();
        let index = if total == 0 {
            rng.random_range(0..remaining.len())
        } else {
            let mut ticket = rng.random_range(0..total);
            remaining
                .iter()
                .position(|i| {
                    if ticket < i.popularity {
                        true
                    } else {
                        ticket = ticket.saturating_sub(i.popularity);
                        false
                    }
                })
                .unwrap_or(0)
        };
        selected.push(remaining.swap_remove(index));
    }

    selected
}
