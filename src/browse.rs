//! Search, size buckets and sort orders for the public deck listing.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use clap::ValueEnum;

use crate::models::Deck;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SizeBucket {
    #[default]
    All,
    /// No cards
    Empty,
    /// 1 to 20 cards
    Small,
    /// 21 to 60 cards
    Medium,
    /// 61 cards or more
    Large,
}

impl SizeBucket {
    pub fn contains(self, card_count: i64) -> bool {
        match self {
            SizeBucket::All => true,
            SizeBucket::Empty => card_count == 0,
            SizeBucket::Small => (1..=20).contains(&card_count),
            SizeBucket::Medium => (21..=60).contains(&card_count),
            SizeBucket::Large => card_count >= 61,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeckSort {
    #[default]
    Newest,
    Oldest,
    MostCards,
    LeastCards,
    NameAz,
    NameZa,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckQuery {
    pub search: Option<String>,
    pub min_cards: Option<i64>,
    pub size: SizeBucket,
    pub sort: DeckSort,
}

fn created(deck: &Deck) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&deck.created_at).ok()
}

fn compare_names(a: &Deck, b: &Deck) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Applies the search term, minimum size and size bucket, then sorts.
/// The sort is stable, so ties keep their listing order.
pub fn browse(decks: Vec<Deck>, query: &DeckQuery) -> Vec<Deck> {
    let term = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let min_cards = query.min_cards.filter(|&n| n > 0);

    let mut decks: Vec<Deck> = decks
        .into_iter()
        .filter(|d| {
            term.as_deref()
                .map_or(true, |t| d.name.to_lowercase().contains(t))
        })
        .filter(|d| min_cards.map_or(true, |n| d.card_count >= n))
        .filter(|d| query.size.contains(d.card_count))
        .collect();

    decks.sort_by(|a, b| match query.sort {
        DeckSort::Newest => created(b).cmp(&created(a)),
        DeckSort::Oldest => created(a).cmp(&created(b)),
        DeckSort::MostCards => b.card_count.cmp(&a.card_count),
        DeckSort::LeastCards => a.card_count.cmp(&b.card_count),
        DeckSort::NameAz => compare_names(a, b),
        DeckSort::NameZa => compare_names(b, a),
    });
    decks
}
