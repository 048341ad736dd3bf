//! Tag/difficulty selection and ordering over a deck's cards.
//!
//! Everything here is total: empty input yields empty output.

use std::cmp::Ordering;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Card, Difficulty};

pub const GENERAL_TAG_LABEL: &str = "General";
pub const ALL_TAGS_LABEL: &str = "All";

// Real tags that read like a picker label are shown with a '#' prefix.
fn write_tag(f: &mut impl fmt::Write, name: &str) -> fmt::Result {
    if name.eq_ignore_ascii_case(GENERAL_TAG_LABEL) || name.eq_ignore_ascii_case(ALL_TAGS_LABEL) {
        write!(f, "#{}", name)
    } else {
        f.write_str(name)
    }
}

/// An entry in the tag picker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagOption {
    /// Groups every card without a tag.
    General,
    Named(String),
}

impl fmt::Display for TagOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOption::General => f.write_str(GENERAL_TAG_LABEL),
            TagOption::Named(name) => write_tag(f, name),
        }
    }
}

/// The active tag selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TagFilter {
    #[default]
    All,
    General,
    Tag(String),
}

impl TagFilter {
    /// Parses a typed tag name. Any non-blank input names a real tag, so a
    /// tag called "General" stays reachable; untagged cards are selected
    /// with [`TagFilter::General`] itself.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            TagFilter::All
        } else {
            TagFilter::Tag(trimmed.to_string())
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::General => card.tag_label().is_none(),
            TagFilter::Tag(tag) => card.tag_label() == Some(tag.as_str()),
        }
    }

    pub fn is_available(&self, options: &[TagOption]) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::General => options.contains(&TagOption::General),
            TagFilter::Tag(tag) => options
                .iter()
                .any(|o| matches!(o, TagOption::Named(name) if name == tag)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TagFilter::All => ALL_TAGS_LABEL.to_string(),
            TagFilter::General => GENERAL_TAG_LABEL.to_string(),
            TagFilter::Tag(tag) => {
                let mut label = String::new();
                let _ = write_tag(&mut label, tag);
                label
            }
        }
    }
}

impl From<&TagOption> for TagFilter {
    fn from(option: &TagOption) -> Self {
        match option {
            TagOption::General => TagFilter::General,
            TagOption::Named(name) => TagFilter::Tag(name.clone()),
        }
    }
}

// Approximates a locale collation: case-insensitive first, raw bytes as tiebreak.
fn compare_tags(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Distinct trimmed tags in ascending order, with `General` first when any
/// card is untagged.
pub fn select_tags(cards: &[Card]) -> Vec<TagOption> {
    let mut has_untagged = false;
    let mut names: Vec<&str> = Vec::new();

    for card in cards {
        match card.tag_label() {
            Some(tag) => names.push(tag),
            None => has_untagged = true,
        }
    }

    names.sort_by(|a, b| compare_tags(a, b));
    names.dedup();

    let mut options = Vec::with_capacity(names.len() + 1);
    if has_untagged {
        options.push(TagOption::General);
    }
    options.extend(names.into_iter().map(|n| TagOption::Named(n.to_string())));
    options
}

/// Drops a selection that no longer exists among `options`.
pub fn retain_selection(selected: TagFilter, options: &[TagOption]) -> TagFilter {
    if selected.is_available(options) {
        selected
    } else {
        log::debug!("tag filter {:?} no longer available, clearing", selected);
        TagFilter::All
    }
}

/// Cards matching both filters, in input order.
pub fn apply_filters<'a>(
    cards: &'a [Card],
    tag: &TagFilter,
    difficulty: Option<Difficulty>,
) -> Vec<&'a Card> {
    cards
        .iter()
        .filter(|card| tag.matches(card))
        .filter(|card| difficulty.map_or(true, |d| card.difficulty == Some(d)))
        .collect()
}

/// Returns a uniformly random permutation of `items`, leaving the input as is.
///
/// `SliceRandom::shuffle` is a Fisher-Yates pass: for each `i` from the end
/// down to 1 it swaps `i` with a uniform pick from `0..=i`.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}
