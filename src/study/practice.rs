//! Manual card-by-card review over a filtered, optionally shuffled deck.
//!
//! [`PracticeState`] is a value: every transition consumes it and returns the
//! next state. Derived views (filtered cards, display order, current card)
//! are computed from the canonical fields on demand.

use rand::Rng;

use super::filter::{apply_filters, retain_selection, select_tags, shuffle, TagFilter, TagOption};
use super::gateway::DeckSource;
use crate::error::Result;
use crate::models::{Card, DeckId, DeckSnapshot, Difficulty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeStatus {
    Loading,
    Ready,
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeState {
    deck: Option<DeckSnapshot>,
    tags: Vec<TagOption>,
    tag_filter: TagFilter,
    difficulty: Option<Difficulty>,
    random_order: bool,
    // Positions into the filtered cards; `None` keeps deck order.
    order: Option<Vec<usize>>,
    index: usize,
    show_answer: bool,
}

impl PracticeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets filters and ordering, e.g. from command-line flags.
    pub fn with_options(
        mut self,
        tag_filter: TagFilter,
        difficulty: Option<Difficulty>,
        random_order: bool,
    ) -> Self {
        self.tag_filter = tag_filter;
        self.difficulty = difficulty;
        self.random_order = random_order;
        self
    }

    pub fn load_deck<R: Rng + ?Sized>(mut self, deck: DeckSnapshot, rng: &mut R) -> Self {
        self.tags = select_tags(&deck.cards);
        self.tag_filter = retain_selection(self.tag_filter, &self.tags);
        self.deck = Some(deck);
        self.reorder(rng)
    }

    pub fn toggle_answer(mut self) -> Self {
        self.show_answer = !self.show_answer;
        self
    }

    pub fn next(mut self) -> Self {
        if self.index + 1 < self.len() {
            self.index += 1;
            self.show_answer = false;
        }
        self
    }

    pub fn prev(mut self) -> Self {
        if self.index > 0 {
            self.index -= 1;
            self.show_answer = false;
        }
        self
    }

    pub fn restart(mut self) -> Self {
        self.index = 0;
        self.show_answer = false;
        self
    }

    pub fn set_filter<R: Rng + ?Sized>(
        mut self,
        tag_filter: TagFilter,
        difficulty: Option<Difficulty>,
        rng: &mut R,
    ) -> Self {
        self.tag_filter = tag_filter;
        self.difficulty = difficulty;
        self.reorder(rng)
    }

    pub fn toggle_random_order<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.random_order = !self.random_order;
        self.reorder(rng)
    }

    /// Re-randomizes the order, switching random mode on if it was off.
    pub fn shuffle_now<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.random_order = true;
        self.reorder(rng)
    }

    fn reorder<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let len = self.filtered_cards().len();
        self.order = if self.random_order {
            let positions: Vec<usize> = (0..len).collect();
            Some(shuffle(&positions, rng))
        } else {
            None
        };
        self.index = 0;
        self.show_answer = false;
        self
    }

    pub fn status(&self) -> PracticeStatus {
        match &self.deck {
            None => PracticeStatus::Loading,
            Some(_) if self.len() == 0 => PracticeStatus::Empty,
            Some(_) => PracticeStatus::Ready,
        }
    }

    pub fn deck_name(&self) -> Option<&str> {
        self.deck.as_ref().map(|d| d.name.as_str())
    }

    pub fn available_tags(&self) -> &[TagOption] {
        &self.tags
    }

    pub fn tag_filter(&self) -> &TagFilter {
        &self.tag_filter
    }

    pub fn difficulty_filter(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn random_order(&self) -> bool {
        self.random_order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn show_answer(&self) -> bool {
        self.show_answer
    }

    pub fn filtered_cards(&self) -> Vec<&Card> {
        match &self.deck {
            Some(deck) => apply_filters(&deck.cards, &self.tag_filter, self.difficulty),
            None => Vec::new(),
        }
    }

    pub fn display_cards(&self) -> Vec<&Card> {
        let filtered = self.filtered_cards();
        match &self.order {
            Some(order) if order.len() == filtered.len() => {
                order.iter().map(|&i| filtered[i]).collect()
            }
            _ => filtered,
        }
    }

    pub fn len(&self) -> usize {
        self.filtered_cards().len()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.display_cards().get(self.index).copied()
    }

    pub fn is_at_start(&self) -> bool {
        self.index == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.index + 1 >= self.len()
    }

    /// The tag selection after `current` in picker order, wrapping back to all.
    pub fn next_tag_filter(&self) -> TagFilter {
        let options: Vec<TagFilter> = self.tags.iter().map(TagFilter::from).collect();
        match &self.tag_filter {
            TagFilter::All => options.into_iter().next().unwrap_or_default(),
            current => options
                .iter()
                .position(|o| o == current)
                .and_then(|i| options.get(i + 1).cloned())
                .unwrap_or_default(),
        }
    }

    pub fn next_difficulty_filter(&self) -> Option<Difficulty> {
        match self.difficulty {
            None => Some(Difficulty::Low),
            Some(Difficulty::Low) => Some(Difficulty::Medium),
            Some(Difficulty::Medium) => Some(Difficulty::Hard),
            Some(Difficulty::Hard) => None,
        }
    }
}

/// Drives a [`PracticeState`] for one deck, owning the card source and the
/// random number generator used for shuffling.
pub struct PracticeController<S, R> {
    source: S,
    rng: R,
    deck_id: DeckId,
    state: PracticeState,
}

impl<S: DeckSource, R: Rng> PracticeController<S, R> {
    pub fn new(source: S, rng: R, deck_id: DeckId) -> Self {
        Self {
            source,
            rng,
            deck_id,
            state: PracticeState::new(),
        }
    }

    pub fn with_options(
        mut self,
        tag_filter: TagFilter,
        difficulty: Option<Difficulty>,
        random_order: bool,
    ) -> Self {
        self.state = self.state.with_options(tag_filter, difficulty, random_order);
        self
    }

    /// Fetches the deck and starts at its first card.
    pub fn load(&mut self) -> Result<()> {
        let deck = self.source.get_deck(self.deck_id).map_err(|e| {
            log::error!("load deck {} failed: {}", self.deck_id, e);
            e
        })?;
        log::debug!("practice deck {} loaded with {} cards", deck.id, deck.cards.len());
        self.update(|state, rng| state.load_deck(deck, rng));
        Ok(())
    }

    pub fn state(&self) -> &PracticeState {
        &self.state
    }

    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn toggle_answer(&mut self) {
        self.update(|state, _| state.toggle_answer());
    }

    pub fn next(&mut self) {
        self.update(|state, _| state.next());
    }

    pub fn prev(&mut self) {
        self.update(|state, _| state.prev());
    }

    pub fn restart(&mut self) {
        self.update(|state, _| state.restart());
    }

    pub fn set_filter(&mut self, tag_filter: TagFilter, difficulty: Option<Difficulty>) {
        self.update(|state, rng| state.set_filter(tag_filter, difficulty, rng));
    }

    pub fn toggle_random_order(&mut self) {
        self.update(|state, rng| state.toggle_random_order(rng));
    }

    pub fn shuffle_now(&mut self) {
        self.update(|state, rng| state.shuffle_now(rng));
    }

    fn update(&mut self, f: impl FnOnce(PracticeState, &mut R) -> PracticeState) {
        let state = std::mem::take(&mut self.state);
        self.state = f(state, &mut self.rng);
    }
}
