//! Seams between the study engine and whatever stores decks and scores
//! sessions.

use crate::error::Result;
use crate::models::{DeckId, DeckSnapshot, SessionPayload, SessionResult, SubmitRequest};

/// Read access to a deck's cards, used to seed practice sessions.
pub trait DeckSource {
    fn get_deck(&self, deck_id: DeckId) -> Result<DeckSnapshot>;
}

/// Issues quick-learn sessions and scores them.
pub trait SessionGateway {
    /// Returns a curated, already-ordered card subset for the deck.
    fn start_session(&self, deck_id: DeckId) -> Result<SessionPayload>;

    /// Scores the answers for the deck's current session.
    fn submit_results(&self, deck_id: DeckId, request: &SubmitRequest) -> Result<SessionResult>;
}

impl<T: DeckSource + ?Sized> DeckSource for &T {
    fn get_deck(&self, deck_id: DeckId) -> Result<DeckSnapshot> {
        (**self).get_deck(deck_id)
    }
}

impl<T: SessionGateway + ?Sized> SessionGateway for &T {
    fn start_session(&self, deck_id: DeckId) -> Result<SessionPayload> {
        (**self).start_session(deck_id)
    }

    fn submit_results(&self, deck_id: DeckId, request: &SubmitRequest) -> Result<SessionResult> {
        (**self).submit_results(deck_id, request)
    }
}

#[cfg(test)]
pub mod memory {
    //! Scriptable in-memory backend for controller tests.

    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};

    use super::*;
    use crate::error::GatewayError;
    use crate::models::{Card, DeckStats, SessionCard, SessionStats};

    #[derive(Default)]
    pub struct MemoryGateway {
        decks: HashMap<DeckId, DeckSnapshot>,
        pub start_failures: RefCell<VecDeque<GatewayError>>,
        pub submit_failures: RefCell<VecDeque<GatewayError>>,
        pub start_calls: Cell<usize>,
        pub submit_calls: Cell<usize>,
        pub last_submit: RefCell<Option<SubmitRequest>>,
    }

    impl MemoryGateway {
        pub fn with_deck(id: DeckId, name: &str, cards: Vec<Card>) -> Self {
            let mut gateway = Self::default();
            gateway.decks.insert(
                id,
                DeckSnapshot {
                    id,
                    name: name.to_string(),
                    cards,
                },
            );
            gateway
        }

        pub fn fail_next_start(&self, err: GatewayError) {
            self.start_failures.borrow_mut().push_back(err);
        }

        pub fn fail_next_submit(&self, err: GatewayError) {
            self.submit_failures.borrow_mut().push_back(err);
        }
    }

    impl DeckSource for MemoryGateway {
        fn get_deck(&self, deck_id: DeckId) -> Result<DeckSnapshot> {
            self.decks
                .get(&deck_id)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("Deck {}", deck_id)))
        }
    }

    impl SessionGateway for MemoryGateway {
        fn start_session(&self, deck_id: DeckId) -> Result<SessionPayload> {
            self.start_calls.set(self.start_calls.get() + 1);
            if let Some(err) = self.start_failures.borrow_mut().pop_front() {
                return Err(err);
            }
            let deck = self.get_deck(deck_id)?;
            Ok(SessionPayload {
                deck_id,
                deck_name: deck.name,
                total_cards_in_deck: deck.cards.len() as i64,
                cards: deck
                    .cards
                    .into_iter()
                    .map(|c| SessionCard {
                        card_id: c.id,
                        question: c.question,
                        answer: c.answer,
                    })
                    .collect(),
            })
        }

        fn submit_results(&self, deck_id: DeckId, request: &SubmitRequest) -> Result<SessionResult> {
            self.submit_calls.set(self.submit_calls.get() + 1);
            *self.last_submit.borrow_mut() = Some(request.clone());
            if let Some(err) = self.submit_failures.borrow_mut().pop_front() {
                return Err(err);
            }
            let deck = self.get_deck(deck_id)?;
            let total = request.answers.len() as i64;
            let correct = request.answers.iter().filter(|a| a.correct).count() as i64;
            let accuracy = if total == 0 {
                0.0
            } else {
                correct as f64 / total as f64
            };
            Ok(SessionResult {
                session_stats: SessionStats {
                    total_cards: total,
                    correct_count: correct,
                    incorrect_count: total - correct,
                    accuracy,
                },
                deck_stats: DeckStats {
                    total_cards_in_deck: deck.cards.len() as i64,
                    cards_studied: total,
                    total_correct: correct,
                    total_incorrect: total - correct,
                    overall_accuracy: accuracy * 100.0,
                },
            })
        }
    }
}
