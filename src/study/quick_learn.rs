//! Timed quick-learn sessions: the backend issues an ordered card set, every
//! card gets one correct/incorrect answer, and the answers are submitted for
//! scoring.
//!
//! Backend calls are split into a `begin_*` transition that hands out a
//! ticket and a completion transition that takes the ticket back. Tickets
//! carry the session generation, so a response that arrives after a restart
//! is recognised as stale and dropped.

use std::collections::HashMap;

use super::gateway::SessionGateway;
use crate::error::Result;
use crate::models::{
    CardAnswer, CardId, DeckId, SessionCard, SessionPayload, SessionResult, SubmitRequest,
};

/// Accuracy as a display percentage.
///
/// The backend may report either a 0-1 fraction or a 0-100 percentage;
/// values up to 1 are treated as fractions. Non-finite input becomes 0.
pub fn normalize_accuracy(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let percent = if raw <= 1.0 { raw * 100.0 } else { raw };
    percent.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickLearnPhase {
    Loading,
    InProgress,
    Complete,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTicket {
    generation: u64,
    deck_id: DeckId,
}

impl StartTicket {
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    generation: u64,
    deck_id: DeckId,
    request: SubmitRequest,
}

impl SubmitTicket {
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn request(&self) -> &SubmitRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickLearnState {
    deck_id: DeckId,
    generation: u64,
    session: Option<SessionPayload>,
    answers: HashMap<CardId, bool>,
    index: usize,
    show_answer: bool,
    loading: bool,
    submitting: bool,
    result: Option<SessionResult>,
}

impl QuickLearnState {
    pub fn new(deck_id: DeckId) -> Self {
        Self {
            deck_id,
            ..Self::default()
        }
    }

    /// Discards the current session and asks for a fresh one.
    pub fn begin_start(mut self) -> (Self, StartTicket) {
        self.generation += 1;
        self.session = None;
        self.answers.clear();
        self.result = None;
        self.index = 0;
        self.show_answer = false;
        self.loading = true;
        self.submitting = false;

        let ticket = StartTicket {
            generation: self.generation,
            deck_id: self.deck_id,
        };
        (self, ticket)
    }

    pub fn session_started(mut self, ticket: StartTicket, payload: SessionPayload) -> Self {
        if ticket.generation != self.generation {
            log::warn!(
                "dropping session for superseded start (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return self;
        }
        log::debug!(
            "quick-learn session for deck {} started with {} cards",
            payload.deck_id,
            payload.cards.len()
        );
        self.session = Some(payload);
        self.answers.clear();
        self.index = 0;
        self.show_answer = false;
        self.loading = false;
        self
    }

    pub fn start_failed(mut self, ticket: StartTicket) -> Self {
        if ticket.generation == self.generation {
            self.loading = false;
        }
        self
    }

    pub fn toggle_answer(mut self) -> Self {
        if self.result.is_none() && self.current_card().is_some() {
            self.show_answer = !self.show_answer;
        }
        self
    }

    /// Records the answer for the current card and moves on, staying put on
    /// the last card. Re-answering a card overwrites its entry.
    pub fn mark_answer(mut self, correct: bool) -> Self {
        if !self.accepts_answers() {
            return self;
        }
        let card_id = match self.current_card() {
            Some(card) => card.card_id,
            None => return self,
        };
        self.answers.insert(card_id, correct);

        if self.index + 1 < self.card_count() {
            self.index += 1;
            self.show_answer = false;
        }
        self
    }

    /// Moves the cursor back to revisit an earlier answer.
    pub fn prev(mut self) -> Self {
        if self.accepts_answers() && self.index > 0 {
            self.index -= 1;
            self.show_answer = false;
        }
        self
    }

    /// Returns a ticket only when the session is complete and nothing is in
    /// flight; otherwise the state is returned untouched.
    pub fn begin_submit(mut self) -> (Self, Option<SubmitTicket>) {
        let deck_id = match self.session.as_ref().map(|s| s.deck_id) {
            Some(id) if !self.submitting && self.result.is_none() => id,
            _ => return (self, None),
        };
        if !self.is_complete() {
            log::warn!(
                "submit rejected: {}/{} cards answered",
                self.answered_count(),
                self.card_count()
            );
            return (self, None);
        }

        let answers = self
            .cards()
            .iter()
            .map(|card| CardAnswer {
                card_id: card.card_id,
                correct: self.answers.get(&card.card_id).copied().unwrap_or(false),
            })
            .collect();
        let ticket = SubmitTicket {
            generation: self.generation,
            deck_id,
            request: SubmitRequest { answers },
        };
        self.submitting = true;
        (self, Some(ticket))
    }

    pub fn submit_succeeded(mut self, ticket: SubmitTicket, result: SessionResult) -> Self {
        if ticket.generation != self.generation || !self.submitting {
            log::warn!("dropping results for superseded submission");
            return self;
        }
        self.result = Some(result);
        self.submitting = false;
        self.show_answer = false;
        self
    }

    /// Re-enables submission; the recorded answers are kept.
    pub fn submit_failed(mut self, ticket: SubmitTicket) -> Self {
        if ticket.generation == self.generation {
            self.submitting = false;
        }
        self
    }

    fn accepts_answers(&self) -> bool {
        self.session.is_some() && !self.submitting && self.result.is_none()
    }

    pub fn phase(&self) -> QuickLearnPhase {
        if self.session.is_none() {
            QuickLearnPhase::Loading
        } else if self.result.is_some() {
            QuickLearnPhase::Submitted
        } else if self.submitting {
            QuickLearnPhase::Submitting
        } else if self.is_complete() {
            QuickLearnPhase::Complete
        } else {
            QuickLearnPhase::InProgress
        }
    }

    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn session(&self) -> Option<&SessionPayload> {
        self.session.as_ref()
    }

    pub fn cards(&self) -> &[SessionCard] {
        self.session
            .as_ref()
            .map(|s| s.cards.as_slice())
            .unwrap_or_default()
    }

    pub fn current_card(&self) -> Option<&SessionCard> {
        self.cards().get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn show_answer(&self) -> bool {
        self.show_answer
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn card_count(&self) -> usize {
        self.cards().len()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answer_for(&self, card_id: CardId) -> Option<bool> {
        self.answers.get(&card_id).copied()
    }

    /// True once every session card has an answer. An empty session is
    /// never complete.
    pub fn is_complete(&self) -> bool {
        let cards = self.cards();
        !cards.is_empty()
            && self.answers.len() == cards.len()
            && cards.iter().all(|c| self.answers.contains_key(&c.card_id))
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }
}

/// Runs a [`QuickLearnState`] against a gateway, one request at a time.
pub struct QuickLearnController<G> {
    gateway: G,
    state: QuickLearnState,
}

impl<G: SessionGateway> QuickLearnController<G> {
    pub fn new(gateway: G, deck_id: DeckId) -> Self {
        Self {
            gateway,
            state: QuickLearnState::new(deck_id),
        }
    }

    pub fn state(&self) -> &QuickLearnState {
        &self.state
    }

    /// Requests a fresh session; any previous answers and results are lost.
    pub fn start(&mut self) -> Result<()> {
        let (state, ticket) = std::mem::take(&mut self.state).begin_start();
        self.state = state;

        match self.gateway.start_session(ticket.deck_id()) {
            Ok(payload) => {
                self.update(|s| s.session_started(ticket, payload));
                Ok(())
            }
            Err(err) => {
                log::error!("start quick-learn for deck {} failed: {}", ticket.deck_id(), err);
                self.update(|s| s.start_failed(ticket));
                Err(err)
            }
        }
    }

    pub fn restart(&mut self) -> Result<()> {
        self.start()
    }

    pub fn toggle_answer(&mut self) {
        self.update(QuickLearnState::toggle_answer);
    }

    pub fn mark_answer(&mut self, correct: bool) {
        self.update(|s| s.mark_answer(correct));
    }

    pub fn prev(&mut self) {
        self.update(QuickLearnState::prev);
    }

    /// Submits the answers. Returns `Ok(false)` without calling the backend
    /// when the session is not ready to submit.
    pub fn submit_results(&mut self) -> Result<bool> {
        let (state, ticket) = std::mem::take(&mut self.state).begin_submit();
        self.state = state;
        let ticket = match ticket {
            Some(ticket) => ticket,
            None => return Ok(false),
        };

        match self.gateway.submit_results(ticket.deck_id(), ticket.request()) {
            Ok(result) => {
                self.update(|s| s.submit_succeeded(ticket, result));
                Ok(true)
            }
            Err(err) => {
                log::error!("submit quick-learn for deck {} failed: {}", ticket.deck_id(), err);
                self.update(|s| s.submit_failed(ticket));
                Err(err)
            }
        }
    }

    fn update(&mut self, f: impl FnOnce(QuickLearnState) -> QuickLearnState) {
        let state = std::mem::take(&mut self.state);
        self.state = f(state);
    }
}
