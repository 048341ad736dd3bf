use chrono::Utc;
use rand::seq::SliceRandom;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{GatewayError, Result};
use crate::models::{
    Card, CardDraft, CardId, Deck, DeckId, DeckSnapshot, DeckStats, Difficulty, Profile,
    SessionCard, SessionPayload, SessionResult, SessionStats, SubmitRequest,
};
use crate::study::{DeckSource, SessionGateway};

pub const DEFAULT_SESSION_SIZE: usize = 20;

const DECK_COLUMNS: &str = r#"
    SELECT d.id, d.name, d.owner, d.is_public, d.created_at,
           (SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id)
    FROM decks d
"#;

fn map_deck(row: &rusqlite::Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        is_public: row.get(3)?,
        created_at: row.get(4)?,
        card_count: row.get(5)?,
    })
}

/// SQLite-backed deck store and quick-learn backend, acting on behalf of one
/// user.
pub struct Database {
    conn: Connection,
    user: String,
    session_size: usize,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            user: String::from("local"),
            session_size: DEFAULT_SESSION_SIZE,
        })
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_session_size(mut self, size: usize) -> Self {
        self.session_size = size.max(1);
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                owner TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                tag TEXT,
                difficulty INTEGER CHECK(difficulty IS NULL OR difficulty BETWEEN 1 AND 3),
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            -- Quick-learn sessions issued to a user
            CREATE TABLE IF NOT EXISTS learn_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                user TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open' CHECK(status IN ('open', 'submitted', 'superseded')),
                started_at TEXT NOT NULL,
                submitted_at TEXT,
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS learn_session_cards (
                session_id INTEGER NOT NULL,
                card_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (session_id, card_id),
                FOREIGN KEY (session_id) REFERENCES learn_sessions(id) ON DELETE CASCADE,
                FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS card_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                card_id INTEGER NOT NULL,
                correct INTEGER NOT NULL,
                answered_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES learn_sessions(id) ON DELETE CASCADE,
                FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_deck_user ON learn_sessions(deck_id, user);
            CREATE INDEX IF NOT EXISTS idx_session_cards_session ON learn_session_cards(session_id);
            CREATE INDEX IF NOT EXISTS idx_results_session ON card_results(session_id);
            "#,
        )?;
        Ok(())
    }

    fn require_user(&self) -> Result<&str> {
        let user = self.user.trim();
        if user.is_empty() {
            Err(GatewayError::Unauthenticated)
        } else {
            Ok(user)
        }
    }

    // Name of a deck the user may read.
    fn visible_deck(&self, deck_id: DeckId) -> Result<String> {
        let user = self.require_user()?;
        self.conn
            .query_row(
                "SELECT name FROM decks WHERE id = ?1 AND (is_public = 1 OR owner = ?2)",
                params![deck_id, user],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| GatewayError::NotFound(format!("Deck {}", deck_id)))
    }

    fn owned_deck(&self, deck_id: DeckId) -> Result<String> {
        let user = self.require_user()?;
        self.conn
            .query_row(
                "SELECT name FROM decks WHERE id = ?1 AND owner = ?2",
                params![deck_id, user],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| GatewayError::NotFound(format!("Deck {}", deck_id)))
    }

    // Deck operations
    pub fn add_deck(&self, name: &str, is_public: bool) -> Result<DeckId> {
        let user = self.require_user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::Validation("deck name is required".into()));
        }
        self.conn.execute(
            "INSERT INTO decks (name, owner, is_public, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, user, is_public, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Decks the user owns plus every public deck, newest first.
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        let user = self.require_user()?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE d.is_public = 1 OR d.owner = ?1 ORDER BY d.id DESC",
            DECK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user], map_deck)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Public decks owned by someone else, newest first.
    pub fn public_decks(&self) -> Result<Vec<Deck>> {
        let user = self.require_user()?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE d.is_public = 1 AND d.owner <> ?1 ORDER BY d.id DESC",
            DECK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user], map_deck)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_deck_summary(&self, deck_id: DeckId) -> Result<Deck> {
        self.visible_deck(deck_id)?;
        let deck = self.conn.query_row(
            &format!("{} WHERE d.id = ?1", DECK_COLUMNS),
            params![deck_id],
            map_deck,
        )?;
        Ok(deck)
    }

    /// Renames the deck and/or changes its visibility. `None` leaves a field
    /// as it is.
    pub fn update_deck(
        &self,
        deck_id: DeckId,
        name: Option<&str>,
        is_public: Option<bool>,
    ) -> Result<()> {
        self.owned_deck(deck_id)?;
        let name = match name.map(str::trim) {
            Some("") => return Err(GatewayError::Validation("deck name is required".into())),
            other => other,
        };
        if name.is_none() && is_public.is_none() {
            return Err(GatewayError::Validation("nothing to update".into()));
        }
        self.conn.execute(
            r#"
            UPDATE decks SET name = COALESCE(?1, name), is_public = COALESCE(?2, is_public)
            WHERE id = ?3
            "#,
            params![name, is_public, deck_id],
        )?;
        log::debug!("deck {} updated", deck_id);
        Ok(())
    }

    /// Deck and card totals over the decks the user owns.
    pub fn profile(&self) -> Result<Profile> {
        let user = self.require_user()?;
        let (deck_count, card_count) = self.conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM((SELECT COUNT(*) FROM cards c WHERE c.deck_id = d.id)), 0)
            FROM decks d
            WHERE d.owner = ?1
            "#,
            params![user],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Profile {
            user: user.to_string(),
            deck_count,
            card_count,
        })
    }

    pub fn delete_deck(&self, deck_id: DeckId) -> Result<()> {
        self.owned_deck(deck_id)?;
        self.conn
            .execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
        Ok(())
    }

    // Card operations
    pub fn add_card(&self, deck_id: DeckId, draft: &CardDraft) -> Result<CardId> {
        self.owned_deck(deck_id)?;
        let (question, answer, tag) = validate_draft(draft)?;
        self.conn.execute(
            "INSERT INTO cards (deck_id, question, answer, tag, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                deck_id,
                question,
                answer,
                tag,
                draft.difficulty.map(|d| d.as_i64())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_card(&self, deck_id: DeckId, card_id: CardId, draft: &CardDraft) -> Result<()> {
        self.owned_deck(deck_id)?;
        let (question, answer, tag) = validate_draft(draft)?;
        let rows = self.conn.execute(
            r#"
            UPDATE cards SET question = ?1, answer = ?2, tag = ?3, difficulty = ?4
            WHERE id = ?5 AND deck_id = ?6
            "#,
            params![
                question,
                answer,
                tag,
                draft.difficulty.map(|d| d.as_i64()),
                card_id,
                deck_id
            ],
        )?;
        if rows == 0 {
            return Err(GatewayError::NotFound(format!("Card {}", card_id)));
        }
        Ok(())
    }

    pub fn delete_card(&self, deck_id: DeckId, card_id: CardId) -> Result<()> {
        self.owned_deck(deck_id)?;
        let rows = self.conn.execute(
            "DELETE FROM cards WHERE id = ?1 AND deck_id = ?2",
            params![card_id, deck_id],
        )?;
        if rows == 0 {
            return Err(GatewayError::NotFound(format!("Card {}", card_id)));
        }
        Ok(())
    }

    fn deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, answer, tag, difficulty FROM cards WHERE deck_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![deck_id], |row| {
            let difficulty: Option<i64> = row.get(4)?;
            Ok(Card {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                tag: row.get(3)?,
                difficulty: difficulty.and_then(Difficulty::from_i64),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Lifetime quick-learn totals for the user on this deck.
    pub fn deck_stats(&self, deck_id: DeckId) -> Result<DeckStats> {
        self.visible_deck(deck_id)?;
        let user = self.require_user()?;

        let total_cards_in_deck: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE deck_id = ?1",
            params![deck_id],
            |row| row.get(0),
        )?;

        let (cards_studied, total_correct, total_incorrect): (i64, i64, i64) =
            self.conn.query_row(
                r#"
                SELECT COUNT(DISTINCT r.card_id),
                       COALESCE(SUM(r.correct), 0),
                       COALESCE(SUM(1 - r.correct), 0)
                FROM card_results r
                JOIN learn_sessions s ON s.id = r.session_id
                WHERE s.deck_id = ?1 AND s.user = ?2
                "#,
                params![deck_id, user],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        Ok(DeckStats {
            total_cards_in_deck,
            cards_studied,
            total_correct,
            total_incorrect,
            overall_accuracy: fraction(total_correct, total_correct + total_incorrect),
        })
    }

    // Latest session of this user on the deck: (id, status)
    fn latest_session(&self, deck_id: DeckId, user: &str) -> Result<Option<(i64, String)>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, status FROM learn_sessions
                WHERE deck_id = ?1 AND user = ?2
                ORDER BY id DESC LIMIT 1
                "#,
                params![deck_id, user],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    fn session_card_ids(&self, session_id: i64) -> Result<Vec<CardId>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id FROM learn_session_cards WHERE session_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![session_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl DeckSource for Database {
    fn get_deck(&self, deck_id: DeckId) -> Result<DeckSnapshot> {
        let name = self.visible_deck(deck_id)?;
        Ok(DeckSnapshot {
            id: deck_id,
            name,
            cards: self.deck_cards(deck_id)?,
        })
    }
}

impl SessionGateway for Database {
    /// Issues a random subset of at most `session_size` cards. Any session
    /// still open for this user and deck is superseded.
    fn start_session(&self, deck_id: DeckId) -> Result<SessionPayload> {
        let deck_name = self.visible_deck(deck_id)?;
        let user = self.require_user()?;
        let cards = self.deck_cards(deck_id)?;

        let mut rng = rand::thread_rng();
        let picked: Vec<&Card> = cards
            .choose_multiple(&mut rng, self.session_size)
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE learn_sessions SET status = 'superseded' WHERE deck_id = ?1 AND user = ?2 AND status = 'open'",
            params![deck_id, user],
        )?;
        tx.execute(
            "INSERT INTO learn_sessions (deck_id, user, started_at) VALUES (?1, ?2, ?3)",
            params![deck_id, user, Utc::now().to_rfc3339()],
        )?;
        let session_id = tx.last_insert_rowid();
        for (position, card) in picked.iter().enumerate() {
            tx.execute(
                "INSERT INTO learn_session_cards (session_id, card_id, position) VALUES (?1, ?2, ?3)",
                params![session_id, card.id, position as i64],
            )?;
        }
        tx.commit()?;

        log::info!(
            "started quick-learn session {} on deck {} with {} cards",
            session_id,
            deck_id,
            picked.len()
        );

        Ok(SessionPayload {
            deck_id,
            deck_name,
            total_cards_in_deck: cards.len() as i64,
            cards: picked
                .into_iter()
                .map(|c| SessionCard {
                    card_id: c.id,
                    question: c.question.clone(),
                    answer: c.answer.clone(),
                })
                .collect(),
        })
    }

    fn submit_results(&self, deck_id: DeckId, request: &SubmitRequest) -> Result<SessionResult> {
        self.visible_deck(deck_id)?;
        let user = self.require_user()?;

        let (session_id, status) = self
            .latest_session(deck_id, user)?
            .ok_or_else(|| GatewayError::Conflict("no quick-learn session was started".into()))?;
        if status != "open" {
            return Err(GatewayError::Conflict(format!(
                "session {} is already {}",
                session_id, status
            )));
        }

        let expected: HashSet<CardId> = self.session_card_ids(session_id)?.into_iter().collect();
        let mut seen = HashSet::new();
        for answer in &request.answers {
            if !expected.contains(&answer.card_id) {
                return Err(GatewayError::Validation(format!(
                    "card {} is not part of this session",
                    answer.card_id
                )));
            }
            if !seen.insert(answer.card_id) {
                return Err(GatewayError::Validation(format!(
                    "card {} answered more than once",
                    answer.card_id
                )));
            }
        }
        if seen.len() != expected.len() {
            return Err(GatewayError::Validation(format!(
                "{} of {} cards answered",
                seen.len(),
                expected.len()
            )));
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        for answer in &request.answers {
            tx.execute(
                "INSERT INTO card_results (session_id, card_id, correct, answered_at) VALUES (?1, ?2, ?3, ?4)",
                params![session_id, answer.card_id, answer.correct, now],
            )?;
        }
        tx.execute(
            "UPDATE learn_sessions SET status = 'submitted', submitted_at = ?1 WHERE id = ?2",
            params![now, session_id],
        )?;
        tx.commit()?;

        let total = request.answers.len() as i64;
        let correct = request.answers.iter().filter(|a| a.correct).count() as i64;
        log::info!(
            "session {} submitted: {}/{} correct",
            session_id,
            correct,
            total
        );

        Ok(SessionResult {
            session_stats: SessionStats {
                total_cards: total,
                correct_count: correct,
                incorrect_count: total - correct,
                accuracy: fraction(correct, total),
            },
            deck_stats: self.deck_stats(deck_id)?,
        })
    }
}

// Accuracies go over the wire as 0-1 fractions.
fn fraction(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn validate_draft(draft: &CardDraft) -> Result<(&str, &str, Option<&str>)> {
    let question = draft.question.trim();
    let answer = draft.answer.trim();
    if question.is_empty() {
        return Err(GatewayError::Validation("question is required".into()));
    }
    if answer.is_empty() {
        return Err(GatewayError::Validation("answer is required".into()));
    }
    let tag = draft.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    Ok((question, answer, tag))
}
