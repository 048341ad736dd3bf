//! The study-session engine: card selection and the two review modes.

pub mod filter;
pub mod gateway;
pub mod practice;
pub mod quick_learn;

pub use filter::{TagFilter, TagOption};
pub use gateway::{DeckSource, SessionGateway};
pub use practice::{PracticeController, PracticeState, PracticeStatus};
pub use quick_learn::{normalize_accuracy, QuickLearnController, QuickLearnPhase, QuickLearnState};
