mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::ThreadRng;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::Database;
use crate::study::{PracticeController, QuickLearnController, TagFilter};

pub enum Screen {
    Practice(PracticeController<Database, ThreadRng>),
    QuickLearn(QuickLearnController<Database>),
}

pub struct App {
    pub screen: Screen,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            status: None,
            should_quit: false,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if key == KeyCode::Char('q') || key == KeyCode::Esc {
            self.should_quit = true;
            return;
        }

        self.status = None;
        match &mut self.screen {
            Screen::Practice(practice) => match key {
                KeyCode::Char(' ') => practice.toggle_answer(),
                KeyCode::Char('l') | KeyCode::Char('j') | KeyCode::Right | KeyCode::Down => {
                    practice.next()
                }
                KeyCode::Char('h') | KeyCode::Char('k') | KeyCode::Left | KeyCode::Up => {
                    practice.prev()
                }
                KeyCode::Char('g') => practice.restart(),
                KeyCode::Char('o') => practice.toggle_random_order(),
                KeyCode::Char('s') => practice.shuffle_now(),
                KeyCode::Char('t') => {
                    let state = practice.state();
                    let (tag, difficulty) = (state.next_tag_filter(), state.difficulty_filter());
                    practice.set_filter(tag, difficulty);
                }
                KeyCode::Char('d') => {
                    let state = practice.state();
                    let (tag, difficulty) =
                        (state.tag_filter().clone(), state.next_difficulty_filter());
                    practice.set_filter(tag, difficulty);
                }
                KeyCode::Char('c') => practice.set_filter(TagFilter::All, None),
                _ => {}
            },

            Screen::QuickLearn(learn) => match key {
                KeyCode::Char(' ') => learn.toggle_answer(),
                KeyCode::Char('y') => learn.mark_answer(true),
                KeyCode::Char('n') => learn.mark_answer(false),
                KeyCode::Char('h') | KeyCode::Left => learn.prev(),
                KeyCode::Enter => match learn.submit_results() {
                    Ok(true) => {}
                    Ok(false) if learn.state().result().is_none() => {
                        self.status = Some("Answer every card before submitting".to_string());
                    }
                    Ok(false) => {}
                    Err(e) => self.status = Some(format!("Submit failed: {}", e)),
                },
                KeyCode::Char('r') => {
                    if let Err(e) = learn.restart() {
                        self.status = Some(format!("Could not start a session: {}", e));
                    }
                }
                _ => {}
            },
        }
    }
}

pub fn run(screen: Screen) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(screen);
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardDraft, DeckId, Difficulty};
    use crate::study::{QuickLearnPhase, TagOption};

    fn setup_db() -> (Database, DeckId) {
        let db = Database::open(":memory:").unwrap().with_user("alice");
        db.init().unwrap();
        let deck_id = db.add_deck("Sample", false).unwrap();
        db.add_card(deck_id, &CardDraft::new("Q1", "A1").tag("math"))
            .unwrap();
        db.add_card(
            deck_id,
            &CardDraft::new("Q2", "A2").difficulty(Difficulty::Hard),
        )
        .unwrap();
        (db, deck_id)
    }

    fn practice_app() -> App {
        let (db, deck_id) = setup_db();
        let mut controller = PracticeController::new(db, rand::thread_rng(), deck_id);
        controller.load().unwrap();
        App::new(Screen::Practice(controller))
    }

    fn learn_app() -> App {
        let (db, deck_id) = setup_db();
        let mut controller = QuickLearnController::new(db, deck_id);
        controller.start().unwrap();
        App::new(Screen::QuickLearn(controller))
    }

    fn practice(app: &App) -> &PracticeController<Database, ThreadRng> {
        match &app.screen {
            Screen::Practice(p) => p,
            _ => panic!("Expected practice screen"),
        }
    }

    fn learn(app: &App) -> &QuickLearnController<Database> {
        match &app.screen {
            Screen::QuickLearn(l) => l,
            _ => panic!("Expected quick-learn screen"),
        }
    }

    #[test]
    fn quit_keys() {
        let mut app = practice_app();
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = learn_app();
        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn practice_navigation() {
        let mut app = practice_app();
        app.handle_key(KeyCode::Char(' '));
        assert!(practice(&app).state().show_answer());

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(practice(&app).state().index(), 1);
        assert!(!practice(&app).state().show_answer());

        app.handle_key(KeyCode::Right);
        assert_eq!(practice(&app).state().index(), 1);

        app.handle_key(KeyCode::Char('k'));
        assert_eq!(practice(&app).state().index(), 0);
    }

    #[test]
    fn practice_filter_keys() {
        let mut app = practice_app();
        app.handle_key(KeyCode::Char('t'));
        assert_eq!(
            TagOption::General.to_string(),
            practice(&app).state().tag_filter().label()
        );
        assert_eq!(practice(&app).state().len(), 1);

        app.handle_key(KeyCode::Char('d'));
        assert_eq!(
            practice(&app).state().difficulty_filter(),
            Some(Difficulty::Low)
        );
        assert_eq!(practice(&app).state().len(), 0);

        app.handle_key(KeyCode::Char('c'));
        assert_eq!(*practice(&app).state().tag_filter(), TagFilter::All);
        assert_eq!(practice(&app).state().difficulty_filter(), None);
        assert_eq!(practice(&app).state().len(), 2);
    }

    #[test]
    fn order_keys() {
        let mut app = practice_app();
        app.handle_key(KeyCode::Char('o'));
        assert!(practice(&app).state().random_order());
        app.handle_key(KeyCode::Char('o'));
        assert!(!practice(&app).state().random_order());

        app.handle_key(KeyCode::Char('l'));
        app.handle_key(KeyCode::Char('s'));
        assert!(practice(&app).state().random_order());
        assert_eq!(practice(&app).state().index(), 0);
        assert_eq!(practice(&app).state().len(), 2);
    }

    #[test]
    fn quick_learn_answer_and_submit() {
        let mut app = learn_app();
        assert_eq!(learn(&app).state().phase(), QuickLearnPhase::InProgress);

        app.handle_key(KeyCode::Enter);
        assert!(app.status.is_some());

        app.handle_key(KeyCode::Char('y'));
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(learn(&app).state().phase(), QuickLearnPhase::Complete);

        app.handle_key(KeyCode::Enter);
        assert!(app.status.is_none());
        assert_eq!(learn(&app).state().phase(), QuickLearnPhase::Submitted);
        let result = learn(&app).state().result().unwrap();
        assert_eq!(result.session_stats.correct_count, 1);
        assert_eq!(result.session_stats.incorrect_count, 1);
    }

    #[test]
    fn quick_learn_restart_clears_answers() {
        let mut app = learn_app();
        app.handle_key(KeyCode::Char('y'));
        assert_eq!(learn(&app).state().answered_count(), 1);

        app.handle_key(KeyCode::Char('r'));
        assert_eq!(learn(&app).state().answered_count(), 0);
        assert_eq!(learn(&app).state().phase(), QuickLearnPhase::InProgress);
    }
}
