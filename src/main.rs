mod browse;
mod config;
mod db;
mod error;
mod models;
mod study;
mod tui;

use clap::{Parser, Subcommand};
use serde::Serialize;

use browse::{browse, DeckQuery, DeckSort, SizeBucket};
use config::Config;
use db::Database;
use error::GatewayError;
use models::{CardDraft, Deck, DeckId, Difficulty, JsonOutput};
use study::filter::{apply_filters, select_tags, shuffle};
use study::{
    normalize_accuracy, DeckSource, PracticeController, QuickLearnController, TagFilter,
    TagOption,
};

#[derive(Parser)]
#[command(name = "flashdeck")]
#[command(about = "Flashcard decks with practice and quick-learn study sessions")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Act as this user (overrides FLASHDECK_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommands),

    /// Manage cards in a deck
    #[command(subcommand)]
    Card(CardCommands),

    /// List a deck's cards, optionally filtered and shuffled
    Cards {
        /// Deck ID
        deck: DeckId,

        #[command(flatten)]
        tags: TagArgs,

        /// Only cards of this difficulty: low/medium/hard or 1-3
        #[arg(long, short, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,

        /// Shuffle the listed cards
        #[arg(long, short)]
        shuffle: bool,
    },

    /// List the tags used in a deck
    Tags {
        /// Deck ID
        deck: DeckId,
    },

    /// Show lifetime quick-learn statistics for a deck
    Stats {
        /// Deck ID
        deck: DeckId,
    },

    /// Practice a deck card by card
    Practice {
        /// Deck ID
        deck: DeckId,

        #[command(flatten)]
        tags: TagArgs,

        /// Start filtered to this difficulty
        #[arg(long, short, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,

        /// Start in random order
        #[arg(long, short)]
        random: bool,
    },

    /// Run a scored quick-learn session
    Learn {
        /// Deck ID
        deck: DeckId,
    },

    /// Show how many decks and cards you own
    Profile,
}

#[derive(clap::Args)]
struct TagArgs {
    /// Only cards with this tag
    #[arg(long, short, conflicts_with = "untagged")]
    tag: Option<String>,

    /// Only cards without a tag (the General group)
    #[arg(long, short)]
    untagged: bool,
}

impl TagArgs {
    fn filter(&self) -> TagFilter {
        if self.untagged {
            TagFilter::General
        } else {
            self.tag.as_deref().map(TagFilter::parse).unwrap_or_default()
        }
    }
}

#[derive(Subcommand)]
enum DeckCommands {
    /// List your decks and all public decks
    List,

    /// Search public decks shared by other users
    Browse {
        /// Case-insensitive name search
        #[arg(long, short)]
        search: Option<String>,

        /// Only decks with at least this many cards
        #[arg(long)]
        min_cards: Option<i64>,

        /// Size bucket: small (1-20), medium (21-60), large (61+), empty
        #[arg(long, value_enum, default_value_t = SizeBucket::All)]
        size: SizeBucket,

        /// Sort order
        #[arg(long, value_enum, default_value_t = DeckSort::Newest)]
        sort: DeckSort,
    },

    /// Create a deck
    Add {
        /// Deck name
        name: String,

        /// Make the deck visible to everyone
        #[arg(long, short)]
        public: bool,
    },

    /// Show a deck and its cards
    Show {
        /// Deck ID
        id: DeckId,
    },

    /// Rename a deck or change its visibility
    #[command(group(
        clap::ArgGroup::new("changes")
            .required(true)
            .multiple(true)
            .args(["name", "public", "private"])
    ))]
    Update {
        /// Deck ID
        id: DeckId,

        /// New deck name
        #[arg(long, short)]
        name: Option<String>,

        /// Make the deck visible to everyone
        #[arg(long, conflicts_with = "private")]
        public: bool,

        /// Make the deck visible only to you
        #[arg(long)]
        private: bool,
    },

    /// Delete a deck and its cards
    Delete {
        /// Deck ID
        id: DeckId,
    },
}

#[derive(Subcommand)]
enum CardCommands {
    /// Add a card to a deck
    Add {
        /// Deck ID
        deck: DeckId,

        #[command(flatten)]
        fields: CardFields,
    },

    /// Replace a card's fields
    Update {
        /// Deck ID
        deck: DeckId,

        /// Card ID
        card: i64,

        #[command(flatten)]
        fields: CardFields,
    },

    /// Delete a card
    Delete {
        /// Deck ID
        deck: DeckId,

        /// Card ID
        card: i64,
    },
}

#[derive(clap::Args)]
struct CardFields {
    /// Question text
    #[arg(long, short)]
    question: String,

    /// Answer text
    #[arg(long, short)]
    answer: String,

    /// Optional tag
    #[arg(long, short)]
    tag: Option<String>,

    /// Optional difficulty: low/medium/hard or 1-3
    #[arg(long, short, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,
}

impl From<CardFields> for CardDraft {
    fn from(fields: CardFields) -> Self {
        let mut draft = CardDraft::new(fields.question, fields.answer);
        if let Some(tag) = fields.tag {
            draft = draft.tag(tag);
        }
        if let Some(difficulty) = fields.difficulty {
            draft = draft.difficulty(difficulty);
        }
        draft
    }
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| {
        format!(
            "Invalid difficulty '{}'. Use: low, medium, hard (or 1, 2, 3)",
            s
        )
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            let kind = e.downcast_ref::<GatewayError>().map(GatewayError::kind);
            let output = JsonOutput::<()>::err(e.to_string()).with_kind(kind);
            println!("{}", serde_json::to_string(&output).unwrap_or_default());
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn print_ok<T: Serialize>(data: T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    let user = cli.user.clone().unwrap_or_else(|| config.user.clone());
    let db = Database::open(&config.db_path)?
        .with_user(user)
        .with_session_size(config.session_size);
    db.init()?;
    log::debug!("using database {} as {}", config.db_path.display(), db.user());

    match cli.command {
        Commands::Init => {
            if cli.json {
                print_ok(())?;
            } else {
                println!("Database initialized at: {}", config.db_path.display());
            }
        }

        Commands::Deck(deck_cmd) => match deck_cmd {
            DeckCommands::List => {
                let decks = db.list_decks()?;
                if cli.json {
                    print_ok(&decks)?;
                } else {
                    print_decks(&decks);
                }
            }

            DeckCommands::Browse {
                search,
                min_cards,
                size,
                sort,
            } => {
                let query = DeckQuery {
                    search,
                    min_cards,
                    size,
                    sort,
                };
                let decks = browse(db.public_decks()?, &query);
                if cli.json {
                    print_ok(&decks)?;
                } else {
                    print_decks(&decks);
                }
            }

            DeckCommands::Add { name, public } => {
                let id = db.add_deck(&name, public)?;
                if cli.json {
                    print_ok(serde_json::json!({ "id": id, "name": name }))?;
                } else {
                    println!("Added deck '{}' with ID: {}", name, id);
                }
            }

            DeckCommands::Show { id } => {
                let summary = db.get_deck_summary(id)?;
                let deck = db.get_deck(id)?;
                if cli.json {
                    print_ok(serde_json::json!({ "deck": summary, "cards": deck.cards }))?;
                } else {
                    println!("Deck: {}", summary.name);
                    println!("ID: {}", summary.id);
                    println!("Owner: {}", summary.owner);
                    println!("Public: {}", if summary.is_public { "yes" } else { "no" });
                    println!("Created: {}", summary.created_at);
                    println!();
                    print_cards(deck.cards.iter());
                }
            }

            DeckCommands::Update {
                id,
                name,
                public,
                private,
            } => {
                let is_public = match (public, private) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                db.update_deck(id, name.as_deref(), is_public)?;
                if cli.json {
                    print_ok(db.get_deck_summary(id)?)?;
                } else {
                    println!("Deck {} updated.", id);
                }
            }

            DeckCommands::Delete { id } => {
                db.delete_deck(id)?;
                if cli.json {
                    print_ok(())?;
                } else {
                    println!("Deck {} deleted.", id);
                }
            }
        },

        Commands::Card(card_cmd) => match card_cmd {
            CardCommands::Add { deck, fields } => {
                let id = db.add_card(deck, &fields.into())?;
                if cli.json {
                    print_ok(serde_json::json!({ "id": id }))?;
                } else {
                    println!("Added card {} to deck {}.", id, deck);
                }
            }

            CardCommands::Update { deck, card, fields } => {
                db.update_card(deck, card, &fields.into())?;
                if cli.json {
                    print_ok(())?;
                } else {
                    println!("Card {} updated.", card);
                }
            }

            CardCommands::Delete { deck, card } => {
                db.delete_card(deck, card)?;
                if cli.json {
                    print_ok(())?;
                } else {
                    println!("Card {} deleted.", card);
                }
            }
        },

        Commands::Cards {
            deck,
            tags,
            difficulty,
            shuffle: shuffled,
        } => {
            let snapshot = db.get_deck(deck)?;
            let filter = tags.filter();
            let mut cards = apply_filters(&snapshot.cards, &filter, difficulty);
            if shuffled {
                cards = shuffle(&cards, &mut rand::thread_rng());
            }

            if cli.json {
                print_ok(&cards)?;
            } else {
                print_cards(cards.into_iter());
            }
        }

        Commands::Tags { deck } => {
            let snapshot = db.get_deck(deck)?;
            let tags = select_tags(&snapshot.cards);
            if cli.json {
                let labels: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
                print_ok(&labels)?;
            } else if tags.is_empty() {
                println!("No tags found.");
            } else {
                for tag in &tags {
                    match tag {
                        TagOption::General => {
                            println!("{} (untagged, select with --untagged)", tag)
                        }
                        TagOption::Named(_) => println!("{}", tag),
                    }
                }
            }
        }

        Commands::Stats { deck } => {
            let stats = db.deck_stats(deck)?;
            if cli.json {
                print_ok(&stats)?;
            } else {
                println!("=== Deck Statistics ===");
                println!("Cards in deck: {}", stats.total_cards_in_deck);
                println!("Cards studied: {}", stats.cards_studied);
                println!("Total correct: {}", stats.total_correct);
                println!("Total incorrect: {}", stats.total_incorrect);
                println!(
                    "Overall accuracy: {:.0}%",
                    normalize_accuracy(stats.overall_accuracy)
                );
            }
        }

        Commands::Practice {
            deck,
            tags,
            difficulty,
            random,
        } => {
            let filter = tags.filter();
            let mut controller = PracticeController::new(db, rand::thread_rng(), deck)
                .with_options(filter, difficulty, random);
            controller.load()?;
            tui::run(tui::Screen::Practice(controller))?;
        }

        Commands::Learn { deck } => {
            let mut controller = QuickLearnController::new(db, deck);
            controller.start()?;
            tui::run(tui::Screen::QuickLearn(controller))?;
        }

        Commands::Profile => {
            let profile = db.profile()?;
            if cli.json {
                print_ok(&profile)?;
            } else {
                println!("User: {}", profile.user);
                println!("Decks: {}", profile.deck_count);
                println!("Cards: {}", profile.card_count);
            }
        }
    }

    Ok(())
}

fn print_decks(decks: &[Deck]) {
    if decks.is_empty() {
        println!("No decks found.");
        return;
    }
    println!("{:<5} {:<30} {:<12} {:<7} CARDS", "ID", "NAME", "OWNER", "PUBLIC");
    println!("{}", "-".repeat(64));
    for deck in decks {
        println!(
            "{:<5} {:<30} {:<12} {:<7} {}",
            deck.id,
            truncate(&deck.name, 28),
            truncate(&deck.owner, 10),
            if deck.is_public { "yes" } else { "no" },
            deck.card_count
        );
    }
}

fn print_cards<'a>(cards: impl Iterator<Item = &'a models::Card>) {
    let mut cards = cards.peekable();
    if cards.peek().is_none() {
        println!("No cards found.");
        return;
    }
    println!("{:<5} {:<14} {:<7} QUESTION", "ID", "TAG", "LEVEL");
    println!("{}", "-".repeat(70));
    for card in cards {
        println!(
            "{:<5} {:<14} {:<7} {}",
            card.id,
            truncate(card.tag_label().unwrap_or("-"), 12),
            card.difficulty.map_or("-", |d| d.label()),
            truncate(&card.question, 40)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("ééééééé", 5), "éé...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["flashdeck", "init"]).unwrap();
            assert!(!cli.json);
            assert!(cli.user.is_none());
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_global_flags() {
            let cli = Cli::try_parse_from(["flashdeck", "--json", "--user", "alice", "deck", "list"])
                .unwrap();
            assert!(cli.json);
            assert_eq!(cli.user.as_deref(), Some("alice"));
            assert!(matches!(cli.command, Commands::Deck(DeckCommands::List)));

            let cli = Cli::try_parse_from(["flashdeck", "stats", "1", "--json"]).unwrap();
            assert!(cli.json);
        }

        #[test]
        fn parse_deck_add_public() {
            let cli = Cli::try_parse_from(["flashdeck", "deck", "add", "Spanish", "--public"])
                .unwrap();
            match cli.command {
                Commands::Deck(DeckCommands::Add { name, public }) => {
                    assert_eq!(name, "Spanish");
                    assert!(public);
                }
                _ => panic!("Expected Deck Add command"),
            }
        }

        #[test]
        fn parse_card_add_full() {
            let cli = Cli::try_parse_from([
                "flashdeck", "card", "add", "3", "-q", "2+2", "-a", "4", "-t", "math", "-d", "hard",
            ])
            .unwrap();
            match cli.command {
                Commands::Card(CardCommands::Add { deck, fields }) => {
                    assert_eq!(deck, 3);
                    let draft: CardDraft = fields.into();
                    assert_eq!(draft.question, "2+2");
                    assert_eq!(draft.answer, "4");
                    assert_eq!(draft.tag.as_deref(), Some("math"));
                    assert_eq!(draft.difficulty, Some(Difficulty::Hard));
                }
                _ => panic!("Expected Card Add command"),
            }
        }

        #[test]
        fn parse_card_update() {
            let cli = Cli::try_parse_from([
                "flashdeck", "card", "update", "1", "7", "--question", "q", "--answer", "a",
            ])
            .unwrap();
            match cli.command {
                Commands::Card(CardCommands::Update { deck, card, fields }) => {
                    assert_eq!(deck, 1);
                    assert_eq!(card, 7);
                    assert!(fields.tag.is_none());
                    assert!(fields.difficulty.is_none());
                }
                _ => panic!("Expected Card Update command"),
            }
        }

        #[test]
        fn parse_cards_with_filters() {
            let cli = Cli::try_parse_from([
                "flashdeck", "cards", "2", "--tag", "general", "--difficulty", "2", "--shuffle",
            ])
            .unwrap();
            match cli.command {
                Commands::Cards {
                    deck,
                    tags,
                    difficulty,
                    shuffle,
                } => {
                    assert_eq!(deck, 2);
                    assert_eq!(tags.filter(), TagFilter::Tag("general".into()));
                    assert_eq!(difficulty, Some(Difficulty::Medium));
                    assert!(shuffle);
                }
                _ => panic!("Expected Cards command"),
            }
        }

        #[test]
        fn untagged_flag_selects_general_group() {
            let cli = Cli::try_parse_from(["flashdeck", "cards", "2", "--untagged"]).unwrap();
            match cli.command {
                Commands::Cards { tags, .. } => assert_eq!(tags.filter(), TagFilter::General),
                _ => panic!("Expected Cards command"),
            }

            let cli = Cli::try_parse_from(["flashdeck", "cards", "2", "--tag", "General"]).unwrap();
            match cli.command {
                Commands::Cards { tags, .. } => {
                    assert_eq!(tags.filter(), TagFilter::Tag("General".into()))
                }
                _ => panic!("Expected Cards command"),
            }

            let cli = Cli::try_parse_from(["flashdeck", "cards", "2"]).unwrap();
            match cli.command {
                Commands::Cards { tags, .. } => assert_eq!(tags.filter(), TagFilter::All),
                _ => panic!("Expected Cards command"),
            }
        }

        #[test]
        fn tag_and_untagged_conflict() {
            let result = Cli::try_parse_from(["flashdeck", "practice", "1", "-t", "x", "-u"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_practice_flags() {
            let cli = Cli::try_parse_from(["flashdeck", "practice", "4", "-t", "verbs", "-r"])
                .unwrap();
            match cli.command {
                Commands::Practice {
                    deck,
                    tags,
                    difficulty,
                    random,
                } => {
                    assert_eq!(deck, 4);
                    assert_eq!(tags.tag, Some("verbs".to_string()));
                    assert!(!tags.untagged);
                    assert!(difficulty.is_none());
                    assert!(random);
                }
                _ => panic!("Expected Practice command"),
            }
        }

        #[test]
        fn parse_deck_update() {
            let cli = Cli::try_parse_from(["flashdeck", "deck", "update", "5", "--name", "New"])
                .unwrap();
            match cli.command {
                Commands::Deck(DeckCommands::Update {
                    id,
                    name,
                    public,
                    private,
                }) => {
                    assert_eq!(id, 5);
                    assert_eq!(name.as_deref(), Some("New"));
                    assert!(!public);
                    assert!(!private);
                }
                _ => panic!("Expected Deck Update command"),
            }

            let cli = Cli::try_parse_from(["flashdeck", "deck", "update", "5", "--private"])
                .unwrap();
            assert!(matches!(
                cli.command,
                Commands::Deck(DeckCommands::Update {
                    name: None,
                    public: false,
                    private: true,
                    ..
                })
            ));
        }

        #[test]
        fn deck_update_needs_a_change() {
            assert!(Cli::try_parse_from(["flashdeck", "deck", "update", "5"]).is_err());
            assert!(Cli::try_parse_from([
                "flashdeck", "deck", "update", "5", "--public", "--private"
            ])
            .is_err());
        }

        #[test]
        fn parse_deck_browse() {
            let cli = Cli::try_parse_from([
                "flashdeck", "deck", "browse", "-s", "spanish", "--min-cards", "5", "--size",
                "medium", "--sort", "name-za",
            ])
            .unwrap();
            match cli.command {
                Commands::Deck(DeckCommands::Browse {
                    search,
                    min_cards,
                    size,
                    sort,
                }) => {
                    assert_eq!(search.as_deref(), Some("spanish"));
                    assert_eq!(min_cards, Some(5));
                    assert_eq!(size, SizeBucket::Medium);
                    assert_eq!(sort, DeckSort::NameZa);
                }
                _ => panic!("Expected Deck Browse command"),
            }
        }

        #[test]
        fn deck_browse_defaults() {
            let cli = Cli::try_parse_from(["flashdeck", "deck", "browse"]).unwrap();
            match cli.command {
                Commands::Deck(DeckCommands::Browse {
                    search,
                    min_cards,
                    size,
                    sort,
                }) => {
                    assert!(search.is_none());
                    assert!(min_cards.is_none());
                    assert_eq!(size, SizeBucket::All);
                    assert_eq!(sort, DeckSort::Newest);
                }
                _ => panic!("Expected Deck Browse command"),
            }
            assert!(Cli::try_parse_from(["flashdeck", "deck", "browse", "--sort", "random"]).is_err());
        }

        #[test]
        fn parse_profile() {
            let cli = Cli::try_parse_from(["flashdeck", "profile"]).unwrap();
            assert!(matches!(cli.command, Commands::Profile));
        }

        #[test]
        fn parse_learn() {
            let cli = Cli::try_parse_from(["flashdeck", "learn", "9"]).unwrap();
            assert!(matches!(cli.command, Commands::Learn { deck: 9 }));
        }

        #[test]
        fn invalid_difficulty_fails() {
            let result = Cli::try_parse_from(["flashdeck", "cards", "1", "-d", "extreme"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["flashdeck", "deck", "add"]).is_err());
            assert!(Cli::try_parse_from(["flashdeck", "card", "add", "1", "-q", "q"]).is_err());
            assert!(Cli::try_parse_from(["flashdeck", "learn"]).is_err());
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["flashdeck", "invalid"]).is_err());
        }
    }
}
