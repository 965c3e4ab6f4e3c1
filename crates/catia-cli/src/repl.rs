//! REPL – Read-Eval-Print Loop for chatting with Catia.
//!
//! Supported slash-commands:
//!   /help                          – show this list
//!   /teach <input> => <response>   – learn a response
//!   /recall <input>                – exact lookup
//!   /fuzzy <input>                 – similar stored inputs
//!   /forget <input>                – drop a learned response
//!   /memories                      – list every learned response
//!   /correct <input> => <response> – override the answer for an input
//!   /mood [reset]                  – show or reset the current mood
//!   /topic                         – last conversation topic
//!   /history                       – recent exchanges
//!   /stats                         – memory statistics
//!   /clear                         – wipe all memory
//!   /config                        – show where memory lives
//!   /quit | /exit                  – leave
//!
//! Anything else is chat: the mood is updated from the line, then Catia
//! answers from corrections, exact memory, fuzzy memory, or asks to be taught.

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use catia_memory::{MemoryStore, MoodDetector, RememberOutcome, SharedMemoryStore, StorageError};
use catia_types::Mood;

use crate::config::{self, Config};

/// Reply used when nothing in memory matches.
pub const TEACH_PROMPT: &str =
    "I don't know how to answer that yet. Teach me with /teach <input> => <response>";

// ─────────────────────────────────────────────────────────────────────────────
// Command parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    Help,
    Teach { input: &'a str, response: &'a str },
    Recall(&'a str),
    Fuzzy(&'a str),
    Forget(&'a str),
    Memories,
    Correct { input: &'a str, response: &'a str },
    Mood { reset: bool },
    Topic,
    History,
    Stats,
    Clear,
    Config,
    Quit,
    /// Plain chat line.
    Say(&'a str),
    /// Known command with bad arguments; holds the usage line.
    Usage(&'static str),
    Unknown(&'a str),
}

pub fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Say(line);
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "/help" => Command::Help,
        "/teach" => match split_pair(rest) {
            Some((input, response)) => Command::Teach { input, response },
            None => Command::Usage("/teach <input> => <response>"),
        },
        "/correct" => match split_pair(rest) {
            Some((input, response)) => Command::Correct { input, response },
            None => Command::Usage("/correct <input> => <response>"),
        },
        "/recall" if !rest.is_empty() => Command::Recall(rest),
        "/recall" => Command::Usage("/recall <input>"),
        "/fuzzy" if !rest.is_empty() => Command::Fuzzy(rest),
        "/fuzzy" => Command::Usage("/fuzzy <input>"),
        "/forget" if !rest.is_empty() => Command::Forget(rest),
        "/forget" => Command::Usage("/forget <input>"),
        "/mood" => match rest {
            "" => Command::Mood { reset: false },
            "reset" => Command::Mood { reset: true },
            _ => Command::Usage("/mood [reset]"),
        },
        "/memories" => Command::Memories,
        "/topic" => Command::Topic,
        "/history" => Command::History,
        "/stats" => Command::Stats,
        "/clear" => Command::Clear,
        "/config" => Command::Config,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other),
    }
}

/// Split `input => response`.  The input must be non-empty; an empty
/// response is passed through so the validator can reject it.
fn split_pair(rest: &str) -> Option<(&str, &str)> {
    let (input, response) = rest.split_once("=>")?;
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    Some((input, response.trim()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Answering
// ─────────────────────────────────────────────────────────────────────────────

/// Where a chat reply came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Corrected(String),
    Recalled(String),
    Similar(String),
    Unknown,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Corrected(t) | Answer::Recalled(t) | Answer::Similar(t) => t,
            Answer::Unknown => TEACH_PROMPT,
        }
    }
}

/// Corrections win over exact memory, which wins over the best fuzzy match.
pub fn answer(store: &MemoryStore, input: &str) -> Answer {
    if let Some(corrected) = store.get_feedback(input) {
        return Answer::Corrected(corrected.to_string());
    }
    if let Some(recalled) = store.recall(input) {
        return Answer::Recalled(recalled.to_string());
    }
    match store.fuzzy_recall(input).first() {
        Some(similar) => Answer::Similar(similar.to_string()),
        None => Answer::Unknown,
    }
}

/// Update the mood from `input`, pick a reply and record the exchange.
pub fn chat(
    store: &mut MemoryStore,
    detector: &MoodDetector,
    input: &str,
) -> Result<(Answer, Mood), StorageError> {
    let mood = store.observe_mood(detector.detect(input))?;
    let reply = answer(store, input);
    store.record_exchange(input, reply.text())?;
    Ok((reply, mood))
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(store: SharedMemoryStore, detector: MoodDetector, cfg: &Config, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "you>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        let result = match parse_command(&line) {
            Command::Help => {
                cmd_help();
                Ok(())
            }
            Command::Teach { input, response } => cmd_teach(&store, input, response),
            Command::Recall(input) => cmd_recall(&store, input),
            Command::Fuzzy(input) => cmd_fuzzy(&store, input),
            Command::Forget(input) => cmd_forget(&store, input),
            Command::Memories => cmd_memories(&store),
            Command::Correct { input, response } => cmd_correct(&store, input, response),
            Command::Mood { reset } => cmd_mood(&store, reset),
            Command::Topic => cmd_topic(&store),
            Command::History => cmd_history(&store),
            Command::Stats => cmd_stats(&store),
            Command::Clear => cmd_clear(&store),
            Command::Config => {
                cmd_config(cfg);
                Ok(())
            }
            Command::Quit => {
                println!("{}", "Bye bye~".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Say(input) => cmd_say(&store, &detector, input),
            Command::Usage(usage) => {
                println!("{} {}", "Usage:".yellow(), usage.bold());
                Ok(())
            }
            Command::Unknown(other) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{}: {}", "Memory error".red(), e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Catia Commands".bold().underline());
    println!("  {}  – learn a response", "/teach <input> => <response>".bold().cyan());
    println!("  {}                – exact lookup", "/recall <input>".bold().cyan());
    println!("  {}                 – similar stored inputs", "/fuzzy <input>".bold().cyan());
    println!("  {}                – forget a response", "/forget <input>".bold().cyan());
    println!("  {}                      – list learned responses", "/memories".bold().cyan());
    println!("  {} – override an answer", "/correct <input> => <response>".bold().cyan());
    println!("  {}                  – show or reset mood", "/mood [reset]".bold().cyan());
    println!("  {}                         – last topic", "/topic".bold().cyan());
    println!("  {}                       – recent exchanges", "/history".bold().cyan());
    println!("  {}                         – memory statistics", "/stats".bold().cyan());
    println!("  {}                         – wipe all memory", "/clear".bold().cyan());
    println!("  {}                        – show memory locations", "/config".bold().cyan());
    println!("  {}                  – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_say(store: &SharedMemoryStore, detector: &MoodDetector, input: &str) -> Result<(), StorageError> {
    let (reply, mood) = store.with(|s| chat(s, detector, input))?;
    let label = match &reply {
        Answer::Similar(_) => format!("catia ({}, ~)>", mood),
        _ => format!("catia ({})>", mood),
    };
    println!("{} {}", label.bold().magenta(), reply.text());
    Ok(())
}

fn cmd_teach(store: &SharedMemoryStore, input: &str, response: &str) -> Result<(), StorageError> {
    match store.with(|s| s.remember(input, response))? {
        RememberOutcome::Learned { category } => {
            println!("{} [{}]", "✓ Learned".green(), category.to_string().yellow())
        }
        RememberOutcome::Updated { category } => println!(
            "{} [{}] (similar input already known)",
            "✓ Learned".green(),
            category.to_string().yellow()
        ),
        RememberOutcome::Rejected(reason) => {
            println!("{} {}", "✗ Not stored:".red(), reason)
        }
    }
    Ok(())
}

fn cmd_recall(store: &SharedMemoryStore, input: &str) -> Result<(), StorageError> {
    store.with(|s| {
        match (s.recall(input), s.category_of(input)) {
            (Some(response), Some(category)) => {
                println!("  [{}] {}", category.to_string().yellow(), response)
            }
            _ => println!("  {}", "Nothing stored for that.".dimmed()),
        }
        Ok(())
    })
}

fn cmd_fuzzy(store: &SharedMemoryStore, input: &str) -> Result<(), StorageError> {
    store.with(|s| {
        let hits = s.fuzzy_recall(input);
        if hits.is_empty() {
            println!("  {}", "No similar inputs.".dimmed());
        }
        for (i, response) in hits.iter().enumerate() {
            println!("  {}. {}", i + 1, response);
        }
        Ok(())
    })
}

fn cmd_forget(store: &SharedMemoryStore, input: &str) -> Result<(), StorageError> {
    if store.with(|s| s.forget(input))? {
        println!("{}", "✓ Forgotten.".green());
    } else {
        println!("  {}", "Nothing stored for that.".dimmed());
    }
    Ok(())
}

fn cmd_memories(store: &SharedMemoryStore) -> Result<(), StorageError> {
    store.with(|s| {
        let lines = format_memories(s);
        if lines.is_empty() {
            println!("  {}", "Nothing learned yet.".dimmed());
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    })
}

/// One numbered line per learned pair: `  N. [category] input => response`.
pub fn format_memories(store: &MemoryStore) -> Vec<String> {
    store
        .memories()
        .enumerate()
        .map(|(i, (category, input, response))| {
            format!("  {}. [{}] {} => {}", i + 1, category, input, response)
        })
        .collect()
}

fn cmd_correct(store: &SharedMemoryStore, input: &str, response: &str) -> Result<(), StorageError> {
    if response.is_empty() {
        println!("{} {}", "Usage:".yellow(), "/correct <input> => <response>".bold());
        return Ok(());
    }
    let count = store.with(|s| s.record_feedback(input, response))?;
    if count == 1 {
        println!("{}", "✓ Got it, I'll answer that way from now on.".green());
    } else {
        let kept = store.with(|s| Ok(s.get_feedback(input).map(str::to_string)))?;
        println!(
            "{} (corrected {} times, keeping \"{}\")",
            "✓ Noted.".green(),
            count,
            kept.unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_mood(store: &SharedMemoryStore, reset: bool) -> Result<(), StorageError> {
    store.with(|s| {
        if reset {
            s.reset_mood()?;
        }
        let trend = if s.mood_trend() { " (steady)" } else { "" };
        println!("  Mood: {}{}", s.current_mood().to_string().yellow(), trend.dimmed());
        Ok(())
    })
}

fn cmd_topic(store: &SharedMemoryStore) -> Result<(), StorageError> {
    store.with(|s| {
        match s.last_topic() {
            Some(topic) => println!("  Last topic: {}", topic.bold()),
            None => println!("  {}", "No topic yet.".dimmed()),
        }
        Ok(())
    })
}

fn cmd_history(store: &SharedMemoryStore) -> Result<(), StorageError> {
    store.with(|s| {
        let history = s.conversation_history();
        if history.is_empty() {
            println!("  {}", "No conversation yet.".dimmed());
        }
        for exchange in history.iter() {
            println!("  {} {}", "you>".cyan(), exchange.input);
            println!("  {} {}", "catia>".magenta(), exchange.response);
        }
        Ok(())
    })
}

fn cmd_stats(store: &SharedMemoryStore) -> Result<(), StorageError> {
    let stats = store.with(|s| Ok(s.stats()))?;
    println!("{}", "Memory".bold().underline());
    for (category, count) in &stats.entries {
        if *count > 0 {
            println!("  {:<13} {}", category.to_string(), count);
        }
    }
    println!("  {:<13} {}", "total".bold(), stats.total_entries);
    println!("  {:<13} {}", "corrections", stats.corrections);
    println!("  {:<13} {}", "history", stats.history_len);
    println!("  {:<13} {}", "mood", stats.mood.to_string().yellow());
    Ok(())
}

fn cmd_clear(store: &SharedMemoryStore) -> Result<(), StorageError> {
    let answer = prompt_str("  Erase everything Catia has learned? [y/N]: ", "n");
    if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
        println!("  {}", "Kept.".dimmed());
        return Ok(());
    }
    store.with(|s| s.clear_all())?;
    println!("{}", "✓ Memory cleared.".green());
    Ok(())
}

fn cmd_config(cfg: &Config) {
    let m = &cfg.memory;
    println!("{}", "Configuration".bold().underline());
    println!("  Config file      : {}", config::config_path().display().to_string().bold());
    println!("  Memory file      : {}", m.memory_path.display());
    println!("  Key file         : {}", m.key_path.display());
    match &m.conversation_log_path {
        Some(path) => println!("  Conversation log : {}", path.display()),
        None => println!("  Conversation log : {}", "disabled".dimmed()),
    }
    println!(
        "  Fuzzy recall     : up to {} match(es) at ≥ {:.2}",
        m.fuzzy.max_results, m.fuzzy.min_similarity
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt for a string value.  Returns `default` when the user presses Enter.
fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catia_memory::MemoryConfig;

    fn open_store(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::open(&MemoryConfig::in_dir(dir.path())).unwrap()
    }

    // ── parse_command ────────────────────────────────────────────────────────

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/topic"), Command::Topic);
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(parse_command("/stats"), Command::Stats);
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/config"), Command::Config);
        assert_eq!(parse_command("/memories"), Command::Memories);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit\n"), Command::Quit);
    }

    #[test]
    fn parses_teach_and_correct_pairs() {
        assert_eq!(
            parse_command("/teach hello there => General Kenobi"),
            Command::Teach { input: "hello there", response: "General Kenobi" }
        );
        assert_eq!(
            parse_command("/correct x=>Y"),
            Command::Correct { input: "x", response: "Y" }
        );
        assert_eq!(
            parse_command("/teach hello"),
            Command::Usage("/teach <input> => <response>")
        );
        assert_eq!(
            parse_command("/teach => orphan"),
            Command::Usage("/teach <input> => <response>")
        );
    }

    #[test]
    fn teach_with_empty_response_reaches_the_validator() {
        assert_eq!(
            parse_command("/teach test =>"),
            Command::Teach { input: "test", response: "" }
        );
    }

    #[test]
    fn parses_single_argument_commands() {
        assert_eq!(parse_command("/recall  Hello "), Command::Recall("Hello"));
        assert_eq!(parse_command("/fuzzy helo"), Command::Fuzzy("helo"));
        assert_eq!(parse_command("/forget bye"), Command::Forget("bye"));
        assert_eq!(parse_command("/recall"), Command::Usage("/recall <input>"));
        assert_eq!(parse_command("/fuzzy"), Command::Usage("/fuzzy <input>"));
        assert_eq!(parse_command("/forget "), Command::Usage("/forget <input>"));
    }

    #[test]
    fn parses_mood() {
        assert_eq!(parse_command("/mood"), Command::Mood { reset: false });
        assert_eq!(parse_command("/mood reset"), Command::Mood { reset: true });
        assert_eq!(parse_command("/mood angry"), Command::Usage("/mood [reset]"));
    }

    #[test]
    fn plain_lines_and_unknown_commands() {
        assert_eq!(parse_command("  how are you? "), Command::Say("how are you?"));
        assert_eq!(parse_command("/dance"), Command::Unknown("/dance"));
    }

    // ── answering ────────────────────────────────────────────────────────────

    #[test]
    fn answer_prefers_correction_then_recall_then_fuzzy() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        assert_eq!(answer(&store, "hello there"), Answer::Unknown);

        store.remember("hello there", "General Kenobi.").unwrap();
        assert_eq!(answer(&store, "helo there"), Answer::Similar("General Kenobi.".into()));
        assert_eq!(answer(&store, "Hello There"), Answer::Recalled("General Kenobi.".into()));

        store.record_feedback("hello there", "Hi!").unwrap();
        assert_eq!(answer(&store, "hello there"), Answer::Corrected("Hi!".into()));
    }

    #[test]
    fn memories_are_listed_with_category_and_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        assert!(format_memories(&store).is_empty());

        store.remember("Hello", "Hey there!").unwrap();
        store.remember("tell me a joke", "Knock knock.").unwrap();
        assert_eq!(
            format_memories(&store),
            vec![
                "  1. [jokes] tell me a joke => Knock knock.".to_string(),
                "  2. [greetings] hello => Hey there!".to_string(),
            ]
        );
    }

    #[test]
    fn chat_updates_mood_and_records_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let detector = MoodDetector::default();

        let (reply, mood) = chat(&mut store, &detector, "I'm so furious").unwrap();
        assert_eq!(reply, Answer::Unknown);
        assert_eq!(mood, Mood::Angry);

        // Sticky until reset.
        let (_, mood) = chat(&mut store, &detector, "this is awesome").unwrap();
        assert_eq!(mood, Mood::Angry);

        let history: Vec<_> = store.conversation_history().iter().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].response, TEACH_PROMPT);
        assert_eq!(store.last_topic(), Some("this is awesome"));
    }
}
