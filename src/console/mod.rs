//! Command console
//!
//! A line-oriented loop over an injected [`Storage`]. Each command runs to
//! completion (including its `save`) before the next line is read. Errors are
//! printed as one-line messages and never end the session.

pub mod error;
pub mod parser;

pub use error::ConsoleError;

use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};

use crate::attributes::InputMode;
use crate::entities::{ClassName, Record};
use crate::storage::Storage;

pub const PROMPT: &str = "(hbnb) ";

/// Output of a successful command, if it prints anything.
type CommandResult = Result<Option<String>, ConsoleError>;

const HELP_TOPICS: [(&str, &str); 9] = [
    ("EOF", "Exits the program without formatting"),
    ("all", "Shows all objects, or all of a class\n[Usage]: all [<className>]"),
    ("count", "Counts the instances of a class\n[Usage]: count <className>"),
    (
        "create",
        "Creates an instance of a class\n[Usage]: create <className> [<key>=<value> ...]",
    ),
    (
        "destroy",
        "Destroys an individual instance of a class\n[Usage]: destroy <className> <objectId>",
    ),
    ("help", "Lists commands, or describes one\n[Usage]: help [<command>]"),
    ("quit", "Exits the program"),
    (
        "show",
        "Shows an individual instance of a class\n[Usage]: show <className> <objectId>",
    ),
    (
        "update",
        "Updates an object with new information\n[Usage]: update <className> <id> <attName> <attVal>\n         update <className> <id> {<attName>: <attVal>, ...}",
    ),
];

pub struct Console<W: Write> {
    storage: Box<dyn Storage>,
    out: W,
    interactive: bool,
}

impl<W: Write> Console<W> {
    pub fn new(storage: Box<dyn Storage>, out: W) -> Self {
        Console {
            storage,
            out,
            interactive: false,
        }
    }

    /// Show the prompt before every line (terminal sessions).
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read and execute lines until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        let mut line = String::new();
        loop {
            if self.interactive {
                write!(self.out, "{}", PROMPT)?;
                self.out.flush()?;
            }

            line.clear();
            if input.read_line(&mut line)? == 0 {
                self.onecmd("EOF")?;
                break;
            }

            if self.onecmd(line.trim_end_matches(['\n', '\r']))? {
                break;
            }
        }
        self.out.flush()
    }

    /// Execute one line. Returns `true` when the session should end.
    pub fn onecmd(&mut self, line: &str) -> io::Result<bool> {
        let line = parser::rewrite_dotted(line);
        let (verb, args) = parser::split_command(&line);

        let result = match verb {
            "" => Ok(None),
            "quit" => return Ok(true),
            "EOF" => {
                if self.interactive {
                    writeln!(self.out)?;
                }
                return Ok(true);
            }
            "help" => Ok(Some(help(args))),
            "create" => self.do_create(args),
            "show" => self.do_show(args),
            "destroy" => self.do_destroy(args),
            "all" => self.do_all(args),
            "count" => self.do_count(args),
            "update" => self.do_update(args),
            _ => Ok(Some(format!("*** Unknown syntax: {}", line.trim()))),
        };

        match result {
            Ok(Some(output)) => writeln!(self.out, "{}", output)?,
            Ok(None) => {}
            Err(err) => {
                if let ConsoleError::Storage(source) = &err {
                    tracing::error!(error = %source, command = %line.trim(), "storage failure");
                }
                writeln!(self.out, "{}", err)?;
            }
        }

        Ok(false)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    fn do_create(&mut self, args: &str) -> CommandResult {
        let tokens = parser::tokenize(args);
        let class = parse_class(tokens.first())?;

        let mut record = Record::new(class);
        for pair in &tokens[1..] {
            let Some((key, value)) = pair.split_once('=') else {
                tracing::warn!(%pair, "skipping argument without '='");
                continue;
            };
            if let Err(e) = record.assign(key, value, InputMode::Create) {
                tracing::warn!(%key, error = %e, "skipping attribute");
            }
        }

        if let Some(field) = record.missing_required() {
            return Err(ConsoleError::NotProvided(field));
        }

        let id = record.id().to_string();
        self.persist(record)?;
        tracing::debug!(%class, %id, "record created");
        Ok(Some(id))
    }

    fn do_show(&mut self, args: &str) -> CommandResult {
        let tokens = parser::tokenize(args);
        let record = self.lookup(&tokens)?;
        Ok(Some(record.to_string()))
    }

    fn do_destroy(&mut self, args: &str) -> CommandResult {
        let tokens = parser::tokenize(args);
        let record = self.lookup(&tokens)?;

        let result = self
            .storage
            .delete(&record)
            .and_then(|_| self.storage.save());
        if let Err(e) = result {
            self.recover();
            return Err(e.into());
        }

        tracing::debug!(key = %record.key(), "record destroyed");
        Ok(Some(format!("{} deleted", record.id())))
    }

    fn do_all(&mut self, args: &str) -> CommandResult {
        let tokens = parser::tokenize(args);
        let class = match tokens.first() {
            Some(_) => Some(parse_class(tokens.first())?),
            None => None,
        };

        let records = self.storage.all(class)?;
        let shown: Vec<String> = records.values().map(|r| r.to_string()).collect();
        Ok(Some(format!("[{}]", shown.join(", "))))
    }

    fn do_count(&mut self, args: &str) -> CommandResult {
        let tokens = parser::tokenize(args);
        let class = parse_class(tokens.first())?;
        Ok(Some(self.storage.count(class)?.to_string()))
    }

    fn do_update(&mut self, args: &str) -> CommandResult {
        let (class_token, rest) = match parser::next_token(args) {
            Some((token, rest)) => (Some(token), rest),
            None => (None, ""),
        };
        let class = parse_class(class_token.as_ref())?;

        let Some((id, rest)) = parser::next_token(rest) else {
            return Err(ConsoleError::InstanceIdMissing);
        };
        let mut record = self
            .storage
            .get(class, &id)?
            .ok_or(ConsoleError::NoInstanceFound)?;

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(ConsoleError::AttributeNameMissing);
        }

        if rest.starts_with('{') {
            let changes = parse_dict(rest).ok_or(ConsoleError::InvalidValue)?;
            for (attribute, value) in &changes {
                record.assign_json(attribute, value)?;
            }
        } else {
            let tokens = parser::tokenize(rest);
            let attribute = &tokens[0];
            let value = tokens.get(1).ok_or(ConsoleError::ValueMissing)?;
            record.assign(attribute, value, InputMode::Update)?;
        }

        record.touch();
        self.persist(record)?;
        Ok(None)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Resolve `<Class> <id>` to a stored record.
    fn lookup(&self, tokens: &[String]) -> Result<Record, ConsoleError> {
        let class = parse_class(tokens.first())?;
        let id = tokens.get(1).ok_or(ConsoleError::InstanceIdMissing)?;
        self.storage
            .get(class, id)?
            .ok_or(ConsoleError::NoInstanceFound)
    }

    /// `new` + `save`; on failure the pending change is discarded so a
    /// later command does not persist it.
    fn persist(&mut self, record: Record) -> Result<(), ConsoleError> {
        let result = self
            .storage
            .new(record)
            .and_then(|_| self.storage.save());
        if let Err(e) = result {
            self.recover();
            return Err(e.into());
        }
        Ok(())
    }

    fn recover(&mut self) {
        if let Err(e) = self.storage.discard() {
            tracing::error!(error = %e, "could not discard pending changes");
        }
    }
}

fn parse_class(token: Option<&String>) -> Result<ClassName, ConsoleError> {
    let name = token.ok_or(ConsoleError::ClassNameMissing)?;
    name.parse().map_err(|_| ConsoleError::ClassDoesNotExist)
}

/// `{"key": value, ...}`; single-quoted keys and strings are accepted too.
fn parse_dict(raw: &str) -> Option<Map<String, Value>> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&raw.replace('\'', "\"")))
        .ok()
}

fn help(topic: &str) -> String {
    let topic = topic.trim();
    if topic.is_empty() {
        let names: Vec<&str> = HELP_TOPICS.iter().map(|(name, _)| *name).collect();
        return format!(
            "Documented commands (type help <topic>):\n========================================\n{}",
            names.join("  ")
        );
    }

    HELP_TOPICS
        .iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| format!("*** No help on {}", topic))
}
