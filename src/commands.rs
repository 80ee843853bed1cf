use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Serialize;
use tagstore_db::{EntityRef, Session};
use tracing::debug;

use crate::{Error, Result};

/// The four kinds of stored entity a command can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
   Tags,
   Files,
   Options,
   Selections,
}

impl EntityKind {
   pub const ALL: [EntityKind; 4] = [
      EntityKind::Tags,
      EntityKind::Files,
      EntityKind::Options,
      EntityKind::Selections,
   ];

   pub fn as_str(self) -> &'static str {
      match self {
         EntityKind::Tags => "tags",
         EntityKind::Files => "files",
         EntityKind::Options => "options",
         EntityKind::Selections => "selections",
      }
   }
}

impl FromStr for EntityKind {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self> {
      EntityKind::ALL
         .into_iter()
         .find(|kind| kind.as_str() == s)
         .ok_or_else(|| Error::UnknownEntity(s.to_string()))
   }
}

impl fmt::Display for EntityKind {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// Value produced by a command.
///
/// Serializes without a tag, so `--json` prints the bare value: `null`,
/// `true`, `7`, `["a","b"]` and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
   Unit,
   Bool(bool),
   Names(Vec<String>),
   Ids(Vec<i64>),
   OptionalId(Option<i64>),
   OptionalText(Option<String>),
}

/// Plain text rendering: one item per line, nothing for `Unit` or a missing value.
impl fmt::Display for Output {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Output::Unit | Output::OptionalId(None) | Output::OptionalText(None) => Ok(()),
         Output::Bool(value) => write!(f, "{value}"),
         Output::OptionalId(Some(id)) => write!(f, "{id}"),
         Output::OptionalText(Some(text)) => f.write_str(text),
         Output::Names(names) => f.write_str(&names.join("\n")),
         Output::Ids(ids) => {
            let lines: Vec<String> = ids.iter().map(i64::to_string).collect();
            f.write_str(&lines.join("\n"))
         }
      }
   }
}

/// How many arguments a command takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
   Exact(usize),
   AtLeast(usize),
}

impl Arity {
   fn check(self, command: &str, given: usize) -> Result<()> {
      let (ok, expected) = match self {
         Arity::Exact(n) => (given == n, format!("{n}")),
         Arity::AtLeast(n) => (given >= n, format!("at least {n}")),
      };
      if ok {
         return Ok(());
      }

      let noun = match self {
         Arity::Exact(1) | Arity::AtLeast(1) => "argument",
         _ => "arguments",
      };
      Err(Error::InvalidArguments {
         command: command.to_string(),
         message: format!("expected {expected} {noun}, got {given}"),
      })
   }
}

/// Positional arguments of one command invocation.
///
/// Arguments that name a tag or file are read as ids when they parse as an
/// integer and as names otherwise.
#[derive(Debug, Clone)]
pub struct Args {
   command: String,
   values: Vec<String>,
}

impl Args {
   pub fn new(command: impl Into<String>, values: Vec<String>) -> Self {
      Self {
         command: command.into(),
         values,
      }
   }

   pub fn len(&self) -> usize {
      self.values.len()
   }

   pub fn is_empty(&self) -> bool {
      self.values.is_empty()
   }

   /// Argument `index` taken verbatim.
   pub fn text(&self, index: usize) -> Result<&str> {
      self
         .values
         .get(index)
         .map(String::as_str)
         .ok_or_else(|| Error::InvalidArguments {
            command: self.command.clone(),
            message: format!("missing argument {}", index + 1),
         })
   }

   /// Argument `index` as a tag or file reference.
   pub fn reference(&self, index: usize) -> Result<EntityRef> {
      self.text(index).map(EntityRef::parse)
   }

   /// Every argument from `index` on, as references.
   pub fn references_from(&self, index: usize) -> Vec<EntityRef> {
      self
         .values
         .iter()
         .skip(index)
         .map(|value| EntityRef::parse(value))
         .collect()
   }
}

pub type CommandFuture<'c> = Pin<Box<dyn Future<Output = Result<Output>> + Send + 'c>>;

pub type Handler = for<'c> fn(&'c mut Session, Args) -> CommandFuture<'c>;

/// One named operation on an entity kind.
pub struct Command {
   pub kind: EntityKind,
   pub name: &'static str,
   /// Argument placeholders, e.g. `TAG NEW_NAME`.
   pub usage: &'static str,
   pub about: &'static str,
   pub arity: Arity,
   handler: Handler,
}

impl fmt::Debug for Command {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Command")
         .field("kind", &self.kind)
         .field("name", &self.name)
         .field("usage", &self.usage)
         .field("arity", &self.arity)
         .finish_non_exhaustive()
   }
}

impl Command {
   /// `"<kind> <name>"`, used in messages.
   pub fn qualified_name(&self) -> String {
      format!("{} {}", self.kind, self.name)
   }

   /// Check the argument count and run the command on `session`.
   pub async fn run(&self, session: &mut Session, args: Vec<String>) -> Result<Output> {
      let command = self.qualified_name();
      self.arity.check(&command, args.len())?;

      debug!(command = %command, args = args.len(), worker = session.worker_id(), "Running command");
      (self.handler)(session, Args::new(command, args)).await
   }
}

/// Find a command by kind and name.
pub fn lookup(kind: EntityKind, name: &str) -> Option<&'static Command> {
   COMMANDS
      .iter()
      .find(|command| command.kind == kind && command.name == name)
}

/// All commands of one kind, in table order.
pub fn commands_for(kind: EntityKind) -> impl Iterator<Item = &'static Command> {
   COMMANDS.iter().filter(move |command| command.kind == kind)
}

/// Resolve `entity` and `command` by name and run it.
pub async fn dispatch(
   session: &mut Session,
   entity: &str,
   command: &str,
   args: Vec<String>,
) -> Result<Output> {
   let kind: EntityKind = entity.parse()?;
   let Some(found) = lookup(kind, command) else {
      return Err(Error::UnknownCommand {
         entity: entity.to_string(),
         command: command.to_string(),
      });
   };
   found.run(session, args).await
}

/// Builds a [`Command`] whose handler is an async body over `(session, args)`.
macro_rules! command {
   (
      $kind:ident, $name:literal, $usage:literal, $arity:expr, $about:literal,
      |$session:ident, $args:ident| $body:expr
   ) => {
      Command {
         kind: EntityKind::$kind,
         name: $name,
         usage: $usage,
         about: $about,
         arity: $arity,
         handler: {
            async fn body($session: &mut Session, $args: Args) -> Result<Output> {
               $body
            }
            fn handler<'c>(session: &'c mut Session, args: Args) -> CommandFuture<'c> {
               Box::pin(body(session, args))
            }
            handler
         },
      }
   };
}

pub static COMMANDS: &[Command] = &[
   // tags
   command!(Tags, "new", "NAME", Arity::Exact(1), "Create a tag", |s, a| {
      Ok(Output::Bool(s.tags().create(a.text(0)?).await?))
   }),
   command!(Tags, "remove", "TAG", Arity::Exact(1), "Delete a tag and its links", |s, a| {
      Ok(Output::Bool(s.tags().remove(a.reference(0)?).await?))
   }),
   command!(Tags, "rename", "TAG NEW_NAME", Arity::Exact(2), "Rename a tag", |s, a| {
      Ok(Output::Bool(s.tags().rename(a.reference(0)?, a.text(1)?).await?))
   }),
   command!(Tags, "get_id", "TAG", Arity::Exact(1), "Id of a tag", |s, a| {
      Ok(Output::OptionalId(s.tags().get_id(a.reference(0)?).await?))
   }),
   command!(Tags, "get_name", "TAG", Arity::Exact(1), "Name of a tag", |s, a| {
      Ok(Output::OptionalText(s.tags().get_name(a.reference(0)?).await?))
   }),
   command!(Tags, "exists", "TAG", Arity::Exact(1), "Whether a tag exists", |s, a| {
      Ok(Output::Bool(s.tags().exists(a.reference(0)?).await?))
   }),
   command!(Tags, "all_names", "", Arity::Exact(0), "Names of all tags", |s, _a| {
      Ok(Output::Names(s.tags().all_names().await?))
   }),
   command!(Tags, "all_ids", "", Arity::Exact(0), "Ids of all tags", |s, _a| {
      Ok(Output::Ids(s.tags().all_ids().await?))
   }),
   // files
   command!(Files, "new", "NAME PATH", Arity::Exact(2), "Register a file", |s, a| {
      Ok(Output::Bool(s.files().create(a.text(0)?, a.text(1)?).await?))
   }),
   command!(Files, "remove", "FILE", Arity::Exact(1), "Delete a file and its links", |s, a| {
      Ok(Output::Bool(s.files().remove(a.reference(0)?).await?))
   }),
   command!(Files, "rename", "FILE NEW_NAME", Arity::Exact(2), "Rename a file", |s, a| {
      Ok(Output::Bool(s.files().rename(a.reference(0)?, a.text(1)?).await?))
   }),
   command!(Files, "get_id", "FILE", Arity::Exact(1), "Id of a file", |s, a| {
      Ok(Output::OptionalId(s.files().get_id(a.reference(0)?).await?))
   }),
   command!(Files, "get_name", "FILE", Arity::Exact(1), "Name of a file", |s, a| {
      Ok(Output::OptionalText(s.files().get_name(a.reference(0)?).await?))
   }),
   command!(Files, "exists", "FILE", Arity::Exact(1), "Whether a file exists", |s, a| {
      Ok(Output::Bool(s.files().exists(a.reference(0)?).await?))
   }),
   command!(Files, "all_names", "", Arity::Exact(0), "Names of all files", |s, _a| {
      Ok(Output::Names(s.files().all_names().await?))
   }),
   command!(Files, "all_ids", "", Arity::Exact(0), "Ids of all files", |s, _a| {
      Ok(Output::Ids(s.files().all_ids().await?))
   }),
   command!(Files, "resolve", "FILE", Arity::Exact(1), "Stored path of a file", |s, a| {
      Ok(Output::OptionalText(s.files().resolve(a.reference(0)?).await?))
   }),
   command!(Files, "get_by_tag", "TAG", Arity::Exact(1), "Files carrying a tag", |s, a| {
      Ok(Output::Names(s.files().get_by_tag(a.reference(0)?).await?))
   }),
   command!(Files, "add_tag", "FILE TAG", Arity::Exact(2), "Link a tag to a file", |s, a| {
      Ok(Output::Bool(s.files().add_tag(a.reference(0)?, a.reference(1)?).await?))
   }),
   command!(Files, "remove_tag", "FILE TAG", Arity::Exact(2), "Unlink a tag from a file", |s, a| {
      Ok(Output::Bool(s.files().remove_tag(a.reference(0)?, a.reference(1)?).await?))
   }),
   command!(Files, "has_tag", "FILE TAG", Arity::Exact(2), "Whether a file carries a tag", |s, a| {
      Ok(Output::Bool(s.files().has_tag(a.reference(0)?, a.reference(1)?).await?))
   }),
   command!(Files, "get_tags", "FILE", Arity::Exact(1), "Tags of a file", |s, a| {
      Ok(Output::Names(s.files().get_tags(a.reference(0)?).await?))
   }),
   command!(Files, "set_tags", "FILE [TAG]...", Arity::AtLeast(1), "Replace the tags of a file", |s, a| {
      Ok(Output::Bool(s.files().set_tags(a.reference(0)?, a.references_from(1)).await?))
   }),
   // options
   command!(Options, "set", "NAME VALUE", Arity::Exact(2), "Set an option", |s, a| {
      s.options().set(a.text(0)?, a.text(1)?).await?;
      Ok(Output::Unit)
   }),
   command!(Options, "get", "NAME", Arity::Exact(1), "Value of an option", |s, a| {
      Ok(Output::OptionalText(s.options().get(a.text(0)?).await?))
   }),
   command!(Options, "unset", "NAME", Arity::Exact(1), "Remove an option", |s, a| {
      Ok(Output::Bool(s.options().unset(a.text(0)?).await?))
   }),
   command!(Options, "all_names", "", Arity::Exact(0), "Names of all options", |s, _a| {
      Ok(Output::Names(s.options().all_names().await?))
   }),
   // selections
   command!(Selections, "new", "NAME SELECTION", Arity::Exact(2), "Save a selection", |s, a| {
      Ok(Output::Bool(s.selections().create(a.text(0)?, a.text(1)?).await?))
   }),
   command!(Selections, "remove", "NAME", Arity::Exact(1), "Delete a selection", |s, a| {
      Ok(Output::Bool(s.selections().remove(a.text(0)?).await?))
   }),
   command!(Selections, "rename", "NAME NEW_NAME", Arity::Exact(2), "Rename a selection", |s, a| {
      Ok(Output::Bool(s.selections().rename(a.text(0)?, a.text(1)?).await?))
   }),
   command!(Selections, "exists", "NAME", Arity::Exact(1), "Whether a selection exists", |s, a| {
      Ok(Output::Bool(s.selections().exists(a.text(0)?).await?))
   }),
   command!(Selections, "resolve", "NAME", Arity::Exact(1), "Stored text of a selection", |s, a| {
      Ok(Output::OptionalText(s.selections().resolve(a.text(0)?).await?))
   }),
   command!(Selections, "all_names", "", Arity::Exact(0), "Names of all selections", |s, _a| {
      Ok(Output::Names(s.selections().all_names().await?))
   }),
   command!(Selections, "select", "NAME", Arity::Exact(1), "Files matched by a selection", |s, a| {
      Ok(Output::Names(s.selections().select(a.text(0)?).await?))
   }),
   command!(Selections, "matches", "NAME FILE", Arity::Exact(2), "Whether a file is matched", |s, a| {
      Ok(Output::Bool(s.selections().matches(a.text(0)?, a.reference(1)?).await?))
   }),
];

#[cfg(test)]
mod tests {
   use std::collections::HashSet;

   use super::*;

   #[test]
   fn entity_kind_round_trip() {
      for kind in EntityKind::ALL {
         assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
      }
      let err = "tag".parse::<EntityKind>().unwrap_err();
      assert_eq!(err.error_code(), "UNKNOWN_ENTITY");
   }

   #[test]
   fn names_are_unique_per_kind() {
      let mut seen = HashSet::new();
      for command in COMMANDS {
         assert!(seen.insert((command.kind, command.name)), "{}", command.qualified_name());
      }
   }

   #[test]
   fn usage_matches_arity() {
      for command in COMMANDS {
         let placeholders = command.usage.split_whitespace().count();
         match command.arity {
            Arity::Exact(n) => assert_eq!(placeholders, n, "{}", command.qualified_name()),
            // the trailing `[TAG]...` placeholder is optional
            Arity::AtLeast(n) => assert_eq!(placeholders, n + 1, "{}", command.qualified_name()),
         }
      }
   }

   #[test]
   fn lookup_by_kind() {
      let command = lookup(EntityKind::Files, "set_tags").unwrap();
      assert_eq!(command.arity, Arity::AtLeast(1));
      assert!(lookup(EntityKind::Options, "set_tags").is_none());
      assert_eq!(commands_for(EntityKind::Options).count(), 4);
   }

   #[test]
   fn arity_messages() {
      let err = Arity::Exact(2).check("tags rename", 1).unwrap_err();
      assert_eq!(err.to_string(), "tags rename: expected 2 arguments, got 1");

      let err = Arity::AtLeast(1).check("files set_tags", 0).unwrap_err();
      assert_eq!(err.to_string(), "files set_tags: expected at least 1 argument, got 0");

      assert!(Arity::AtLeast(1).check("files set_tags", 3).is_ok());
   }

   #[test]
   fn args_read_references() {
      let args = Args::new("files set_tags", vec!["a.jpg".into(), "3".into(), "-1".into()]);
      assert_eq!(args.reference(0).unwrap(), EntityRef::Name("a.jpg".into()));
      assert_eq!(
         args.references_from(1),
         vec![EntityRef::Id(3), EntityRef::Id(-1)]
      );
      assert_eq!(args.text(5).unwrap_err().error_code(), "INVALID_ARGUMENTS");
   }

   #[test]
   fn output_json_and_text() {
      assert_eq!(serde_json::to_string(&Output::Unit).unwrap(), "null");
      assert_eq!(serde_json::to_string(&Output::OptionalId(None)).unwrap(), "null");
      assert_eq!(serde_json::to_string(&Output::Bool(true)).unwrap(), "true");
      assert_eq!(
         serde_json::to_string(&Output::Names(vec!["a".into(), "b".into()])).unwrap(),
         r#"["a","b"]"#
      );

      assert_eq!(Output::Unit.to_string(), "");
      assert_eq!(Output::OptionalText(None).to_string(), "");
      assert_eq!(Output::Ids(vec![1, 2]).to_string(), "1\n2");
      assert_eq!(Output::Bool(false).to_string(), "false");
   }
}
