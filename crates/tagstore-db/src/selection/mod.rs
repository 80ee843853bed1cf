//! Saved tag selections.
//!
//! A selection is a boolean expression over tag membership, evaluated per
//! file. The text form is:
//!
//! ```text
//! expr    := term ( '|' term )*
//! term    := factor ( '&' factor )*
//! factor  := '!' factor | '(' expr ')' | atom
//! atom    := '*' | '#' integer | 'quoted name' | "quoted name" | bare-name
//!          | '(&)' | '(|)'
//! ```
//!
//! `*` (or the bare name `__ALL__`) matches every file, `#7` names a tag by id,
//! and any other atom names a tag by name. `(&)` is the empty conjunction
//! (every file) and `(|)` the empty disjunction (no file). `!` binds tighter
//! than `&`, which binds tighter than `|`. Nesting of `!` and `(` is limited
//! to 64 levels.
//!
//! Rendering with `Display` yields text that parses back to an equal tree,
//! except that a single-operand `And`/`Or` renders as its operand.
//!
//! Expressions compile to a parameterized SQL predicate; tag names and ids
//! are always bound, never spliced into the statement text.
//!
//! # Example
//!
//! ```
//! use tagstore_db::SelectionExpr;
//!
//! let expr = SelectionExpr::parse("photo & !(raw | 'to delete')").unwrap();
//! assert_eq!(expr.to_string(), "photo & !(raw | 'to delete')");
//! ```

mod compile;
mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::reference::{ALL_TAG, EntityRef};

pub use compile::{Bind, CompiledPredicate, compile};

/// Parsed selection expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionExpr {
   /// Matches every file.
   All,
   /// Matches files linked to the tag.
   Tag(EntityRef),
   Not(Box<SelectionExpr>),
   /// Matches when every operand does. Empty matches everything.
   And(Vec<SelectionExpr>),
   /// Matches when any operand does. Empty matches nothing.
   Or(Vec<SelectionExpr>),
}

impl SelectionExpr {
   /// Parse selection text.
   pub fn parse(text: &str) -> Result<Self> {
      parser::parse(text)
   }

   pub fn tag(tag: impl Into<EntityRef>) -> Self {
      SelectionExpr::Tag(tag.into())
   }

   pub fn negate(self) -> Self {
      SelectionExpr::Not(Box::new(self))
   }

   /// Tags referenced anywhere in the expression, in order of appearance.
   pub fn tags(&self) -> Vec<&EntityRef> {
      let mut out = Vec::new();
      self.collect_tags(&mut out);
      out
   }

   fn collect_tags<'a>(&'a self, out: &mut Vec<&'a EntityRef>) {
      match self {
         SelectionExpr::All => {}
         SelectionExpr::Tag(tag) => out.push(tag),
         SelectionExpr::Not(inner) => inner.collect_tags(out),
         SelectionExpr::And(items) | SelectionExpr::Or(items) => {
            for item in items {
               item.collect_tags(out);
            }
         }
      }
   }

   /// Binding strength when rendered: `|` < `&` < `!` and atoms.
   fn precedence(&self) -> u8 {
      match self {
         SelectionExpr::Or(items) | SelectionExpr::And(items) if items.len() == 1 => {
            items[0].precedence()
         }
         SelectionExpr::Or(items) if items.len() > 1 => 1,
         SelectionExpr::And(items) if items.len() > 1 => 2,
         _ => 3,
      }
   }

   fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
      if self.precedence() < min_precedence {
         write!(f, "({self})")
      } else {
         write!(f, "{self}")
      }
   }
}

impl fmt::Display for SelectionExpr {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         SelectionExpr::All => f.write_str("*"),
         SelectionExpr::Tag(EntityRef::Id(id)) => write!(f, "#{id}"),
         SelectionExpr::Tag(EntityRef::Name(name)) => write_name(f, name),
         SelectionExpr::Not(inner) => {
            f.write_str("!")?;
            inner.fmt_operand(f, 3)
         }
         SelectionExpr::And(items) => write_joined(f, items, " & ", 3, "(&)"),
         SelectionExpr::Or(items) => write_joined(f, items, " | ", 2, "(|)"),
      }
   }
}

fn write_joined(
   f: &mut fmt::Formatter<'_>,
   items: &[SelectionExpr],
   separator: &str,
   min_precedence: u8,
   empty: &str,
) -> fmt::Result {
   match items {
      [] => f.write_str(empty),
      [only] => write!(f, "{only}"),
      _ => {
         for (i, item) in items.iter().enumerate() {
            if i > 0 {
               f.write_str(separator)?;
            }
            item.fmt_operand(f, min_precedence)?;
         }
         Ok(())
      }
   }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
   // The bare word `__ALL__` would read back as `*`
   if name != ALL_TAG && !name.is_empty() && name.chars().all(parser::is_bare_char) {
      f.write_str(name)
   } else {
      write!(f, "'{}'", name.replace('\'', "''"))
   }
}
