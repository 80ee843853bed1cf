//! SQL generation for selection expressions.
//!
//! The predicate is evaluated against one row of `files` at a time, so it is
//! meant to be placed in a `WHERE` clause of a query over `files`. Every tag
//! reference becomes a bound `?` parameter; [`CompiledPredicate::binds`]
//! lists them in placeholder order.
//!
//! `AND`/`OR` chains are emitted as balanced binary trees so that a wide
//! selection costs SQLite logarithmic expression depth instead of linear.

use crate::reference::EntityRef;
use crate::selection::SelectionExpr;

const TAG_ID_TERM: &str = "EXISTS (SELECT 1 FROM tag_files \
   WHERE tag_files.file_id = files.id AND tag_files.tag_id = ?)";

const TAG_NAME_TERM: &str = "EXISTS (SELECT 1 FROM tag_files \
   INNER JOIN tags ON tags.id = tag_files.tag_id \
   WHERE tag_files.file_id = files.id AND tags.name = ?)";

/// Upper bound on [`sql_depth`] for stored selections, well inside
/// SQLite's default expression depth limit of 1000.
pub(crate) const MAX_SQL_DEPTH: usize = 500;

/// Expression depth charged for one tag membership term, counting the
/// `EXISTS` node and the subquery's `WHERE` clause.
const TERM_DEPTH: usize = 4;

/// A value bound to one `?` placeholder of a compiled predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
   Int(i64),
   Text(String),
}

/// SQL text for a `WHERE` clause plus the values for its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPredicate {
   pub sql: String,
   pub binds: Vec<Bind>,
}

/// Compile an expression into a parameterized predicate over `files`.
pub fn compile(expr: &SelectionExpr) -> CompiledPredicate {
   let mut compiled = CompiledPredicate {
      sql: String::new(),
      binds: Vec::new(),
   };
   write_expr(expr, &mut compiled);
   compiled
}

fn write_expr(expr: &SelectionExpr, out: &mut CompiledPredicate) {
   match expr {
      SelectionExpr::All => out.sql.push('1'),
      SelectionExpr::Tag(tag) if tag.is_all_tag() => out.sql.push('1'),
      SelectionExpr::Tag(EntityRef::Id(id)) => {
         out.sql.push_str(TAG_ID_TERM);
         out.binds.push(Bind::Int(*id));
      }
      SelectionExpr::Tag(EntityRef::Name(name)) => {
         out.sql.push_str(TAG_NAME_TERM);
         out.binds.push(Bind::Text(name.clone()));
      }
      SelectionExpr::Not(inner) => {
         out.sql.push_str("NOT (");
         write_expr(inner, out);
         out.sql.push(')');
      }
      SelectionExpr::And(items) => write_joined(items, " AND ", "1", out),
      SelectionExpr::Or(items) => write_joined(items, " OR ", "0", out),
   }
}

fn write_joined(items: &[SelectionExpr], operator: &str, empty: &str, out: &mut CompiledPredicate) {
   match items {
      [] => out.sql.push_str(empty),
      [only] => write_expr(only, out),
      _ => {
         let (left, right) = items.split_at(items.len() / 2);
         out.sql.push('(');
         write_joined(left, operator, empty, out);
         out.sql.push_str(operator);
         write_joined(right, operator, empty, out);
         out.sql.push(')');
      }
   }
}

/// Expression depth SQLite will see for the compiled predicate.
pub(crate) fn sql_depth(expr: &SelectionExpr) -> usize {
   match expr {
      SelectionExpr::All => 1,
      SelectionExpr::Tag(tag) if tag.is_all_tag() => 1,
      SelectionExpr::Tag(_) => TERM_DEPTH,
      SelectionExpr::Not(inner) => 1 + sql_depth(inner),
      SelectionExpr::And(items) | SelectionExpr::Or(items) => joined_depth(items),
   }
}

fn joined_depth(items: &[SelectionExpr]) -> usize {
   match items {
      [] => 1,
      [only] => sql_depth(only),
      _ => {
         let (left, right) = items.split_at(items.len() / 2);
         1 + joined_depth(left).max(joined_depth(right))
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_single_tag_by_name() {
      let compiled = compile(&SelectionExpr::tag("photo"));
      assert_eq!(compiled.sql, TAG_NAME_TERM);
      assert_eq!(compiled.binds, vec![Bind::Text("photo".into())]);
   }

   #[test]
   fn test_binds_follow_placeholder_order() {
      let expr = SelectionExpr::parse("a & !(#7 | b)").unwrap();
      let compiled = compile(&expr);

      assert_eq!(
         compiled.sql,
         format!("({TAG_NAME_TERM} AND NOT (({TAG_ID_TERM} OR {TAG_NAME_TERM})))")
      );
      assert_eq!(compiled.sql.matches('?').count(), compiled.binds.len());
      assert_eq!(
         compiled.binds,
         vec![
            Bind::Text("a".into()),
            Bind::Int(7),
            Bind::Text("b".into())
         ]
      );
   }

   #[test]
   fn test_names_never_reach_sql_text() {
      let compiled = compile(&SelectionExpr::tag("x') OR 1=1 --"));
      assert!(!compiled.sql.contains("1=1"));
      assert_eq!(compiled.binds, vec![Bind::Text("x') OR 1=1 --".into())]);
   }

   #[test]
   fn test_wide_chains_are_balanced() {
      let expr = SelectionExpr::parse("a | b | c | d").unwrap();
      let compiled = compile(&expr);
      assert_eq!(
         compiled.sql,
         format!("(({t} OR {t}) OR ({t} OR {t}))", t = TAG_NAME_TERM)
      );
      let names: Vec<Bind> = ["a", "b", "c", "d"]
         .into_iter()
         .map(|name| Bind::Text(name.into()))
         .collect();
      assert_eq!(compiled.binds, names);

      let wide = SelectionExpr::Or((0..4096_i64).map(SelectionExpr::tag).collect());
      assert_eq!(sql_depth(&wide), 12 + TERM_DEPTH);
   }

   #[test]
   fn test_depth_counts_negations() {
      let expr = SelectionExpr::parse("!!a").unwrap();
      assert_eq!(sql_depth(&expr), 2 + TERM_DEPTH);
      assert_eq!(sql_depth(&SelectionExpr::All), 1);
   }

   #[test]
   fn test_constants() {
      assert_eq!(compile(&SelectionExpr::All).sql, "1");
      assert_eq!(compile(&SelectionExpr::tag(-1_i64)).sql, "1");
      assert_eq!(compile(&SelectionExpr::And(vec![])).sql, "1");
      assert_eq!(compile(&SelectionExpr::Or(vec![])).sql, "0");
      assert!(compile(&SelectionExpr::All).binds.is_empty());
   }
}
