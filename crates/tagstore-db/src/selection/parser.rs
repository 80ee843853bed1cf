//! Recursive-descent parser for selection text.

use crate::Error;
use crate::reference::{ALL_TAG, EntityRef};
use crate::selection::SelectionExpr;
use crate::selection::compile::{MAX_SQL_DEPTH, sql_depth};

/// Deepest run of nested `!` and `(` accepted.
pub(crate) const MAX_NESTING: usize = 64;

/// Characters allowed in an unquoted tag name.
pub(crate) fn is_bare_char(ch: char) -> bool {
   ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
   LParen,
   RParen,
   And,
   Or,
   Not,
   Star,
   Id(i64),
   Name(String),
}

impl Token {
   fn describe(&self) -> String {
      match self {
         Token::LParen => "'('".to_string(),
         Token::RParen => "')'".to_string(),
         Token::And => "'&'".to_string(),
         Token::Or => "'|'".to_string(),
         Token::Not => "'!'".to_string(),
         Token::Star => "'*'".to_string(),
         Token::Id(id) => format!("tag id #{id}"),
         Token::Name(name) => format!("tag '{name}'"),
      }
   }
}

/// Split selection text into `(byte offset, token)` pairs.
fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, Error> {
   let mut tokens = Vec::new();
   let mut chars = text.char_indices().peekable();

   while let Some(&(start, ch)) = chars.peek() {
      let token = match ch {
         c if c.is_whitespace() => {
            chars.next();
            continue;
         }
         '(' => Token::LParen,
         ')' => Token::RParen,
         '&' => Token::And,
         '|' => Token::Or,
         '!' => Token::Not,
         '*' => Token::Star,
         '#' => {
            chars.next();
            let mut digits = String::new();
            while let Some(&(_, c)) = chars.peek() {
               if c.is_ascii_digit() || (c == '-' && digits.is_empty()) {
                  digits.push(c);
                  chars.next();
               } else {
                  break;
               }
            }
            let id = digits
               .parse::<i64>()
               .map_err(|_| Error::invalid_selection(start, "expected a tag id after '#'"))?;
            tokens.push((start, Token::Id(id)));
            continue;
         }
         '\'' | '"' => {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
               if c == ch {
                  // Doubled quote is an escape
                  if matches!(chars.peek(), Some(&(_, next)) if next == ch) {
                     chars.next();
                     name.push(ch);
                     continue;
                  }
                  closed = true;
                  break;
               }
               name.push(c);
            }
            if !closed {
               return Err(Error::invalid_selection(start, "unterminated quoted tag name"));
            }
            tokens.push((start, Token::Name(name)));
            continue;
         }
         c if is_bare_char(c) => {
            let mut name = String::new();
            while let Some(&(_, c)) = chars.peek() {
               if !is_bare_char(c) {
                  break;
               }
               name.push(c);
               chars.next();
            }
            let token = if name == ALL_TAG {
               Token::Star
            } else {
               Token::Name(name)
            };
            tokens.push((start, token));
            continue;
         }
         other => {
            return Err(Error::invalid_selection(
               start,
               format!("unexpected character {other:?}"),
            ));
         }
      };

      chars.next();
      tokens.push((start, token));
   }

   Ok(tokens)
}

struct Parser {
   tokens: Vec<(usize, Token)>,
   pos: usize,
   end: usize,
   depth: usize,
}

impl Parser {
   fn peek(&self) -> Option<&Token> {
      self.tokens.get(self.pos).map(|(_, token)| token)
   }

   fn offset(&self) -> usize {
      self
         .tokens
         .get(self.pos)
         .map_or(self.end, |(offset, _)| *offset)
   }

   fn advance(&mut self) -> Option<Token> {
      let token = self.tokens.get(self.pos).map(|(_, token)| token.clone());
      self.pos += 1;
      token
   }

   fn expr(&mut self) -> Result<SelectionExpr, Error> {
      let mut items = vec![self.term()?];
      while self.peek() == Some(&Token::Or) {
         self.advance();
         items.push(self.term()?);
      }
      Ok(combine(items, false))
   }

   fn term(&mut self) -> Result<SelectionExpr, Error> {
      let mut items = vec![self.factor()?];
      while self.peek() == Some(&Token::And) {
         self.advance();
         items.push(self.factor()?);
      }
      Ok(combine(items, true))
   }

   fn factor(&mut self) -> Result<SelectionExpr, Error> {
      let offset = self.offset();
      match self.advance() {
         Some(Token::Not) => {
            self.descend(offset)?;
            let inner = self.factor()?;
            self.depth -= 1;
            Ok(inner.negate())
         }
         Some(Token::LParen) => {
            if let Some(empty) = self.empty_group() {
               return Ok(empty);
            }
            self.descend(offset)?;
            let inner = self.expr()?;
            self.depth -= 1;
            match self.advance() {
               Some(Token::RParen) => Ok(inner),
               _ => Err(Error::invalid_selection(offset, "unclosed '('")),
            }
         }
         Some(Token::Star) => Ok(SelectionExpr::All),
         Some(Token::Id(id)) => Ok(SelectionExpr::Tag(EntityRef::Id(id))),
         Some(Token::Name(name)) => Ok(SelectionExpr::Tag(EntityRef::Name(name))),
         Some(other) => Err(Error::invalid_selection(
            offset,
            format!("expected a tag, '*', '!' or '(' but found {}", other.describe()),
         )),
         None => Err(Error::invalid_selection(offset, "unexpected end of selection")),
      }
   }
}

impl Parser {
   fn descend(&mut self, offset: usize) -> Result<(), Error> {
      if self.depth >= MAX_NESTING {
         return Err(Error::invalid_selection(offset, "selection nested too deeply"));
      }
      self.depth += 1;
      Ok(())
   }

   /// `(&)` and `(|)`, the operand-less conjunction and disjunction.
   /// Called just after the `(`.
   fn empty_group(&mut self) -> Option<SelectionExpr> {
      let expr = match (self.peek(), self.tokens.get(self.pos + 1)) {
         (Some(Token::And), Some((_, Token::RParen))) => SelectionExpr::And(Vec::new()),
         (Some(Token::Or), Some((_, Token::RParen))) => SelectionExpr::Or(Vec::new()),
         _ => return None,
      };
      self.pos += 2;
      Some(expr)
   }
}

/// Build an n-ary node, flattening operands of the same kind so that
/// `(a & b) & c` and `a & b & c` produce the same tree.
fn combine(mut items: Vec<SelectionExpr>, conjunction: bool) -> SelectionExpr {
   if items.len() == 1 {
      return items.remove(0);
   }

   let mut flat = Vec::with_capacity(items.len());
   for item in items {
      match item {
         // Empty groups stay as written: `(&) & a` keeps its `(&)`
         SelectionExpr::And(inner) if conjunction && !inner.is_empty() => flat.extend(inner),
         SelectionExpr::Or(inner) if !conjunction && !inner.is_empty() => flat.extend(inner),
         item => flat.push(item),
      }
   }

   if conjunction {
      SelectionExpr::And(flat)
   } else {
      SelectionExpr::Or(flat)
   }
}

pub(crate) fn parse(text: &str) -> Result<SelectionExpr, Error> {
   let tokens = tokenize(text)?;
   if tokens.is_empty() {
      return Err(Error::invalid_selection(0, "selection is empty"));
   }

   let mut parser = Parser {
      tokens,
      pos: 0,
      end: text.len(),
      depth: 0,
   };
   let expr = parser.expr()?;

   if let Some(token) = parser.peek() {
      return Err(Error::invalid_selection(
         parser.offset(),
         format!("unexpected {} after expression", token.describe()),
      ));
   }

   if sql_depth(&expr) > MAX_SQL_DEPTH {
      return Err(Error::invalid_selection(0, "selection nested too deeply"));
   }

   Ok(expr)
}

#[cfg(test)]
mod tests {
   use super::*;

   fn tag(name: &str) -> SelectionExpr {
      SelectionExpr::tag(name)
   }

   fn error_position(text: &str) -> usize {
      match parse(text) {
         Err(Error::InvalidSelection { position, .. }) => position,
         other => panic!("expected InvalidSelection for {text:?}, got {other:?}"),
      }
   }

   #[test]
   fn test_single_tag_forms() {
      assert_eq!(parse("photo").unwrap(), tag("photo"));
      assert_eq!(parse("  photo  ").unwrap(), tag("photo"));
      assert_eq!(parse("'my photos'").unwrap(), tag("my photos"));
      assert_eq!(parse("\"say \"\"hi\"\"\"").unwrap(), tag("say \"hi\""));
      assert_eq!(parse("#12").unwrap(), SelectionExpr::tag(12_i64));
      assert_eq!(parse("2024").unwrap(), tag("2024"));
      assert_eq!(parse("фото").unwrap(), tag("фото"));
   }

   #[test]
   fn test_all_forms() {
      assert_eq!(parse("*").unwrap(), SelectionExpr::All);
      assert_eq!(parse("__ALL__").unwrap(), SelectionExpr::All);
      // The id and quoted forms keep the literal reference
      assert_eq!(parse("#-1").unwrap(), SelectionExpr::tag(-1_i64));
      assert_eq!(parse("'__ALL__'").unwrap(), tag("__ALL__"));
   }

   #[test]
   fn test_empty_groups() {
      assert_eq!(parse("(&)").unwrap(), SelectionExpr::And(vec![]));
      assert_eq!(parse("( | )").unwrap(), SelectionExpr::Or(vec![]));
      assert_eq!(
         parse("!(&) | a").unwrap(),
         SelectionExpr::Or(vec![SelectionExpr::And(vec![]).negate(), tag("a")])
      );
      assert_eq!(
         parse("(&) & a").unwrap(),
         SelectionExpr::And(vec![SelectionExpr::And(vec![]), tag("a")])
      );
      assert_eq!(error_position("(& a)"), 1);
   }

   #[test]
   fn test_nesting_limit() {
      let ok = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
      assert_eq!(parse(&ok).unwrap(), tag("a"));
      assert!(parse(&format!("{}a", "!".repeat(MAX_NESTING))).is_ok());

      // One level past the limit, reported at the offending token
      assert_eq!(error_position(&format!("{}a", "!".repeat(MAX_NESTING + 1))), MAX_NESTING);

      // Far past the limit fails cleanly instead of exhausting the stack
      assert!(parse(&format!("{}a", "(".repeat(200_000))).is_err());
      assert!(parse(&format!("{}a", "!".repeat(20_000))).is_err());
      assert!(parse(&"!(".repeat(50_000)).is_err());
   }

   #[test]
   fn test_precedence() {
      assert_eq!(
         parse("a | b & !c").unwrap(),
         SelectionExpr::Or(vec![
            tag("a"),
            SelectionExpr::And(vec![tag("b"), tag("c").negate()]),
         ])
      );
      assert_eq!(
         parse("!(a | b)").unwrap(),
         SelectionExpr::Or(vec![tag("a"), tag("b")]).negate()
      );
   }

   #[test]
   fn test_flattening() {
      let expected = SelectionExpr::And(vec![tag("a"), tag("b"), tag("c")]);
      assert_eq!(parse("a & b & c").unwrap(), expected);
      assert_eq!(parse("(a & b) & c").unwrap(), expected);
      assert_eq!(parse("a & (b & c)").unwrap(), expected);
      assert_eq!(parse("((a))").unwrap(), tag("a"));
   }

   #[test]
   fn test_errors_report_offsets() {
      assert_eq!(error_position(""), 0);
      assert_eq!(error_position("   "), 0);
      assert_eq!(error_position("a &"), 3);
      assert_eq!(error_position("a b"), 2);
      assert_eq!(error_position("(a | b"), 0);
      assert_eq!(error_position("a & 'open"), 4);
      assert_eq!(error_position("#x"), 0);
      assert_eq!(error_position("a ; DROP TABLE tags"), 2);
      assert_eq!(error_position("tags.name='x'"), 9);
   }
}
