use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the virtual tag that matches every file.
pub const ALL_TAG: &str = "__ALL__";

/// Id that [`ALL_TAG`] resolves to. No stored tag ever has this id.
pub const ALL_TAG_ID: i64 = -1;

/// A tag or file given either by name or by numeric id.
///
/// Ids are trusted as given: a handle never checks that an id refers to an
/// existing row before using it. Names are looked up, and a name that matches
/// nothing resolves to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
   Id(i64),
   Name(String),
}

impl EntityRef {
   /// Interpret a command-line style argument: anything that parses as an
   /// `i64` is an id, everything else is a name.
   pub fn parse(value: &str) -> Self {
      match value.parse::<i64>() {
         Ok(id) => EntityRef::Id(id),
         Err(_) => EntityRef::Name(value.to_string()),
      }
   }

   /// True for the virtual tag, whether given as `__ALL__` or as `-1`.
   pub fn is_all_tag(&self) -> bool {
      match self {
         EntityRef::Id(id) => *id == ALL_TAG_ID,
         EntityRef::Name(name) => name == ALL_TAG,
      }
   }

   pub fn as_id(&self) -> Option<i64> {
      match self {
         EntityRef::Id(id) => Some(*id),
         EntityRef::Name(_) => None,
      }
   }

   pub fn as_name(&self) -> Option<&str> {
      match self {
         EntityRef::Id(_) => None,
         EntityRef::Name(name) => Some(name),
      }
   }
}

impl From<i64> for EntityRef {
   fn from(id: i64) -> Self {
      EntityRef::Id(id)
   }
}

impl From<&str> for EntityRef {
   fn from(name: &str) -> Self {
      EntityRef::Name(name.to_string())
   }
}

impl From<String> for EntityRef {
   fn from(name: String) -> Self {
      EntityRef::Name(name)
   }
}

impl From<&String> for EntityRef {
   fn from(name: &String) -> Self {
      EntityRef::Name(name.clone())
   }
}

impl From<&EntityRef> for EntityRef {
   fn from(value: &EntityRef) -> Self {
      value.clone()
   }
}

impl fmt::Display for EntityRef {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         EntityRef::Id(id) => write!(f, "#{id}"),
         EntityRef::Name(name) => f.write_str(name),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_parse_prefers_ids() {
      assert_eq!(EntityRef::parse("42"), EntityRef::Id(42));
      assert_eq!(EntityRef::parse("-1"), EntityRef::Id(-1));
      assert_eq!(EntityRef::parse("photo"), EntityRef::Name("photo".into()));
      assert_eq!(EntityRef::parse("4a"), EntityRef::Name("4a".into()));
   }

   #[test]
   fn test_all_tag_in_both_forms() {
      assert!(EntityRef::from(ALL_TAG).is_all_tag());
      assert!(EntityRef::from(ALL_TAG_ID).is_all_tag());
      assert!(!EntityRef::from("__all__").is_all_tag());
      assert!(!EntityRef::from(0).is_all_tag());
   }

   #[test]
   fn test_serde_is_untagged() {
      let refs: Vec<EntityRef> = serde_json::from_str(r#"[3, "photo"]"#).unwrap();
      assert_eq!(refs, vec![EntityRef::Id(3), EntityRef::Name("photo".into())]);
   }
}
