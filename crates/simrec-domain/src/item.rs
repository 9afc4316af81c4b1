//! Item module - polymorphic references to rateable entities

use std::fmt;

/// Reference to an item of any kind
///
/// Items are never loaded by the core; they are identified by a `kind`
/// (e.g. `"quote"`, `"person"`) and a numeric primary key. The derived
/// ordering compares `kind` first, then `id`, and is the canonical ordering
/// used to store unordered similarity pairs exactly once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemRef {
    /// Item kind (the polymorphic type tag)
    pub kind: String,

    /// Primary key within the kind
    pub id: i64,
}

impl ItemRef {
    /// Create a new item reference
    ///
    /// # Examples
    ///
    /// ```
    /// use simrec_domain::ItemRef;
    ///
    /// let quote = ItemRef::new("quote", 7);
    /// assert_eq!(quote.to_string(), "quote:7");
    /// ```
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    /// Parse an item reference from its `kind:id` form
    ///
    /// # Examples
    ///
    /// ```
    /// use simrec_domain::ItemRef;
    ///
    /// let item = ItemRef::parse("person:42").unwrap();
    /// assert_eq!(item, ItemRef::new("person", 42));
    /// assert!(ItemRef::parse("person").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        let (kind, id) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("Invalid item reference '{}'. Expected 'kind:id'", s))?;

        if kind.is_empty() {
            return Err(format!("Invalid item reference '{}': empty kind", s));
        }

        let id = id
            .parse::<i64>()
            .map_err(|e| format!("Invalid item id in '{}': {}", s, e))?;

        Ok(Self::new(kind, id))
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl std::str::FromStr for ItemRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
