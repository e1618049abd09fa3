use std::borrow::Cow;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::runner::ds::operations::type_conversion::canonical_integer_string;

/// Key of a keyed collection entry.
///
/// Strings that spell a canonical decimal integer are always stored as `Int`, so `"5"` and
/// `5` address the same entry. A hand built `Str("5")` is folded to `Int(5)` by the collection
/// on every store and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    pub fn from_name(name: &str) -> Self {
        match canonical_integer_string(name) {
            Some(i) => ArrayKey::Int(i),
            None => ArrayKey::Str(name.to_string()),
        }
    }

    /// Folds a `Str` spelling a canonical integer into `Int`.
    pub fn into_canonical(self) -> Self {
        match self {
            ArrayKey::Str(s) => match canonical_integer_string(&s) {
                Some(i) => ArrayKey::Int(i),
                None => ArrayKey::Str(s),
            },
            key => key,
        }
    }

    pub fn canonical(&self) -> Cow<'_, ArrayKey> {
        match self {
            ArrayKey::Str(s) => match canonical_integer_string(s) {
                Some(i) => Cow::Owned(ArrayKey::Int(i)),
                None => Cow::Borrowed(self),
            },
            ArrayKey::Int(_) => Cow::Borrowed(self),
        }
    }

    /// The key rendered as a property name.
    pub fn to_name(&self) -> String {
        match self {
            ArrayKey::Int(i) => i.to_string(),
            ArrayKey::Str(s) => s.to_string(),
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, ArrayKey::Int(_))
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_name(s)
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::from_name(&s)
    }
}

impl Display for ArrayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_names_become_int_keys() {
        assert_eq!(ArrayKey::from_name("42"), ArrayKey::Int(42));
        assert_eq!(ArrayKey::from_name("-7"), ArrayKey::Int(-7));
        assert_eq!(ArrayKey::from("0"), ArrayKey::Int(0));
    }

    #[test]
    fn test_non_canonical_names_stay_strings() {
        for name in &["007", "-0", "+1", "1.5", " 1", "", "abc", "99999999999999999999"] {
            assert_eq!(ArrayKey::from_name(name), ArrayKey::Str(name.to_string()));
        }
    }

    #[test]
    fn test_hand_built_numeric_string_folds_to_int() {
        assert_eq!(ArrayKey::Str("5".to_string()).into_canonical(), ArrayKey::Int(5));
        assert_eq!(*ArrayKey::Str("-3".to_string()).canonical(), ArrayKey::Int(-3));
        let kept = ArrayKey::Str("05".to_string());
        assert!(matches!(kept.canonical(), Cow::Borrowed(_)));
        assert_eq!(kept.into_canonical(), ArrayKey::Str("05".to_string()));
    }

    #[test]
    fn test_to_name() {
        assert_eq!(ArrayKey::Int(3).to_name(), "3");
        assert_eq!(ArrayKey::Str("x".to_string()).to_name(), "x");
        assert_eq!(ArrayKey::Str("x".to_string()).to_string(), "\"x\"");
    }
}
