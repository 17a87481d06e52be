//! Table name patterns.

use regex::Regex;
use std::fmt;

use crate::errors::{Result, TableKeeperError};

/// Regex that must match the whole unqualified table name.
///
/// `tmp.+` selects `tmp1` and `tmp_abc` but not `tmp`, `xtmp1` or
/// `temporary_x`.
#[derive(Debug, Clone)]
pub struct TableNamePattern {
    source: String,
    regex: Regex,
}

impl TableNamePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = |source| TableKeeperError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        };
        // Compile on its own first: an unbalanced `)` would otherwise close
        // the anchoring group early.
        Regex::new(pattern).map_err(invalid)?;
        let regex = Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(invalid)?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, table_name: &str) -> bool {
        self.regex.is_match(table_name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for TableNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_requires_full_match() {
        let pattern = TableNamePattern::new("tmp.+").unwrap();
        assert!(pattern.matches("tmp123"));
        assert!(pattern.matches("tmp_abc"));
        assert!(!pattern.matches("tmp"));
        assert!(!pattern.matches("prod1"));
        assert!(!pattern.matches("temporary_x"));
        assert!(!pattern.matches("xtmp1"));
        assert!(!pattern.matches("my_tmp_table"));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let pattern = TableNamePattern::new("a|tmp.+").unwrap();
        assert!(pattern.matches("a"));
        assert!(!pattern.matches("a1"));
        assert!(!pattern.matches("xtmp1"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = TableNamePattern::new("tmp(").unwrap_err();
        assert!(matches!(err, TableKeeperError::InvalidPattern { ref pattern, .. } if pattern == "tmp("));
    }

    #[test]
    fn unbalanced_group_cannot_escape_anchors() {
        let err = TableNamePattern::new("tmp)|(?:x").unwrap_err();
        assert!(matches!(err, TableKeeperError::InvalidPattern { ref pattern, .. } if pattern == "tmp)|(?:x"));
    }

    #[test]
    fn anchors_reject_embedded_newlines() {
        let pattern = TableNamePattern::new("tmp.+").unwrap();
        assert!(!pattern.matches("tmp1\n"));
        assert!(!pattern.matches("prod\ntmp1"));
    }

    #[test]
    fn keeps_caller_pattern_for_display() {
        let pattern = TableNamePattern::new("tmp.+").unwrap();
        assert_eq!(pattern.to_string(), "tmp.+");
        assert_eq!(pattern.as_str(), "tmp.+");
    }
}
