//! Work items and the consumers that submit them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A post waiting to be scored.
///
/// `id` is assigned by the caller and is expected, but not required, to be
/// unique. Items with empty text should be filtered out before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub text: String,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// True when there is nothing worth sending to a provider
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Identifies the consumer (page, CLI session) a work item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumerId(pub u64);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_new() {
        let item = WorkItem::new("1789", "A long thread about compilers");
        assert_eq!(item.id, "1789");
        assert_eq!(item.text, "A long thread about compilers");
    }

    #[test]
    fn test_work_item_is_blank() {
        assert!(WorkItem::new("1", "").is_blank());
        assert!(WorkItem::new("1", "  \n\t").is_blank());
        assert!(!WorkItem::new("1", "ok").is_blank());
    }

    #[test]
    fn test_work_item_from_json_line() {
        let item: WorkItem = serde_json::from_str(r#"{"id":"42","text":"hello"}"#).unwrap();
        assert_eq!(item, WorkItem::new("42", "hello"));
    }

    #[test]
    fn test_consumer_id_display() {
        assert_eq!(ConsumerId(7).to_string(), "consumer-7");
    }
}
