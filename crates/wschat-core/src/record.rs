//! Display records and the append-only message log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Sent by this session.
    Own,
    /// Sent by another participant (or by an unidentified sender).
    Other,
}

/// A classified, ready-to-render chat line.
///
/// Records are immutable once created; fields are private and exposed
/// through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    origin: Origin,
    text: String,
    received_at: DateTime<Utc>,
}

impl DisplayRecord {
    /// Creates a record stamped with the current time.
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self::with_timestamp(origin, text, Utc::now())
    }

    /// Creates a record with an explicit receipt time.
    pub fn with_timestamp(origin: Origin, text: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            origin,
            text: text.into(),
            received_at,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Returns true if this session authored the message.
    pub fn is_own(&self) -> bool {
        self.origin == Origin::Own
    }
}

/// Ordered, append-only log of display records.
///
/// The only mutation is [`MessageLog::append`]; there is no way to edit or
/// remove an entry once it is in the log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    records: Vec<DisplayRecord>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record at the end of the log.
    pub fn append(&mut self, record: DisplayRecord) {
        self.records.push(record);
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    /// The most recently appended record.
    pub fn last(&self) -> Option<&DisplayRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a DisplayRecord;
    type IntoIter = std::slice::Iter<'a, DisplayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = DisplayRecord::new(Origin::Own, "hi");
        assert_eq!(record.origin(), Origin::Own);
        assert_eq!(record.text(), "hi");
        assert!(record.is_own());

        let other = DisplayRecord::new(Origin::Other, "hey");
        assert!(!other.is_own());
    }

    #[test]
    fn test_log_preserves_order() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());

        log.append(DisplayRecord::new(Origin::Other, "one"));
        log.append(DisplayRecord::new(Origin::Own, "two"));
        log.append(DisplayRecord::new(Origin::Other, "three"));

        let texts: Vec<&str> = log.iter().map(DisplayRecord::text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(log.last().map(DisplayRecord::text), Some("three"));
    }

    #[test]
    fn test_log_append_keeps_prior_entries() {
        let mut log = MessageLog::new();
        log.append(DisplayRecord::new(Origin::Other, "first"));
        let snapshot: Vec<DisplayRecord> = log.records().to_vec();

        for i in 0..10 {
            let before = log.len();
            log.append(DisplayRecord::new(Origin::Own, format!("msg {i}")));
            assert_eq!(log.len(), before + 1);
            assert_eq!(&log.records()[..snapshot.len()], snapshot.as_slice());
        }
    }

    #[test]
    fn test_origin_serialization() {
        let json = serde_json::to_string(&Origin::Own).unwrap();
        assert_eq!(json, "\"own\"");
    }
}
