//! Bounded, newest-first list of past analyses.

use crate::model::{Classification, HistoryEntry, Sentiment};
use time::macros::format_description;
use time::OffsetDateTime;

pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Build from restored entries, keeping at most [`MAX_HISTORY`] of the newest.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(MAX_HISTORY);
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create an entry for `text` and insert it at the front, evicting the oldest
    /// entries beyond [`MAX_HISTORY`].
    pub fn record(
        &mut self,
        text: &str,
        classification: Classification,
        now: OffsetDateTime,
    ) -> &HistoryEntry {
        let id = self.next_id(now);
        let entry = HistoryEntry::new(id, text, classification, format_clock(now));
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY);
        &self.entries[0]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // Ids are creation milliseconds, bumped past the newest entry on collision.
    // A restored id at `i64::MAX` cannot be bumped; the clock value is used then.
    fn next_id(&self, now: OffsetDateTime) -> i64 {
        let ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        match self.entries.first() {
            Some(newest) if newest.id() >= ms => newest.id().checked_add(1).unwrap_or(ms),
            _ => ms,
        }
    }
}

/// `HH:MM` in the timestamp's own offset.
pub fn format_clock(now: OffsetDateTime) -> String {
    now.format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| "--:--".into())
}

/// Example entries shown on first launch when `--seed-examples` is set.
pub fn demo_entries(now: OffsetDateTime) -> Vec<HistoryEntry> {
    let ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
    vec![
        HistoryEntry::new(
            ms - 10_000,
            "Este produto é incrível e superou minhas expectativas!",
            Classification {
                sentiment: Sentiment::Positive,
                probability: 0.92,
            },
            format_clock(now),
        ),
        HistoryEntry::new(
            ms - 20_000,
            "Não gostei do atendimento, muito demorado e pouco eficiente.",
            Classification {
                sentiment: Sentiment::Negative,
                probability: 0.78,
            },
            format_clock(now - time::Duration::minutes(10)),
        ),
    ]
}

pub const DEMO_INPUT: &str =
    "Estou muito satisfeito com o serviço, tudo funcionou perfeitamente!";

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn positive(p: f64) -> Classification {
        Classification {
            sentiment: Sentiment::Positive,
            probability: p,
        }
    }

    #[test]
    fn newest_first_and_bounded() {
        let mut history = History::default();
        let t0 = datetime!(2026-10-18 14:05 UTC);
        for i in 0..15 {
            let text = format!("analysis number {i}");
            history.record(&text, positive(0.5), t0 + time::Duration::seconds(i));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.entries()[0].full_text(), "analysis number 14");
        assert_eq!(history.entries()[9].full_text(), "analysis number 5");
        let ids: Vec<i64> = history.entries().iter().map(|e| e.id()).collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn ids_stay_distinct_within_one_millisecond() {
        let mut history = History::default();
        let t = datetime!(2026-10-18 14:05 UTC);
        let a = history.record("first text", positive(0.6), t).id();
        let b = history.record("second text", positive(0.7), t).id();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn restored_max_id_does_not_overflow() {
        let raw = r#"[{"id":9223372036854775807,"text":"antigo","fullText":"antigo","sentiment":"positivo","probability":0.7,"timestamp":"08:00"}]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(raw).unwrap();
        let mut history = History::from_entries(entries);
        let t = datetime!(2026-10-18 14:05 UTC);
        let id = history.record("texto novo", positive(0.9), t).id();
        assert_ne!(id, i64::MAX);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].full_text(), "texto novo");
    }

    #[test]
    fn records_clock_time() {
        let mut history = History::default();
        let entry = history.record("bom demais", positive(0.8), datetime!(2026-10-18 09:07 UTC));
        assert_eq!(entry.timestamp(), "09:07");
        assert_eq!(entry.probability(), 0.8);
    }

    #[test]
    fn restore_keeps_newest_ten() {
        let mut source = History::default();
        let t = datetime!(2026-10-18 14:05 UTC);
        for i in 0..10 {
            source.record(&format!("entry {i}"), positive(0.5), t);
        }
        let mut too_many = source.entries().to_vec();
        too_many.extend(source.entries().iter().cloned());
        let restored = History::from_entries(too_many);
        assert_eq!(restored.entries(), source.entries());
    }
}
