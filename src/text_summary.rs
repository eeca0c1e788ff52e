//! Text summary builder for CLI output.

use crate::metrics;
use crate::model::HistoryEntry;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Summary of one finished analysis.
pub(crate) fn build_result_summary(entry: &HistoryEntry) -> TextSummary {
    let lines = vec![
        format!("Text: {}", entry.display_text()),
        format!(
            "Sentiment: {} ({}%)",
            entry.sentiment().as_str().to_uppercase(),
            metrics::confidence_percent(entry.probability())
        ),
        format!("Time: {}", entry.timestamp()),
    ];
    TextSummary { lines }
}

/// One line per stored analysis, newest first, plus an aggregate line.
pub(crate) fn build_history_summary(entries: &[HistoryEntry]) -> TextSummary {
    if entries.is_empty() {
        return TextSummary {
            lines: vec!["No analyses in history.".into()],
        };
    }

    let mut lines: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "{} - {}  {} ({}%)",
                e.timestamp(),
                e.display_text(),
                e.sentiment(),
                metrics::confidence_percent(e.probability())
            )
        })
        .collect();

    let stats = metrics::compute_history_stats(entries);
    let mut total = format!(
        "{} analyses: {} positive / {} negative",
        entries.len(),
        stats.positive,
        stats.negative
    );
    if let Some(mean) = stats.mean_probability {
        total.push_str(&format!(", avg confidence {}%", metrics::confidence_percent(mean)));
    }
    lines.push(total);

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::model::{Classification, Sentiment};
    use time::macros::datetime;

    #[test]
    fn result_summary_shows_rounded_confidence() {
        let mut history = History::default();
        let entry = history.record(
            "Chegou antes do prazo",
            Classification {
                sentiment: Sentiment::Positive,
                probability: 0.915,
            },
            datetime!(2026-10-18 08:15 UTC),
        );
        let summary = build_result_summary(entry);
        assert_eq!(summary.lines[1], "Sentiment: POSITIVE (92%)");
        assert_eq!(summary.lines[2], "Time: 08:15");
    }

    #[test]
    fn history_summary_lists_then_totals() {
        let t = datetime!(2026-10-18 08:15 UTC);
        let entries = crate::history::demo_entries(t);
        let summary = build_history_summary(&entries);
        assert_eq!(summary.lines.len(), 3);
        assert!(summary.lines[0].ends_with("Positive (92%)"));
        assert_eq!(
            summary.lines[2],
            "2 analyses: 1 positive / 1 negative, avg confidence 85%"
        );
    }

    #[test]
    fn empty_history_summary() {
        assert_eq!(
            build_history_summary(&[]).lines,
            vec!["No analyses in history.".to_string()]
        );
    }
}
