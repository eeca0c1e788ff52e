use crate::model::{HistoryEntry, Sentiment};

/// Confidence as a whole percentage, `round(100 * p)`, clamped to 0..=100.
pub fn confidence_percent(probability: f64) -> u8 {
    if !probability.is_finite() {
        return 0;
    }
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Aggregate figures shown under the history list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryStats {
    pub positive: usize,
    pub negative: usize,
    pub mean_probability: Option<f64>,
}

/// Compute positive/negative counts and mean confidence over `entries`.
pub fn compute_history_stats(entries: &[HistoryEntry]) -> HistoryStats {
    if entries.is_empty() {
        return HistoryStats::default();
    }
    let positive = entries
        .iter()
        .filter(|e| e.sentiment() == Sentiment::Positive)
        .count();
    let mean = entries.iter().map(|e| e.probability()).sum::<f64>() / entries.len() as f64;
    HistoryStats {
        positive,
        negative: entries.len() - positive,
        mean_probability: Some(mean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Classification;

    fn entry(sentiment: Sentiment, probability: f64) -> HistoryEntry {
        HistoryEntry::new(
            0,
            "texto qualquer",
            Classification {
                sentiment,
                probability,
            },
            "12:00".into(),
        )
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(confidence_percent(0.924), 92);
        assert_eq!(confidence_percent(0.925), 93);
        assert_eq!(confidence_percent(0.0), 0);
        assert_eq!(confidence_percent(1.0), 100);
        assert_eq!(confidence_percent(f64::NAN), 0);
    }

    #[test]
    fn stats_count_by_label() {
        let entries = vec![
            entry(Sentiment::Positive, 0.9),
            entry(Sentiment::Negative, 0.7),
            entry(Sentiment::Positive, 0.8),
        ];
        let stats = compute_history_stats(&entries);
        assert_eq!(stats.positive, 2);
        assert_eq!(stats.negative, 1);
        let mean = stats.mean_probability.unwrap();
        assert!((mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn stats_empty() {
        assert_eq!(compute_history_stats(&[]), HistoryStats::default());
    }
}
