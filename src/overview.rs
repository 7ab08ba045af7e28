use crate::models::{Attribute, AttributePoint, RatingPoint, RatingSummary};
use crate::store::MonthlyTable;

/// Which per-attribute signal to read from the monthly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    WeightedSentiment,
    Mention,
}

pub fn rating_trend(table: &MonthlyTable) -> Vec<RatingPoint> {
    table
        .records()
        .iter()
        .map(|record| RatingPoint {
            month: record.month,
            avg_rating: record.avg_rating,
        })
        .collect()
}

/// Long-format series, one point per (month, attribute), attributes in the
/// order given.
pub fn attribute_trend(
    table: &MonthlyTable,
    attributes: &[Attribute],
    kind: SignalKind,
) -> Vec<AttributePoint> {
    attributes
        .iter()
        .flat_map(|attribute| {
            table.records().iter().map(move |record| {
                let signal = record.signal(*attribute);
                AttributePoint {
                    month: record.month,
                    attribute: *attribute,
                    value: match kind {
                        SignalKind::WeightedSentiment => signal.weighted_sentiment,
                        SignalKind::Mention => f64::from(signal.mention),
                    },
                }
            })
        })
        .collect()
}

pub fn rating_summary(table: &MonthlyTable) -> Option<RatingSummary> {
    let records = table.records();
    let first = records.first()?.avg_rating;
    let last = records.last()?.avg_rating;
    let (min, max, total) = records.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, total), record| {
            (
                min.min(record.avg_rating),
                max.max(record.avg_rating),
                total + record.avg_rating,
            )
        },
    );

    Some(RatingSummary {
        first,
        last,
        mean: total / records.len() as f64,
        min,
        max,
        months: records.len(),
    })
}

/// Total mentions per attribute over the slice, in the order given.
pub fn mention_totals(table: &MonthlyTable, attributes: &[Attribute]) -> Vec<(Attribute, u64)> {
    attributes
        .iter()
        .map(|attribute| {
            let total = table
                .records()
                .iter()
                .map(|record| u64::from(record.signal(*attribute).mention))
                .sum::<u64>();
            (*attribute, total)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeSignal, MonthlyAttributeRecord};
    use chrono::NaiveDate;

    fn record(month: u32, rating: f64, sentiment: f64, mention: u32) -> MonthlyAttributeRecord {
        let mut signals = [AttributeSignal {
            weighted_sentiment: 0.0,
            mention: 0,
        }; 6];
        signals[Attribute::Service.index()] = AttributeSignal {
            weighted_sentiment: sentiment,
            mention,
        };
        MonthlyAttributeRecord {
            month: NaiveDate::from_ymd_opt(2017, month, 1).unwrap(),
            avg_rating: rating,
            signals,
        }
    }

    fn sample() -> MonthlyTable {
        MonthlyTable::from_records(vec![
            record(1, 4.0, 0.2, 10),
            record(2, 3.5, -0.1, 4),
            record(3, 4.5, 0.3, 7),
        ])
        .unwrap()
    }

    #[test]
    fn rating_summary_covers_slice() {
        let summary = rating_summary(&sample()).unwrap();
        assert_eq!(summary.first, 4.0);
        assert_eq!(summary.last, 4.5);
        assert_eq!(summary.min, 3.5);
        assert_eq!(summary.max, 4.5);
        assert!((summary.mean - 4.0).abs() < 1e-12);
        assert_eq!(summary.months, 3);
        assert!(rating_summary(&MonthlyTable::default()).is_none());
    }

    #[test]
    fn attribute_trend_reads_selected_signal() {
        let table = sample();
        let sentiment = attribute_trend(&table, &[Attribute::Service], SignalKind::WeightedSentiment);
        let values: Vec<f64> = sentiment.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.2, -0.1, 0.3]);

        let mentions = attribute_trend(&table, &[Attribute::Taste, Attribute::Service], SignalKind::Mention);
        assert_eq!(mentions.len(), 6);
        assert_eq!(mentions[3].attribute, Attribute::Service);
        assert_eq!(mentions[3].value, 10.0);
    }

    #[test]
    fn rating_trend_and_mention_totals() {
        let table = sample();
        assert_eq!(rating_trend(&table).len(), 3);
        assert_eq!(
            mention_totals(&table, &[Attribute::Service, Attribute::Staff]),
            vec![(Attribute::Service, 21), (Attribute::Staff, 0)]
        );
    }
}
