use crate::models::{Attribute, BetaPoint, ImpactSummary};
use crate::store::KanoTable;

/// Mean β⁺ and β⁻ per attribute over the slice, attributes in order of first
/// appearance. Attributes without records in the slice are left out.
pub fn impact_summary(table: &KanoTable) -> Vec<ImpactSummary> {
    table
        .attributes()
        .into_iter()
        .map(|attribute| {
            let (count, plus, minus) = table
                .records_for(attribute)
                .fold((0usize, 0.0, 0.0), |(count, plus, minus), record| {
                    (count + 1, plus + record.beta_plus, minus + record.beta_minus)
                });
            ImpactSummary {
                attribute,
                mean_beta_plus: plus / count as f64,
                mean_beta_minus: minus / count as f64,
                record_count: count,
            }
        })
        .collect()
}

pub fn mean_beta_plus(table: &KanoTable, attribute: Attribute) -> Option<f64> {
    impact_summary(&table.select_attributes(&[attribute]))
        .first()
        .map(|summary| summary.mean_beta_plus)
}

pub fn mean_beta_minus(table: &KanoTable, attribute: Attribute) -> Option<f64> {
    impact_summary(&table.select_attributes(&[attribute]))
        .first()
        .map(|summary| summary.mean_beta_minus)
}

/// Per-period β series for the selected attributes.
pub fn beta_trend(table: &KanoTable, attributes: &[Attribute]) -> Vec<BetaPoint> {
    attributes
        .iter()
        .flat_map(|attribute| table.records_for(*attribute))
        .map(|record| BetaPoint {
            attribute: record.attribute,
            month: record.month.clone(),
            beta_plus: record.beta_plus,
            beta_minus: record.beta_minus,
        })
        .collect()
}

/// Attribute whose positive sentiment lifts rating the most; ties keep the first.
pub fn top_delighter(summaries: &[ImpactSummary]) -> Option<&ImpactSummary> {
    summaries.iter().fold(None, |best: Option<&ImpactSummary>, summary| match best {
        Some(current) if current.mean_beta_plus >= summary.mean_beta_plus => Some(current),
        _ => Some(summary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KanoCategory, KanoRecord};

    fn record(attribute: Attribute, month: &str, beta_plus: f64, beta_minus: f64) -> KanoRecord {
        KanoRecord {
            attribute,
            month: month.to_string(),
            year: month[..4].parse().unwrap(),
            category: KanoCategory::Attractive,
            beta_plus,
            beta_minus,
        }
    }

    fn sample_table() -> KanoTable {
        KanoTable::from_records(vec![
            record(Attribute::Service, "2015-01", 0.2, -0.4),
            record(Attribute::Taste, "2015-01", 0.5, -0.1),
            record(Attribute::Service, "2015-02", 0.4, -0.2),
            record(Attribute::Taste, "2016-01", 0.7, -0.3),
            record(Attribute::Hygiene, "2016-01", 0.123456789, -0.987654321),
        ])
        .unwrap()
    }

    #[test]
    fn averages_per_attribute_in_input_order() {
        let summaries = impact_summary(&sample_table());
        let attributes: Vec<Attribute> = summaries.iter().map(|s| s.attribute).collect();
        assert_eq!(
            attributes,
            vec![Attribute::Service, Attribute::Taste, Attribute::Hygiene]
        );
        assert!((summaries[0].mean_beta_plus - 0.3).abs() < 1e-12);
        assert!((summaries[0].mean_beta_minus + 0.3).abs() < 1e-12);
        assert!((summaries[1].mean_beta_plus - 0.6).abs() < 1e-12);
        assert_eq!(summaries[1].record_count, 2);
    }

    #[test]
    fn single_record_group_keeps_exact_values() {
        let summaries = impact_summary(&sample_table());
        let hygiene = &summaries[2];
        assert_eq!(hygiene.record_count, 1);
        assert_eq!(hygiene.mean_beta_plus, 0.123456789);
        assert_eq!(hygiene.mean_beta_minus, -0.987654321);
    }

    #[test]
    fn absent_attributes_are_omitted() {
        let slice = sample_table().filter_by_year_range(2016, 2016);
        let summaries = impact_summary(&slice);
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.attribute != Attribute::Service));
        assert_eq!(mean_beta_plus(&slice, Attribute::Service), None);
        assert_eq!(mean_beta_minus(&slice, Attribute::Taste), Some(-0.3));
    }

    #[test]
    fn empty_slice_yields_no_summaries() {
        let slice = sample_table().filter_by_year_range(2030, 2031);
        assert!(impact_summary(&slice).is_empty());
        assert!(top_delighter(&[]).is_none());
    }

    #[test]
    fn beta_trend_keeps_month_order() {
        let points = beta_trend(&sample_table(), &[Attribute::Taste]);
        let months: Vec<&str> = points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2015-01", "2016-01"]);
    }

    #[test]
    fn top_delighter_has_highest_mean_beta_plus() {
        let summaries = impact_summary(&sample_table());
        let top = top_delighter(&summaries).unwrap();
        assert_eq!(top.attribute, Attribute::Taste);
    }
}
