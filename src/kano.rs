use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Attribute, CategoryComposition, CategoryStep, KanoCategory};
use crate::store::KanoTable;

/// Position of a category on the importance scale, Reverse = 0 through Must-Be = 4.
pub fn category_ordinal(category: &str) -> Result<u8> {
    category.parse::<KanoCategory>().map(|category| category.ordinal())
}

/// Per-attribute ordinal series for a step chart, in table order.
pub fn category_steps(table: &KanoTable, attributes: &[Attribute]) -> Vec<CategoryStep> {
    attributes
        .iter()
        .flat_map(|attribute| table.records_for(*attribute))
        .map(|record| CategoryStep {
            attribute: record.attribute,
            month: record.month.clone(),
            category: record.category,
            ordinal: record.category.ordinal(),
        })
        .collect()
}

/// Number of attributes in each category per month, months ascending.
pub fn composition(table: &KanoTable) -> Vec<CategoryComposition> {
    let mut by_month: BTreeMap<&str, [usize; 5]> = BTreeMap::new();
    for record in table.records() {
        let counts = by_month.entry(record.month.as_str()).or_insert([0; 5]);
        counts[record.category.ordinal() as usize] += 1;
    }

    by_month
        .into_iter()
        .map(|(month, counts)| CategoryComposition {
            month: month.to_string(),
            counts,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::models::KanoRecord;

    fn record(attribute: Attribute, month: &str, category: KanoCategory) -> KanoRecord {
        KanoRecord {
            attribute,
            month: month.to_string(),
            year: month[..4].parse().unwrap(),
            category,
            beta_plus: 0.0,
            beta_minus: 0.0,
        }
    }

    #[test]
    fn ordinals_follow_importance_scale() {
        let ordinals: Vec<u8> = ["Reverse", "Indifferent", "Attractive", "One-Dimensional", "Must-Be"]
            .iter()
            .map(|name| category_ordinal(name).unwrap())
            .collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
        assert!(category_ordinal("Reverse").unwrap() < category_ordinal("Must-Be").unwrap());
    }

    #[test]
    fn ordinal_order_is_strict_and_total() {
        for pair in KanoCategory::ORDER.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = category_ordinal("Delighter").unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownCategory(_)));
        assert!(category_ordinal("must-be").is_err());
    }

    #[test]
    fn steps_follow_selected_attributes() {
        let table = KanoTable::from_records(vec![
            record(Attribute::Taste, "2015-01", KanoCategory::Attractive),
            record(Attribute::Price, "2015-01", KanoCategory::Reverse),
            record(Attribute::Taste, "2015-02", KanoCategory::MustBe),
        ])
        .unwrap();

        let steps = category_steps(&table, &[Attribute::Taste]);
        let ordinals: Vec<u8> = steps.iter().map(|step| step.ordinal).collect();
        assert_eq!(ordinals, vec![2, 4]);
        assert!(steps.iter().all(|step| step.attribute == Attribute::Taste));
    }

    #[test]
    fn composition_counts_categories_per_month() {
        let table = KanoTable::from_records(vec![
            record(Attribute::Taste, "2015-02", KanoCategory::Attractive),
            record(Attribute::Price, "2015-01", KanoCategory::Attractive),
            record(Attribute::Service, "2015-01", KanoCategory::MustBe),
            record(Attribute::Price, "2015-02", KanoCategory::Attractive),
        ])
        .unwrap();

        let rows = composition(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2015-01");
        assert_eq!(rows[0].counts, [0, 0, 1, 0, 1]);
        assert_eq!(rows[1].counts, [0, 0, 2, 0, 0]);
    }
}
