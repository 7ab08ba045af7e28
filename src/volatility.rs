use crate::models::{
    Attribute, CategoryTransition, KanoCategory, SwitchSummary, Transitions, VolatilityBand,
    VolatilityReport,
};
use crate::store::KanoTable;

pub const HIGH_VOLATILITY_SWITCHES: usize = 8;
pub const MODERATE_VOLATILITY_SWITCHES: usize = 4;

/// Adjacent pairs whose ordinal differs. The first month has no predecessor.
pub fn switch_count(categories: &[KanoCategory]) -> usize {
    categories
        .windows(2)
        .filter(|pair| pair[0].ordinal() != pair[1].ordinal())
        .count()
}

/// One summary per attribute present in the slice, in `Attribute::ALL` order.
pub fn switch_summaries(table: &KanoTable) -> Vec<SwitchSummary> {
    Attribute::ALL
        .into_iter()
        .filter_map(|attribute| {
            let categories: Vec<KanoCategory> = table
                .records_for(attribute)
                .map(|record| record.category)
                .collect();
            let first_category = *categories.first()?;
            let last_category = *categories.last()?;
            Some(SwitchSummary {
                attribute,
                switch_count: switch_count(&categories),
                first_category,
                last_category,
            })
        })
        .collect()
}

pub fn volatility_band(switch_count: usize) -> VolatilityBand {
    match switch_count {
        n if n >= HIGH_VOLATILITY_SWITCHES => VolatilityBand::High,
        n if n >= MODERATE_VOLATILITY_SWITCHES => VolatilityBand::Moderate,
        _ => VolatilityBand::Stable,
    }
}

impl VolatilityBand {
    pub fn label(&self) -> &'static str {
        match self {
            VolatilityBand::High => "high volatility",
            VolatilityBand::Moderate => "moderate",
            VolatilityBand::Stable => "stable",
        }
    }
}

/// Attributes whose first and last category differ.
pub fn transitions(summaries: &[SwitchSummary]) -> Transitions {
    let shifts: Vec<CategoryTransition> = summaries
        .iter()
        .filter(|summary| summary.first_category != summary.last_category)
        .map(|summary| CategoryTransition {
            attribute: summary.attribute,
            first_category: summary.first_category,
            last_category: summary.last_category,
        })
        .collect();

    if shifts.is_empty() {
        Transitions::Stable
    } else {
        Transitions::Shifts(shifts)
    }
}

/// `None` when the slice holds no Kano records.
pub fn volatility_report(table: &KanoTable) -> Option<VolatilityReport> {
    let summaries = switch_summaries(table);
    let mut most_dynamic = summaries.first()?;
    let mut most_stable = most_dynamic;

    // strict comparisons keep the earliest attribute on ties
    for summary in &summaries[1..] {
        if summary.switch_count > most_dynamic.switch_count {
            most_dynamic = summary;
        }
        if summary.switch_count < most_stable.switch_count {
            most_stable = summary;
        }
    }

    Some(VolatilityReport {
        most_dynamic: most_dynamic.clone(),
        most_stable: most_stable.clone(),
        transitions: transitions(&summaries),
        band: volatility_band(most_dynamic.switch_count),
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KanoRecord;
    use KanoCategory::*;

    fn table(series: Vec<(Attribute, Vec<KanoCategory>)>) -> KanoTable {
        let mut records = Vec::new();
        for (attribute, categories) in &series {
            for (index, category) in categories.iter().enumerate() {
                records.push(KanoRecord {
                    attribute: *attribute,
                    month: format!("{}-{:02}", 2015 + index / 12, index % 12 + 1),
                    year: 2015 + (index / 12) as i32,
                    category: *category,
                    beta_plus: 0.0,
                    beta_minus: 0.0,
                });
            }
        }
        KanoTable::from_records(records).unwrap()
    }

    #[test]
    fn counts_changes_between_adjacent_months() {
        let categories = [Attractive, Attractive, MustBe, MustBe, Attractive];
        assert_eq!(switch_count(&categories), 2);
    }

    #[test]
    fn constant_series_never_switches() {
        assert_eq!(switch_count(&[Indifferent; 7]), 0);
        assert_eq!(switch_count(&[Reverse]), 0);
        assert_eq!(switch_count(&[]), 0);
    }

    #[test]
    fn taste_scenario_reports_two_switches() {
        let kano = table(vec![(
            Attribute::Taste,
            vec![Attractive, Attractive, MustBe, MustBe, Attractive],
        )]);
        let summaries = switch_summaries(&kano);
        assert_eq!(
            summaries,
            vec![SwitchSummary {
                attribute: Attribute::Taste,
                switch_count: 2,
                first_category: Attractive,
                last_category: Attractive,
            }]
        );
    }

    #[test]
    fn ties_resolve_to_enumeration_order() {
        let kano = table(vec![
            (Attribute::Hygiene, vec![Reverse, MustBe, Reverse]),
            (Attribute::Taste, vec![Attractive, MustBe, Attractive]),
            (Attribute::Price, vec![Attractive, Attractive, Attractive]),
            (Attribute::Staff, vec![Indifferent, Indifferent, Indifferent]),
        ]);
        let report = volatility_report(&kano).unwrap();
        assert_eq!(report.most_dynamic.attribute, Attribute::Taste);
        assert_eq!(report.most_stable.attribute, Attribute::Price);
        assert_eq!(report.band, VolatilityBand::Stable);
        assert_eq!(report.transitions, Transitions::Stable);
    }

    #[test]
    fn reports_first_to_last_transitions() {
        let kano = table(vec![
            (Attribute::Taste, vec![Attractive, MustBe]),
            (Attribute::Service, vec![Indifferent, Indifferent]),
            (Attribute::Staff, vec![OneDimensional, Reverse]),
        ]);
        let report = volatility_report(&kano).unwrap();
        match report.transitions {
            Transitions::Shifts(shifts) => {
                assert_eq!(shifts.len(), 2);
                assert_eq!(shifts[0].attribute, Attribute::Taste);
                assert_eq!(shifts[0].last_category, MustBe);
                assert_eq!(shifts[1].attribute, Attribute::Staff);
                assert_eq!(shifts[1].first_category, OneDimensional);
            }
            Transitions::Stable => panic!("expected shifts"),
        }
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(volatility_band(0), VolatilityBand::Stable);
        assert_eq!(volatility_band(3), VolatilityBand::Stable);
        assert_eq!(volatility_band(4), VolatilityBand::Moderate);
        assert_eq!(volatility_band(7), VolatilityBand::Moderate);
        assert_eq!(volatility_band(8), VolatilityBand::High);
        assert_eq!(VolatilityBand::High.label(), "high volatility");
    }

    #[test]
    fn most_dynamic_band_uses_its_switch_count() {
        let alternating: Vec<KanoCategory> = (0..10)
            .map(|i| if i % 2 == 0 { Attractive } else { MustBe })
            .collect();
        let kano = table(vec![(Attribute::Ambience, alternating)]);
        let report = volatility_report(&kano).unwrap();
        assert_eq!(report.most_dynamic.switch_count, 9);
        assert_eq!(report.band, VolatilityBand::High);
    }

    #[test]
    fn empty_slice_has_no_report() {
        assert!(volatility_report(&KanoTable::default()).is_none());
    }
}
