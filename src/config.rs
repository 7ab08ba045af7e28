use std::path::PathBuf;

use anyhow::{bail, Context};

use crate::models::Attribute;

pub const DEFAULT_MONTHLY_PATH: &str = "monthly_attributes_weighted_filtered.csv";
pub const DEFAULT_KANO_PATH: &str = "kano_dynamic.csv";

/// Attributes plotted on the Kano step view when none are requested.
pub const DEFAULT_STEP_ATTRIBUTES: [Attribute; 3] =
    [Attribute::Taste, Attribute::Service, Attribute::Hygiene];

/// Filters shared by the overview, Kano and impact views.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceConfig {
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub attributes: Vec<Attribute>,
}

impl SliceConfig {
    pub fn new(
        from_year: Option<i32>,
        to_year: Option<i32>,
        attributes: Option<&str>,
        default_attributes: &[Attribute],
    ) -> anyhow::Result<Self> {
        let attributes = match attributes {
            Some(list) => parse_attribute_list(list)?,
            None => default_attributes.to_vec(),
        };
        let config = Self {
            from_year,
            to_year,
            attributes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                bail!("--from-year {from} is after --to-year {to}");
            }
        }
        if self.attributes.is_empty() {
            bail!("at least one attribute must be selected");
        }
        Ok(())
    }

    /// Fills unset bounds from the table's own year range.
    pub fn year_range(&self, bounds: (i32, i32)) -> (i32, i32) {
        (
            self.from_year.unwrap_or(bounds.0),
            self.to_year.unwrap_or(bounds.1),
        )
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub monthly_path: PathBuf,
    pub kano_path: PathBuf,
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.monthly_path.as_os_str().is_empty() {
            bail!("monthly table path cannot be empty");
        }
        if self.kano_path.as_os_str().is_empty() {
            bail!("Kano table path cannot be empty");
        }
        Ok(())
    }
}

/// Parses a comma separated list such as "taste, service".
pub fn parse_attribute_list(list: &str) -> anyhow::Result<Vec<Attribute>> {
    let mut attributes = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let attribute: Attribute = name
            .parse()
            .with_context(|| format!("expected one of: {}", attribute_names()))?;
        if !attributes.contains(&attribute) {
            attributes.push(attribute);
        }
    }
    Ok(attributes)
}

fn attribute_names() -> String {
    Attribute::ALL
        .iter()
        .map(Attribute::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
