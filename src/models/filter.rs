use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::asset_row::ProcessedRow;

/// One of the four cascading filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Category,
    Subcategory,
    Expert,
    Asset,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Category,
        Dimension::Subcategory,
        Dimension::Expert,
        Dimension::Asset,
    ];

    /// The English display field the dimension is keyed on.
    pub fn value_of<'a>(&self, row: &'a ProcessedRow) -> &'a str {
        match self {
            Dimension::Category => row.category(),
            Dimension::Subcategory => row.subcategory(),
            Dimension::Expert => row.expert(),
            Dimension::Asset => row.asset(),
        }
    }
}

/// Inclusive bounds on `price_date_formatted`. An open bound is no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Current UI selections. An empty set means "no constraint" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub subcategories: BTreeSet<String>,
    #[serde(default)]
    pub experts: BTreeSet<String>,
    #[serde(default)]
    pub assets: BTreeSet<String>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl FilterSelection {
    pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Category => &self.categories,
            Dimension::Subcategory => &self.subcategories,
            Dimension::Expert => &self.experts,
            Dimension::Asset => &self.assets,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Category => &mut self.categories,
            Dimension::Subcategory => &mut self.subcategories,
            Dimension::Expert => &mut self.experts,
            Dimension::Asset => &mut self.assets,
        }
    }

    /// Replaces one dimension's selection.
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.get_mut(dimension) = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Still-selectable values per dimension, each sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub experts: Vec<String>,
    pub assets: Vec<String>,
}

impl FilterOptions {
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Category => &self.categories,
            Dimension::Subcategory => &self.subcategories,
            Dimension::Expert => &self.experts,
            Dimension::Asset => &self.assets,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut Vec<String> {
        match dimension {
            Dimension::Category => &mut self.categories,
            Dimension::Subcategory => &mut self.subcategories,
            Dimension::Expert => &mut self.experts,
            Dimension::Asset => &mut self.assets,
        }
    }
}
