//! Fare and family-size categorizers
//!
//! Pure, total bucket mappings. Ordinal codes follow the fixed literal label
//! order of each enum, never the observed data, so the encoding is stable no
//! matter which buckets actually occur in a given split.

use serde::{Deserialize, Serialize};

/// Fare bucket. Half-open intervals with inclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FareCategory {
    Low,
    Med,
    High,
    VeryHigh,
}

impl FareCategory {
    /// Bucket a fare value.
    pub fn from_fare(fare: f64) -> Self {
        if fare <= 8.0 {
            FareCategory::Low
        } else if fare <= 10.5 {
            FareCategory::Med
        } else if fare <= 100.0 {
            FareCategory::High
        } else {
            FareCategory::VeryHigh
        }
    }

    /// Ordinal code in the fixed label order
    /// {Low_Fare, Med_Fare, High_Fare, Very_High_Fare}.
    pub fn code(self) -> i64 {
        match self {
            FareCategory::Low => 0,
            FareCategory::Med => 1,
            FareCategory::High => 2,
            FareCategory::VeryHigh => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FareCategory::Low => "Low_Fare",
            FareCategory::Med => "Med_Fare",
            FareCategory::High => "High_Fare",
            FareCategory::VeryHigh => "Very_High_Fare",
        }
    }
}

/// Family-size bucket. Total for all integers, including non-positive sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilySizeCategory {
    Single,
    SmallFamily,
    LargeFamily,
}

impl FamilySizeCategory {
    pub fn from_size(size: i64) -> Self {
        if size <= 1 {
            FamilySizeCategory::Single
        } else if size <= 3 {
            FamilySizeCategory::SmallFamily
        } else {
            FamilySizeCategory::LargeFamily
        }
    }

    /// Ordinal code in the fixed label order
    /// {Single, Small_Family, Large_Family}.
    pub fn code(self) -> i64 {
        match self {
            FamilySizeCategory::Single => 0,
            FamilySizeCategory::SmallFamily => 1,
            FamilySizeCategory::LargeFamily => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FamilySizeCategory::Single => "Single",
            FamilySizeCategory::SmallFamily => "Small_Family",
            FamilySizeCategory::LargeFamily => "Large_Family",
        }
    }
}
