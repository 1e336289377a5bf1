//! The three-stand scenario.
//!
//! Stands `s1`, `s2`, `s3` with areas 10, 20 and 30; regimes `A` and `B`;
//! periods 2016 and 2021. Regime `A` yields 1 m3/ha of `volume` and 3 units
//! of `deadwood`, regime `B` yields 2 m3/ha and 1 unit, in both periods.
//!
//! With `Sum_volume` (area-weighted sum, summed over periods) the best plan
//! puts every stand on `B` for 240 and the worst on `A` for 120. If `b` is
//! the area managed with `B`, volume is `120 + 2b` and deadwood `360 - 4b`.

use multiforest_core::{
    Direction, InMemoryPanel, ObjectiveDefinition, PanelBuilder, StandAggregation,
    YearAggregation,
};

pub const PERIODS: [i32; 2] = [2016, 2021];
pub const AREAS: [(&str, f64); 3] = [("s1", 10.0), ("s2", 20.0), ("s3", 30.0)];

/// Builder pre-filled with the scenario; tests may add to it.
pub fn three_stand_builder() -> PanelBuilder {
    let mut builder = PanelBuilder::new();
    for (stand, area) in AREAS {
        builder = builder.stand(stand, area);
    }
    for (stand, _) in AREAS {
        for period in PERIODS {
            builder = builder
                .cell(stand, period, "A", &[("volume", 1.0), ("deadwood", 3.0)])
                .cell(stand, period, "B", &[("volume", 2.0), ("deadwood", 1.0)]);
        }
        builder = builder.baseline_cell(stand, 2011, &[("volume", 1.0), ("deadwood", 2.0)]);
    }
    builder
}

/// The scenario panel.
pub fn three_stand_panel() -> InMemoryPanel {
    three_stand_builder()
        .build()
        .expect("scenario panel is valid")
}

/// `Sum_volume`: area-weighted sum of `volume`, summed over periods, maximized.
pub fn sum_volume() -> ObjectiveDefinition {
    ObjectiveDefinition::new(
        "Sum_volume",
        "volume",
        Direction::Max,
        YearAggregation::Sum,
        StandAggregation::AreaWeightedSum,
    )
}

/// `Sum_deadwood`: area-weighted sum of `deadwood`, summed over periods, maximized.
pub fn sum_deadwood() -> ObjectiveDefinition {
    ObjectiveDefinition::new(
        "Sum_deadwood",
        "deadwood",
        Direction::Max,
        YearAggregation::Sum,
        StandAggregation::AreaWeightedSum,
    )
}
