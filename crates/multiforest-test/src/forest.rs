//! A three-period panel with clear-cut, continuous-cover and set-aside regimes.
//!
//! | regime | harvest | deadwood | spruce | birch |
//! |---|---|---|---|---|
//! | `CC`  | 5, 0, 6 | 1, 1, 1 | 10, 4, 6   | 2, 6, 3 |
//! | `CCF` | 2, 2, 2 | 2, 3, 4 | 10, 9, 9   | 2, 3, 3 |
//! | `SA`  | 0, 0, 0 | 3, 5, 7 | 10, 11, 12 | 2, 2, 2 |
//!
//! Values are per hectare for periods 2016, 2021 and 2026. Stand `s3` is on
//! peat (`PEAT = 1`), the others are not. Areas are 10, 20 and 30.

use multiforest_core::{
    Direction, InMemoryPanel, ObjectiveDefinition, PanelBuilder, StandAggregation,
    YearAggregation,
};

pub const PERIODS: [i32; 3] = [2016, 2021, 2026];
pub const REGIMES: [&str; 3] = ["CC", "CCF", "SA"];

fn series(regime: &str) -> [[f64; 3]; 4] {
    match regime {
        "CC" => [
            [5.0, 0.0, 6.0],
            [1.0, 1.0, 1.0],
            [10.0, 4.0, 6.0],
            [2.0, 6.0, 3.0],
        ],
        "CCF" => [
            [2.0, 2.0, 2.0],
            [2.0, 3.0, 4.0],
            [10.0, 9.0, 9.0],
            [2.0, 3.0, 3.0],
        ],
        _ => [
            [0.0, 0.0, 0.0],
            [3.0, 5.0, 7.0],
            [10.0, 11.0, 12.0],
            [2.0, 2.0, 2.0],
        ],
    }
}

/// Builder pre-filled with the forest panel.
pub fn forest_builder() -> PanelBuilder {
    let stands = [("s1", 10.0, 0.0), ("s2", 20.0, 0.0), ("s3", 30.0, 1.0)];
    let mut builder = PanelBuilder::new();
    for (stand, area, _) in stands {
        builder = builder.stand(stand, area);
    }
    for (stand, _, peat) in stands {
        for regime in REGIMES {
            let [harvest, deadwood, spruce, birch] = series(regime);
            for (i, period) in PERIODS.into_iter().enumerate() {
                builder = builder.cell(
                    stand,
                    period,
                    regime,
                    &[
                        ("harvest", harvest[i]),
                        ("deadwood", deadwood[i]),
                        ("spruce", spruce[i]),
                        ("birch", birch[i]),
                        ("PEAT", peat),
                    ],
                );
            }
        }
        builder = builder.baseline_cell(stand, 2011, &[("harvest", 0.0), ("deadwood", 2.0)]);
    }
    builder
}

pub fn forest_panel() -> InMemoryPanel {
    forest_builder().build().expect("forest panel is valid")
}

/// Total harvest over all periods, maximized.
pub fn total_harvest() -> ObjectiveDefinition {
    ObjectiveDefinition::new(
        "Total_harvest",
        "harvest",
        Direction::Max,
        YearAggregation::Sum,
        StandAggregation::AreaWeightedSum,
    )
}

/// Deadwood in the last period, maximized.
pub fn final_deadwood() -> ObjectiveDefinition {
    ObjectiveDefinition::new(
        "Final_deadwood",
        "deadwood",
        Direction::Max,
        YearAggregation::LastYear,
        StandAggregation::AreaWeightedSum,
    )
}

/// Smallest per-period harvest, maximized (an even-flow objective).
pub fn min_harvest() -> ObjectiveDefinition {
    ObjectiveDefinition::new(
        "Min_harvest",
        "harvest",
        Direction::Max,
        YearAggregation::Min,
        StandAggregation::AreaWeightedSum,
    )
}
