//! Round-trip of external partition descriptions through the public API.

use gridstat::partition::{Partition, PartitionDescription, UnivariateDescription};
use gridstat::value::STAR;

fn sample_description() -> PartitionDescription {
    PartitionDescription {
        dimensions: vec![
            UnivariateDescription::IntervalBounds {
                bounds: vec![0.8, 1.45, 1.75],
            },
            UnivariateDescription::ValueGroups {
                groups: vec![
                    vec!["A".to_string(), "B".to_string()],
                    vec!["C".to_string(), STAR.to_string()],
                ],
            },
            UnivariateDescription::ContinuousValueSet {
                values: vec![-1.0, 0.0, 2.5],
            },
            UnivariateDescription::SymbolValueSet {
                values: vec!["x".to_string(), "y".to_string()],
            },
        ],
    }
}

#[test]
fn import_then_export_is_identity() {
    let description = sample_description();
    let grid = Partition::import_from(&description);
    assert_eq!(grid.export_to(), description);
}

#[test]
fn imported_grid_compiles_with_expected_shape() {
    let mut grid = Partition::import_from(&sample_description());
    grid.compile().unwrap();
    // 4 x 2 x 3 x 2 cells.
    assert_eq!(grid.total_cell_count(), 48);
    for index in [0, 7, 23, 47] {
        assert_eq!(grid.cell_index(&grid.decompose(index)), index);
    }
}

#[test]
fn description_round_trips_through_json() {
    let description = sample_description();
    let json = serde_json::to_string_pretty(&description).unwrap();
    let back: PartitionDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(back, description);

    let grid = Partition::import_from(&back);
    assert_eq!(grid.export_to(), description);
}
