use cellgrid_grid_model::GridPartition;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum GridOp {
    AddColumn,
    RemoveColumn,
    AddRow,
    RemoveRow,
    ResetUniform,
}

fn grid_op() -> impl Strategy<Value = GridOp> {
    prop_oneof![
        Just(GridOp::AddColumn),
        Just(GridOp::RemoveColumn),
        Just(GridOp::AddRow),
        Just(GridOp::RemoveRow),
        Just(GridOp::ResetUniform),
    ]
}

fn weights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.05f64..20.0, 1..8)
}

proptest! {
    #[test]
    fn edits_never_empty_an_axis(
        columns in weights(),
        rows in weights(),
        ops in prop::collection::vec(grid_op(), 0..40),
    ) {
        let mut partition = GridPartition::from_weights(columns, rows).unwrap();
        for op in ops {
            let (columns, rows) = (partition.column_count(), partition.row_count());
            match op {
                GridOp::AddColumn => partition.add_column(),
                GridOp::RemoveColumn => prop_assert_eq!(partition.remove_column(), columns > 1),
                GridOp::AddRow => partition.add_row(),
                GridOp::RemoveRow => prop_assert_eq!(partition.remove_row(), rows > 1),
                GridOp::ResetUniform => {
                    partition.reset_uniform();
                    prop_assert!(partition.is_uniform());
                    prop_assert_eq!(partition.column_count(), columns);
                }
            }
            prop_assert!(partition.column_count() >= 1);
            prop_assert!(partition.row_count() >= 1);
            prop_assert!(partition
                .column_weights()
                .iter()
                .chain(partition.row_weights())
                .all(|w| w.is_finite() && *w > 0.0));
        }
    }

    #[test]
    fn cell_positions_cover_the_grid_row_major(columns in 1usize..9, rows in 1usize..9) {
        let partition = GridPartition::uniform(columns, rows);
        prop_assert_eq!(partition.cell_count(), columns * rows);
        prop_assert_eq!(partition.cell_position(0), None);
        prop_assert_eq!(partition.cell_position(columns * rows + 1), None);

        let positions: Vec<(usize, usize)> = (1..=partition.cell_count())
            .map(|index| partition.cell_position(index).unwrap())
            .collect();
        let expected: Vec<(usize, usize)> = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| (column, row)))
            .collect();
        prop_assert_eq!(positions, expected);
    }

    #[test]
    fn invalid_weights_leave_the_partition_unchanged(
        columns in weights(),
        bad_index in 0usize..8,
        bad in prop::sample::select(vec![0.0, -1.0, f64::NAN, f64::INFINITY]),
    ) {
        let mut partition = GridPartition::uniform(columns.len(), 2);
        let mut replacement = columns.clone();
        let bad_index = bad_index % replacement.len();
        replacement[bad_index] = bad;

        prop_assert!(partition.set_column_weights(replacement).is_err());
        prop_assert!(partition.is_uniform());
        prop_assert!(partition.set_column_weights(columns.clone()).is_ok());
        prop_assert_eq!(partition.column_weights(), columns.as_slice());
    }
}
