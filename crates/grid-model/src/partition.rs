//! Grid partition and cell rectangle types.
//!
//! A partition splits a container into weighted columns and rows, in the
//! manner of CSS `fr` tracks. Cells are addressed by a 1-based index in
//! row-major order.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Weighted columns and rows of the grid.
///
/// Invariant: both weight lists are non-empty and every weight is finite
/// and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPartition")]
pub struct GridPartition {
    column_weights: Vec<f64>,
    row_weights: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through `from_weights`.
#[derive(Deserialize)]
struct RawPartition {
    column_weights: Vec<f64>,
    row_weights: Vec<f64>,
}

impl TryFrom<RawPartition> for GridPartition {
    type Error = ModelError;

    fn try_from(raw: RawPartition) -> Result<Self, Self::Error> {
        Self::from_weights(raw.column_weights, raw.row_weights)
    }
}

impl GridPartition {
    /// A grid of `columns` x `rows` equally weighted tracks.
    ///
    /// Zero counts are raised to one.
    pub fn uniform(columns: usize, rows: usize) -> Self {
        Self {
            column_weights: vec![1.0; columns.max(1)],
            row_weights: vec![1.0; rows.max(1)],
        }
    }

    /// Build a partition from explicit weights.
    pub fn from_weights(column_weights: Vec<f64>, row_weights: Vec<f64>) -> Result<Self, ModelError> {
        validate_weights("column", &column_weights)?;
        validate_weights("row", &row_weights)?;
        Ok(Self {
            column_weights,
            row_weights,
        })
    }

    pub fn column_weights(&self) -> &[f64] {
        &self.column_weights
    }

    pub fn row_weights(&self) -> &[f64] {
        &self.row_weights
    }

    pub fn column_count(&self) -> usize {
        self.column_weights.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_weights.len()
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.column_count() * self.row_count()
    }

    /// Map a 1-based cell index to its `(column, row)`.
    ///
    /// Returns `None` for index 0 or indices past the last cell.
    pub fn cell_position(&self, index: usize) -> Option<(usize, usize)> {
        if index == 0 || index > self.cell_count() {
            return None;
        }
        let columns = self.column_count();
        Some(((index - 1) % columns, (index - 1) / columns))
    }

    /// Append a column of weight 1.
    pub fn add_column(&mut self) {
        self.column_weights.push(1.0);
    }

    /// Remove the last column. Returns `false` if only one column is left.
    pub fn remove_column(&mut self) -> bool {
        if self.column_weights.len() <= 1 {
            return false;
        }
        self.column_weights.pop();
        true
    }

    /// Append a row of weight 1.
    pub fn add_row(&mut self) {
        self.row_weights.push(1.0);
    }

    /// Remove the last row. Returns `false` if only one row is left.
    pub fn remove_row(&mut self) -> bool {
        if self.row_weights.len() <= 1 {
            return false;
        }
        self.row_weights.pop();
        true
    }

    /// Reset every weight to 1, keeping the column and row counts.
    pub fn reset_uniform(&mut self) {
        self.column_weights.iter_mut().for_each(|w| *w = 1.0);
        self.row_weights.iter_mut().for_each(|w| *w = 1.0);
    }

    /// Whether all weights on both axes are equal.
    pub fn is_uniform(&self) -> bool {
        all_equal(&self.column_weights) && all_equal(&self.row_weights)
    }

    /// Replace the column weights, keeping the column count.
    pub fn set_column_weights(&mut self, weights: Vec<f64>) -> Result<(), ModelError> {
        check_count("column", self.column_count(), weights.len())?;
        validate_weights("column", &weights)?;
        self.column_weights = weights;
        Ok(())
    }

    /// Replace the row weights, keeping the row count.
    pub fn set_row_weights(&mut self, weights: Vec<f64>) -> Result<(), ModelError> {
        check_count("row", self.row_count(), weights.len())?;
        validate_weights("row", &weights)?;
        self.row_weights = weights;
        Ok(())
    }
}

impl Default for GridPartition {
    fn default() -> Self {
        Self::uniform(2, 2)
    }
}

fn validate_weights(axis: &'static str, weights: &[f64]) -> Result<(), ModelError> {
    if weights.is_empty() {
        return Err(ModelError::EmptyAxis { axis });
    }
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(ModelError::InvalidWeight { axis, index, value });
        }
    }
    Ok(())
}

fn check_count(axis: &'static str, expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected != actual {
        return Err(ModelError::WeightCountMismatch {
            axis,
            expected,
            actual,
        });
    }
    Ok(())
}

fn all_equal(weights: &[f64]) -> bool {
    weights.windows(2).all(|pair| pair[0] == pair[1])
}

/// A cell's pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Whether two rectangles share any pixel.
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_partition() {
        let partition = GridPartition::uniform(3, 2);
        assert_eq!(partition.column_count(), 3);
        assert_eq!(partition.row_count(), 2);
        assert_eq!(partition.cell_count(), 6);
        assert!(partition.is_uniform());
    }

    #[test]
    fn test_uniform_raises_zero_counts() {
        let partition = GridPartition::uniform(0, 0);
        assert_eq!(partition.cell_count(), 1);
    }

    #[test]
    fn test_from_weights_rejects_invalid() {
        assert_eq!(
            GridPartition::from_weights(vec![], vec![1.0]),
            Err(ModelError::EmptyAxis { axis: "column" })
        );
        assert!(matches!(
            GridPartition::from_weights(vec![1.0], vec![1.0, 0.0]),
            Err(ModelError::InvalidWeight {
                axis: "row",
                index: 1,
                ..
            })
        ));
        assert!(GridPartition::from_weights(vec![f64::NAN], vec![1.0]).is_err());
        assert!(GridPartition::from_weights(vec![-1.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_cell_position_row_major() {
        let partition = GridPartition::uniform(3, 2);
        assert_eq!(partition.cell_position(1), Some((0, 0)));
        assert_eq!(partition.cell_position(3), Some((2, 0)));
        assert_eq!(partition.cell_position(4), Some((0, 1)));
        assert_eq!(partition.cell_position(6), Some((2, 1)));
        assert_eq!(partition.cell_position(0), None);
        assert_eq!(partition.cell_position(7), None);
    }

    #[test]
    fn test_add_and_remove_tracks() {
        let mut partition = GridPartition::uniform(1, 1);
        assert!(!partition.remove_column());
        assert!(!partition.remove_row());

        partition.add_column();
        partition.add_row();
        partition.add_row();
        assert_eq!(partition.column_count(), 2);
        assert_eq!(partition.row_count(), 3);

        assert!(partition.remove_row());
        assert_eq!(partition.row_count(), 2);
    }

    #[test]
    fn test_reset_uniform_keeps_counts() {
        let mut partition = GridPartition::from_weights(vec![1.0, 3.0], vec![2.0, 5.0, 1.0]).unwrap();
        assert!(!partition.is_uniform());
        partition.reset_uniform();
        assert!(partition.is_uniform());
        assert_eq!(partition.column_weights(), &[1.0, 1.0]);
        assert_eq!(partition.row_weights(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_set_weights_checks_count() {
        let mut partition = GridPartition::uniform(2, 2);
        assert!(partition.set_column_weights(vec![1.0]).is_err());
        assert!(partition.set_column_weights(vec![1.0, 3.0]).is_ok());
        assert_eq!(partition.column_weights(), &[1.0, 3.0]);
    }

    #[test]
    fn test_cell_rect_geometry() {
        let a = CellRect::new(0, 0, 50, 50);
        let b = CellRect::new(50, 0, 50, 50);
        assert_eq!(a.right(), 50);
        assert!(!a.overlaps(&b));
        assert!(a.contains(49, 49));
        assert!(!a.contains(50, 0));
        assert_eq!(a.area(), 2500);
    }

    #[test]
    fn test_partition_json_shape() {
        let partition = GridPartition::uniform(2, 1);
        let json = serde_json::to_string(&partition).unwrap();
        assert_eq!(json, r#"{"column_weights":[1.0,1.0],"row_weights":[1.0]}"#);

        let parsed: GridPartition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, partition);
    }

    #[test]
    fn test_deserialize_validates_weights() {
        let raw = r#"{"column_weights":[1.0,0.0],"row_weights":[1.0]}"#;
        assert!(serde_json::from_str::<GridPartition>(raw).is_err());
    }
}
