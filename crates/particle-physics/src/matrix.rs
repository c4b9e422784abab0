//! Per-group-pair attraction coefficients

use crate::error::ConfigError;

/// `max_groups x max_groups` table of base coefficients.
///
/// Entry `(i, j)` is how strongly group `i` is pulled toward group `j`; the
/// table is not symmetric. The effective coefficient is the base value times
/// the live force multiplier, applied at read time so a multiplier change
/// rescales every pair without touching the table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttractionMatrix {
    base: Vec<f32>,
    max_groups: usize,
}

impl AttractionMatrix {
    /// All-zero matrix
    pub fn new(max_groups: usize) -> Self {
        Self {
            base: vec![0.0; max_groups * max_groups],
            max_groups,
        }
    }

    /// Build from `(from, to, coefficient)` triples, leaving every other pair at zero
    pub fn from_entries<I>(max_groups: usize, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (usize, usize, f32)>,
    {
        let mut matrix = Self::new(max_groups);
        for (from, to, coefficient) in entries {
            matrix.set(from, to, coefficient)?;
        }
        Ok(matrix)
    }

    pub fn max_groups(&self) -> usize {
        self.max_groups
    }

    /// Base coefficient without the multiplier
    pub fn base(&self, from: usize, to: usize) -> f32 {
        self.base[self.index(from, to)]
    }

    /// Effective coefficient for the ordered pair `(from, to)`.
    ///
    /// # Panics
    /// If either id is not below `max_groups`.
    pub fn coefficient(&self, from: usize, to: usize, force_multiplier: f32) -> f32 {
        self.base(from, to) * force_multiplier
    }

    pub fn set(&mut self, from: usize, to: usize, coefficient: f32) -> Result<(), ConfigError> {
        for index in [from, to] {
            if index >= self.max_groups {
                return Err(ConfigError::GroupOutOfRange {
                    index,
                    max_groups: self.max_groups,
                });
            }
        }
        let index = self.index(from, to);
        self.base[index] = coefficient;
        Ok(())
    }

    fn index(&self, from: usize, to: usize) -> usize {
        // Checked per axis: the flat index alone aliases rows
        assert!(
            from < self.max_groups && to < self.max_groups,
            "group pair ({from}, {to}) is outside the {}-group matrix",
            self.max_groups
        );
        from * self.max_groups + to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_asymmetric() {
        let matrix = AttractionMatrix::from_entries(4, [(1, 0, 1.6), (0, 1, -0.5)]).unwrap();
        assert_eq!(matrix.base(1, 0), 1.6);
        assert_eq!(matrix.base(0, 1), -0.5);
        assert_eq!(matrix.base(2, 3), 0.0);
    }

    #[test]
    fn test_multiplier_scales_at_read_time() {
        let matrix = AttractionMatrix::from_entries(2, [(0, 0, 1.0), (1, 0, -2.0)]).unwrap();
        assert_eq!(matrix.coefficient(0, 0, 0.1), 0.1);
        assert_eq!(matrix.coefficient(1, 0, 0.5), -1.0);
        assert_eq!(matrix.coefficient(1, 0, 0.0), 0.0);
    }

    #[test]
    fn test_out_of_range_group_is_rejected() {
        let mut matrix = AttractionMatrix::new(4);
        assert_eq!(
            matrix.set(4, 0, 1.0),
            Err(ConfigError::GroupOutOfRange {
                index: 4,
                max_groups: 4
            })
        );
        assert!(matrix.set(0, 7, 1.0).is_err());
        assert_eq!(matrix, AttractionMatrix::new(4));
    }

    #[test]
    #[should_panic(expected = "outside the 4-group matrix")]
    fn test_column_past_the_edge_does_not_alias_another_pair() {
        let matrix = AttractionMatrix::from_entries(4, [(1, 1, 2.0)]).unwrap();
        let _ = matrix.coefficient(0, 5, 1.0);
    }
}
