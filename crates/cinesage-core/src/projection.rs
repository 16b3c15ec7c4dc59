//! Fixed linear dimensionality reduction for embedding vectors.
//!
//! A [`ReductionMatrix`] is learned once offline (PCA over the catalog
//! embeddings) and persisted alongside the embedding matrix. The same
//! transform must then be applied to every freshly encoded query vector
//! so queries stay commensurate with stored rows; a width mismatch is a
//! hard error, never a silent truncation.

use serde::{Deserialize, Serialize};

use cinesage_types::error::CodecError;

/// A fixed linear projection from `input_dim` to `output_dim`.
///
/// Mean-centers the input, then multiplies by the component matrix:
/// `out[o] = sum_i components[o * input_dim + i] * (v[i] - mean[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionMatrix {
    pub input_dim: usize,
    pub output_dim: usize,
    /// Per-dimension mean subtracted before projection; `input_dim` long.
    pub mean: Vec<f32>,
    /// Row-major `output_dim x input_dim` component matrix.
    pub components: Vec<f32>,
}

impl ReductionMatrix {
    /// Whether the mean and component buffers agree with the declared
    /// dimensions. Checked by the bundle loader before the transform is
    /// ever applied.
    pub fn is_well_formed(&self) -> bool {
        self.input_dim > 0
            && self.output_dim > 0
            && self.mean.len() == self.input_dim
            && self.components.len() == self.input_dim * self.output_dim
    }

    /// Project a raw vector down to `output_dim`.
    ///
    /// Fails fast on a width mismatch.
    pub fn project(&self, vector: &[f32]) -> Result<Vec<f32>, CodecError> {
        if vector.len() != self.input_dim {
            return Err(CodecError::DimensionMismatch {
                expected: self.input_dim,
                actual: vector.len(),
            });
        }

        let mut out = vec![0.0_f32; self.output_dim];
        for (o, slot) in out.iter_mut().enumerate() {
            let row = &self.components[o * self.input_dim..(o + 1) * self.input_dim];
            let mut acc = 0.0_f32;
            for i in 0..self.input_dim {
                acc += row[i] * (vector[i] - self.mean[i]);
            }
            *slot = acc;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 -> 2 transform that picks out the first two (centered) axes.
    fn axis_transform() -> ReductionMatrix {
        ReductionMatrix {
            input_dim: 3,
            output_dim: 2,
            mean: vec![0.0, 0.0, 0.0],
            components: vec![
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
        }
    }

    #[test]
    fn test_project_selects_axes() {
        let t = axis_transform();
        let out = t.project(&[0.5, -0.25, 9.0]).unwrap();
        assert_eq!(out, vec![0.5, -0.25]);
    }

    #[test]
    fn test_project_subtracts_mean() {
        let mut t = axis_transform();
        t.mean = vec![0.5, 0.5, 0.5];
        let out = t.project(&[1.0, 0.5, 0.0]).unwrap();
        assert_eq!(out, vec![0.5, 0.0]);
    }

    #[test]
    fn test_project_width_mismatch_fails() {
        let t = axis_transform();
        let err = t.project(&[1.0, 2.0]).unwrap_err();
        match err {
            CodecError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
        }
    }

    #[test]
    fn test_is_well_formed() {
        assert!(axis_transform().is_well_formed());

        let mut bad = axis_transform();
        bad.components.pop();
        assert!(!bad.is_well_formed());

        let mut bad = axis_transform();
        bad.mean.push(0.0);
        assert!(!bad.is_well_formed());

        let mut bad = axis_transform();
        bad.output_dim = 0;
        assert!(!bad.is_well_formed());
    }
}
