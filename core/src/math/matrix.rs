use ndarray::{Array1, Array2, ArrayView2, Axis};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Stacks fixed-width rows into a dense matrix.
    pub fn from_rows(rows: &[Vec<f64>], width: usize) -> Array2<f64> {
        let mut matrix = Array2::zeros((rows.len(), width));
        for (mut target, row) in matrix.axis_iter_mut(Axis(0)).zip(rows) {
            for (cell, &value) in target.iter_mut().zip(row.iter()) {
                *cell = value;
            }
        }
        matrix
    }

    /// `inputs · weights + bias`, broadcasting the bias over every row.
    pub fn affine(
        inputs: ArrayView2<f64>,
        weights: ArrayView2<f64>,
        bias: &Array1<f64>,
    ) -> Array2<f64> {
        inputs.dot(&weights) + bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn from_rows_pads_short_rows_with_zero() {
        let matrix = MatrixHelper::from_rows(&[vec![1.0, 2.0], vec![3.0]], 2);
        assert_eq!(matrix, array![[1.0, 2.0], [3.0, 0.0]]);
    }

    #[test]
    fn affine_broadcasts_bias() {
        let inputs = array![[1.0, 2.0]];
        let weights = array![[1.0], [1.0]];
        let bias = array![0.5];
        let out = MatrixHelper::affine(inputs.view(), weights.view(), &bias);
        assert_eq!(out, array![[3.5]]);
    }
}
