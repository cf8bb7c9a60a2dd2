pub struct StatsHelper;

impl StatsHelper {
    pub fn mean_square(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| v * v).sum();
        sum_sq / samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_residuals_have_zero_loss() {
        assert_eq!(StatsHelper::mean_square(&[]), 0.0);
        assert_eq!(StatsHelper::mean_square(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn mean_square_of_residuals() {
        assert_eq!(StatsHelper::mean_square(&[3.0, -1.0]), 5.0);
    }
}
