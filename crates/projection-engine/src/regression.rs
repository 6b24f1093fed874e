use statrs::statistics::Statistics;

/// Ordinary least-squares line fit over (x, y) points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination: 1.0 is a perfect fit, 0.0 is a fit no
    /// better than the mean. Can go negative for fits worse than the mean.
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit a line through the points. Needs at least 2 points and a
    /// non-degenerate x axis (two identical x values cannot be fit).
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
        let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
        let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

        let denom = n * sum_x2 - sum_x * sum_x;
        if denom == 0.0 {
            return None;
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;

        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        let mean_y = ys.as_slice().mean();
        let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();

        // A constant series is fit exactly by its own flat line
        let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

        Some(Self { slope, intercept, r_squared })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_line_has_unit_r_squared() {
        let points = [(2022.0, 100.0), (2023.0, 110.0), (2024.0, 120.0)];
        let fit = LinearFit::fit(&points).unwrap();

        assert_relative_eq!(fit.slope, 10.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.predict(2026.0), 140.0, epsilon = 1e-6);
    }

    #[test]
    fn two_points_always_fit_perfectly() {
        let fit = LinearFit::fit(&[(2023.0, 50.0), (2024.0, 75.0)]).unwrap();
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.predict(2025.0), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn flat_series_is_a_perfect_flat_fit() {
        let fit = LinearFit::fit(&[(2022.0, 100.0), (2023.0, 100.0), (2024.0, 100.0)]).unwrap();
        assert_relative_eq!(fit.slope, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn v_shaped_series_fits_no_better_than_the_mean() {
        let fit = LinearFit::fit(&[(2022.0, 100.0), (2023.0, 0.0), (2024.0, 100.0)]).unwrap();
        assert_relative_eq!(fit.slope, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_inputs_yield_no_fit() {
        assert!(LinearFit::fit(&[]).is_none());
        assert!(LinearFit::fit(&[(2024.0, 1.0)]).is_none());
        assert!(LinearFit::fit(&[(2024.0, 1.0), (2024.0, 2.0)]).is_none());
    }
}
