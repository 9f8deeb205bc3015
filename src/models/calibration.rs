use crate::utils::error::PestError;
use crate::Result;
use linfa::composing::platt_scaling::{platt_newton_method, platt_predict, Platt};
use linfa::ParamGuard;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Platt sigmoid: P(y=1|f) = 1 / (1 + exp(A*f + B))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattScaling {
    fn default() -> Self {
        // 未校准时退化为标准sigmoid
        Self { a: -1.0, b: 0.0 }
    }
}

impl PlattScaling {
    /// 在二分类判别值上拟合sigmoid参数（牛顿法）
    pub fn fit(decision_values: &[f64], labels: &[bool]) -> Result<Self> {
        if decision_values.len() != labels.len() {
            return Err(PestError::Training(format!(
                "Platt scaling got {} decision values for {} labels",
                decision_values.len(),
                labels.len()
            )));
        }
        if decision_values.is_empty() {
            return Ok(Self::default());
        }

        let params = Platt::<f64, ()>::params();
        let params = params
            .check_ref()
            .map_err(|e| PestError::Training(format!("Invalid Platt parameters: {}", e)))?;

        let (a, b) = platt_newton_method(
            ArrayView1::from(decision_values),
            ArrayView1::from(labels),
            params,
        )
        .map_err(|e| PestError::Training(format!("Platt scaling failed: {}", e)))?;

        Ok(Self { a, b })
    }

    pub fn probability(&self, decision_value: f64) -> f64 {
        if decision_value.is_nan() {
            return 0.0;
        }
        f64::from(*platt_predict(decision_value, self.a, self.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separable_scores_give_monotone_probabilities() {
        let values = [-3.0, -2.0, -1.5, -1.0, 1.0, 1.5, 2.0, 3.0];
        let labels = [false, false, false, false, true, true, true, true];
        let platt = PlattScaling::fit(&values, &labels).unwrap();

        assert!(platt.a < 0.0);
        assert!(platt.probability(2.5) > 0.5);
        assert!(platt.probability(-2.5) < 0.5);
        assert!(platt.probability(1.0) < platt.probability(2.0));
    }

    #[test]
    fn probabilities_are_bounded() {
        let platt = PlattScaling::default();
        for v in [-1e6, -10.0, 0.0, 10.0, 1e6] {
            let p = platt.probability(v);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(PlattScaling::fit(&[], &[]).unwrap(), PlattScaling::default());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(PlattScaling::fit(&[0.5, -0.5], &[true]).is_err());
    }

    #[test]
    fn overlapping_scores_fit_finite_coefficients() {
        let values = [-2.1, -1.3, -0.7, -0.2, 0.4, 0.9, -0.4, 0.3, 1.2, 2.2];
        let labels = [false, false, false, true, false, true, false, true, true, true];
        let platt = PlattScaling::fit(&values, &labels).unwrap();

        assert!(platt.a.is_finite() && platt.b.is_finite());
        assert!(platt.a < 0.0);
        assert!(platt.probability(-2.0) < platt.probability(2.0));
    }

    #[test]
    fn nan_decision_value_has_zero_probability() {
        assert_eq!(PlattScaling::default().probability(f64::NAN), 0.0);
    }
}
