/// Ordinary least-squares line and its mean-response confidence band.
///
/// The band at x is ŷ(x) ± t* · s · sqrt(1/n + (x − x̄)² / Sxx), with t*
/// the two-sided Student t quantile on n − 2 degrees of freedom.

use statrs::distribution::{ContinuousCDF, StudentsT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
    pub x_mean: f64,
    pub sxx: f64,
    /// Residual standard error; `None` with fewer than three points.
    pub residual_se: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub x: f64,
    pub lower: f64,
    pub upper: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Confidence band at `level` percent over `xs`. `None` when the
    /// residual error is undefined or the level is out of (0, 100).
    pub fn confidence_band(&self, xs: &[f64], level: f64) -> Option<Vec<BandPoint>> {
        let s = self.residual_se?;
        if !(level > 0.0 && level < 100.0) {
            return None;
        }
        let df = (self.n - 2) as f64;
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let t_crit = dist.inverse_cdf(0.5 + level / 200.0);
        let nf = self.n as f64;

        Some(
            xs.iter()
                .map(|&x| {
                    let half = t_crit * s * (1.0 / nf + (x - self.x_mean).powi(2) / self.sxx).sqrt();
                    let y = self.predict(x);
                    BandPoint {
                        x,
                        lower: y - half,
                        upper: y + half,
                    }
                })
                .collect(),
        )
    }
}

/// Least-squares fit of y on x. `None` with fewer than two points or when
/// all x are equal.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / nf;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for &(x, y) in points {
        sxx += (x - x_mean).powi(2);
        sxy += (x - x_mean) * (y - y_mean);
    }
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let residual_se = if n > 2 {
        let sse: f64 = points
            .iter()
            .map(|&(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        Some((sse / (nf - 2.0)).sqrt())
    } else {
        None
    };

    Some(LinearFit {
        slope,
        intercept,
        n,
        x_mean,
        sxx,
        residual_se,
    })
}

/// `count` evenly spaced values spanning [lo, hi].
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            let mut xs: Vec<f64> = (0..count).map(|i| lo + step * i as f64).collect();
            xs[count - 1] = hi;
            xs
        }
    }
}
