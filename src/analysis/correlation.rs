/// Pearson correlation with a two-tailed significance test.
///
/// The p-value uses Student's t with n − 2 degrees of freedom:
/// t = r·sqrt((n − 2) / (1 − r²)).

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::analysis::groupings::Group;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub r_squared: f64,
    pub n: usize,
}

/// Per-group correlation result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupStats {
    Defined(Correlation),
    /// Fewer than two points, or a constant coordinate.
    Insufficient { n: usize },
}

impl GroupStats {
    pub fn correlation(&self) -> Option<&Correlation> {
        match self {
            GroupStats::Defined(c) => Some(c),
            GroupStats::Insufficient { .. } => None,
        }
    }
}

/// Pearson r, p and r² over `points`.
pub fn pearson(points: &[(f64, f64)]) -> GroupStats {
    let n = points.len();
    if n < 2 {
        return GroupStats::Insufficient { n };
    }

    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return GroupStats::Insufficient { n };
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    GroupStats::Defined(Correlation {
        r,
        p_value: two_tailed_p(r, n),
        r_squared: r * r,
        n,
    })
}

fn two_tailed_p(r: f64, n: usize) -> f64 {
    if n <= 2 {
        // Two points always lie on a line.
        return 1.0;
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / denom).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        // Upper tail through sf(); 1 - cdf() rounds to zero below ~1e-16.
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Stats for every group, in the groups' order.
pub fn group_stats(groups: &[Group]) -> Vec<(String, GroupStats)> {
    groups
        .iter()
        .map(|g| (g.name.clone(), pearson(&g.points)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_perfect_line() {
        let stats = pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]);
        let c = stats.correlation().expect("three collinear points are defined");
        assert_abs_diff_eq!(c.r, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.r_squared, 1.0, epsilon = 1e-12);
        assert!(c.p_value.is_finite());
        assert_eq!(c.n, 3);
    }

    #[test]
    fn test_single_point_is_insufficient() {
        assert_eq!(pearson(&[(5.0, 9.0)]), GroupStats::Insufficient { n: 1 });
        assert_eq!(pearson(&[]), GroupStats::Insufficient { n: 0 });
    }

    #[test]
    fn test_constant_coordinate_is_insufficient() {
        assert_eq!(
            pearson(&[(1.0, 3.0), (1.0, 4.0), (1.0, 5.0)]),
            GroupStats::Insufficient { n: 3 }
        );
    }

    #[test]
    fn test_two_points_have_unit_p() {
        let c = *pearson(&[(0.0, 1.0), (1.0, 0.0)]).correlation().unwrap();
        assert_abs_diff_eq!(c.r, -1.0, epsilon = 1e-12);
        assert_eq!(c.p_value, 1.0);
    }

    #[test]
    fn test_known_p_value() {
        // r = 102/110 ≈ 0.927, t ≈ 7.0 on 8 df, p ≈ 1.1e-4
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let ys = [2.0, 1.0, 4.0, 3.0, 7.0, 5.0, 6.0, 9.0, 8.0, 10.0];
        let points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        let c = *pearson(&points).correlation().unwrap();
        assert_abs_diff_eq!(c.r_squared, c.r * c.r, epsilon = 1e-15);
        assert_abs_diff_eq!(c.r, 102.0 / 110.0, epsilon = 1e-12);
        assert!(c.p_value > 5e-5 && c.p_value < 5e-4);
    }

    #[test]
    fn test_strong_correlation_keeps_tiny_p() {
        // y = x ± 0.5 over 30 samples: r ≈ 0.99833, t ≈ 91.4 on 28 df
        let points: Vec<(f64, f64)> = (1..=30)
            .map(|i| {
                let x = i as f64;
                (x, if i % 2 == 1 { x + 0.5 } else { x - 0.5 })
            })
            .collect();
        let c = *pearson(&points).correlation().unwrap();
        assert_abs_diff_eq!(c.r, 0.99833, epsilon = 1e-5);
        assert!(c.p_value > 1e-37 && c.p_value < 1e-34, "p = {:e}", c.p_value);
        assert_eq!(crate::plot::legend::format_general(c.p_value, 2), "3.2e-36");
    }

    #[test]
    fn test_r_squared_bounds() {
        let points = [(1.0, 9.0), (2.0, 7.5), (3.0, 8.0), (4.0, 3.0), (5.0, 4.5)];
        let c = *pearson(&points).correlation().unwrap();
        assert!(c.r < 0.0);
        assert!((0.0..=1.0).contains(&c.r_squared));
        assert_abs_diff_eq!(c.r_squared, c.r * c.r, epsilon = 1e-15);
        assert!((0.0..=1.0).contains(&c.p_value));
    }
}
