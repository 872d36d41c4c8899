use crate::math::Vec3;

use super::buffer::GeometryError;

/// Memoized binomial coefficients built with Pascal's recurrence.
///
/// Rows are computed lazily and kept for the lifetime of the table:
/// `C(n, 0) = C(n, n) = 1`, `C(n, i) = C(n-1, i-1) + C(n-1, i)`.
#[derive(Debug, Clone)]
pub struct BinomialTable {
    rows: Vec<Vec<f64>>,
}

impl Default for BinomialTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BinomialTable {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![1.0]],
        }
    }

    /// Row `n`: `[C(n, 0), ..., C(n, n)]`.
    pub fn row(&mut self, n: usize) -> &[f64] {
        while self.rows.len() <= n {
            let prev = &self.rows[self.rows.len() - 1];
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(1.0);
            for i in 1..prev.len() {
                next.push(prev[i - 1] + prev[i]);
            }
            next.push(1.0);
            self.rows.push(next);
        }
        &self.rows[n]
    }

    /// Number of rows computed so far.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Bezier curve of arbitrary degree.
///
/// Evaluation blends the control points with Bernstein weights
/// `C(n, i) * (1 - t)^(n - i) * t^i`, where `n + 1` is the control point count.
#[derive(Debug, Clone)]
pub struct BezierCurve {
    control_points: Vec<Vec3>,
    binomials: BinomialTable,
}

impl BezierCurve {
    pub fn new(control_points: Vec<Vec3>) -> Result<Self, GeometryError> {
        if control_points.is_empty() {
            return Err(GeometryError::NoControlPoints);
        }
        Ok(Self {
            control_points,
            binomials: BinomialTable::new(),
        })
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    /// Point on the curve at parameter `t`.
    pub fn evaluate(&mut self, t: f32) -> Vec3 {
        let n = self.degree();
        let one_minus_t = 1.0 - t;
        let coefficients = self.binomials.row(n);

        let mut point = Vec3::zero();
        for (i, (&c, &p)) in coefficients.iter().zip(&self.control_points).enumerate() {
            let weight = c as f32 * one_minus_t.powi((n - i) as i32) * t.powi(i as i32);
            point = point + p * weight;
        }
        point
    }

    /// Samples `point_count` points at uniformly spaced parameters over `[0, tick]`.
    ///
    /// A single sample evaluates `t = 0`.
    pub fn sample(&mut self, point_count: usize, tick: f32) -> Vec<Vec3> {
        let step = if point_count > 1 {
            tick / (point_count - 1) as f32
        } else {
            0.0
        };
        (0..point_count)
            .map(|i| self.evaluate(i as f32 * step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    // ── binomials ─────────────────────────────────────────────────────────

    #[test]
    fn row_four_matches_known_values() {
        let mut table = BinomialTable::new();
        assert_eq!(table.row(4), &[1.0, 4.0, 6.0, 4.0, 1.0]);
    }

    #[test]
    fn rows_satisfy_pascal_recurrence() {
        let mut table = BinomialTable::new();
        table.row(20);
        for n in 1..=20 {
            let prev = table.row(n - 1).to_vec();
            let row = table.row(n).to_vec();
            assert_eq!(row[0], 1.0);
            assert_eq!(row[n], 1.0);
            for i in 1..n {
                assert_eq!(row[i], prev[i - 1] + prev[i]);
            }
        }
    }

    #[test]
    fn rows_are_memoized() {
        let mut table = BinomialTable::new();
        table.row(6);
        assert_eq!(table.cached_rows(), 7);
        table.row(3);
        assert_eq!(table.cached_rows(), 7);
    }

    // ── evaluation ────────────────────────────────────────────────────────

    #[test]
    fn endpoints_match_first_and_last_control_point() {
        let pts = vec![
            Vec3::new(-4.0, 2.0, 1.0),
            Vec3::new(10.0, 30.0, -5.0),
            Vec3::new(7.0, -8.0, 2.0),
            Vec3::new(1.0, 1.0, 9.0),
        ];
        let mut curve = BezierCurve::new(pts.clone()).unwrap();
        assert!(close(curve.evaluate(0.0), pts[0]));
        assert!(close(curve.evaluate(1.0), pts[3]));
    }

    #[test]
    fn quadratic_midpoint() {
        let mut curve = BezierCurve::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(150.0, 0.0, 0.0),
            Vec3::new(300.0, 300.0, 0.0),
        ])
        .unwrap();
        // 0.25 * p0 + 0.5 * p1 + 0.25 * p2
        assert!(close(curve.evaluate(0.5), Vec3::new(150.0, 75.0, 0.0)));
    }

    #[test]
    fn single_control_point_is_constant() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        let mut curve = BezierCurve::new(vec![p]).unwrap();
        for point in curve.sample(5, 1.0) {
            assert_eq!(point, p);
        }
    }

    #[test]
    fn empty_control_points_rejected() {
        assert_eq!(
            BezierCurve::new(Vec::new()).unwrap_err(),
            GeometryError::NoControlPoints
        );
    }

    // ── sampling ──────────────────────────────────────────────────────────

    #[test]
    fn sample_ten_points_spans_the_curve() {
        let mut curve = BezierCurve::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(150.0, 0.0, 0.0),
            Vec3::new(300.0, 300.0, 0.0),
        ])
        .unwrap();
        let points = curve.sample(10, 1.0);
        assert_eq!(points.len(), 10);
        assert!(close(points[0], Vec3::new(0.0, 0.0, 0.0)));
        assert!(close(points[9], Vec3::new(300.0, 300.0, 0.0)));
    }

    #[test]
    fn single_sample_is_start_point() {
        let mut curve =
            BezierCurve::new(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(9.0, 9.0, 9.0)]).unwrap();
        let points = curve.sample(1, 1.0);
        assert_eq!(points, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn zero_samples_is_empty() {
        let mut curve = BezierCurve::new(vec![Vec3::zero()]).unwrap();
        assert!(curve.sample(0, 1.0).is_empty());
    }

    #[test]
    fn partial_tick_stops_early() {
        let mut curve =
            BezierCurve::new(vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)]).unwrap();
        let points = curve.sample(3, 0.5);
        assert!(close(points[2], Vec3::new(5.0, 0.0, 0.0)));
    }
}
