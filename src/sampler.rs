//! Hit-and-run sampling of a bounded convex polytope.
//!
//! The polytope is `{x : A x <sense> b, lb <= x <= ub}`, given as a [Problem] with `m` columns.
//! The sampler binds an augmented problem with one more column `t` and `m` trailing rows
//! that read `x - t * d = a`. Maximising `t` gives the furthest point of the polytope
//! on the line going through `a` with direction `d`. Each step of a walk rewrites the
//! `t` coefficients and right-hand sides of the trailing rows in place, and solves again.
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::adapter::SolverAdapter;
use crate::constraint::Sense;
use crate::error::{ProblemError, SamplingError};
use crate::problem::{MatrixData, Problem};
use crate::solvers::{ObjectiveDirection, SolutionStatus, Solver, SolverSession};

/// How a random gaussian direction `d` is scaled before it is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionNormalization {
    /// Divide by the norm, `sqrt(d · d)`, giving a unit vector
    #[default]
    UnitNorm,
    /// Divide by the squared norm, `d · d`.
    /// Only useful to reproduce samples drawn with that historical convention.
    SquaredNorm,
}

/// Options of a [PolytopeSampler]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Number of moves of each walk
    pub steps: usize,
    /// Scaling of the directions
    pub normalization: DirectionNormalization,
    /// Seed of the random generator. Walks are reproducible when it is set.
    pub seed: Option<u64>,
    /// Check that the start point is in the polytope before sampling
    pub verify_start: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            steps: 1000,
            normalization: DirectionNormalization::UnitNorm,
            seed: None,
            verify_start: false,
        }
    }
}

/// Draws approximately uniform points from a bounded polytope.
///
/// ```
/// use polylp::{PolytopeSampler, Problem, SamplerConfig};
/// use polylp::solvers::DefaultSolver;
///
/// // the unit square
/// let mut square = Problem::new(0, 2).unwrap();
/// square.set_lower_bounds(vec![0., 0.]);
/// square.set_upper_bounds(vec![1., 1.]);
///
/// let config = SamplerConfig { steps: 20, seed: Some(7), ..SamplerConfig::default() };
/// let mut sampler =
///     PolytopeSampler::new(&DefaultSolver::default(), &square, vec![0.5, 0.5], config).unwrap();
/// for point in sampler.sample(3).unwrap() {
///     assert!(point.iter().all(|&x| (-1e-6..=1. + 1e-6).contains(&x)));
/// }
/// ```
#[derive(Debug)]
pub struct PolytopeSampler<S: SolverSession> {
    adapter: SolverAdapter<S>,
    dimension: usize,
    /// Session rows of the `x - t * d = a` block
    direction_rows: Range<usize>,
    distance_column: usize,
    start: Vec<f64>,
    linked: Vec<Vec<usize>>,
    config: SamplerConfig,
    rng: StdRng,
}

impl<S: SolverSession> PolytopeSampler<S> {
    /// Bind the augmented problem of `polytope` to a new session of `solver`.
    ///
    /// `start` must lie in the polytope. It is only checked when
    /// [SamplerConfig::verify_start] is set.
    pub fn new<B>(
        solver: &B,
        polytope: &Problem,
        start: Vec<f64>,
        config: SamplerConfig,
    ) -> Result<Self, SamplingError>
    where
        B: Solver<Session = S>,
    {
        polytope.validate()?;
        let dimension = polytope.num_cols();
        check_len("start point", dimension, start.len())?;
        if config.verify_start {
            let mut check = SolverAdapter::bind(solver, polytope.clone())?;
            let feasible = check.is_feasible(&start)?;
            check.close();
            if !feasible {
                return Err(SamplingError::InfeasibleStart);
            }
        }
        let base_rows = polytope.num_rows();
        let adapter = SolverAdapter::bind(solver, augment(polytope)?)?.with_name("sampler");
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(PolytopeSampler {
            adapter,
            dimension,
            direction_rows: base_rows..base_rows + dimension,
            distance_column: dimension,
            start,
            linked: vec![],
            config,
            rng,
        })
    }

    /// Give every column of each group the direction component of the first column of the group
    pub fn with_linked_groups(mut self, groups: Vec<Vec<usize>>) -> Result<Self, SamplingError> {
        if let Some(&index) = groups.iter().flatten().find(|&&i| i >= self.dimension) {
            return Err(ProblemError::IndexOutOfRange {
                index,
                num_cols: self.dimension,
            }
            .into());
        }
        self.linked = groups;
        Ok(self)
    }

    /// Number of columns of the polytope
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The point every walk starts from
    pub fn start(&self) -> &[f64] {
        &self.start
    }

    /// Change the point walks start from
    pub fn set_start(&mut self, start: Vec<f64>) -> Result<(), SamplingError> {
        check_len("start point", self.dimension, start.len())?;
        self.start = start;
        Ok(())
    }

    /// The options the sampler was created with
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// The adapter holding the augmented problem
    pub fn adapter(&self) -> &SolverAdapter<S> {
        &self.adapter
    }

    /// The furthest point of the polytope on the ray `a + t * b`, `t` maximal.
    ///
    /// Any status other than optimal is an error: the walk would otherwise
    /// continue from a point that is not known to be in the polytope.
    pub fn line_intersection(&mut self, a: &[f64], b: &[f64]) -> Result<Vec<f64>, SamplingError> {
        check_len("line origin", self.dimension, a.len())?;
        check_len("line direction", self.dimension, b.len())?;
        let t = self.distance_column;
        let coefficients: Vec<(usize, usize, f64)> = self
            .direction_rows
            .clone()
            .zip(b)
            .map(|(row, &bk)| (row, t, -bk))
            .collect();
        let rhs: Vec<(usize, f64)> = self.direction_rows.clone().zip(a.iter().copied()).collect();
        self.adapter.change_coefficients(&coefficients)?;
        self.adapter.change_rhs(&rhs)?;
        let solution = self.adapter.solve()?;
        if solution.status() != SolutionStatus::Optimal {
            log::warn!(
                "line intersection from {:?} along {:?} ended with status {:?}",
                a,
                b,
                solution.status()
            );
            return Err(SamplingError::Status(solution.status()));
        }
        let mut point = solution.into_values();
        point.truncate(self.dimension);
        Ok(point)
    }

    /// A random direction drawn from the standard normal distribution, scaled according to
    /// [SamplerConfig::normalization], with linked groups applied afterwards
    pub fn sample_direction(&mut self) -> Vec<f64> {
        let mut direction: Vec<f64> = loop {
            let d: Vec<f64> = (0..self.dimension)
                .map(|_| -> f64 { StandardNormal.sample(&mut self.rng) })
                .collect();
            if d.iter().any(|&x| x != 0.) {
                break d;
            }
        };
        let squared_norm: f64 = direction.iter().map(|x| x * x).sum();
        let scale = match self.config.normalization {
            DirectionNormalization::UnitNorm => squared_norm.sqrt(),
            DirectionNormalization::SquaredNorm => squared_norm,
        };
        for x in &mut direction {
            *x /= scale;
        }
        for group in &self.linked {
            if let Some((&first, rest)) = group.split_first() {
                let value = direction[first];
                for &i in rest {
                    direction[i] = value;
                }
            }
        }
        direction
    }

    /// One walk of [SamplerConfig::steps] moves from the start point. Returns the last point.
    pub fn walk(&mut self) -> Result<Vec<f64>, SamplingError> {
        let start = self.start.clone();
        self.walk_from(&start, self.config.steps)
    }

    /// A walk of `steps` moves from `start`. Each move goes to a uniformly drawn point between
    /// the current point and the boundary of the polytope in a random direction.
    pub fn walk_from(&mut self, start: &[f64], steps: usize) -> Result<Vec<f64>, SamplingError> {
        check_len("start point", self.dimension, start.len())?;
        let mut current = start.to_vec();
        for step in 0..steps {
            let direction = self.sample_direction();
            let boundary = self.line_intersection(&current, &direction)?;
            let u: f64 = self.rng.gen();
            for (x, c) in current.iter_mut().zip(&boundary) {
                *x += u * (c - *x);
            }
            log::trace!("step {}: {:?}", step, current);
        }
        Ok(current)
    }

    /// `n` independent walks, all from the start point
    pub fn sample(&mut self, n: usize) -> Result<Vec<Vec<f64>>, SamplingError> {
        let samples = (0..n).map(|_| self.walk()).collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "drew {} samples of dimension {} with {} steps each",
            n,
            self.dimension,
            self.config.steps
        );
        Ok(samples)
    }

    /// Release the session of the augmented problem
    pub fn close(&mut self) {
        self.adapter.close()
    }
}

/// The problem maximising the distance column `t`, with the rows of `polytope` followed by
/// an identity block on the original columns. The `t` entries of that block start at zero.
fn augment(polytope: &Problem) -> Result<Problem, ProblemError> {
    let m = polytope.num_cols();
    let n = polytope.num_rows();
    let mut augmented = Problem::new(0, m + 1)?;
    augmented.set_direction(ObjectiveDirection::Maximisation);
    let mut objective = vec![0.; m + 1];
    objective[m] = 1.;
    augmented.set_objective(objective);

    let mut lower = polytope.lower_bounds().to_vec();
    lower.push(f64::NEG_INFINITY);
    augmented.set_lower_bounds(lower);
    let mut upper = polytope.upper_bounds().to_vec();
    upper.push(f64::INFINITY);
    augmented.set_upper_bounds(upper);

    let entries = polytope
        .matrix()
        .iter_coordinates()
        .chain((0..m).map(|k| (n + k, k, 1.)))
        .collect();
    augmented.set_matrix(MatrixData::Coordinate {
        num_rows: n + m,
        num_cols: m + 1,
        entries,
    })?;

    let mut rhs = polytope.rhs().to_vec();
    rhs.resize(n + m, 0.);
    augmented.set_rhs(rhs);
    let mut senses = polytope.senses().to_vec();
    senses.resize(n + m, Sense::Equal);
    augmented.set_senses(senses);
    augmented.set_range_values(polytope.range_values().map(|values| {
        let mut values = values.to_vec();
        values.resize(n + m, 0.);
        values
    }));
    augmented.validate()?;
    Ok(augmented)
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), ProblemError> {
    if expected != found {
        return Err(ProblemError::ShapeMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
#[cfg(feature = "microlp")]
mod tests {
    use float_eq::assert_float_eq;

    use super::{augment, DirectionNormalization, PolytopeSampler, SamplerConfig};
    use crate::constraint::Sense;
    use crate::error::{ProblemError, SamplingError};
    use crate::problem::{MatrixData, Problem};
    use crate::solvers::microlp::{MicroLp, MicroLpSession};
    use crate::solvers::SolutionStatus;

    /// The triangle x >= 0, y >= 0, x + y <= 1
    fn triangle() -> Problem {
        let mut p = Problem::new(0, 2).unwrap();
        p.set_lower_bounds(vec![0., 0.]);
        p.set_matrix(MatrixData::Dense(vec![vec![1., 1.]])).unwrap();
        p.set_rhs(vec![1.]);
        p.set_senses(vec![Sense::LessEq]);
        p
    }

    fn sampler(config: SamplerConfig) -> PolytopeSampler<MicroLpSession> {
        PolytopeSampler::new(&MicroLp, &triangle(), vec![0.2, 0.2], config).unwrap()
    }

    fn seeded(steps: usize) -> SamplerConfig {
        SamplerConfig {
            steps,
            seed: Some(42),
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn augmented_problem_layout() {
        let p = augment(&triangle()).unwrap();
        assert_eq!(p.num_cols(), 3);
        assert_eq!(p.num_rows(), 3);
        assert_eq!(p.objective(), &[0., 0., 1.]);
        assert_eq!(p.lower_bounds(), &[0., 0., f64::NEG_INFINITY]);
        assert_eq!(
            p.matrix().to_dense(),
            vec![vec![1., 1., 0.], vec![1., 0., 0.], vec![0., 1., 0.]]
        );
        assert_eq!(p.senses(), &[Sense::LessEq, Sense::Equal, Sense::Equal]);
        assert_eq!(p.rhs(), &[1., 0., 0.]);
    }

    #[test]
    fn line_intersection_reaches_the_boundary() {
        let mut s = sampler(seeded(1));
        let c = s.line_intersection(&[0.2, 0.2], &[1., 0.]).unwrap();
        assert_float_eq!(c[0], 0.8, abs <= 1e-9);
        assert_float_eq!(c[1], 0.2, abs <= 1e-9);
        let c = s.line_intersection(&[0.2, 0.2], &[0., -1.]).unwrap();
        assert_float_eq!(c[0], 0.2, abs <= 1e-9);
        assert_float_eq!(c[1], 0., abs <= 1e-9);
        // the rewritten rows are visible in the bound problem
        assert_eq!(s.adapter().problem().matrix().get(2, 2), 1.);
        assert_eq!(s.adapter().problem().rhs(), &[1., 0.2, 0.2]);
    }

    #[test]
    fn unbounded_lines_are_errors() {
        let mut p = Problem::new(0, 1).unwrap();
        p.set_lower_bounds(vec![0.]);
        let mut s = PolytopeSampler::new(&MicroLp, &p, vec![1.], seeded(1)).unwrap();
        assert_eq!(
            s.line_intersection(&[1.], &[1.]),
            Err(SamplingError::Status(SolutionStatus::Unbounded))
        );
    }

    #[test]
    fn empty_polytopes_are_errors() {
        // x >= 1 and x <= 0
        let mut p = Problem::new(0, 1).unwrap();
        p.add_bound_constraint(0, Sense::GreaterEq, 1.).unwrap();
        p.add_bound_constraint(0, Sense::LessEq, 0.).unwrap();
        let mut s = PolytopeSampler::new(&MicroLp, &p, vec![0.5], seeded(5)).unwrap();
        let infeasible = Err(SamplingError::Status(SolutionStatus::Infeasible));
        assert_eq!(s.line_intersection(&[0.5], &[1.]), infeasible);
        assert_eq!(s.walk(), infeasible);
    }

    #[test]
    fn directions_are_normalized() {
        let mut s = sampler(seeded(1));
        for _ in 0..10 {
            let d = s.sample_direction();
            let norm: f64 = d.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_float_eq!(norm, 1., abs <= 1e-12);
        }
        let mut unit = sampler(seeded(3));
        let mut squared = sampler(SamplerConfig {
            normalization: DirectionNormalization::SquaredNorm,
            ..seeded(3)
        });
        for _ in 0..10 {
            // same draws: the squared-norm direction is the unit direction divided by |g|
            let u = unit.sample_direction();
            let d = squared.sample_direction();
            let norm: f64 = d.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_float_eq!(d[0] / norm, u[0], abs <= 1e-9);
            assert_float_eq!(d[1] / norm, u[1], abs <= 1e-9);
        }
    }

    #[test]
    fn linked_groups_share_a_component() {
        let mut p = Problem::new(0, 4).unwrap();
        p.set_lower_bounds(vec![0.; 4]);
        p.set_upper_bounds(vec![1.; 4]);
        let mut s = PolytopeSampler::new(&MicroLp, &p, vec![0.5; 4], seeded(5))
            .unwrap()
            .with_linked_groups(vec![vec![0, 2, 3]])
            .unwrap();
        let d = s.sample_direction();
        assert_eq!(d[0], d[2]);
        assert_eq!(d[0], d[3]);
        let x = s.walk().unwrap();
        assert_float_eq!(x[0], x[2], abs <= 1e-9);
        assert_float_eq!(x[0], x[3], abs <= 1e-9);
    }

    #[test]
    fn linked_groups_are_checked() {
        let s = sampler(seeded(1)).with_linked_groups(vec![vec![0, 2]]);
        assert!(matches!(
            s,
            Err(SamplingError::Problem(ProblemError::IndexOutOfRange {
                index: 2,
                num_cols: 2
            }))
        ));
    }

    #[test]
    fn samples_stay_in_the_triangle() {
        let mut s = sampler(seeded(30));
        let triangle = triangle();
        for x in s.sample(5).unwrap() {
            assert!(triangle.is_satisfied_by(&x, 1e-6), "{:?}", x);
        }
    }

    #[test]
    fn zero_steps_returns_the_start() {
        let mut s = sampler(seeded(0));
        assert_eq!(s.walk().unwrap(), vec![0.2, 0.2]);
    }

    #[test]
    fn seeded_walks_are_reproducible() {
        let a = sampler(seeded(10)).sample(2).unwrap();
        let b = sampler(seeded(10)).sample(2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn start_points_can_be_verified() {
        let config = SamplerConfig {
            verify_start: true,
            ..seeded(1)
        };
        let outside = PolytopeSampler::new(&MicroLp, &triangle(), vec![0.8, 0.8], config);
        assert!(matches!(outside, Err(SamplingError::InfeasibleStart)));
        let inside = PolytopeSampler::new(&MicroLp, &triangle(), vec![0.1, 0.1], config);
        assert!(inside.is_ok());
        let wrong_len = PolytopeSampler::new(&MicroLp, &triangle(), vec![0.1], config);
        assert!(wrong_len.is_err());
    }
}
