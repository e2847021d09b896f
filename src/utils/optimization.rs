//! Derivative-free minimization used for model parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size (relative for non-zero coordinates).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// A simplex vertex with its cached objective value.
#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Objective wrapper that clamps points into bounds and maps NaN to +inf so
/// that ordering stays total.
struct Bounded<'a, F> {
    objective: F,
    bounds: Option<&'a [(f64, f64)]>,
}

impl<F> Bounded<'_, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn clamp(&self, point: Vec<f64>) -> Vec<f64> {
        match self.bounds {
            None => point,
            Some(b) => point
                .into_iter()
                .enumerate()
                .map(|(i, x)| match b.get(i) {
                    Some(&(lo, hi)) => x.clamp(lo, hi),
                    None => x,
                })
                .collect(),
        }
    }

    fn vertex(&self, point: Vec<f64>) -> Vertex {
        let point = self.clamp(point);
        let value = (self.objective)(&point);
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex { point, value }
    }
}

/// Minimize `objective` starting from `initial` with the Nelder-Mead simplex
/// method.
///
/// # Arguments
/// * `objective` - Function to minimize
/// * `initial` - Starting point
/// * `bounds` - Optional `(min, max)` box per coordinate
/// * `config` - Algorithm coefficients and stopping rules
///
/// # Example
/// ```
/// use country_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let problem = Bounded { objective, bounds };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(problem.vertex(initial.to_vec()));
    for i in 0..n {
        let mut point = initial.to_vec();
        point[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(problem.vertex(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let worst = simplex[n].value;
        let second_worst = simplex[n - 1].value;

        if (worst - best).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without_last(&simplex);
        let diameter = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let reflected = problem.vertex(along(&centroid, &simplex[n].point, -config.alpha));

        if reflected.value < best {
            let expanded = problem.vertex(along(&centroid, &reflected.point, config.gamma));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            let outside = problem.vertex(along(&centroid, &reflected.point, config.rho));
            (outside.value <= reflected.value).then_some(outside)
        } else {
            let inside = problem.vertex(along(&centroid, &simplex[n].point, config.rho));
            (inside.value < worst).then_some(inside)
        };

        if let Some(vertex) = contracted {
            simplex[n] = vertex;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&vertex.point)
                .map(|(a, p)| a + config.sigma * (p - a))
                .collect();
            *vertex = problem.vertex(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
        .unwrap_or(Vertex {
            point: initial.to_vec(),
            value: f64::NAN,
        });

    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}

/// Centroid of all vertices but the last (worst after sorting).
fn centroid_without_last(simplex: &[Vertex]) -> Vec<f64> {
    let count = (simplex.len() - 1) as f64;
    let dims = simplex[0].point.len();
    let mut centroid = vec![0.0; dims];
    for vertex in &simplex[..simplex.len() - 1] {
        for (c, x) in centroid.iter_mut().zip(&vertex.point) {
            *c += x;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `centroid + t * (point - centroid)`.
///
/// Reflection uses a negative `t`, expansion and contraction positive ones.
fn along(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + t * (p - c))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
