//! Direct linear solver for the rate equations.
//!
//! Uses LU decomposition with partial pivoting via `faer` to solve the
//! $N \times N$ system $\mathbf{M}\mathbf{b} = \mathbf{e}_N$ exactly. Level
//! counts per species are small (tens to a few thousand), so a dense
//! factorisation is always affordable.
//!
//! `faer` does not report singular pivots, so singularity is detected around
//! the factorisation: structurally empty rows or columns before it, and a
//! non-finite or inconsistent solution after it.

use faer::linalg::solvers::SpSolver;
use ndarray::{Array1, Array2};

use super::NlteError;

/// Largest accepted residual relative to $\|M\|_\infty \|x\|_\infty + \|b\|_\infty$.
pub const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Solve the rate system using direct LU decomposition.
///
/// # Arguments
/// * `matrix` - The $N \times N$ rate matrix with the conservation row.
/// * `rhs` - The right-hand side (length $N$).
///
/// # Returns
/// The solution vector (departure coefficients, length $N$).
pub fn solve_direct(matrix: &Array2<f64>, rhs: &Array1<f64>) -> Result<Array1<f64>, NlteError> {
    let dim = matrix.nrows();
    if dim != matrix.ncols() || dim != rhs.len() {
        return Err(NlteError::LinAlgError(format!(
            "cannot solve a {}x{} system with a right-hand side of length {}",
            matrix.nrows(),
            matrix.ncols(),
            rhs.len()
        )));
    }
    if dim == 0 {
        return Ok(Array1::zeros(0));
    }

    if let Some(i) = (0..dim).find(|&i| matrix.row(i).iter().all(|&v| v == 0.0)) {
        return Err(NlteError::SingularMatrix(format!("row {} is zero", i)));
    }
    if let Some(j) = (0..dim).find(|&j| matrix.column(j).iter().all(|&v| v == 0.0)) {
        return Err(NlteError::SingularMatrix(format!("column {} is zero", j)));
    }

    let faer_mat = faer::Mat::<f64>::from_fn(dim, dim, |i, j| matrix[[i, j]]);
    let faer_rhs = faer::Col::<f64>::from_fn(dim, |i| rhs[i]);

    let lu = faer_mat.partial_piv_lu();
    let faer_sol = lu.solve(&faer_rhs);

    let solution = Array1::from_shape_fn(dim, |i| faer_sol[i]);

    if let Some(i) = solution.iter().position(|x| !x.is_finite()) {
        return Err(NlteError::SingularMatrix(format!(
            "solution component {} is not finite",
            i
        )));
    }

    let residual = matrix.dot(&solution) - rhs;
    let scale = norm_inf_matrix(matrix) * norm_inf(&solution) + norm_inf(rhs);
    let error = norm_inf(&residual);
    if !(error <= RESIDUAL_TOLERANCE * scale) {
        return Err(NlteError::SingularMatrix(format!(
            "residual {:.3e} exceeds {:.1e} of scale {:.3e}",
            error, RESIDUAL_TOLERANCE, scale
        )));
    }

    Ok(solution)
}

fn norm_inf(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

fn norm_inf_matrix(m: &Array2<f64>) -> f64 {
    m.rows()
        .into_iter()
        .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
