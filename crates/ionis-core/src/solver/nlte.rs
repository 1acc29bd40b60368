//! Statistical-equilibrium linear system.
//!
//! With $R_{ij}$ the LTE-weighted rates, the steady state of level $i$ reads
//!
//! $$-\Big(\sum_j R_{ij}\Big) b_i + \sum_{j \ne i} R_{ji} b_j = 0 .$$
//!
//! These equations are linearly dependent, so the last one is replaced by
//! particle conservation $\sum_i n_i^{LTE} b_i = 1$.

use ionis_atomic::AtomicStructure;
use log::debug;

use super::direct::solve_direct;
use super::NlteError;
use crate::workspace::NlteWorkspace;

/// Assemble the constrained system from `ws.rates` into `ws.matrix` / `ws.rhs`.
pub fn assemble_system(ws: &mut NlteWorkspace) {
    let n = ws.n_levels();
    ws.matrix.fill(0.0);
    ws.rhs.fill(0.0);
    if n == 0 {
        return;
    }

    for i in 0..n {
        let mut out = 0.0;
        for j in 0..n {
            if i != j {
                out += ws.rates[[i, j]];
                ws.matrix[[i, j]] = ws.rates[[j, i]];
            }
        }
        ws.matrix[[i, i]] = -out;
    }

    let last = n - 1;
    for j in 0..n {
        ws.matrix[[last, j]] = ws.lte_population[j];
    }
    ws.rhs[last] = 1.0;
}

/// One rate-equation solve: departure coefficients, populations and ion
/// fractions from the current rate matrix.
pub fn equilibrium_step(atom: &AtomicStructure, ws: &mut NlteWorkspace) -> Result<(), NlteError> {
    assemble_system(ws);
    let solution = solve_direct(&ws.matrix, &ws.rhs)?;
    debug!("solved {0}x{0} rate system", solution.len());

    for (i, &b) in solution.iter().enumerate() {
        let b = if b < 0.0 {
            ws.diagnostics.clamped_levels += 1;
            0.0
        } else {
            b
        };
        ws.departure[i] = b;
        ws.population[i] = b * ws.lte_population[i];
    }
    ws.sum_ion_fractions(atom);
    Ok(())
}
