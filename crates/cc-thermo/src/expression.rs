//! Temperature polynomial used by analytic database expressions.
//!
//! PHREEQC stores temperature dependence as up to six coefficients
//! `A1..A6` applied to `1, T, 1/T, log10(T), 1/T², T²`.

/// The six basis terms at temperature `t_k` (Kelvin).
pub fn analytic_terms(t_k: f64) -> [f64; 6] {
    [1.0, t_k, 1.0 / t_k, t_k.log10(), 1.0 / (t_k * t_k), t_k * t_k]
}

/// Evaluate coefficients against the basis terms. Extra coefficients beyond
/// six are ignored; missing ones count as zero.
pub fn evaluate_analytic(coefficients: &[f64], t_k: f64) -> f64 {
    analytic_terms(t_k)
        .iter()
        .zip(coefficients)
        .map(|(term, c)| term * c)
        .sum()
}
