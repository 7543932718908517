//! Arithmetic on natural-log probabilities.
//! `f64::NEG_INFINITY` is an exact zero probability and the identity of [`log_add`].

/// Beyond this gap the smaller operand of [`log_add`] is dropped.
/// ln(1+exp(-37)) is already below the resolution of an f64 around zero.
pub const LOG_RANGE: f64 = 37f64;

/// Number of table entries per unit of `x` in the ln(1+exp(-x)) table.
pub const LOG_ACCURACY: usize = 10_000;

/// Stand-in for -inf in text outputs, so that downstream tools can parse them.
pub const ALMOST_NEG_INFTY: f64 = -1000f64;

/// Log of a probability. Zero becomes -inf.
pub fn log(x: f64) -> f64 {
    debug_assert!(!x.is_sign_negative() || x == 0f64, "{}", x);
    if x > 0f64 {
        x.ln()
    } else {
        f64::NEG_INFINITY
    }
}

/// ln(exp(p) + exp(q)).
#[inline]
pub fn log_add(p: f64, q: f64) -> f64 {
    if p == f64::NEG_INFINITY {
        return q;
    }
    if q == f64::NEG_INFINITY {
        return p;
    }
    let (max, diff) = if p > q { (p, p - q) } else { (q, q - p) };
    if diff > LOG_RANGE {
        max
    } else {
        max + log_one_plus_exp_neg(diff)
    }
}

#[cfg(not(feature = "log-table"))]
#[inline]
fn log_one_plus_exp_neg(x: f64) -> f64 {
    (-x).exp().ln_1p()
}

#[cfg(feature = "log-table")]
#[inline]
fn log_one_plus_exp_neg(x: f64) -> f64 {
    static TABLE: std::sync::OnceLock<LogTable> = std::sync::OnceLock::new();
    TABLE.get_or_init(LogTable::new).lookup(x)
}

/// Precomputed ln(1+exp(-x)) over [0, LOG_RANGE].
#[derive(Debug, Clone)]
pub struct LogTable {
    values: Vec<f64>,
}

impl LogTable {
    pub fn new() -> Self {
        let len = LOG_RANGE as usize * LOG_ACCURACY + 1;
        let values = (0..len)
            .map(|i| (-(i as f64) / LOG_ACCURACY as f64).exp().ln_1p())
            .collect();
        Self { values }
    }
    /// `x` should be in [0, LOG_RANGE]. Values outside are clamped.
    pub fn lookup(&self, x: f64) -> f64 {
        let idx = (x * LOG_ACCURACY as f64) as usize;
        self.values[idx.min(self.values.len() - 1)]
    }
}

impl std::default::Default for LogTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum of `xs` in log space. Empty input gives -inf.
pub fn logsumexp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln() + max
}

/// Replace non-finite values by [`ALMOST_NEG_INFTY`].
pub fn finite_or_sentinel(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        ALMOST_NEG_INFTY
    }
}
