//! Samples `y = f(x)` over a domain for plot previews.
//!
//! Markup never runs this: generated `\addplot` statements only carry the sampling
//! parameters and the target renderer evaluates the function itself.

use crate::model::{PlotParams, Point};

pub mod expr;

pub use expr::{Expr, ExprError};

/// Preview-only display bound; samples with `|y|` at or above it are not drawn.
pub const PREVIEW_Y_LIMIT: f64 = 20.0;

/// Most intervals a preview evaluates, whatever the plot asks for.
pub const MAX_PREVIEW_SAMPLES: u32 = 2000;

const MACROS: &[(&str, &str)] = &[
    ("\\sin", "sin"),
    ("\\cos", "cos"),
    ("\\tan", "tan"),
    ("\\exp", "exp"),
    ("\\ln", "log"),
    ("\\sqrt", "sqrt"),
    ("\\pi", "pi"),
    ("e^", "exp"),
];

/// Rewrites the markup macros above into plain function names in one left-to-right
/// pass. No key is a prefix of another, so table order does not matter.
pub fn normalize_expression(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    'scan: while let Some(ch) = rest.chars().next() {
        for (from, to) in MACROS {
            if let Some(tail) = rest.strip_prefix(from) {
                out.push_str(to);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Normalizes and parses an expression as the sampler would.
pub fn compile(expression: &str) -> Result<Expr, ExprError> {
    Expr::parse(&normalize_expression(expression))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleDomain {
    pub start: f64,
    pub end: f64,
    pub samples: u32,
}

impl SampleDomain {
    pub fn new(start: f64, end: f64, samples: u32) -> Self {
        Self {
            start,
            end,
            samples,
        }
    }

    pub fn of_plot(plot: &PlotParams) -> Self {
        Self::new(plot.domain_start, plot.domain_end, plot.samples)
    }

    /// The same domain with its sample count capped for previews.
    pub fn for_preview(self) -> Self {
        Self {
            samples: self.samples.min(MAX_PREVIEW_SAMPLES),
            ..self
        }
    }

    fn intervals(&self) -> u32 {
        self.samples.max(2)
    }

    pub fn step(&self) -> f64 {
        (self.end - self.start) / f64::from(self.intervals())
    }

    /// `start`, `start + step`, ... up to and including `end`. Positions are computed
    /// from the index so the last one lands exactly on `end`.
    pub fn xs(self) -> impl Iterator<Item = f64> {
        let n = self.intervals();
        let (start, end, step) = (self.start, self.end, self.step());
        (0..=n).map(move |i| {
            if i == n {
                end
            } else {
                start + f64::from(i) * step
            }
        })
    }
}

fn raw_samples(expr: &Expr, domain: SampleDomain) -> impl Iterator<Item = Option<Point>> + '_ {
    domain
        .xs()
        .map(move |x| expr.eval(x).ok().map(|y| Point::new(x, y)))
}

fn compile_logged(expression: &str) -> Option<Expr> {
    match compile(expression) {
        Ok(expr) => Some(expr),
        Err(err) => {
            tracing::debug!(expression, %err, "expression does not parse, no samples");
            None
        }
    }
}

/// Every sample that evaluates to a finite number. Failing samples are skipped.
pub fn sample_expression(expression: &str, domain: SampleDomain) -> Vec<Point> {
    let Some(expr) = compile_logged(expression) else {
        return Vec::new();
    };
    raw_samples(&expr, domain).flatten().collect()
}

fn in_preview(p: &Point) -> bool {
    p.y.abs() < PREVIEW_Y_LIMIT
}

/// Like [`sample_expression`], also dropping samples outside the preview bound.
pub fn sample_preview(expression: &str, domain: SampleDomain) -> Vec<Point> {
    sample_expression(expression, domain.for_preview())
        .into_iter()
        .filter(in_preview)
        .collect()
}

/// Preview samples split into polylines wherever a sample was dropped, so poles and
/// gaps are not bridged.
pub fn sample_preview_runs(expression: &str, domain: SampleDomain) -> Vec<Vec<Point>> {
    let Some(expr) = compile_logged(expression) else {
        return Vec::new();
    };
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for sample in raw_samples(&expr, domain.for_preview()) {
        match sample.filter(in_preview) {
            Some(p) => current.push(p),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_the_macro_table() {
        assert_eq!(normalize_expression("\\sin(x)+\\cos(x)"), "sin(x)+cos(x)");
        assert_eq!(normalize_expression("\\ln(x)*\\pi"), "log(x)*pi");
        assert_eq!(normalize_expression("e^{x}"), "exp{x}");
        assert_eq!(normalize_expression("\\sqrt{x} + \\tan(x)"), "sqrt{x} + tan(x)");
        assert_eq!(normalize_expression("\\exp(1)"), "exp(1)");
        // Replacements are not re-scanned.
        assert_eq!(normalize_expression("\\exe^"), "\\exexp");
    }

    #[test]
    fn inclusive_domain_with_at_least_two_intervals() {
        let xs: Vec<f64> = SampleDomain::new(-1.0, 1.0, 4).xs().collect();
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        let xs: Vec<f64> = SampleDomain::new(0.0, 1.0, 0).xs().collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0]);
        let xs: Vec<f64> = SampleDomain::new(0.0, 0.3, 3).xs().collect();
        assert_eq!(xs.len(), 4);
        assert_eq!(*xs.last().unwrap(), 0.3);
    }

    #[test]
    fn failing_samples_are_dropped_not_fatal() {
        let points = sample_expression("sqrt(x)", SampleDomain::new(-2.0, 2.0, 4));
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn unparsable_expression_yields_nothing() {
        assert!(sample_expression("sin(", SampleDomain::new(0.0, 1.0, 10)).is_empty());
        assert!(sample_preview_runs("sin(", SampleDomain::new(0.0, 1.0, 10)).is_empty());
    }

    #[test]
    fn latex_macros_evaluate() {
        let points = sample_expression("\\sin(x) + e^{0}", SampleDomain::new(0.0, 0.0, 2));
        assert_eq!(points.len(), 3);
        assert!((points[0].y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn preview_bound_applies_only_to_preview() {
        let domain = SampleDomain::new(-10.0, 10.0, 20);
        let all = sample_expression("x^2", domain);
        let preview = sample_preview("x^2", domain);
        assert_eq!(all.len(), 21);
        assert!(preview.iter().all(|p| p.y.abs() < PREVIEW_Y_LIMIT));
        // x in -4..=4 keeps x^2 below 20.
        assert_eq!(preview.len(), 9);
    }

    #[test]
    fn preview_sample_count_is_capped() {
        let domain = SampleDomain::new(-1.0, 1.0, u32::MAX);
        let runs = sample_preview_runs("x", domain);
        let total: usize = runs.iter().map(Vec::len).sum();
        assert_eq!(total, MAX_PREVIEW_SAMPLES as usize + 1);
        assert_eq!(sample_preview("x", domain).len(), total);
        assert_eq!(SampleDomain::new(0.0, 1.0, 50).for_preview().samples, 50);
    }

    #[test]
    fn pathological_nesting_yields_nothing() {
        let deep = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        let domain = SampleDomain::new(0.0, 1.0, 2);
        assert!(sample_expression(&deep, domain).is_empty());
        assert!(sample_preview_runs(&format!("{}x", "-".repeat(100_000)), domain).is_empty());
    }

    #[test]
    fn preview_runs_break_at_dropped_samples() {
        let runs = sample_preview_runs("1/x", SampleDomain::new(-2.0, 2.0, 4));
        // x = 0 fails, splitting the curve in two.
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 2);
    }
}
