use super::parser::{Comparator, Expr};

/// Direction a numeric limit constrains its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// `var < limit` or `var <= limit`
    Upper,
    /// `var > limit` or `var >= limit`
    Lower,
}

/// A `variable <cmp> numeric literal` comparison found in a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericBound {
    pub variable: String,
    pub comparator: Comparator,
    pub limit: f64,
}

impl NumericBound {
    pub fn kind(&self) -> Option<BoundKind> {
        match self.comparator {
            Comparator::Lt | Comparator::Le => Some(BoundKind::Upper),
            Comparator::Gt | Comparator::Ge => Some(BoundKind::Lower),
            Comparator::Eq | Comparator::Ne => None,
        }
    }

    /// Signed distance `observed` must move to reach the limit, when it sits
    /// on the wrong side of it. Positive means increase.
    pub fn shortfall(&self, observed: f64) -> Option<f64> {
        match self.kind()? {
            BoundKind::Upper if observed > self.limit => Some(self.limit - observed),
            BoundKind::Lower if observed < self.limit => Some(self.limit - observed),
            _ => None,
        }
    }
}

/// Collects ordering bounds in source order, normalising `literal <cmp> var`
/// so the variable is always on the left.
pub fn numeric_bounds(expr: &Expr) -> Vec<NumericBound> {
    let mut bounds = Vec::new();
    collect(expr, &mut bounds);
    bounds
}

fn collect(expr: &Expr, bounds: &mut Vec<NumericBound>) {
    match expr {
        Expr::Compare { op, lhs, rhs } => {
            match (lhs.as_ref(), rhs.as_ref()) {
                (Expr::Variable(name), other) => {
                    if let Some(limit) = numeric_literal(other) {
                        push_ordering(bounds, name, *op, limit);
                    }
                }
                (other, Expr::Variable(name)) => {
                    if let Some(limit) = numeric_literal(other) {
                        push_ordering(bounds, name, op.flipped(), limit);
                    }
                }
                _ => {}
            }
            collect(lhs, bounds);
            collect(rhs, bounds);
        }
        Expr::Logical { lhs, rhs, .. } | Expr::Arithmetic { lhs, rhs, .. } => {
            collect(lhs, bounds);
            collect(rhs, bounds);
        }
        Expr::Not(inner) | Expr::Negate(inner) => collect(inner, bounds),
        Expr::Literal(_) | Expr::Variable(_) => {}
    }
}

fn push_ordering(bounds: &mut Vec<NumericBound>, variable: &str, comparator: Comparator, limit: f64) {
    if matches!(comparator, Comparator::Eq | Comparator::Ne) {
        return;
    }
    bounds.push(NumericBound {
        variable: variable.to_string(),
        comparator,
        limit,
    });
}

fn numeric_literal(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Literal(value) => value.as_f64(),
        Expr::Negate(inner) => numeric_literal(inner).map(|value| -value),
        _ => None,
    }
}
