use std::cmp::Ordering;

use super::parser::{ArithmeticOp, Comparator, Expr, LogicalOp};
use super::ExpressionError;
use crate::evaluation::InputValue;

/// Read-only variable lookup used while walking an expression tree.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<&InputValue>;
}

/// Evaluates a parsed condition and requires it to produce a boolean.
pub fn evaluate_condition(expr: &Expr, bindings: &impl Bindings) -> Result<bool, ExpressionError> {
    match evaluate(expr, bindings)? {
        InputValue::Boolean(value) => Ok(value),
        other => Err(ExpressionError::Evaluation(format!(
            "condition produced {} instead of a boolean",
            other.type_name()
        ))),
    }
}

/// Walks the tree over typed values; `and`/`or` short-circuit.
pub fn evaluate(expr: &Expr, bindings: &impl Bindings) -> Result<InputValue, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => bindings.lookup(name).cloned().ok_or_else(|| {
            ExpressionError::Evaluation(format!("name '{name}' is not defined"))
        }),
        Expr::Negate(operand) => match evaluate(operand, bindings)? {
            InputValue::Integer(value) => value
                .checked_neg()
                .map(InputValue::Integer)
                .ok_or_else(|| ExpressionError::Evaluation("integer overflow".to_string())),
            InputValue::Float(value) => Ok(InputValue::Float(-value)),
            other => Err(ExpressionError::Evaluation(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },
        Expr::Not(operand) => {
            let value = expect_boolean(evaluate(operand, bindings)?, "not")?;
            Ok(InputValue::Boolean(!value))
        }
        Expr::Arithmetic { op, lhs, rhs } => {
            let lhs = evaluate(lhs, bindings)?;
            let rhs = evaluate(rhs, bindings)?;
            arithmetic(*op, &lhs, &rhs)
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = evaluate(lhs, bindings)?;
            let rhs = evaluate(rhs, bindings)?;
            compare(*op, &lhs, &rhs).map(InputValue::Boolean)
        }
        Expr::Logical { op, lhs, rhs } => {
            let keyword = match op {
                LogicalOp::And => "and",
                LogicalOp::Or => "or",
            };
            let lhs = expect_boolean(evaluate(lhs, bindings)?, keyword)?;
            match (op, lhs) {
                (LogicalOp::And, false) => Ok(InputValue::Boolean(false)),
                (LogicalOp::Or, true) => Ok(InputValue::Boolean(true)),
                _ => {
                    let rhs = expect_boolean(evaluate(rhs, bindings)?, keyword)?;
                    Ok(InputValue::Boolean(rhs))
                }
            }
        }
    }
}

fn expect_boolean(value: InputValue, keyword: &str) -> Result<bool, ExpressionError> {
    match value {
        InputValue::Boolean(value) => Ok(value),
        other => Err(ExpressionError::Evaluation(format!(
            "'{keyword}' expects boolean operands, found {}",
            other.type_name()
        ))),
    }
}

fn arithmetic(
    op: ArithmeticOp,
    lhs: &InputValue,
    rhs: &InputValue,
) -> Result<InputValue, ExpressionError> {
    let mismatch = || {
        ExpressionError::Evaluation(format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))
    };
    let overflow = || ExpressionError::Evaluation("integer overflow".to_string());

    if let (InputValue::Integer(a), InputValue::Integer(b)) = (lhs, rhs) {
        return match op {
            ArithmeticOp::Add => a.checked_add(*b).map(InputValue::Integer).ok_or_else(overflow),
            ArithmeticOp::Subtract => a.checked_sub(*b).map(InputValue::Integer).ok_or_else(overflow),
            ArithmeticOp::Multiply => a.checked_mul(*b).map(InputValue::Integer).ok_or_else(overflow),
            ArithmeticOp::Divide => {
                if *b == 0 {
                    Err(ExpressionError::Evaluation("division by zero".to_string()))
                } else {
                    Ok(InputValue::Float(*a as f64 / *b as f64))
                }
            }
        };
    }

    let a = lhs.as_f64().ok_or_else(mismatch)?;
    let b = rhs.as_f64().ok_or_else(mismatch)?;
    let result = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => {
            if b == 0.0 {
                return Err(ExpressionError::Evaluation("division by zero".to_string()));
            }
            a / b
        }
    };

    if result.is_finite() {
        Ok(InputValue::Float(result))
    } else {
        Err(ExpressionError::Evaluation(
            "arithmetic produced a non-finite number".to_string(),
        ))
    }
}

fn compare(op: Comparator, lhs: &InputValue, rhs: &InputValue) -> Result<bool, ExpressionError> {
    let mismatch = || {
        ExpressionError::Evaluation(format!(
            "'{}' not supported between {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))
    };

    let ordering = match (lhs, rhs) {
        (InputValue::Integer(a), InputValue::Integer(b)) => a.cmp(b),
        (InputValue::Text(a), InputValue::Text(b)) => {
            return equality_only(op, a == b).ok_or_else(mismatch);
        }
        (InputValue::Boolean(a), InputValue::Boolean(b)) => {
            return equality_only(op, a == b).ok_or_else(mismatch);
        }
        _ => {
            let a = lhs.as_f64().ok_or_else(mismatch)?;
            let b = rhs.as_f64().ok_or_else(mismatch)?;
            a.partial_cmp(&b).ok_or_else(mismatch)?
        }
    };

    Ok(match op {
        Comparator::Lt => ordering == Ordering::Less,
        Comparator::Le => ordering != Ordering::Greater,
        Comparator::Gt => ordering == Ordering::Greater,
        Comparator::Ge => ordering != Ordering::Less,
        Comparator::Eq => ordering == Ordering::Equal,
        Comparator::Ne => ordering != Ordering::Equal,
    })
}

/// Strings and booleans only support equality tests.
fn equality_only(op: Comparator, equal: bool) -> Option<bool> {
    match op {
        Comparator::Eq => Some(equal),
        Comparator::Ne => Some(!equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse;
    use std::collections::BTreeMap;

    struct Vars(BTreeMap<String, InputValue>);

    impl Bindings for Vars {
        fn lookup(&self, name: &str) -> Option<&InputValue> {
            self.0.get(name)
        }
    }

    fn vars(pairs: &[(&str, InputValue)]) -> Vars {
        Vars(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        )
    }

    fn run(source: &str, bindings: &Vars) -> Result<bool, ExpressionError> {
        evaluate_condition(&parse(source).expect("parses"), bindings)
    }

    #[test]
    fn compares_mixed_numeric_types() {
        let bindings = vars(&[
            ("income", InputValue::Integer(750_000)),
            ("ratio", InputValue::Float(0.28)),
        ]);

        assert!(run("income <= 800000", &bindings).unwrap());
        assert!(run("ratio < 1 and income / 2 > 300000.5", &bindings).unwrap());
        assert!(!run("income * 2 == 1000000", &bindings).unwrap());
    }

    #[test]
    fn string_equality_is_allowed_but_ordering_is_a_type_error() {
        let bindings = vars(&[("state", InputValue::Text("IA".to_string()))]);

        assert!(run("state == 'IA'", &bindings).unwrap());
        assert!(run("state != \"NE\"", &bindings).unwrap());
        match run("state > 'A'", &bindings) {
            Err(ExpressionError::Evaluation(reason)) => {
                assert!(reason.contains("string"), "reason was {reason}")
            }
            other => panic!("expected type error, got {other:?}"),
        }
    }

    #[test]
    fn string_never_coerces_to_number() {
        let bindings = vars(&[("age", InputValue::Text("30".to_string()))]);
        assert!(matches!(
            run("age == 30", &bindings),
            Err(ExpressionError::Evaluation(_))
        ));
    }

    #[test]
    fn connectives_short_circuit() {
        let bindings = vars(&[
            ("enrolled", InputValue::Boolean(false)),
            ("name", InputValue::Text("x".to_string())),
        ]);

        assert!(!run("enrolled and name > 3", &bindings).unwrap());
        assert!(run("not enrolled or name > 3", &bindings).unwrap());
        assert!(run("enrolled or name > 3", &bindings).is_err());
    }

    #[test]
    fn reports_runtime_errors() {
        let bindings = vars(&[("count", InputValue::Integer(i64::MAX))]);

        for source in [
            "count / 0 > 1",
            "count + 1 > 0",
            "count",
            "undefined_name > 1",
            "count and true",
        ] {
            assert!(
                matches!(run(source, &bindings), Err(ExpressionError::Evaluation(_))),
                "expected '{source}' to fail at runtime"
            );
        }
    }
}
