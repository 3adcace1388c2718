use super::parser::{BinaryOp, Expr};
use super::ExpressionError;

/// Provides whole columns of values by name
pub trait ColumnSource {
    /// Number of rows every column has.
    fn row_count(&self) -> usize;

    /// The column called `name`, if present.
    fn column(&self, name: &str) -> Option<&[f64]>;
}

/// Intermediate value: a literal or a full column
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(f64),
    Series(Vec<f64>),
}

/// Evaluates `expr` element-wise over `source`, broadcasting literals.
pub fn evaluate<S: ColumnSource + ?Sized>(
    expr: &Expr,
    source: &S,
) -> Result<Vec<f64>, ExpressionError> {
    Ok(match eval(expr, source)? {
        Value::Scalar(value) => vec![value; source.row_count()],
        Value::Series(values) => values,
    })
}

fn eval<S: ColumnSource + ?Sized>(expr: &Expr, source: &S) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),
        Expr::Column(name) => source
            .column(name)
            .map(|values| Value::Series(values.to_vec()))
            .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
        Expr::Negate(inner) => Ok(match eval(inner, source)? {
            Value::Scalar(value) => Value::Scalar(-value),
            Value::Series(values) => Value::Series(values.into_iter().map(|v| -v).collect()),
        }),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, source)?;
            let rhs = eval(rhs, source)?;
            apply(*op, lhs, rhs)
        }
    }
}

fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExpressionError> {
    Ok(match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(op.apply(a, b)),
        (Value::Scalar(a), Value::Series(b)) => {
            Value::Series(b.into_iter().map(|b| op.apply(a, b)).collect())
        }
        (Value::Series(a), Value::Scalar(b)) => {
            Value::Series(a.into_iter().map(|a| op.apply(a, b)).collect())
        }
        (Value::Series(a), Value::Series(b)) => {
            if a.len() != b.len() {
                return Err(ExpressionError::LengthMismatch {
                    left: a.len(),
                    right: b.len(),
                });
            }
            Value::Series(a.into_iter().zip(b).map(|(a, b)| op.apply(a, b)).collect())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Columns {
        rows: usize,
        data: HashMap<&'static str, Vec<f64>>,
    }

    impl ColumnSource for Columns {
        fn row_count(&self) -> usize {
            self.rows
        }

        fn column(&self, name: &str) -> Option<&[f64]> {
            self.data.get(name).map(Vec::as_slice)
        }
    }

    fn columns(pairs: &[(&'static str, Vec<f64>)]) -> Columns {
        Columns {
            rows: pairs.first().map_or(0, |(_, v)| v.len()),
            data: pairs.iter().cloned().collect(),
        }
    }

    fn col(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(name.to_string()))
    }

    #[test]
    fn scalar_broadcasts_over_series() {
        let source = columns(&[("a", vec![1.0, 2.0, 3.0])]);
        let expr = Expr::Binary {
            op: BinaryOp::Multiply,
            lhs: Box::new(Expr::Number(10.0)),
            rhs: col("a"),
        };
        assert_eq!(evaluate(&expr, &source).unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn constant_expression_fills_every_row() {
        let source = columns(&[("a", vec![1.0, 2.0])]);
        let expr = Expr::Negate(Box::new(Expr::Number(4.0)));
        assert_eq!(evaluate(&expr, &source).unwrap(), vec![-4.0, -4.0]);
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        let source = columns(&[("a", vec![1.0, -1.0, 0.0]), ("b", vec![0.0, 0.0, 0.0])]);
        let expr = Expr::Binary {
            op: BinaryOp::Divide,
            lhs: col("a"),
            rhs: col("b"),
        };
        let result = evaluate(&expr, &source).unwrap();
        assert_eq!(result[0], f64::INFINITY);
        assert_eq!(result[1], f64::NEG_INFINITY);
        assert!(result[2].is_nan());
    }

    #[test]
    fn unknown_column_is_reported() {
        let source = columns(&[("a", vec![1.0])]);
        let err = evaluate(&Expr::Column("zz".into()), &source).unwrap_err();
        assert_eq!(err, ExpressionError::UnknownVariable("zz".into()));
    }

    #[test]
    fn series_of_different_lengths_are_rejected() {
        let source = columns(&[("a", vec![1.0, 2.0]), ("b", vec![1.0])]);
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: col("a"),
            rhs: col("b"),
        };
        assert_eq!(
            evaluate(&expr, &source).unwrap_err(),
            ExpressionError::LengthMismatch { left: 2, right: 1 }
        );
    }
}
