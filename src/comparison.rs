use serde_json::Value;
use std::cmp::Ordering;

use crate::expression::{CmpOp, ExprError};

/// Apply `op` to two evaluated operands.
///
/// Equality needs both sides to be the same scalar type; ordering needs two numbers.
pub fn cmp_values(op: CmpOp, a: &Value, b: &Value) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => scalar_eq(a, b, op),
        CmpOp::Ne => scalar_eq(a, b, op).map(|eq| !eq),
        CmpOp::Lt | CmpOp::Lte | CmpOp::Gt | CmpOp::Gte => {
            let ord = numeric_cmp(a, b, op)?;
            Ok(match op {
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Lte => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }
    }
}

fn scalar_eq(a: &Value, b: &Value, op: CmpOp) -> Result<bool, ExprError> {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => Ok(sa == sb),
        (Value::Bool(ba), Value::Bool(bb)) => Ok(ba == bb),
        (Value::Number(_), Value::Number(_)) => Ok(numeric_cmp(a, b, op)? == Ordering::Equal),
        _ => Err(incompatible(op, a, b)),
    }
}

fn numeric_cmp(a: &Value, b: &Value, op: CmpOp) -> Result<Ordering, ExprError> {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            if let (Some(ia), Some(ib)) = (na.as_i64(), nb.as_i64()) {
                return Ok(ia.cmp(&ib));
            }
            match (na.as_f64(), nb.as_f64()) {
                (Some(da), Some(db)) => da
                    .partial_cmp(&db)
                    .ok_or_else(|| incompatible(op, a, b)),
                _ => Err(incompatible(op, a, b)),
            }
        }
        _ => Err(incompatible(op, a, b)),
    }
}

fn incompatible(op: CmpOp, a: &Value, b: &Value) -> ExprError {
    ExprError::Type(format!(
        "cannot apply `{}` to {} {a} and {} {b}",
        op.symbol(),
        type_name(a),
        type_name(b)
    ))
}

pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

/// `true`, non-zero numbers, non-empty strings and mapping nodes are truthy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_relations() {
        assert!(cmp_values(CmpOp::Lt, &json!(375), &json!(400)).unwrap());
        assert!(!cmp_values(CmpOp::Lt, &json!(500), &json!(400)).unwrap());
        assert!(cmp_values(CmpOp::Lte, &json!(400), &json!(400.0)).unwrap());
        assert!(cmp_values(CmpOp::Gte, &json!(1.5), &json!(1)).unwrap());
        assert!(cmp_values(CmpOp::Eq, &json!(2), &json!(2.0)).unwrap());
    }

    #[test]
    fn equality_by_type() {
        assert!(cmp_values(CmpOp::Eq, &json!("B"), &json!("B")).unwrap());
        assert!(cmp_values(CmpOp::Ne, &json!("A"), &json!("B")).unwrap());
        assert!(cmp_values(CmpOp::Eq, &json!(false), &json!(false)).unwrap());
    }

    #[test]
    fn incompatible_types_fail() {
        assert!(matches!(
            cmp_values(CmpOp::Eq, &json!("1"), &json!(1)),
            Err(ExprError::Type(_))
        ));
        assert!(matches!(
            cmp_values(CmpOp::Lt, &json!("a"), &json!("b")),
            Err(ExprError::Type(_))
        ));
        assert!(matches!(
            cmp_values(CmpOp::Eq, &json!({"a": 1}), &json!({"a": 1})),
            Err(ExprError::Type(_))
        ));
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(-1)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!({"k": false})));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(false)));
    }
}
