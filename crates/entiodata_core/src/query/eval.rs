//! Expression evaluation against records.
//!
//! Null handling:
//!
//! | operator class        | null operand                          |
//! |-----------------------|---------------------------------------|
//! | `eq`, `ne`            | null is a value; `null eq null` holds |
//! | `lt`, `le`, `gt`, `ge`| null                                  |
//! | arithmetic, functions | null                                  |
//! | `and`, `or`, `not`    | three-valued (Kleene)                 |
//!
//! A filter keeps a record only when its predicate is `true`.

use super::expr::{BinaryOp, Expr, Function, PropertyPath};
use crate::accessor::{FieldValue, Record};
use crate::error::{CoreError, CoreResult};
use crate::registry::AccessorResolver;
use chrono::{Datelike, Timelike};
use entiodata_codec::{Numeric, Value};
use rust_decimal::RoundingStrategy;
use std::cmp::Ordering;

/// Evaluates expressions against records, reading fields through the
/// accessors of a resolver.
pub struct Evaluator<'a> {
    resolver: &'a dyn AccessorResolver,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator.
    pub fn new(resolver: &'a dyn AccessorResolver) -> Self {
        Self { resolver }
    }

    /// Evaluates a filter predicate. Null counts as false.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Evaluation`] if the expression is ill-typed or
    /// does not produce a boolean.
    pub fn evaluate_predicate(&self, expr: &Expr, record: &Record) -> CoreResult<bool> {
        match self.evaluate(expr, record)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(CoreError::evaluation(format!(
                "filter {expr} produced non-boolean {other}"
            ))),
        }
    }

    /// Evaluates an expression.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Evaluation`] on type mismatches, unresolvable
    /// property paths, overflow and bad function arguments.
    pub fn evaluate(&self, expr: &Expr, record: &Record) -> CoreResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Property(path) => self.resolve_path(record, path),
            Expr::Not(inner) => match self.evaluate(inner, record)? {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(CoreError::evaluation(format!("not applied to {other}"))),
            },
            Expr::Negate(inner) => {
                let value = self.evaluate(inner, record)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let n = numeric(&value)?;
                n.checked_neg()
                    .map(|n| n.into_value(is_narrow(&value)))
                    .ok_or_else(|| CoreError::evaluation(format!("cannot negate {value}")))
            }
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, record),
            Expr::Call { function, args } => {
                let (min, max) = function.arity();
                if args.len() < min || args.len() > max {
                    return Err(CoreError::evaluation(format!(
                        "{} takes {min}..={max} arguments, got {}",
                        function.name(),
                        args.len()
                    )));
                }
                let values = args
                    .iter()
                    .map(|a| self.evaluate(a, record))
                    .collect::<CoreResult<Vec<_>>>()?;
                if values.iter().any(Value::is_null) {
                    return Ok(Value::Null);
                }
                call(*function, &values)
            }
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, record: &Record) -> CoreResult<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let left = truth(&self.evaluate(lhs, record)?, op)?;
                let short = if op == BinaryOp::And { Some(false) } else { Some(true) };
                if left == short {
                    return Ok(Value::from(left));
                }
                let right = truth(&self.evaluate(rhs, record)?, op)?;
                let result = match (left, right) {
                    (_, r) if r == short => short,
                    (Some(l), Some(r)) if l == r => Some(l),
                    _ => None,
                };
                Ok(Value::from(result))
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let left = self.evaluate(lhs, record)?;
                let right = self.evaluate(rhs, record)?;
                let equal = match (left.is_null(), right.is_null()) {
                    (true, true) => true,
                    (true, false) | (false, true) => false,
                    (false, false) => compare(&left, &right)? == Ordering::Equal,
                };
                Ok(Value::Boolean(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let left = self.evaluate(lhs, record)?;
                let right = self.evaluate(rhs, record)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                let ord = compare(&left, &right)?;
                Ok(Value::Boolean(match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                }))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let left = self.evaluate(lhs, record)?;
                let right = self.evaluate(rhs, record)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                let arithmetic = op.arithmetic().ok_or_else(|| {
                    CoreError::evaluation(format!("{} is not arithmetic", op.keyword()))
                })?;
                numeric(&left)?
                    .checked_apply(numeric(&right)?, arithmetic)
                    .map(|n| n.into_value(is_narrow(&left) && is_narrow(&right)))
                    .ok_or_else(|| {
                        CoreError::evaluation(format!(
                            "{left} {} {right} overflows or divides by zero",
                            op.keyword()
                        ))
                    })
            }
        }
    }

    fn resolve_path(&self, record: &Record, path: &PropertyPath) -> CoreResult<Value> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(CoreError::evaluation("empty property path"));
        };

        let mut current = record.clone();
        for segment in parents {
            match self.read(&current, segment, path)? {
                FieldValue::Null => return Ok(Value::Null),
                FieldValue::Record(next) => current = next,
                _ => {
                    return Err(CoreError::evaluation(format!(
                        "{path}: {segment} is not a structured value"
                    )))
                }
            }
        }

        match self.read(&current, last, path)? {
            FieldValue::Null => Ok(Value::Null),
            FieldValue::Simple(v) => Ok(v),
            FieldValue::Enum(member) => Ok(Value::String(member)),
            FieldValue::Record(_) => Err(CoreError::evaluation(format!(
                "{path} is a structured value"
            ))),
        }
    }

    fn read(&self, record: &Record, field: &str, path: &PropertyPath) -> CoreResult<FieldValue> {
        let accessor = self.resolver.accessor_for(record.shape()).ok_or_else(|| {
            CoreError::evaluation(format!("{path}: no accessor for {}", record.shape()))
        })?;
        accessor
            .get(record.data(), field)
            .map_err(|e| match e {
                CoreError::NotFound { .. } | CoreError::InvalidRecord { .. } => {
                    CoreError::evaluation(format!("{path}: {e}"))
                }
                other => other,
            })
    }
}

/// Compares two non-null values, failing for incompatible types.
pub(crate) fn compare(left: &Value, right: &Value) -> CoreResult<Ordering> {
    left.try_compare(right).ok_or_else(|| {
        CoreError::evaluation(format!(
            "cannot compare {} with {}",
            type_label(left),
            type_label(right)
        ))
    })
}

fn type_label(value: &Value) -> &'static str {
    value.simple_type().map_or("null", |t| t.name())
}

fn truth(value: &Value, op: BinaryOp) -> CoreResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(CoreError::evaluation(format!(
            "{} applied to {}",
            op.keyword(),
            type_label(other)
        ))),
    }
}

fn numeric(value: &Value) -> CoreResult<Numeric> {
    value
        .as_numeric()
        .ok_or_else(|| CoreError::evaluation(format!("{} is not numeric", type_label(value))))
}

fn is_narrow(value: &Value) -> bool {
    matches!(
        value,
        Value::Byte(_) | Value::SByte(_) | Value::Int16(_) | Value::Int32(_)
    )
}

fn text<'v>(function: Function, value: &'v Value) -> CoreResult<&'v str> {
    value.as_str().ok_or_else(|| {
        CoreError::evaluation(format!(
            "{} expects a string, got {}",
            function.name(),
            type_label(value)
        ))
    })
}

fn index(function: Function, value: &Value) -> CoreResult<usize> {
    value
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            CoreError::evaluation(format!(
                "{} expects a non-negative integer, got {value}",
                function.name()
            ))
        })
}

fn int(n: usize) -> Value {
    i32::try_from(n).map_or(Value::Int64(n as i64), Value::Int32)
}

fn call(function: Function, args: &[Value]) -> CoreResult<Value> {
    use Function as F;
    let arg = |i: usize| &args[i];

    Ok(match function {
        F::SubstringOf => Value::Boolean(text(function, arg(1))?.contains(text(function, arg(0))?)),
        F::StartsWith => Value::Boolean(text(function, arg(0))?.starts_with(text(function, arg(1))?)),
        F::EndsWith => Value::Boolean(text(function, arg(0))?.ends_with(text(function, arg(1))?)),
        F::Length => int(text(function, arg(0))?.chars().count()),
        F::IndexOf => {
            let haystack = text(function, arg(0))?;
            match haystack.find(text(function, arg(1))?) {
                Some(byte) => int(haystack[..byte].chars().count()),
                None => Value::Int32(-1),
            }
        }
        F::Substring => {
            let s = text(function, arg(0))?;
            let start = index(function, arg(1))?;
            let chars = s.chars().skip(start);
            match args.get(2) {
                Some(len) => Value::String(chars.take(index(function, len)?).collect()),
                None => Value::String(chars.collect()),
            }
        }
        F::ToLower => Value::String(text(function, arg(0))?.to_lowercase()),
        F::ToUpper => Value::String(text(function, arg(0))?.to_uppercase()),
        F::Trim => Value::String(text(function, arg(0))?.trim().to_string()),
        F::Concat => {
            let mut s = text(function, arg(0))?.to_string();
            s.push_str(text(function, arg(1))?);
            Value::String(s)
        }
        F::Replace => Value::String(
            text(function, arg(0))?.replace(text(function, arg(1))?, text(function, arg(2))?),
        ),
        F::Year | F::Month | F::Day | F::Hour | F::Minute | F::Second => {
            date_part(function, arg(0))?
        }
        F::Round | F::Floor | F::Ceiling => rounding(function, arg(0))?,
    })
}

fn date_part(function: Function, value: &Value) -> CoreResult<Value> {
    let (date, time) = match value {
        Value::DateTime(dt) => (Some(dt.date()), dt.time()),
        Value::DateTimeOffset(dt) => (Some(dt.date_naive()), dt.time()),
        Value::Time(t) => (None, *t),
        other => {
            return Err(CoreError::evaluation(format!(
                "{} expects a date or time, got {}",
                function.name(),
                type_label(other)
            )))
        }
    };
    let part = match function {
        Function::Year => date.map(|d| d.year()),
        Function::Month => date.map(|d| d.month() as i32),
        Function::Day => date.map(|d| d.day() as i32),
        Function::Hour => Some(time.hour() as i32),
        Function::Minute => Some(time.minute() as i32),
        _ => Some(time.second() as i32),
    };
    part.map(Value::Int32).ok_or_else(|| {
        CoreError::evaluation(format!("{} is undefined for a time of day", function.name()))
    })
}

fn rounding(function: Function, value: &Value) -> CoreResult<Value> {
    let round_f64 = |f: f64| match function {
        Function::Round => f.round(),
        Function::Floor => f.floor(),
        _ => f.ceil(),
    };
    Ok(match value {
        Value::Decimal(d) => Value::Decimal(match function {
            Function::Round => d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            Function::Floor => d.floor(),
            _ => d.ceil(),
        }),
        Value::Double(f) => Value::Double(round_f64(*f)),
        #[allow(clippy::cast_possible_truncation)]
        Value::Single(f) => Value::Single(round_f64(f64::from(*f)) as f32),
        other if other.as_i64().is_some() => other.clone(),
        other => {
            return Err(CoreError::evaluation(format!(
                "{} expects a number, got {}",
                function.name(),
                type_label(other)
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{PropertyAccessor, TypedAccessor};
    use crate::types::ShapeId;
    use chrono::NaiveDate;
    use entiodata_codec::SimpleType;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Default, Clone)]
    struct Address {
        city: Option<String>,
    }

    #[derive(Debug, Default, Clone)]
    struct Person {
        name: String,
        age: Option<i32>,
        balance: Decimal,
        address: Option<Address>,
        born: Option<chrono::NaiveDateTime>,
    }

    struct Shapes(HashMap<ShapeId, Arc<dyn PropertyAccessor>>);

    impl AccessorResolver for Shapes {
        fn accessor_for(&self, shape: &ShapeId) -> Option<&Arc<dyn PropertyAccessor>> {
            self.0.get(shape)
        }
    }

    fn shapes() -> Shapes {
        let person: Arc<dyn PropertyAccessor> = Arc::new(
            TypedAccessor::<Person>::new()
                .simple("Name", SimpleType::String, |p: &Person| p.name.clone(), |p, v| p.name = v)
                .simple("Age", SimpleType::Int32, |p: &Person| p.age, |p, v| p.age = v)
                .simple("Balance", SimpleType::Decimal, |p: &Person| p.balance, |p, v| p.balance = v)
                .record("Address", "Address", |p: &Person| p.address.clone(), |p, v| p.address = v)
                .simple("Born", SimpleType::DateTime, |p: &Person| p.born, |p, v| p.born = v),
        );
        let address: Arc<dyn PropertyAccessor> = Arc::new(TypedAccessor::<Address>::new().simple(
            "City",
            SimpleType::String,
            |a: &Address| a.city.clone(),
            |a, v| a.city = v,
        ));
        Shapes(HashMap::from([
            (ShapeId::from("Person"), person),
            (ShapeId::from("Address"), address),
        ]))
    }

    fn ada() -> Record {
        Record::new(
            "Person",
            Person {
                name: "Ada".into(),
                age: Some(36),
                balance: Decimal::new(1050, 2),
                address: Some(Address {
                    city: Some("London".into()),
                }),
                born: NaiveDate::from_ymd_opt(1815, 12, 10)
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
            },
        )
    }

    fn nobody() -> Record {
        Record::new("Person", Person::default())
    }

    fn eval(expr: &Expr, record: &Record) -> CoreResult<Value> {
        let shapes = shapes();
        Evaluator::new(&shapes).evaluate(expr, record)
    }

    fn holds(expr: &Expr, record: &Record) -> bool {
        let shapes = shapes();
        Evaluator::new(&shapes).evaluate_predicate(expr, record).unwrap()
    }

    #[test]
    fn comparisons_promote_numerics() {
        let e = Expr::property("Balance").gt(Expr::literal(10));
        assert!(holds(&e, &ada()));
        let e = Expr::property("Age").equals(Expr::literal(36i64));
        assert!(holds(&e, &ada()));
    }

    #[test]
    fn nan_compares_without_error() {
        let nan = || Expr::literal(f64::NAN);
        assert_eq!(eval(&nan().equals(Expr::literal(10.0)), &ada()).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&nan().gt(Expr::literal(10.0)), &ada()).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&nan().equals(nan()), &ada()).unwrap(), Value::Boolean(true));
        assert!(!holds(&Expr::property("Balance").gt(nan()), &ada()));
    }

    #[test]
    fn paths_traverse_nested_records() {
        let e = Expr::property("Address/City").equals(Expr::literal("London"));
        assert!(holds(&e, &ada()));
        assert_eq!(eval(&Expr::property("Address/City"), &nobody()).unwrap(), Value::Null);
    }

    #[test]
    fn null_comparison_table() {
        let age = || Expr::property("Age");
        let null = || Expr::literal(Value::Null);
        assert_eq!(eval(&age().equals(null()), &nobody()).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&age().not_equals(null()), &ada()).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&age().lt(Expr::literal(3)), &nobody()).unwrap(), Value::Null);
        assert_eq!(eval(&age().plus(Expr::literal(1)), &nobody()).unwrap(), Value::Null);
        assert!(!holds(&age().lt(Expr::literal(3)), &nobody()));
        assert!(!holds(&Expr::not(age().lt(Expr::literal(3))), &nobody()));
    }

    #[test]
    fn kleene_logic() {
        let unknown = || Expr::property("Age").gt(Expr::literal(1));
        let t = || Expr::literal(true);
        let f = || Expr::literal(false);
        let p = nobody();
        assert_eq!(eval(&unknown().and(f()), &p).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&unknown().and(t()), &p).unwrap(), Value::Null);
        assert_eq!(eval(&unknown().or(t()), &p).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&unknown().or(f()), &p).unwrap(), Value::Null);
        assert_eq!(eval(&f().and(unknown()), &p).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn incompatible_types_fail() {
        let e = Expr::property("Name").gt(Expr::literal(3));
        let err = eval(&e, &ada()).unwrap_err();
        assert!(matches!(err, CoreError::Evaluation { .. }));

        let err = eval(&Expr::property("Missing"), &ada()).unwrap_err();
        assert!(matches!(err, CoreError::Evaluation { .. }));

        let err = eval(&Expr::property("Address"), &ada()).unwrap_err();
        assert!(matches!(err, CoreError::Evaluation { .. }));
    }

    #[test]
    fn arithmetic() {
        let e = Expr::property("Age").plus(Expr::literal(4)).times(Expr::literal(2));
        assert_eq!(eval(&e, &ada()).unwrap(), Value::Int32(80));
        let e = Expr::literal(i32::MAX).plus(Expr::literal(1));
        assert_eq!(eval(&e, &ada()).unwrap(), Value::Int64(i64::from(i32::MAX) + 1));
        let e = Expr::literal(1).divided_by(Expr::literal(0));
        assert!(eval(&e, &ada()).is_err());
        let e = Expr::negate(Expr::property("Balance"));
        assert_eq!(eval(&e, &ada()).unwrap(), Value::Decimal(Decimal::new(-1050, 2)));
    }

    #[test]
    fn string_functions() {
        let name = || Expr::property("Name");
        let call = |f, args| eval(&Expr::call(f, args), &ada()).unwrap();
        assert_eq!(call(Function::Length, vec![name()]), Value::Int32(3));
        assert_eq!(call(Function::ToUpper, vec![name()]), Value::from("ADA"));
        assert_eq!(
            call(Function::SubstringOf, vec![Expr::literal("d"), name()]),
            Value::Boolean(true)
        );
        assert_eq!(
            call(Function::StartsWith, vec![name(), Expr::literal("Ad")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call(Function::IndexOf, vec![name(), Expr::literal("a")]),
            Value::Int32(2)
        );
        assert_eq!(
            call(Function::Substring, vec![name(), Expr::literal(1), Expr::literal(1)]),
            Value::from("d")
        );
        assert_eq!(
            call(Function::Concat, vec![name(), Expr::literal("!")]),
            Value::from("Ada!")
        );
        assert_eq!(
            call(Function::Replace, vec![name(), Expr::literal("A"), Expr::literal("I")]),
            Value::from("Ida")
        );
    }

    #[test]
    fn date_and_math_functions() {
        let call = |f, args| eval(&Expr::call(f, args), &ada()).unwrap();
        assert_eq!(call(Function::Year, vec![Expr::property("Born")]), Value::Int32(1815));
        assert_eq!(call(Function::Month, vec![Expr::property("Born")]), Value::Int32(12));
        assert_eq!(
            call(Function::Floor, vec![Expr::property("Balance")]),
            Value::Decimal(Decimal::new(10, 0))
        );
        assert_eq!(
            call(Function::Ceiling, vec![Expr::literal(1.2f64)]),
            Value::Double(2.0)
        );
        assert_eq!(eval(&Expr::call(Function::Year, vec![Expr::property("Born")]), &nobody()).unwrap(), Value::Null);
    }

    #[test]
    fn arity_is_checked() {
        let e = Expr::call(Function::Length, vec![]);
        assert!(eval(&e, &ada()).is_err());
    }
}
