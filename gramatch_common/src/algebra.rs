//! Data values, operators and the algebra families that interpret them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The sort (data type) of a value node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sort {
    /// Booleans.
    Bool,
    /// 64-bit signed integers.
    Int,
    /// Strings.
    String,
}

impl Sort {
    /// Name of the node type that carries values of this sort.
    pub const fn name(self) -> &'static str {
        match self {
            Sort::Bool => "bool",
            Sort::Int => "int",
            Sort::String => "string",
        }
    }

    /// The single value a point algebra uses for this sort.
    pub fn point(self) -> Value {
        match self {
            Sort::Bool => Value::Bool(false),
            Sort::Int => Value::Int(0),
            Sort::String => Value::Str(Arc::from("")),
        }
    }
}

/// A data value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String value.
    Str(Arc<str>),
}

impl Value {
    /// Sort of this value.
    pub const fn sort(&self) -> Sort {
        match self {
            Value::Bool(_) => Sort::Bool,
            Value::Int(_) => Sort::Int,
            Value::Str(_) => Sort::String,
        }
    }

    /// Integer payload, if this is an integer.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Operations over values, evaluated by operator items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    /// Integer addition.
    IntAdd,
    /// Integer subtraction.
    IntSub,
    /// Integer multiplication.
    IntMul,
    /// Integer division; no result for a zero divisor.
    IntDiv,
    /// Integer remainder; no result for a zero divisor.
    IntMod,
    /// Minimum of two integers.
    IntMin,
    /// Maximum of two integers.
    IntMax,
    /// Integer negation.
    IntNeg,
    /// Integer less-than.
    IntLt,
    /// Integer less-or-equal.
    IntLe,
    /// Integer greater-than.
    IntGt,
    /// Integer greater-or-equal.
    IntGe,
    /// Equality of two values of the same sort.
    Eq,
    /// Inequality of two values of the same sort.
    Neq,
    /// Boolean conjunction.
    BoolAnd,
    /// Boolean disjunction.
    BoolOr,
    /// Boolean negation.
    BoolNot,
    /// String concatenation.
    StrConcat,
    /// String length in characters.
    StrLength,
}

impl Operator {
    /// Number of arguments.
    pub const fn arity(self) -> usize {
        match self {
            Operator::IntNeg | Operator::BoolNot | Operator::StrLength => 1,
            _ => 2,
        }
    }

    /// Sort of the result.
    pub const fn result_sort(self) -> Sort {
        match self {
            Operator::IntAdd
            | Operator::IntSub
            | Operator::IntMul
            | Operator::IntDiv
            | Operator::IntMod
            | Operator::IntMin
            | Operator::IntMax
            | Operator::IntNeg
            | Operator::StrLength => Sort::Int,
            Operator::StrConcat => Sort::String,
            _ => Sort::Bool,
        }
    }

    /// Concrete evaluation. `None` on sort mismatch or arithmetic failure.
    fn eval(self, args: &[Value]) -> Option<Value> {
        if args.len() != self.arity() {
            return None;
        }
        let int = |ix: usize| args[ix].as_int();
        let boolean = |ix: usize| args[ix].as_bool();
        let value = match self {
            Operator::IntAdd => Value::Int(int(0)?.checked_add(int(1)?)?),
            Operator::IntSub => Value::Int(int(0)?.checked_sub(int(1)?)?),
            Operator::IntMul => Value::Int(int(0)?.checked_mul(int(1)?)?),
            Operator::IntDiv => Value::Int(int(0)?.checked_div(int(1)?)?),
            Operator::IntMod => Value::Int(int(0)?.checked_rem(int(1)?)?),
            Operator::IntMin => Value::Int(int(0)?.min(int(1)?)),
            Operator::IntMax => Value::Int(int(0)?.max(int(1)?)),
            Operator::IntNeg => Value::Int(int(0)?.checked_neg()?),
            Operator::IntLt => Value::Bool(int(0)? < int(1)?),
            Operator::IntLe => Value::Bool(int(0)? <= int(1)?),
            Operator::IntGt => Value::Bool(int(0)? > int(1)?),
            Operator::IntGe => Value::Bool(int(0)? >= int(1)?),
            Operator::Eq | Operator::Neq => {
                if args[0].sort() != args[1].sort() {
                    return None;
                }
                Value::Bool((args[0] == args[1]) == (self == Operator::Eq))
            }
            Operator::BoolAnd => Value::Bool(boolean(0)? && boolean(1)?),
            Operator::BoolOr => Value::Bool(boolean(0)? || boolean(1)?),
            Operator::BoolNot => Value::Bool(!boolean(0)?),
            Operator::StrConcat => {
                let mut joined = String::from(args[0].as_str()?);
                joined.push_str(args[1].as_str()?);
                Value::Str(Arc::from(joined))
            }
            Operator::StrLength => Value::Int(i64::try_from(args[0].as_str()?.chars().count()).ok()?),
        };
        Some(value)
    }
}

/// Operations folding a multiset of values collected from sub-matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SetOperator {
    /// Sum of integers (0 when empty).
    IntSum,
    /// Product of integers (1 when empty).
    IntProd,
    /// Minimum of integers (no result when empty).
    IntMin,
    /// Maximum of integers (no result when empty).
    IntMax,
    /// Number of values.
    Count,
    /// Conjunction of booleans (true when empty).
    BoolAll,
    /// Disjunction of booleans (false when empty).
    BoolAny,
    /// Concatenation of strings in sub-match order.
    StrConcat,
}

impl SetOperator {
    /// Sort of the result.
    pub const fn result_sort(self) -> Sort {
        match self {
            SetOperator::BoolAll | SetOperator::BoolAny => Sort::Bool,
            SetOperator::StrConcat => Sort::String,
            _ => Sort::Int,
        }
    }

    fn eval(self, values: &[Value]) -> Option<Value> {
        let ints = || values.iter().map(Value::as_int).collect::<Option<Vec<i64>>>();
        let bools = || values.iter().map(Value::as_bool).collect::<Option<Vec<bool>>>();
        let value = match self {
            SetOperator::IntSum => Value::Int(
                ints()?
                    .into_iter()
                    .try_fold(0i64, |acc, v| acc.checked_add(v))?,
            ),
            SetOperator::IntProd => Value::Int(
                ints()?
                    .into_iter()
                    .try_fold(1i64, |acc, v| acc.checked_mul(v))?,
            ),
            SetOperator::IntMin => Value::Int(ints()?.into_iter().min()?),
            SetOperator::IntMax => Value::Int(ints()?.into_iter().max()?),
            SetOperator::Count => Value::Int(i64::try_from(values.len()).ok()?),
            SetOperator::BoolAll => Value::Bool(bools()?.into_iter().all(|b| b)),
            SetOperator::BoolAny => Value::Bool(bools()?.into_iter().any(|b| b)),
            SetOperator::StrConcat => {
                let mut joined = String::new();
                for v in values {
                    joined.push_str(v.as_str()?);
                }
                Value::Str(Arc::from(joined))
            }
        };
        Some(value)
    }
}

/// The algebra family used to interpret constants and operators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgebraFamily {
    /// Concrete evaluation.
    #[default]
    Default,
    /// Every sort collapses to a single point value.
    Point,
}

impl AlgebraFamily {
    /// Map a constant into this family.
    pub fn normalize(self, value: Value) -> Value {
        match self {
            AlgebraFamily::Default => value,
            AlgebraFamily::Point => value.sort().point(),
        }
    }

    /// Apply an operator to argument values.
    pub fn apply(self, op: Operator, args: &[Value]) -> Option<Value> {
        match self {
            AlgebraFamily::Default => op.eval(args),
            AlgebraFamily::Point => (args.len() == op.arity()).then(|| op.result_sort().point()),
        }
    }

    /// Fold a multiset of values with a set operator.
    pub fn fold(self, op: SetOperator, values: &[Value]) -> Option<Value> {
        match self {
            AlgebraFamily::Default => op.eval(values),
            AlgebraFamily::Point => Some(op.result_sort().point()),
        }
    }

    /// The value a count of `n` sub-matches is represented by.
    pub fn count(self, n: usize) -> Option<Value> {
        let value = Value::Int(i64::try_from(n).ok()?);
        Some(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Operator::IntAdd, vec![Value::Int(2), Value::Int(3)], Some(Value::Int(5)))]
    #[case(Operator::IntDiv, vec![Value::Int(7), Value::Int(0)], None)]
    #[case(Operator::IntLt, vec![Value::Int(1), Value::Int(2)], Some(Value::Bool(true)))]
    #[case(Operator::Eq, vec![Value::Int(1), Value::Bool(true)], None)]
    #[case(Operator::StrConcat, vec![Value::from("ab"), Value::from("c")], Some(Value::from("abc")))]
    #[case(Operator::StrLength, vec![Value::from("héllo")], Some(Value::Int(5)))]
    #[case(Operator::BoolNot, vec![Value::Bool(true)], Some(Value::Bool(false)))]
    fn default_family_evaluates(
        #[case] op: Operator,
        #[case] args: Vec<Value>,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(AlgebraFamily::Default.apply(op, &args), expected);
    }

    #[rstest]
    #[case(SetOperator::IntSum, vec![], Some(Value::Int(0)))]
    #[case(SetOperator::IntSum, vec![Value::Int(4), Value::Int(5)], Some(Value::Int(9)))]
    #[case(SetOperator::IntMax, vec![], None)]
    #[case(SetOperator::Count, vec![Value::Bool(true), Value::Bool(true)], Some(Value::Int(2)))]
    #[case(SetOperator::BoolAll, vec![], Some(Value::Bool(true)))]
    fn set_operators_fold(
        #[case] op: SetOperator,
        #[case] values: Vec<Value>,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(AlgebraFamily::Default.fold(op, &values), expected);
    }

    #[test]
    fn point_family_collapses_values() {
        let family = AlgebraFamily::Point;
        assert_eq!(family.normalize(Value::Int(42)), Value::Int(0));
        assert_eq!(
            family.apply(Operator::IntAdd, &[Value::Int(1), Value::Int(2)]),
            Some(Value::Int(0))
        );
        assert_eq!(family.count(7), Some(Value::Int(0)));
    }

    #[test]
    fn overflow_has_no_result() {
        let args = [Value::Int(i64::MAX), Value::Int(1)];
        assert_eq!(AlgebraFamily::Default.apply(Operator::IntAdd, &args), None);
    }
}
