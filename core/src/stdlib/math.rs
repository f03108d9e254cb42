//! Numeric functions. Mixed Integer/Float operands promote results to Float.

use crate::errors::RuntimeError;
use crate::stdlib::{integer_arg, numeric_arg, Caller, Num, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    let binary = || {
        Signature::new(
            vec![Type::Numeric, Type::Numeric],
            ReturnType::Fixed(Type::Numeric),
        )
    };
    let variadic = || binary().variadic(Type::Numeric);

    builder.register("add", variadic(), add);
    builder.register("sub", binary(), sub);
    builder.register("mul", variadic(), mul);
    builder.register(
        "div",
        Signature::new(
            vec![Type::Numeric, Type::Numeric],
            ReturnType::Fixed(Type::Float),
        ),
        div,
    );
    builder.register("mod", binary(), modulo);
    builder.register("min", variadic(), min);
    builder.register("max", variadic(), max);
    builder.register(
        "abs",
        Signature::new(vec![Type::Numeric], ReturnType::Fixed(Type::Numeric)),
        abs,
    );
    builder.register("pow", binary(), pow);
    builder.register(
        "pad_zero",
        Signature::new(
            vec![Type::Integer, Type::Integer],
            ReturnType::Fixed(Type::String),
        ),
        pad_zero,
    );
}

fn operands(args: &[Value]) -> Result<Vec<Num>, RuntimeError> {
    args.iter().map(numeric_arg).collect()
}

fn all_integers(nums: &[Num]) -> bool {
    nums.iter().all(|n| matches!(n, Num::Int(_)))
}

fn fold_int(
    name: &'static str,
    nums: &[Num],
    op: fn(i64, i64) -> Option<i64>,
) -> Result<Value, RuntimeError> {
    let mut accumulator = match nums[0] {
        Num::Int(i) => i,
        Num::Float(_) => unreachable!("caller checked all_integers"),
    };
    for num in &nums[1..] {
        let Num::Int(i) = num else {
            unreachable!("caller checked all_integers")
        };
        accumulator = op(accumulator, *i)
            .ok_or_else(|| RuntimeError::function(name, "integer overflow"))?;
    }
    Ok(Value::Integer(accumulator))
}

fn fold_float(nums: &[Num], op: fn(f64, f64) -> f64) -> Value {
    let mut accumulator = nums[0].as_f64();
    for num in &nums[1..] {
        accumulator = op(accumulator, num.as_f64());
    }
    Value::Float(accumulator)
}

fn add(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let nums = operands(args)?;
    if all_integers(&nums) {
        fold_int("add", &nums, i64::checked_add)
    } else {
        Ok(fold_float(&nums, |a, b| a + b))
    }
}

fn sub(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let nums = operands(args)?;
    if all_integers(&nums) {
        fold_int("sub", &nums, i64::checked_sub)
    } else {
        Ok(fold_float(&nums, |a, b| a - b))
    }
}

fn mul(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let nums = operands(args)?;
    if all_integers(&nums) {
        fold_int("mul", &nums, i64::checked_mul)
    } else {
        Ok(fold_float(&nums, |a, b| a * b))
    }
}

/// True division: always a Float.
fn div(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let numerator = numeric_arg(&args[0])?.as_f64();
    let denominator = numeric_arg(&args[1])?.as_f64();
    if denominator == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Float(numerator / denominator))
}

/// Euclidean remainder: the result takes the sign of the divisor's modulus,
/// never negative for positive divisors.
fn modulo(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let left = numeric_arg(&args[0])?;
    let right = numeric_arg(&args[1])?;
    match (left, right) {
        (Num::Int(_), Num::Int(0)) => Err(RuntimeError::DivisionByZero),
        (Num::Int(a), Num::Int(b)) => Ok(Value::Integer(a.rem_euclid(b))),
        (a, b) => {
            let divisor = b.as_f64();
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Float(a.as_f64().rem_euclid(divisor)))
        }
    }
}

fn min(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let nums = operands(args)?;
    if all_integers(&nums) {
        fold_int("min", &nums, |a, b| Some(a.min(b)))
    } else {
        Ok(fold_float(&nums, f64::min))
    }
}

fn max(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let nums = operands(args)?;
    if all_integers(&nums) {
        fold_int("max", &nums, |a, b| Some(a.max(b)))
    } else {
        Ok(fold_float(&nums, f64::max))
    }
}

fn abs(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    match numeric_arg(&args[0])? {
        Num::Int(i) => i
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| RuntimeError::function("abs", "integer overflow")),
        Num::Float(f) => Ok(Value::Float(f.abs())),
    }
}

fn pow(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let base = numeric_arg(&args[0])?;
    let exponent = numeric_arg(&args[1])?;
    match (base, exponent) {
        (Num::Int(b), Num::Int(e)) if e >= 0 => {
            let e = u32::try_from(e)
                .map_err(|_| RuntimeError::function("pow", "exponent too large"))?;
            b.checked_pow(e)
                .map(Value::Integer)
                .ok_or_else(|| RuntimeError::function("pow", "integer overflow"))
        }
        (b, e) => Ok(Value::Float(b.as_f64().powf(e.as_f64()))),
    }
}

fn pad_zero(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = integer_arg(&args[0])?;
    let width = integer_arg(&args[1])?;
    let width = usize::try_from(width)
        .map_err(|_| RuntimeError::function("pad_zero", "width must be non-negative"))?;
    Ok(Value::String(format!("{value:0width$}")))
}

#[cfg(test)]
mod tests {
    use crate::stdlib::test_support::run;
    use crate::values::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(
            run("add", &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
            Ok(Value::Integer(6))
        );
        assert_eq!(
            run("mul", &[Value::Integer(4), Value::Integer(5)]),
            Ok(Value::Integer(20))
        );
    }

    #[test]
    fn mixed_operands_promote_to_float() {
        assert_eq!(
            run("add", &[Value::Integer(1), Value::Float(0.5)]),
            Ok(Value::Float(1.5))
        );
    }

    #[test]
    fn div_is_true_division() {
        assert_eq!(
            run("div", &[Value::Integer(3), Value::Integer(2)]),
            Ok(Value::Float(1.5))
        );
        assert!(run("div", &[Value::Integer(1), Value::Integer(0)]).is_err());
    }

    #[test]
    fn modulo_is_euclidean() {
        assert_eq!(
            run("mod", &[Value::Integer(-7), Value::Integer(3)]),
            Ok(Value::Integer(2))
        );
    }

    #[test]
    fn pad_zero_prints_fixed_width() {
        assert_eq!(
            run("pad_zero", &[Value::Integer(7), Value::Integer(3)]),
            Ok(Value::String("007".into()))
        );
    }
}
