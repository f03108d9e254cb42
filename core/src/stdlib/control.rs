//! Control-flow functions. Arguments are evaluated before the call, so both
//! branches of `if` are always computed.

use crate::errors::RuntimeError;
use crate::stdlib::{boolean_arg, string_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder.register(
        "if",
        Signature::new(
            vec![Type::Boolean, Type::Any, Type::Any],
            ReturnType::UnionOf(vec![1, 2]),
        ),
        if_,
    );
    builder.register(
        "throw",
        Signature::new(vec![Type::String], ReturnType::Fixed(Type::Any)),
        throw,
    );
}

fn if_(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    if boolean_arg(&args[0])? {
        Ok(args[1].clone())
    } else {
        Ok(args[2].clone())
    }
}

fn throw(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Err(RuntimeError::UserThrown(string_arg(&args[0])?.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::errors::RuntimeError;
    use crate::stdlib::test_support::run;
    use crate::values::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_selects_by_condition() {
        assert_eq!(
            run(
                "if",
                &[Value::Boolean(true), Value::Integer(1), Value::Integer(2)]
            ),
            Ok(Value::Integer(1))
        );
        assert_eq!(
            run(
                "if",
                &[Value::Boolean(false), Value::Integer(1), Value::Integer(2)]
            ),
            Ok(Value::Integer(2))
        );
    }

    #[test]
    fn throw_surfaces_the_message() {
        assert_eq!(
            run("throw", &[Value::String("boom".into())]),
            Err(RuntimeError::UserThrown("boom".into()))
        );
    }
}
