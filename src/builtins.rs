// The normative built-in function surface (spec §6), wired to ops.rs.
//
// Every entry here is a zero-overhead wrapper: argument count and kind
// checking is left to `function::resolve_overload` (each built-in
// declares `TypeSpec::Any` parameters, since ops.rs already raises
// `UnsupportedOperation`/`ArithmeticError` for whatever it can't
// handle), so the wrapper's only job is unpacking the argument slice.

use crate::bridge::TypeSpec;
use crate::bridge::{format_value, FormatConfig};
use crate::error::{Error, Result};
use crate::function::FuncHandle;
use crate::ops;
use crate::value::Value;

fn unary(args: &[Value]) -> Result<&Value> {
    match args {
        [a] => Ok(a),
        _ => Err(Error::ArgumentCountMismatch {
            expected: 1,
            got: args.len(),
        }),
    }
}

fn binary(args: &[Value]) -> Result<(&Value, &Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(Error::ArgumentCountMismatch {
            expected: 2,
            got: args.len(),
        }),
    }
}

/// Builds the read-only set of built-ins installed in the root context
/// at startup (§6: "The registry is immutable after startup").
pub fn builtin_registry() -> Vec<FuncHandle> {
    let binary_fn = |name: &'static str, f: fn(&Value, &Value) -> Result<Value>| {
        FuncHandle::builtin(
            name,
            vec![TypeSpec::Any, TypeSpec::Any],
            TypeSpec::Any,
            false,
            move |args| {
                let (l, r) = binary(args)?;
                f(l, r)
            },
        )
    };
    let unary_fn = |name: &'static str, f: fn(&Value) -> Result<Value>| {
        FuncHandle::builtin(name, vec![TypeSpec::Any], TypeSpec::Any, false, move |args| {
            f(unary(args)?)
        })
    };

    vec![
        FuncHandle::builtin(
            "print",
            vec![TypeSpec::Any],
            TypeSpec::Void,
            false,
            |args| {
                let v = unary(args)?;
                println!("{}", format_value(v, &FormatConfig::default()));
                Ok(Value::None)
            },
        ),
        binary_fn("add", ops::add),
        binary_fn("subtract", ops::subtract),
        binary_fn("multiply", ops::multiply),
        binary_fn("divide", ops::divide),
        binary_fn("modulo", ops::modulo),
        binary_fn("max", ops::max),
        binary_fn("min", ops::min),
        binary_fn("pow", ops::pow),
        unary_fn("round", ops::round),
        unary_fn("floor", ops::floor),
        unary_fn("ceil", ops::ceil),
        unary_fn("negate", ops::unary_minus),
        unary_fn("sqrt", ops::sqrt),
        unary_fn("abs", ops::abs),
        unary_fn("signum", ops::signum),
        unary_fn("is_zero", ops::is_zero),
        binary_fn("equals", ops::equals),
        binary_fn("not_equals", ops::not_equals),
        binary_fn("less_than", ops::less_than),
        binary_fn("less_than_equals", ops::less_than_equals),
        binary_fn("greater_than", ops::greater_than),
        binary_fn("greater_than_equals", ops::greater_than_equals),
        binary_fn("bit_and", ops::bit_and),
        binary_fn("bit_or", ops::bit_or),
        binary_fn("bit_xor", ops::bit_xor),
        unary_fn("bit_not", ops::bitwise_not),
        binary_fn("shift_left", ops::shift_left),
        binary_fn("shift_right", ops::shift_right_arithmetic),
        binary_fn("unsigned_shift_right", ops::shift_right_logical),
        unary_fn("pre_increment", ops::increment),
        unary_fn("post_increment", ops::increment),
        unary_fn("pre_decrement", ops::decrement),
        unary_fn("post_decrement", ops::decrement),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IntValue;

    #[test]
    fn registry_covers_the_normative_surface() {
        let registry = builtin_registry();
        let names: Vec<&str> = registry.iter().map(|f| f.name()).collect();
        for expected in [
            "print",
            "add",
            "subtract",
            "multiply",
            "divide",
            "modulo",
            "max",
            "min",
            "pow",
            "round",
            "floor",
            "ceil",
            "negate",
            "sqrt",
            "abs",
            "signum",
            "is_zero",
            "equals",
            "not_equals",
            "less_than",
            "less_than_equals",
            "greater_than",
            "greater_than_equals",
            "bit_and",
            "bit_or",
            "bit_xor",
            "bit_not",
            "shift_left",
            "shift_right",
            "unsigned_shift_right",
            "pre_increment",
            "post_increment",
            "pre_decrement",
            "post_decrement",
        ] {
            assert!(names.contains(&expected), "missing builtin `{expected}`");
        }
    }

    #[test]
    fn add_builtin_dispatches_to_ops() {
        let add = builtin_registry()
            .into_iter()
            .find(|f| f.name() == "add")
            .unwrap();
        let result = add
            .call_native(&[Value::Int(IntValue::I8(2)), Value::Int(IntValue::I8(3))])
            .unwrap();
        assert_eq!(result, Value::Int(IntValue::I8(5)));
    }
}
