// Black-box scenarios from spec §8, run against the `Interpreter` facade
// with hand-built `ast::Node` trees (there is no parser in this crate —
// front ends are expected to build these trees themselves).

use naftah::ast::{BinaryOperator, InterpolatedSegment, Node};
use naftah::bridge::TypeSpec;
use naftah::error::Error;
use naftah::function::FuncHandle;
use naftah::value::{IntValue, Value};
use naftah::Interpreter;

#[test]
fn arithmetic_promotion_and_print() {
    let decl_x = Node::declaration("x", Node::ty_any(), false, Some(Node::number("2")));
    let decl_y = Node::declaration("y", Node::ty_any(), false, Some(Node::number("3.0")));
    let sum = Node::binary(BinaryOperator::Add, Node::ident("x"), Node::ident("y"));
    let print_call = Node::call(Node::ident("print"), vec![sum]);
    let program = Node::program(vec![decl_x, decl_y, print_call]);

    let interpreter = Interpreter::new();
    let result = interpreter.run(&program).unwrap();

    // `print`'s return type is Void, so the program's own result is None;
    // the "5.0" text itself is exercised directly in bridge.rs's
    // `float_with_integral_value_prints_with_decimal_point`.
    assert_eq!(result, Value::None);
}

#[test]
fn recursive_factorial() {
    let condition = Node::binary(BinaryOperator::Lte, Node::ident("n"), Node::number("1"));
    let base_case = Node::if_stmt(
        vec![(condition, Node::block(vec![Node::return_stmt(Some(Node::number("1")))]))],
        None,
    );
    let recurse = Node::call(Node::ident("f"), vec![
        Node::call(Node::ident("subtract"), vec![Node::ident("n"), Node::number("1")]),
    ]);
    let step = Node::call(Node::ident("multiply"), vec![Node::ident("n"), recurse]);
    let body = Node::block(vec![base_case, Node::return_stmt(Some(step))]);
    let declare_f = Node::function_declaration(
        "f",
        vec![Node::parameter("n", Node::ty_any(), None, false)],
        Node::ty_any(),
        body,
    );
    let call_f = Node::call(Node::ident("f"), vec![Node::number("5")]);
    let program = Node::program(vec![declare_f, call_f]);

    let interpreter = Interpreter::new();
    let result = interpreter.run(&program).unwrap();

    assert_eq!(result, Value::Int(IntValue::I8(120)));
}

#[test]
fn string_interpolation_with_unresolved_name() {
    let decl_name = Node::declaration("name", Node::ty_any(), false, Some(Node::string("Ada")));
    let interpolated = Node::new(naftah::ast::NodeKind::InterpolatedString(vec![
        InterpolatedSegment::Text("hi ".to_string()),
        InterpolatedSegment::Placeholder("name".to_string()),
        InterpolatedSegment::Text(", age ".to_string()),
        InterpolatedSegment::Placeholder("age".to_string()),
    ]));
    let program = Node::program(vec![decl_name, interpolated]);

    let interpreter = Interpreter::new();
    let result = interpreter.run(&program).unwrap();

    assert_eq!(result, Value::str("hi Ada, age <empty>"));
}

fn register_seq_builder(interpreter: &Interpreter) {
    interpreter.register(FuncHandle::builtin(
        "seq",
        vec![TypeSpec::Any],
        TypeSpec::Any,
        true,
        |args| Ok(Value::seq(args.to_vec())),
    ));
}

#[test]
fn element_wise_add_on_sequences() {
    let interpreter = Interpreter::new();
    register_seq_builder(&interpreter);

    let left = Node::call(Node::ident("seq"), vec![Node::number("1"), Node::number("2"), Node::number("3")]);
    let right = Node::call(Node::ident("seq"), vec![Node::number("10"), Node::number("20"), Node::number("30")]);
    let program = Node::program(vec![Node::binary(BinaryOperator::ElementAdd, left, right)]);

    let result = interpreter.run(&program).unwrap();
    assert_eq!(
        result,
        Value::seq(vec![
            Value::Int(IntValue::I8(11)),
            Value::Int(IntValue::I8(22)),
            Value::Int(IntValue::I8(33)),
        ])
    );
}

#[test]
fn element_wise_add_with_mismatched_lengths_raises() {
    let interpreter = Interpreter::new();
    register_seq_builder(&interpreter);

    let left = Node::call(Node::ident("seq"), vec![Node::number("1"), Node::number("2")]);
    let right = Node::call(Node::ident("seq"), vec![Node::number("1"), Node::number("2"), Node::number("3")]);
    let program = Node::program(vec![Node::binary(BinaryOperator::ElementAdd, left, right)]);

    let err = interpreter.run(&program).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation { .. }));
}

#[test]
fn constant_write_violation() {
    let decl_pi = Node::declaration("pi", Node::ty_any(), true, Some(Node::number("3.14")));
    let reassign = Node::assign(Node::ident("pi"), Node::number("2.71"));
    let program = Node::program(vec![decl_pi, reassign]);

    let interpreter = Interpreter::new();
    let err = interpreter.run(&program).unwrap_err();
    assert!(matches!(err, Error::ConstantWrite(_)));
}

#[test]
fn short_circuit_or_avoids_division_by_zero() {
    // Built from the `||` operator directly, not a `logical_or` call:
    // this crate's builtin registry deliberately omits `logical_or`/
    // `logical_and` since short-circuiting is an evaluator-level
    // property of the `And`/`Or` operators (§4.2), not something a
    // plain eagerly-evaluated function call could express.
    let left = Node::binary(BinaryOperator::Eq, Node::number("1"), Node::number("1"));
    let right = Node::binary(BinaryOperator::Divide, Node::number("1"), Node::number("0"));
    let program = Node::program(vec![Node::binary(BinaryOperator::Or, left, right)]);

    let interpreter = Interpreter::new();
    let result = interpreter.run(&program).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn native_bridge_write_back_swaps_a_pair() {
    let interpreter = Interpreter::new();
    interpreter.register(FuncHandle::builtin(
        "make_pair",
        vec![TypeSpec::Any, TypeSpec::Any],
        TypeSpec::Any,
        false,
        |args| Ok(Value::pair(args[0].clone(), args[1].clone())),
    ));
    interpreter.register(FuncHandle::native(
        "swap",
        vec![TypeSpec::Any],
        TypeSpec::Void,
        None,
        |args| {
            if let Value::Tuple(cell) = &args[0] {
                cell.borrow_mut().swap(0, 1);
            }
            Ok(Value::None)
        },
    ));

    let decl_p = Node::declaration(
        "p",
        Node::ty_any(),
        false,
        Some(Node::call(Node::ident("make_pair"), vec![Node::number("1"), Node::number("2")])),
    );
    let call_swap = Node::call(Node::ident("swap"), vec![Node::ident("p")]);
    let return_p = Node::return_stmt(Some(Node::ident("p")));
    let program = Node::program(vec![decl_p, call_swap, return_p]);

    let result = interpreter.run(&program).unwrap();
    assert_eq!(
        result,
        Value::pair(Value::Int(IntValue::I8(2)), Value::Int(IntValue::I8(1)))
    );
}
