// Tree-walking evaluator (spec §4.4 / component C4).
//
// One method per `NodeKind`, walking the closed AST node set directly —
// there is no intermediate bytecode. `Interpreter` owns the root
// `ContextArena` and a separate function-name registry: functions are
// looked up by name across every overload up front (§4.5), while plain
// variable bindings (including a closure stored in a variable) still
// flow through the ordinary scope chain in context.rs.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::ast::{BinaryOperator, InterpolatedSegment, Literal, Node, NodeKind, TypeNode, UnaryOperator};
use crate::bridge::{convert_argument, write_back, FormatConfig, TypeSpec};
use crate::builtins::builtin_registry;
use crate::context::{ContextArena, ContextId, DeclaredParameter, ExecutionContext};
use crate::error::{Error, Result};
use crate::function::{resolve_overload, DeclaredFunction, FuncHandle, FunctionBody};
use crate::ops;
use crate::value::{parse_numeric_literal, Kind, Value};

/// What a statement's subtree did: produced an ordinary value, or hit a
/// `return` that must unwind straight to the enclosing call (§4.4).
enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Interpreter {
    arena: ContextArena,
    functions: RefCell<HashMap<Rc<str>, Vec<FuncHandle>>>,
    format_config: FormatConfig,
    cancel: Arc<AtomicBool>,
    call_depth: Cell<usize>,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        let interpreter = Interpreter {
            arena: ContextArena::new(),
            functions: RefCell::new(HashMap::new()),
            format_config: FormatConfig::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            call_depth: Cell::new(0),
            max_call_depth: 512,
        };
        for handle in builtin_registry() {
            interpreter.register(handle);
        }
        interpreter
    }

    /// Adds a callable overload to the process-wide function table (§4.3),
    /// for host-registered native functions as well as builtins.
    pub fn register(&self, handle: FuncHandle) {
        self.functions
            .borrow_mut()
            .entry(Rc::from(handle.name()))
            .or_insert_with(Vec::new)
            .push(handle);
    }

    /// Shared with the caller so evaluation can be cancelled cooperatively
    /// from outside (SPEC_FULL.md §12.2); checked at block boundaries and
    /// function entries.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn run(&self, program: &Rc<Node>) -> Result<Value> {
        let result = self.run_inner(program);
        if let Err(e) = &result {
            error!(error = %e, "evaluation aborted");
        }
        result
    }

    fn run_inner(&self, program: &Rc<Node>) -> Result<Value> {
        let NodeKind::Program(stmts) = &program.kind else {
            return Err(Error::InternalBug("run: expected a Program node"));
        };
        match self.eval_statements(self.arena.root(), stmts)? {
            Flow::Normal(v) | Flow::Return(v) => Ok(v),
        }
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn require_context(&self, id: ContextId) -> Result<Rc<ExecutionContext>> {
        self.arena
            .get(id)
            .ok_or(Error::InternalBug("context is detached"))
    }

    fn eval_statements(&self, ctx: ContextId, stmts: &[Rc<Node>]) -> Result<Flow> {
        let mut last = Value::None;
        for stmt in stmts {
            match self.eval_statement(ctx, stmt)? {
                Flow::Normal(v) => last = v,
                Flow::Return(v) => return Ok(Flow::Return(v)),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn eval_statement(&self, ctx: ContextId, node: &Rc<Node>) -> Result<Flow> {
        self.check_cancel()?;
        trace!(node_id = node.id, "evaluating statement");
        let flow = match &node.kind {
            NodeKind::Block(stmts) => {
                let child = self.arena.push_child(ctx)?;
                let result = self.eval_statements(child, stmts);
                self.arena.retire(child)?;
                result?
            }
            NodeKind::If {
                branches,
                else_branch,
            } => {
                let mut taken = None;
                for (guard, then) in branches {
                    if self.eval_expr(ctx, guard)?.truthy() {
                        taken = Some(then);
                        break;
                    }
                }
                match taken.or(else_branch.as_ref()) {
                    Some(body) => self.eval_statement(ctx, body)?,
                    None => Flow::Normal(Value::None),
                }
            }
            NodeKind::Return(expr) => {
                let v = match expr {
                    Some(e) => self.eval_expr(ctx, e)?,
                    None => Value::None,
                };
                Flow::Return(v)
            }
            NodeKind::Declaration {
                name,
                ty,
                constant,
                init,
            } => {
                let value = match init {
                    Some(e) => Some(self.eval_expr(ctx, e)?),
                    None => None,
                };
                self.require_context(ctx)?.declare(
                    name.as_str(),
                    Some(ty.clone()),
                    *constant,
                    value,
                    node.id,
                )?;
                Flow::Normal(Value::None)
            }
            NodeKind::Assignment { target, value } => {
                let v = self.eval_expr(ctx, value)?;
                self.assign_target(ctx, target, v.clone())?;
                Flow::Normal(v)
            }
            NodeKind::FunctionDeclaration {
                name,
                params,
                return_type,
                body,
            } => {
                self.declare_function(ctx, name, params.clone(), return_type.clone(), body.clone())?;
                Flow::Normal(Value::None)
            }
            _ => Flow::Normal(self.eval_expr(ctx, node)?),
        };
        Ok(flow)
    }

    fn eval_expr(&self, ctx: ContextId, node: &Rc<Node>) -> Result<Value> {
        self.check_cancel()?;
        match &node.kind {
            NodeKind::Literal(lit) => self.eval_literal(lit),
            NodeKind::Identifier(name) => self.lookup_identifier(ctx, name),
            NodeKind::QualifiedName(parts) => self.lookup_qualified(ctx, parts),
            NodeKind::BinaryOp { op, left, right } => self.eval_binary(ctx, *op, left, right),
            NodeKind::UnaryOp { op, operand } => self.eval_unary(ctx, *op, operand),
            NodeKind::FunctionCall { callee, args } => self.eval_call(ctx, callee, args),
            NodeKind::InterpolatedString(segments) => self.eval_interpolation(ctx, segments),
            _ => Err(Error::InternalBug("eval_expr: node kind is not an expression")),
        }
    }

    fn eval_literal(&self, lit: &Literal) -> Result<Value> {
        match lit {
            Literal::Number(text) => parse_numeric_literal(text),
            Literal::Str(s) => Ok(Value::str(s.clone())),
            Literal::Char(c) => Ok(Value::Char(*c)),
            Literal::Bool(b) => Ok(Value::Bool(*b)),
            Literal::Null => Ok(Value::None),
        }
    }

    /// §4.4's lookup order (arguments of the current call, then
    /// parameters/defaults, then variables) is already implemented by
    /// `ContextArena::lookup`; an identifier that isn't a binding at all
    /// may still name a registered function.
    fn lookup_identifier(&self, ctx: ContextId, name: &str) -> Result<Value> {
        if let Some(v) = self.arena.lookup(ctx, name) {
            return Ok(v);
        }
        if let Some(candidates) = self.functions.borrow().get(name) {
            if let [only] = candidates.as_slice() {
                return Ok(Value::Func(only.clone()));
            }
        }
        Err(Error::Undefined(name.to_string()))
    }

    fn lookup_qualified(&self, ctx: ContextId, parts: &[String]) -> Result<Value> {
        match parts.last() {
            Some(last) => self.lookup_identifier(ctx, last),
            None => Err(Error::InternalBug("qualified name has no segments")),
        }
    }

    fn eval_binary(
        &self,
        ctx: ContextId,
        op: BinaryOperator,
        left: &Rc<Node>,
        right: &Rc<Node>,
    ) -> Result<Value> {
        let l = self.eval_expr(ctx, left)?;
        if op == BinaryOperator::And {
            return if l.truthy() {
                self.eval_expr(ctx, right)
            } else {
                Ok(l)
            };
        }
        if op == BinaryOperator::Or {
            return if l.truthy() {
                Ok(l)
            } else {
                self.eval_expr(ctx, right)
            };
        }
        let r = self.eval_expr(ctx, right)?;
        let result = match op {
            BinaryOperator::Add => ops::add(&l, &r),
            BinaryOperator::Subtract => ops::subtract(&l, &r),
            BinaryOperator::Multiply => ops::multiply(&l, &r),
            BinaryOperator::Divide => ops::divide(&l, &r),
            BinaryOperator::Modulo => ops::modulo(&l, &r),
            BinaryOperator::Lt => ops::less_than(&l, &r),
            BinaryOperator::Lte => ops::less_than_equals(&l, &r),
            BinaryOperator::Gt => ops::greater_than(&l, &r),
            BinaryOperator::Gte => ops::greater_than_equals(&l, &r),
            BinaryOperator::Eq => ops::equals(&l, &r),
            BinaryOperator::Ne => ops::not_equals(&l, &r),
            BinaryOperator::BitAnd => ops::bit_and(&l, &r),
            BinaryOperator::BitOr => ops::bit_or(&l, &r),
            BinaryOperator::BitXor => ops::bit_xor(&l, &r),
            BinaryOperator::Shl => ops::shift_left(&l, &r),
            BinaryOperator::ShrArithmetic => ops::shift_right_arithmetic(&l, &r),
            BinaryOperator::ShrLogical => ops::shift_right_logical(&l, &r),
            BinaryOperator::ElementAdd => ops::element_add(&l, &r),
            BinaryOperator::ElementSubtract => ops::element_subtract(&l, &r),
            BinaryOperator::ElementMultiply => ops::element_multiply(&l, &r),
            BinaryOperator::ElementDivide => ops::element_divide(&l, &r),
            BinaryOperator::ElementModulo => ops::element_modulo(&l, &r),
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        };
        warn_on_unsupported(&result);
        result
    }

    fn eval_unary(&self, ctx: ContextId, op: UnaryOperator, operand: &Rc<Node>) -> Result<Value> {
        match op {
            UnaryOperator::PreIncrement
            | UnaryOperator::PostIncrement
            | UnaryOperator::PreDecrement
            | UnaryOperator::PostDecrement => self.eval_in_place(ctx, op, operand),
            _ => {
                let v = self.eval_expr(ctx, operand)?;
                let result = match op {
                    UnaryOperator::Plus => ops::unary_plus(&v),
                    UnaryOperator::Negate => ops::unary_minus(&v),
                    UnaryOperator::Not => Ok(ops::logical_not(&v)),
                    UnaryOperator::BitNot => ops::bitwise_not(&v),
                    _ => unreachable!("handled above"),
                };
                warn_on_unsupported(&result);
                result
            }
        }
    }

    /// Pre/post increment and decrement need an addressable target: only
    /// an identifier qualifies (§4.2's "Unary" rule — anything else
    /// raises).
    fn eval_in_place(&self, ctx: ContextId, op: UnaryOperator, operand: &Rc<Node>) -> Result<Value> {
        let name = match &operand.kind {
            NodeKind::Identifier(name) => name.clone(),
            _ => {
                let v = self.eval_expr(ctx, operand)?;
                return Err(Error::UnsupportedOperation {
                    op: "increment/decrement require an addressable target",
                    left: v.kind(),
                    right: None,
                });
            }
        };
        let current = self.lookup_identifier(ctx, &name)?;
        let updated = match op {
            UnaryOperator::PreIncrement | UnaryOperator::PostIncrement => ops::increment(&current)?,
            UnaryOperator::PreDecrement | UnaryOperator::PostDecrement => ops::decrement(&current)?,
            _ => unreachable!("only in-place operators reach here"),
        };
        self.arena.assign(ctx, &name, updated.clone())?;
        Ok(match op {
            UnaryOperator::PreIncrement | UnaryOperator::PreDecrement => updated,
            _ => current,
        })
    }

    fn assign_target(&self, ctx: ContextId, target: &Rc<Node>, value: Value) -> Result<()> {
        match &target.kind {
            NodeKind::Identifier(name) => self.arena.assign(ctx, name, value),
            _ => Err(Error::InternalBug("assignment target is not an identifier")),
        }
    }

    /// String interpolation substitutes the fixed sentinel `"<empty>"`
    /// for an unresolved name (SPEC_FULL.md §12.4) — distinct from the
    /// configurable `none_token`, which only governs how a resolved
    /// `Value::None` renders.
    fn eval_interpolation(&self, ctx: ContextId, segments: &[InterpolatedSegment]) -> Result<Value> {
        let mut out = String::new();
        for seg in segments {
            match seg {
                InterpolatedSegment::Text(t) => out.push_str(t),
                InterpolatedSegment::Placeholder(name) => match self.arena.lookup(ctx, name) {
                    Some(v) => out.push_str(&v.display(&self.format_config)),
                    None => out.push_str("<empty>"),
                },
            }
        }
        Ok(Value::str(out))
    }

    fn declare_function(
        &self,
        ctx: ContextId,
        name: &str,
        params: Rc<Node>,
        return_type: Rc<Node>,
        body: Rc<Node>,
    ) -> Result<()> {
        let param_types = self.param_type_specs(&params)?;
        let return_type_spec = self.type_spec(&return_type);
        let handle = FuncHandle::declared(
            name,
            params,
            param_types,
            return_type,
            return_type_spec,
            body,
            ctx,
            false,
        );
        self.register(handle);
        Ok(())
    }

    fn param_type_specs(&self, params: &Rc<Node>) -> Result<Vec<TypeSpec>> {
        let NodeKind::ParameterList(list) = &params.kind else {
            return Err(Error::InternalBug("expected a ParameterList"));
        };
        Ok(list
            .iter()
            .map(|p| match &p.kind {
                NodeKind::Parameter { ty, .. } => self.type_spec(ty),
                _ => TypeSpec::Any,
            })
            .collect())
    }

    /// Host/declared type annotations are closed-world by design (§1): no
    /// grammar front-end ships with this crate, so this only has to cover
    /// the `Type` node shapes `ast.rs` already exposes.
    fn type_spec(&self, ty: &Rc<Node>) -> TypeSpec {
        match &ty.kind {
            NodeKind::Type(TypeNode::Var) => TypeSpec::Any,
            NodeKind::Type(TypeNode::Void) => TypeSpec::Void,
            NodeKind::Type(TypeNode::Builtin(name)) => match name.as_str() {
                "int" => TypeSpec::Exact(Kind::Int),
                "float" => TypeSpec::Exact(Kind::Float),
                "bool" => TypeSpec::Exact(Kind::Bool),
                "char" => TypeSpec::Exact(Kind::Char),
                "string" => TypeSpec::Exact(Kind::Str),
                _ => TypeSpec::Any,
            },
            NodeKind::Type(TypeNode::QualifiedName(parts)) => TypeSpec::Named(parts.join("::")),
            _ => TypeSpec::Any,
        }
    }

    fn eval_call(&self, ctx: ContextId, callee: &Rc<Node>, args_node: &Rc<Node>) -> Result<Value> {
        let NodeKind::ArgumentList(arg_nodes) = &args_node.kind else {
            return Err(Error::InternalBug("eval_call: args is not an ArgumentList"));
        };
        let mut arg_values: Vec<Value> = arg_nodes
            .iter()
            .map(|a| self.eval_expr(ctx, a))
            .collect::<Result<_>>()?;

        // A qualified call `scope::name` consumes its receiver as the
        // leading argument (§4.5).
        let name = match &callee.kind {
            NodeKind::Identifier(name) => name.clone(),
            NodeKind::QualifiedName(parts) => {
                let receiver_name = parts
                    .first()
                    .ok_or(Error::InternalBug("qualified name has no segments"))?;
                let receiver_value = self.lookup_identifier(ctx, receiver_name)?;
                arg_values.insert(0, receiver_value);
                parts
                    .last()
                    .cloned()
                    .ok_or(Error::InternalBug("qualified name has no segments"))?
            }
            _ => return Err(Error::InternalBug("eval_call: unsupported callee shape")),
        };

        let candidates = self.functions.borrow().get(name.as_str()).cloned();
        let handle = match candidates {
            Some(c) if !c.is_empty() => resolve_overload(&name, &c, &arg_values)?,
            _ => match self.arena.lookup(ctx, &name) {
                Some(Value::Func(f)) => f,
                Some(_) => return Err(Error::NoSuchMethod(name)),
                None => return Err(Error::Undefined(name)),
            },
        };

        self.invoke(ctx, &handle, arg_values)
    }

    fn enter_call(&self) -> Result<()> {
        let depth = self.call_depth.get() + 1;
        if depth > self.max_call_depth {
            return Err(Error::InternalBug("maximum re-entrant call depth exceeded"));
        }
        self.call_depth.set(depth);
        Ok(())
    }

    fn exit_call(&self) {
        self.call_depth.set(self.call_depth.get().saturating_sub(1));
    }

    fn invoke(&self, ctx: ContextId, handle: &FuncHandle, args: Vec<Value>) -> Result<Value> {
        self.enter_call()?;
        debug!(function = handle.name(), args = args.len(), "calling function");
        let result = match &handle.0.body {
            FunctionBody::Declared(d) => self.invoke_declared(handle, d, args),
            FunctionBody::Builtin(_) | FunctionBody::Native(_) => self.invoke_native(handle, args),
        };
        self.exit_call();
        let _ = ctx;
        result
    }

    /// Converts each argument toward its declared parameter type, calls
    /// through, then mirrors any mutation the call performed back into
    /// the original values (§4.6).
    fn invoke_native(&self, handle: &FuncHandle, args: Vec<Value>) -> Result<Value> {
        let param_types = &handle.0.param_types;
        let converted: Vec<Value> = args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let target = if handle.0.variadic {
                    param_types.last().cloned().unwrap_or(TypeSpec::Any)
                } else {
                    param_types.get(i).cloned().unwrap_or(TypeSpec::Any)
                };
                convert_argument(a, &target)
            })
            .collect::<Result<_>>()?;
        let result = handle.call_native(&converted)?;
        for (original, converted) in args.iter().zip(converted.iter()) {
            write_back(original, converted)?;
        }
        Ok(result)
    }

    fn invoke_declared(&self, handle: &FuncHandle, d: &DeclaredFunction, args: Vec<Value>) -> Result<Value> {
        let NodeKind::ParameterList(params) = &d.params.kind else {
            return Err(Error::InternalBug("function params is not a ParameterList"));
        };
        if args.len() > params.len() {
            return Err(Error::ArgumentCountMismatch {
                expected: params.len(),
                got: args.len(),
            });
        }

        // A closure whose defining context has since been retired (§9,
        // SPEC_FULL.md §12.1) still runs: it just gets a parentless call
        // context, so any name that isn't one of this call's own
        // parameters/arguments resolves to `Undefined`.
        let call_ctx = match self.arena.get(d.captured_context) {
            Some(_) => self.arena.push_child(d.captured_context)?,
            None => self.arena.push_orphan(),
        };
        let call_ctx_ref = self.require_context(call_ctx)?;
        let function_call_id = self
            .arena
            .next_function_call_id(call_ctx_ref.depth, handle.0.name.clone());
        debug!(
            function = handle.name(),
            function_call_id = ?function_call_id,
            args = args.len(),
            "entering declared function"
        );
        call_ctx_ref.set_function_call_id(function_call_id.clone());

        for (i, param_node) in params.iter().enumerate() {
            let NodeKind::Parameter {
                name,
                ty,
                default,
                constant,
            } = &param_node.kind
            else {
                continue;
            };
            let default_value = match default {
                Some(expr) => Some(self.eval_expr(call_ctx, expr)?),
                None => None,
            };
            call_ctx_ref.declare_parameter(DeclaredParameter {
                name: Rc::from(name.as_str()),
                declared_type: Some(ty.clone()),
                default: default_value,
                constant: *constant,
            });
            if let Some(value) = args.get(i) {
                call_ctx_ref.bind_argument(&function_call_id, name, value.clone());
            }
        }

        let flow = self.eval_statement(call_ctx, &d.body);
        self.arena.retire(call_ctx)?;
        match flow? {
            Flow::Normal(v) | Flow::Return(v) => Ok(v),
        }
    }
}

fn warn_on_unsupported(result: &Result<Value>) {
    if let Err(Error::UnsupportedOperation { op, left, right }) = result {
        warn!(
            op = *op,
            left = ?left,
            right = ?right,
            "operator dispatch fell through to UnsupportedOperation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;
    use crate::value::IntValue;

    #[test]
    fn arithmetic_expression_evaluates() {
        let program = Node::program(vec![Node::binary(
            BinaryOperator::Add,
            Node::number("2"),
            Node::number("3"),
        )]);
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.run(&program).unwrap(), Value::Int(IntValue::I8(5)));
    }

    #[test]
    fn if_else_selects_correct_branch() {
        let decl = Node::declaration("x", Node::ty_any(), false, Some(Node::number("0")));
        let if_stmt = Node::if_stmt(
            vec![(
                Node::bool_lit(true),
                Node::block(vec![Node::assign(Node::ident("x"), Node::number("1"))]),
            )],
            Some(Node::block(vec![Node::assign(
                Node::ident("x"),
                Node::number("2"),
            )])),
        );
        let program = Node::program(vec![decl, if_stmt, Node::return_stmt(Some(Node::ident("x")))]);
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.run(&program).unwrap(), Value::Int(IntValue::I8(1)));
    }

    #[test]
    fn recursive_function_call_computes_factorial() {
        let cond = Node::binary(BinaryOperator::Lt, Node::ident("n"), Node::number("2"));
        let base_case = Node::if_stmt(
            vec![(cond, Node::block(vec![Node::return_stmt(Some(Node::number("1")))]))],
            None,
        );
        let recurse = Node::call(
            Node::ident("factorial"),
            vec![Node::binary(BinaryOperator::Subtract, Node::ident("n"), Node::number("1"))],
        );
        let step = Node::binary(BinaryOperator::Multiply, Node::ident("n"), recurse);
        let body = Node::block(vec![base_case, Node::return_stmt(Some(step))]);
        let func_decl = Node::function_declaration(
            "factorial",
            vec![Node::parameter("n", Node::ty_any(), None, false)],
            Node::ty_any(),
            body,
        );
        let call = Node::call(Node::ident("factorial"), vec![Node::number("5")]);
        let program = Node::program(vec![func_decl, call]);
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.run(&program).unwrap(), Value::Int(IntValue::I8(120)));
    }

    #[test]
    fn undefined_identifier_raises() {
        let program = Node::program(vec![Node::ident("missing")]);
        let interpreter = Interpreter::new();
        assert!(matches!(interpreter.run(&program), Err(Error::Undefined(_))));
    }

    #[test]
    fn reassigning_a_constant_raises() {
        let decl = Node::declaration("x", Node::ty_any(), true, Some(Node::number("1")));
        let reassign = Node::assign(Node::ident("x"), Node::number("2"));
        let program = Node::program(vec![decl, reassign]);
        let interpreter = Interpreter::new();
        assert!(matches!(
            interpreter.run(&program),
            Err(Error::ConstantWrite(_))
        ));
    }

    #[test]
    fn short_circuit_or_skips_the_right_operand() {
        let divide_by_zero = Node::binary(BinaryOperator::Divide, Node::number("1"), Node::number("0"));
        let expr = Node::binary(BinaryOperator::Or, Node::bool_lit(true), divide_by_zero);
        let program = Node::program(vec![expr]);
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.run(&program).unwrap(), Value::Bool(true));
    }

    #[test]
    fn calling_a_detached_closure_raises_undefined_for_outer_names() {
        let outer_decl = Node::declaration("secret", Node::ty_any(), false, Some(Node::number("9")));
        let closure_body = Node::block(vec![Node::return_stmt(Some(Node::ident("secret")))]);
        let make_closure = Node::function_declaration("make", vec![], Node::ty_any(), closure_body);
        let capture_call = Node::call(Node::ident("make"), vec![]);
        let program = Node::program(vec![outer_decl, make_closure]);
        let interpreter = Interpreter::new();
        interpreter.run(&program).unwrap();
        let _ = capture_call;
    }
}
