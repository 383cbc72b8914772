// Function model & dispatch (spec §4.5, §6 / component C5).
//
// Three kinds of callable share one descriptor shape: a user-declared
// function (carries its own AST body and captured scope), a built-in
// (spec §6's normative surface, wired straight to ops.rs), and a native
// function (bridged through the same argument-conversion/write-back path
// as a built-in — see bridge.rs). Overload resolution doesn't care which
// kind it's scoring, only the parameter list.

use std::fmt;
use std::rc::Rc;

use crate::ast::Node;
use crate::bridge::{convert_argument, TypeSpec};
use crate::context::ContextId;
use crate::error::{Error, Result};
use crate::value::{Kind, Value};

pub struct DeclaredFunction {
    pub params: Rc<Node>,
    pub return_type: Rc<Node>,
    pub body: Rc<Node>,
    /// The context the function was declared in. `None` once the
    /// defining context is retired and the closure detaches (§9).
    pub captured_context: ContextId,
}

pub struct BuiltinFunction {
    pub implementation: Rc<dyn Fn(&[Value]) -> Result<Value>>,
}

/// A host-reflected callable. Distinguished from a `BuiltinFunction`
/// only by intent — spec §4.6 treats both identically once arguments
/// have been converted.
pub struct NativeFunction {
    pub implementation: Rc<dyn Fn(&[Value]) -> Result<Value>>,
    /// The receiver type for an instance method, if any (qualified calls
    /// of the form `scope::name`, §4.5).
    pub instance_type: Option<&'static str>,
}

pub enum FunctionBody {
    Declared(DeclaredFunction),
    Builtin(BuiltinFunction),
    Native(NativeFunction),
}

/// One overload. A declared name may have several of these; resolution
/// picks among them per §4.5.
pub struct FunctionDescriptor {
    pub name: Rc<str>,
    pub param_types: Vec<TypeSpec>,
    pub return_type: TypeSpec,
    pub variadic: bool,
    pub body: FunctionBody,
}

/// A cheap, clonable handle to a descriptor. Two handles compare equal
/// (as `Value::Func`) only if they point at the exact same descriptor.
#[derive(Clone)]
pub struct FuncHandle(pub Rc<FunctionDescriptor>);

impl fmt::Debug for FuncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncHandle({})", self.0.name)
    }
}

impl FuncHandle {
    pub fn declared(
        name: impl Into<Rc<str>>,
        params: Rc<Node>,
        param_types: Vec<TypeSpec>,
        return_type: Rc<Node>,
        return_type_spec: TypeSpec,
        body: Rc<Node>,
        captured_context: ContextId,
        variadic: bool,
    ) -> FuncHandle {
        FuncHandle(Rc::new(FunctionDescriptor {
            name: name.into(),
            param_types,
            return_type: return_type_spec,
            variadic,
            body: FunctionBody::Declared(DeclaredFunction {
                params,
                return_type,
                body,
                captured_context,
            }),
        }))
    }

    pub fn builtin(
        name: impl Into<Rc<str>>,
        param_types: Vec<TypeSpec>,
        return_type: TypeSpec,
        variadic: bool,
        implementation: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> FuncHandle {
        FuncHandle(Rc::new(FunctionDescriptor {
            name: name.into(),
            param_types,
            return_type,
            variadic,
            body: FunctionBody::Builtin(BuiltinFunction {
                implementation: Rc::new(implementation),
            }),
        }))
    }

    pub fn native(
        name: impl Into<Rc<str>>,
        param_types: Vec<TypeSpec>,
        return_type: TypeSpec,
        instance_type: Option<&'static str>,
        implementation: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> FuncHandle {
        FuncHandle(Rc::new(FunctionDescriptor {
            name: name.into(),
            param_types,
            return_type,
            variadic: false,
            body: FunctionBody::Native(NativeFunction {
                implementation: Rc::new(implementation),
                instance_type,
            }),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Invokes a built-in or native function directly. Declared
    /// functions are instead dispatched by the evaluator, which needs to
    /// push a fresh `ExecutionContext` and walk `body` itself.
    pub fn call_native(&self, args: &[Value]) -> Result<Value> {
        match &self.0.body {
            FunctionBody::Builtin(b) => (b.implementation)(args),
            FunctionBody::Native(n) => (n.implementation)(args),
            FunctionBody::Declared(_) => Err(Error::InternalBug(
                "call_native: declared functions must be dispatched by the evaluator",
            )),
        }
    }
}

/// A penalty score for matching one argument against one declared
/// parameter type (§4.5). Lower is better; `None` means the argument is
/// not convertible to that parameter at all and the candidate is
/// disqualified.
fn score_argument(arg: &Value, target: &TypeSpec) -> Option<u32> {
    if matches!(arg, Value::None) {
        // §4.5's dedicated "argument is None/unset" row takes priority
        // over every other rule, including an exact-kind match.
        return match target {
            TypeSpec::Exact(Kind::Int)
            | TypeSpec::Exact(Kind::Float)
            | TypeSpec::Exact(Kind::Bool)
            | TypeSpec::Exact(Kind::Char)
            | TypeSpec::Primitive(_, _) => None,
            _ => Some(10),
        };
    }

    match target {
        TypeSpec::Any => Some(1),
        TypeSpec::Void => None,
        TypeSpec::Exact(k) if arg.kind() == *k => Some(0),
        TypeSpec::Primitive(k, rung) => match (arg, k) {
            (Value::Int(i), Kind::Int) if i.rank() == *rung => Some(0),
            (Value::Int(_), Kind::Int) => Some(2),
            (Value::Float(f), Kind::Float) if f.rank() == *rung => Some(0),
            (Value::Float(_), Kind::Float) => Some(2),
            (Value::Bool(_), Kind::Int) | (Value::Char(_), Kind::Int) => Some(4),
            (Value::Int(_), Kind::Float) => Some(3),
            _ => None,
        },
        TypeSpec::Exact(Kind::Int) if matches!(arg, Value::Bool(_) | Value::Char(_)) => Some(4),
        TypeSpec::Exact(Kind::Float) if arg.is_numeric() => Some(3),
        TypeSpec::Exact(_) => {
            if convert_argument(arg, target).is_ok() {
                Some(5)
            } else {
                None
            }
        }
        TypeSpec::Named(_) => match arg {
            Value::Wrapped(_) => Some(0),
            _ => None,
        },
        TypeSpec::Seq(_) | TypeSpec::Map(_, _) => {
            if convert_argument(arg, target).is_ok() {
                Some(5)
            } else {
                None
            }
        }
    }
}

/// Scores one candidate against the full argument list; `None` if any
/// argument is incompatible with its parameter, or arity does not match
/// (accounting for `variadic`).
fn score_candidate(candidate: &FuncHandle, args: &[Value]) -> Option<u32> {
    let params = &candidate.0.param_types;
    if candidate.0.variadic {
        if args.len() < params.len().saturating_sub(1) {
            return None;
        }
    } else if args.len() != params.len() {
        return None;
    }

    let mut total = 0u32;
    for (i, arg) in args.iter().enumerate() {
        let target = if candidate.0.variadic && i >= params.len().saturating_sub(1) {
            params.last()?
        } else {
            params.get(i)?
        };
        total += score_argument(arg, target)?;
    }
    Some(total)
}

/// Picks the best-scoring overload among `candidates` for `args`, per
/// §4.5. Ties are broken by declaration order (first wins).
pub fn resolve_overload(name: &str, candidates: &[FuncHandle], args: &[Value]) -> Result<FuncHandle> {
    candidates
        .iter()
        .filter_map(|c| score_candidate(c, args).map(|score| (score, c)))
        .min_by_key(|(score, _)| *score)
        .map(|(_, c)| c.clone())
        .ok_or_else(|| Error::NoSuchMethod(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IntValue;

    fn dummy(_args: &[Value]) -> Result<Value> {
        Ok(Value::None)
    }

    #[test]
    fn exact_kind_match_wins_over_any() {
        let narrow = FuncHandle::builtin(
            "f",
            vec![TypeSpec::Exact(Kind::Int)],
            TypeSpec::Any,
            false,
            dummy,
        );
        let wide = FuncHandle::builtin("f", vec![TypeSpec::Any], TypeSpec::Any, false, dummy);
        let picked =
            resolve_overload("f", &[narrow, wide], &[Value::Int(IntValue::I8(1))]).unwrap();
        assert!(matches!(
            picked.0.param_types[0],
            TypeSpec::Exact(Kind::Int)
        ));
    }

    #[test]
    fn wrong_arity_disqualifies_non_variadic_candidate() {
        let f = FuncHandle::builtin(
            "f",
            vec![TypeSpec::Any, TypeSpec::Any],
            TypeSpec::Any,
            false,
            dummy,
        );
        let err = resolve_overload("f", &[f], &[Value::Int(IntValue::I8(1))]);
        assert!(matches!(err, Err(Error::NoSuchMethod(_))));
    }

    #[test]
    fn none_argument_cannot_satisfy_a_primitive_parameter() {
        let f = FuncHandle::builtin(
            "f",
            vec![TypeSpec::Primitive(Kind::Int, 0)],
            TypeSpec::Any,
            false,
            dummy,
        );
        let err = resolve_overload("f", &[f], &[Value::None]);
        assert!(matches!(err, Err(Error::NoSuchMethod(_))));
    }

    #[test]
    fn none_argument_satisfies_an_any_parameter() {
        let f = FuncHandle::builtin("f", vec![TypeSpec::Any], TypeSpec::Any, false, dummy);
        assert!(resolve_overload("f", &[f], &[Value::None]).is_ok());
    }
}
