// Native bridge (spec §4.6 / component C6).
//
// Used at every call into a built-in or host-reflected function: convert
// arguments from `Value` into the shape the native side expects, invoke,
// then mirror back whatever the native call mutated. Because this crate
// has no actual foreign host to reflect into, "native" functions are
// ordinary Rust closures registered the same way `builtins.rs` registers
// built-ins (see function.rs) — the conversion/write-back/formatting
// machinery below is exercised identically either way, which is the
// part spec §4.6 actually specifies.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{FloatValue, IntValue, Kind, Value};

/// The configurable tokens §4.6 calls out: "All tokens are
/// implementation-configurable; only their meaning is normative."
#[derive(Clone, Debug)]
pub struct FormatConfig {
    pub none_token: String,
    pub nan_token: String,
    pub seq_open: char,
    pub seq_close: char,
    pub tuple_open: char,
    pub tuple_close: char,
    pub map_open: char,
    pub map_close: char,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            none_token: "<empty>".to_string(),
            nan_token: "NaN".to_string(),
            seq_open: '[',
            seq_close: ']',
            tuple_open: '(',
            tuple_close: ')',
            map_open: '{',
            map_close: '}',
        }
    }
}

/// The target shape a native parameter declares, coarse enough to drive
/// both argument conversion and the overload scorer in function.rs.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeSpec {
    Any,
    Void,
    /// Accepts any value of this `Kind` ("boxed"-style acceptance).
    Exact(Kind),
    /// Accepts a numeric value of this `Kind` only at the given tower
    /// rung ("primitive"-style acceptance per §4.5's boxed/primitive
    /// distinction).
    Primitive(Kind, u8),
    Named(String),
    Seq(Box<TypeSpec>),
    Map(Box<TypeSpec>, Box<TypeSpec>),
}

/// Converts `value` toward `target`, per §4.6 item 1: unwrap `Wrapped`,
/// narrow/widen the numeric tower, map `None`/`NaN` to the target's
/// null-ish form, and recurse into sequences/maps/tuples element-wise.
/// Returns the identity conversion when `value` is already assignable.
pub fn convert_argument(value: &Value, target: &TypeSpec) -> Result<Value> {
    match target {
        TypeSpec::Any => Ok(value.clone()),
        TypeSpec::Void => Ok(Value::None),
        TypeSpec::Named(_) => match value {
            Value::Wrapped(_) => Ok(value.clone()),
            Value::None => Ok(Value::None),
            _ => Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: value.kind(),
                right: None,
            }),
        },
        TypeSpec::Exact(Kind::Int) | TypeSpec::Primitive(Kind::Int, _) => {
            convert_to_int(value, target)
        }
        TypeSpec::Exact(Kind::Float) | TypeSpec::Primitive(Kind::Float, _) => {
            convert_to_float(value, target)
        }
        TypeSpec::Exact(Kind::Bool) => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::None | Value::NaN => Ok(Value::Bool(false)),
            other => Ok(Value::Bool(other.truthy())),
        },
        TypeSpec::Exact(Kind::Char) => match value {
            Value::Char(_) => Ok(value.clone()),
            Value::Int(i) => char::from_u32(i.to_f64() as u32)
                .map(Value::Char)
                .ok_or(Error::UnsupportedOperation {
                    op: "convert_argument",
                    left: value.kind(),
                    right: None,
                }),
            _ => Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: value.kind(),
                right: None,
            }),
        },
        TypeSpec::Exact(Kind::Str) => match value {
            Value::Str(_) => Ok(value.clone()),
            Value::None => Ok(Value::str("")),
            other => Ok(Value::str(format_value(other, &FormatConfig::default()))),
        },
        TypeSpec::Seq(elem) => match value {
            Value::Seq(items) | Value::Tuple(items) => {
                let converted: Result<Vec<Value>> = items
                    .borrow()
                    .iter()
                    .map(|v| convert_argument(v, elem))
                    .collect();
                Ok(Value::seq(converted?))
            }
            Value::None => Ok(Value::seq(vec![])),
            other => Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: other.kind(),
                right: None,
            }),
        },
        TypeSpec::Map(key_ty, val_ty) => match value {
            Value::Map(m) => {
                let mut converted = Vec::new();
                for (k, v) in m.borrow().iter() {
                    converted.push((convert_argument(k, key_ty)?, convert_argument(v, val_ty)?));
                }
                Ok(Value::map(converted))
            }
            Value::None => Ok(Value::map(vec![])),
            other => Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: other.kind(),
                right: None,
            }),
        },
        TypeSpec::Exact(_) | TypeSpec::Primitive(_, _) => Ok(value.clone()),
    }
}

fn convert_to_int(value: &Value, target: &TypeSpec) -> Result<Value> {
    let widened = match value {
        Value::Int(i) => i.clone(),
        Value::Bool(b) => IntValue::I8(*b as i8),
        Value::Char(c) => IntValue::I32(*c as i32),
        Value::Float(f) => IntValue::I64(f.to_f64() as i64),
        Value::None | Value::NaN => IntValue::I8(0),
        other => {
            return Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: other.kind(),
                right: None,
            })
        }
    };
    if let TypeSpec::Primitive(_, rung) = target {
        return Ok(Value::Int(rerung_int(widened, *rung)));
    }
    Ok(Value::Int(widened))
}

fn rerung_int(v: IntValue, rung: u8) -> IntValue {
    use num_traits::ToPrimitive;
    match rung {
        0 => IntValue::I8(v.to_bigint().to_i8().unwrap_or_default()),
        1 => IntValue::I16(v.to_bigint().to_i16().unwrap_or_default()),
        2 => IntValue::I32(v.to_bigint().to_i32().unwrap_or_default()),
        3 => IntValue::I64(v.to_bigint().to_i64().unwrap_or_default()),
        _ => IntValue::Big(v.to_bigint()),
    }
}

fn convert_to_float(value: &Value, target: &TypeSpec) -> Result<Value> {
    let widened = match value {
        Value::Float(f) => f.clone(),
        Value::Int(i) => FloatValue::F64(i.to_f64()),
        Value::Bool(b) => FloatValue::F64(*b as i64 as f64),
        Value::Char(c) => FloatValue::F64(*c as u32 as f64),
        Value::None | Value::NaN => FloatValue::F64(0.0),
        other => {
            return Err(Error::UnsupportedOperation {
                op: "convert_argument",
                left: other.kind(),
                right: None,
            })
        }
    };
    if let TypeSpec::Primitive(_, rung) = target {
        return Ok(Value::Float(rerung_float(widened, *rung)));
    }
    Ok(Value::Float(widened))
}

fn rerung_float(v: FloatValue, rung: u8) -> FloatValue {
    match rung {
        0 => FloatValue::F32(v.to_f64() as f32),
        1 => FloatValue::F64(v.to_f64()),
        _ => FloatValue::Big(v.to_big_decimal()),
    }
}

/// Host-side mutation tracked across a native call, so `write_back` can
/// mirror it into the `Value` the evaluator still holds (§4.6 item 2).
#[derive(Clone)]
pub struct MutationSlot {
    pub original: Value,
    pub after: RefCell<Value>,
}

impl MutationSlot {
    pub fn new(original: Value) -> Rc<MutationSlot> {
        Rc::new(MutationSlot {
            after: RefCell::new(original.clone()),
            original,
        })
    }
}

/// Copies mutations a native call may have produced back into the
/// original `Value`. For numeric wrappers the tower width is preserved;
/// for sequences, pointwise replacement; for maps, replace-contents; for
/// tuples, the (nominally immutable) cells are rebound directly, which
/// is the one place in this crate a `Tuple`'s contents legitimately
/// change after construction.
pub fn write_back(original: &Value, mutated: &Value) -> Result<()> {
    match (original, mutated) {
        // `convert_argument(_, TypeSpec::Any)` hands back a clone of the
        // same `Rc`, so `original` and `mutated` already alias one
        // `RefCell`: any mutation the native call made is visible through
        // `original` already, and borrowing it both ways here would
        // double-borrow and panic.
        (Value::Seq(dst), Value::Seq(src)) if Rc::ptr_eq(dst, src) => Ok(()),
        (Value::Tuple(dst), Value::Tuple(src)) if Rc::ptr_eq(dst, src) => Ok(()),
        (Value::Map(dst), Value::Map(src)) if Rc::ptr_eq(dst, src) => Ok(()),
        (Value::Seq(dst), Value::Seq(src)) => {
            let mut dst = dst.borrow_mut();
            dst.clear();
            dst.extend(src.borrow().iter().cloned());
            Ok(())
        }
        (Value::Tuple(dst), Value::Tuple(src)) => {
            let mut dst = dst.borrow_mut();
            let src = src.borrow();
            if dst.len() != src.len() {
                return Err(Error::InternalBug(
                    "write_back: tuple arity changed across a native call",
                ));
            }
            for (slot, value) in dst.iter_mut().zip(src.iter()) {
                *slot = value.clone();
            }
            Ok(())
        }
        (Value::Map(dst), Value::Map(src)) => {
            let mut dst = dst.borrow_mut();
            dst.clear();
            for (k, v) in src.borrow().iter() {
                dst.insert(k.clone(), v.clone());
            }
            Ok(())
        }
        // Numeric wrappers and every other variant are immutable value
        // types from the evaluator's perspective: nothing to mirror
        // back, the caller already holds the returned value.
        _ => Ok(()),
    }
}

/// Formats a value for `print`/string interpolation (§4.6's formatting
/// table). Numbers render in their shortest lossless decimal form,
/// strings render unquoted, and containers use the configured
/// balanced-delimiter form.
pub fn format_value(value: &Value, cfg: &FormatConfig) -> String {
    match value {
        Value::None => cfg.none_token.clone(),
        Value::NaN => cfg.nan_token.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Int(i) => i.to_bigint().to_string(),
        Value::Float(f) => format_float(f),
        Value::Str(s) => s.to_string(),
        Value::Seq(items) => format_delimited(
            items.borrow().iter(),
            cfg.seq_open,
            cfg.seq_close,
            cfg,
        ),
        Value::Tuple(items) => format_delimited(
            items.borrow().iter(),
            cfg.tuple_open,
            cfg.tuple_close,
            cfg,
        ),
        Value::Map(m) => {
            let parts: Vec<String> = m
                .borrow()
                .iter()
                .map(|(k, v)| format!("{}: {}", format_value(k, cfg), format_value(v, cfg)))
                .collect();
            format!("{}{}{}", cfg.map_open, parts.join(", "), cfg.map_close)
        }
        Value::Func(f) => format!("<function {}>", f.0.name),
        Value::Wrapped(w) => format!("<{}>", w.tag),
    }
}

fn format_delimited<'a>(
    items: impl Iterator<Item = &'a Value>,
    open: char,
    close: char,
    cfg: &FormatConfig,
) -> String {
    let parts: Vec<String> = items.map(|v| format_value(v, cfg)).collect();
    format!("{open}{}{close}", parts.join(", "))
}

fn format_float(f: &FloatValue) -> String {
    match f {
        FloatValue::F32(v) => shortest_float(*v as f64),
        FloatValue::F64(v) => shortest_float(*v),
        FloatValue::Big(v) => v.to_string(),
    }
}

fn shortest_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_formats_as_configured_token() {
        assert_eq!(format_value(&Value::None, &FormatConfig::default()), "<empty>");
    }

    #[test]
    fn float_with_integral_value_prints_with_decimal_point() {
        let v = Value::Float(FloatValue::F64(5.0));
        assert_eq!(format_value(&v, &FormatConfig::default()), "5.0");
    }

    #[test]
    fn convert_none_to_int_yields_zero() {
        let out = convert_argument(&Value::None, &TypeSpec::Exact(Kind::Int)).unwrap();
        assert!(matches!(out, Value::Int(IntValue::I8(0))));
    }

    #[test]
    fn write_back_rebinds_tuple_cells() {
        let pair = Value::pair(Value::Int(IntValue::I8(1)), Value::Int(IntValue::I8(2)));
        let swapped = Value::pair(Value::Int(IntValue::I8(2)), Value::Int(IntValue::I8(1)));
        write_back(&pair, &swapped).unwrap();
        if let Value::Tuple(cells) = &pair {
            assert_eq!(cells.borrow()[0], Value::Int(IntValue::I8(2)));
            assert_eq!(cells.borrow()[1], Value::Int(IntValue::I8(1)));
        } else {
            panic!("expected tuple");
        }
    }
}
