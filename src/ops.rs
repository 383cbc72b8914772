// Operator dispatch (spec §4.2 / component C2).
//
// Every operator is a plain function over two (or one) `Value`s; the
// evaluator is the only caller, and it's the evaluator's job to resolve
// an assignable target for the in-place unary operators (pre/post
// increment/decrement) — these functions only compute the new value.
//
// Dispatch is by (operator, left kind, right kind) per the table in the
// spec this module implements. `NaN` propagates through every
// arithmetic/bitwise/element-wise operator unconditionally; `None`
// behaves as integer zero in the same positions, except string
// concatenation where it renders as the literal `"None"`.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::bridge::{format_value, FormatConfig};
use crate::error::{Error, Result};
use crate::value::{int_result_from_big, promote, FloatValue, IntValue, Promoted, Value};

fn none_placeholder() -> &'static str {
    "None"
}

fn char_wise(l: &str, r: &str, f: impl Fn(u32, u32) -> u32) -> String {
    l.chars()
        .zip(r.chars())
        .map(|(a, b)| clamp_codepoint(f(a as u32, b as u32)))
        .collect()
}

fn clamp_codepoint(cp: u32) -> char {
    let cp = cp % 0x110000;
    if (0xD800..=0xDFFF).contains(&cp) {
        '\u{FFFD}'
    } else {
        char::from_u32(cp).unwrap_or('\u{FFFD}')
    }
}

fn sum_of_codepoints(s: &str) -> f64 {
    s.chars().map(|c| c as u32 as f64).sum()
}

fn operand_as_int(v: &Value, op: &'static str) -> Result<IntValue> {
    match v {
        Value::None | Value::NaN => Ok(IntValue::I8(0)),
        Value::Int(i) => Ok(i.clone()),
        Value::Bool(b) => Ok(IntValue::I8(*b as i8)),
        Value::Char(c) => Ok(IntValue::I32(*c as i32)),
        other => Err(Error::UnsupportedOperation {
            op,
            left: other.kind(),
            right: None,
        }),
    }
}

fn element_wise(l: &Value, r: &Value, op: impl Fn(&Value, &Value) -> Result<Value>) -> Result<Value> {
    let (l_is_tuple, a) = match l {
        Value::Seq(v) => (false, v.borrow().clone()),
        Value::Tuple(v) => (true, v.borrow().clone()),
        other => {
            return Err(Error::UnsupportedOperation {
                op: "element_wise",
                left: other.kind(),
                right: Some(r.kind()),
            })
        }
    };
    let (r_is_tuple, b) = match r {
        Value::Seq(v) => (false, v.borrow().clone()),
        Value::Tuple(v) => (true, v.borrow().clone()),
        other => {
            return Err(Error::UnsupportedOperation {
                op: "element_wise",
                left: l.kind(),
                right: Some(other.kind()),
            })
        }
    };
    if a.len() != b.len() {
        return Err(Error::UnsupportedOperation {
            op: "element_wise: length mismatch",
            left: l.kind(),
            right: Some(r.kind()),
        });
    }
    let result: Vec<Value> = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| op(x, y))
        .collect::<Result<_>>()?;
    if l_is_tuple && r_is_tuple {
        Ok(Value::tuple(result))
    } else {
        Ok(Value::seq(result))
    }
}

fn element_wise_map(l: &Value, r: &Value, op: impl Fn(&Value, &Value) -> Result<Value>) -> Result<Value> {
    let (Value::Map(lm), Value::Map(rm)) = (l, r) else {
        return Err(Error::UnsupportedOperation {
            op: "element_wise_map",
            left: l.kind(),
            right: Some(r.kind()),
        });
    };
    let lm = lm.borrow();
    let rm = rm.borrow();
    if lm.len() != rm.len() || !lm.keys().all(|k| rm.contains_key(k)) {
        return Err(Error::UnsupportedOperation {
            op: "element_wise_map: key sets differ",
            left: l.kind(),
            right: Some(r.kind()),
        });
    }
    let mut entries = Vec::with_capacity(lm.len());
    for (k, lv) in lm.iter() {
        let rv = rm.get(k).expect("key presence checked above");
        entries.push((k.clone(), op(lv, rv)?));
    }
    Ok(Value::map(entries))
}

// --- Unary operators --------------------------------------------------

pub fn unary_plus(v: &Value) -> Result<Value> {
    match v {
        Value::NaN => Ok(Value::NaN),
        Value::Str(_) => Ok(Value::NaN),
        Value::None => Ok(Value::Int(IntValue::I8(0))),
        _ if v.is_numeric() => Ok(v.clone()),
        other => Err(Error::UnsupportedOperation {
            op: "unary_plus",
            left: other.kind(),
            right: None,
        }),
    }
}

pub fn unary_minus(v: &Value) -> Result<Value> {
    match v {
        Value::NaN => Ok(Value::NaN),
        Value::Str(_) => Ok(Value::NaN),
        Value::None => Ok(Value::Int(IntValue::I8(0))),
        Value::Int(i) => Ok(Value::Int(int_result_from_big(-i.to_bigint(), i.rank()))),
        Value::Bool(b) => Ok(Value::Int(IntValue::I8(-(*b as i8)))),
        Value::Char(c) => Ok(Value::Int(IntValue::I32(-(*c as i32)))),
        Value::Float(f) => Ok(Value::Float(negate_float(f))),
        other => Err(Error::UnsupportedOperation {
            op: "unary_minus",
            left: other.kind(),
            right: None,
        }),
    }
}

fn negate_float(f: &FloatValue) -> FloatValue {
    match f {
        FloatValue::F32(v) => FloatValue::F32(-v),
        FloatValue::F64(v) => FloatValue::F64(-v),
        FloatValue::Big(v) => FloatValue::Big(-v.clone()),
    }
}

pub fn logical_not(v: &Value) -> Value {
    Value::Bool(!v.truthy())
}

pub fn bitwise_not(v: &Value) -> Result<Value> {
    let i = operand_as_int(v, "bitwise_not")?;
    Ok(Value::Int(int_result_from_big(!i.to_bigint(), i.rank())))
}

pub fn increment(v: &Value) -> Result<Value> {
    add(v, &Value::Int(IntValue::I8(1)))
}

pub fn decrement(v: &Value) -> Result<Value> {
    subtract(v, &Value::Int(IntValue::I8(1)))
}

// --- Binary arithmetic --------------------------------------------------

pub fn add(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, add)
        }
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, add),
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
        (Value::Str(a), Value::None) => Ok(Value::str(format!("{a}{}", none_placeholder()))),
        (Value::None, Value::Str(a)) => Ok(Value::str(format!("{}{a}", none_placeholder()))),
        (Value::Str(a), b) => Ok(Value::str(format!("{a}{}", format_value(b, &FormatConfig::default())))),
        (a, Value::Str(b)) => Ok(Value::str(format!("{}{b}", format_value(a, &FormatConfig::default())))),
        _ => numeric_add(l, r),
    }
}

fn numeric_add(l: &Value, r: &Value) -> Result<Value> {
    match promote(l, r)? {
        Promoted::Int(a, b) => Ok(Value::Int(int_result_from_big(
            a.to_bigint() + b.to_bigint(),
            a.rank(),
        ))),
        Promoted::Float(a, b) => Ok(Value::Float(float_binop(a, b, |x, y| x + y, |x, y| x + y))),
    }
}

pub fn subtract(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, subtract)
        }
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, subtract),
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(remove_all(a, b))),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            let rendered = format_value(b, &FormatConfig::default());
            Ok(Value::str(remove_all(a, &rendered)))
        }
        _ => numeric_subtract(l, r),
    }
}

fn remove_all(s: &str, pat: &str) -> String {
    if pat.is_empty() {
        s.to_string()
    } else {
        s.replace(pat, "")
    }
}

fn numeric_subtract(l: &Value, r: &Value) -> Result<Value> {
    match promote(l, r)? {
        Promoted::Int(a, b) => Ok(Value::Int(int_result_from_big(
            a.to_bigint() - b.to_bigint(),
            a.rank(),
        ))),
        Promoted::Float(a, b) => Ok(Value::Float(float_binop(a, b, |x, y| x - y, |x, y| x - y))),
    }
}

pub fn multiply(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, multiply)
        }
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, multiply),
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(char_wise(a, b, |x, y| x.wrapping_mul(y)))),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            Ok(repeat_string(a, b.integer_value()?))
        }
        _ => numeric_multiply(l, r),
    }
}

fn repeat_string(s: &str, n: i64) -> Value {
    if n <= 0 {
        Value::str("")
    } else {
        Value::str(s.repeat(n as usize))
    }
}

fn numeric_multiply(l: &Value, r: &Value) -> Result<Value> {
    match promote(l, r)? {
        Promoted::Int(a, b) => Ok(Value::Int(int_result_from_big(
            a.to_bigint() * b.to_bigint(),
            a.rank(),
        ))),
        Promoted::Float(a, b) => Ok(Value::Float(float_binop(a, b, |x, y| x * y, |x, y| x * y))),
    }
}

pub fn divide(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, divide)
        }
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, divide),
        (Value::Str(a), Value::Str(b)) => Ok(Value::seq(
            a.split(b.as_ref()).map(Value::str).collect(),
        )),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            split_into_parts(a, b.integer_value()?)
        }
        _ => numeric_divide(l, r),
    }
}

fn split_into_parts(s: &str, n: i64) -> Result<Value> {
    if n <= 0 {
        return Ok(Value::seq(vec![]));
    }
    let n = n as usize;
    let chars: Vec<char> = s.chars().collect();
    let base = chars.len() / n;
    let rem = chars.len() % n;
    let mut parts = Vec::with_capacity(n);
    let mut idx = 0;
    for i in 0..n {
        let take = base + usize::from(i < rem);
        let part: String = chars[idx..idx + take].iter().collect();
        idx += take;
        parts.push(Value::str(part));
    }
    Ok(Value::seq(parts))
}

fn numeric_divide(l: &Value, r: &Value) -> Result<Value> {
    use num_integer::Integer;
    match promote(l, r)? {
        Promoted::Int(a, b) => {
            let rank = a.rank().max(b.rank());
            let (a, b) = (a.to_bigint(), b.to_bigint());
            if b.is_zero() {
                return Err(Error::ArithmeticError("integer division by zero"));
            }
            Ok(Value::Int(int_result_from_big(a.div_floor(&b), rank)))
        }
        Promoted::Float(a, b) => Ok(Value::Float(float_binop(a, b, |x, y| x / y, |x, y| x / y))),
    }
}

pub fn modulo(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, modulo)
        }
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, modulo),
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(char_wise(a, b, |x, y| {
            if y == 0 {
                0
            } else {
                x % y
            }
        }))),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            let rendered = format_value(b, &FormatConfig::default());
            Ok(Value::str(char_wise(a, &rendered, |x, y| {
                if y == 0 {
                    0
                } else {
                    x % y
                }
            })))
        }
        _ => numeric_modulo(l, r),
    }
}

fn numeric_modulo(l: &Value, r: &Value) -> Result<Value> {
    use num_integer::Integer;
    match promote(l, r)? {
        Promoted::Int(a, b) => {
            let rank = a.rank().max(b.rank());
            let (a, b) = (a.to_bigint(), b.to_bigint());
            if b.is_zero() {
                return Err(Error::ArithmeticError("integer modulo by zero"));
            }
            Ok(Value::Int(int_result_from_big(a.mod_floor(&b), rank)))
        }
        Promoted::Float(a, b) => Ok(Value::Float(float_binop(
            a,
            b,
            |x, y| x % y,
            |x, y| x % y,
        ))),
    }
}

fn float_binop(
    a: FloatValue,
    b: FloatValue,
    f64_op: impl Fn(f64, f64) -> f64,
    big_op: impl Fn(bigdecimal::BigDecimal, bigdecimal::BigDecimal) -> bigdecimal::BigDecimal,
) -> FloatValue {
    match (a, b) {
        (FloatValue::Big(x), FloatValue::Big(y)) => FloatValue::Big(big_op(x, y)),
        (a, b) => {
            let rank = a.rank().max(b.rank());
            let result = f64_op(a.to_f64(), b.to_f64());
            match rank {
                0 => FloatValue::F32(result as f32),
                _ => FloatValue::F64(result),
            }
        }
    }
}

// --- Element-wise operator aliases (explicit AST ElementOp variants) ---

pub fn element_add(l: &Value, r: &Value) -> Result<Value> {
    dispatch_container_only(l, r, add)
}
pub fn element_subtract(l: &Value, r: &Value) -> Result<Value> {
    dispatch_container_only(l, r, subtract)
}
pub fn element_multiply(l: &Value, r: &Value) -> Result<Value> {
    dispatch_container_only(l, r, multiply)
}
pub fn element_divide(l: &Value, r: &Value) -> Result<Value> {
    dispatch_container_only(l, r, divide)
}
pub fn element_modulo(l: &Value, r: &Value) -> Result<Value> {
    dispatch_container_only(l, r, modulo)
}

fn dispatch_container_only(l: &Value, r: &Value, op: impl Fn(&Value, &Value) -> Result<Value>) -> Result<Value> {
    match (l, r) {
        (Value::Map(_), Value::Map(_)) => element_wise_map(l, r, op),
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => element_wise(l, r, op),
        _ => Err(Error::UnsupportedOperation {
            op: "element_wise",
            left: l.kind(),
            right: Some(r.kind()),
        }),
    }
}

// --- Comparison -----------------------------------------------------

/// `Ok(None)` means the pair is never comparable (`NaN` is involved).
pub fn compare(l: &Value, r: &Value) -> Result<Option<Ordering>> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(None);
    }
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            Ok(sum_of_codepoints(a).partial_cmp(&as_compare_f64(b).unwrap_or(0.0)))
        }
        (a, Value::Str(b)) if a.is_numeric() || matches!(a, Value::None) => {
            Ok(as_compare_f64(a).unwrap_or(0.0).partial_cmp(&sum_of_codepoints(b)))
        }
        (Value::Seq(_) | Value::Tuple(_) | Value::Map(_), _)
        | (_, Value::Seq(_) | Value::Tuple(_) | Value::Map(_)) => Err(Error::UnsupportedOperation {
            op: "compare",
            left: l.kind(),
            right: Some(r.kind()),
        }),
        _ => match promote(
            &coerce_none_to_zero(l),
            &coerce_none_to_zero(r),
        )? {
            Promoted::Int(a, b) => Ok(Some(a.to_bigint().cmp(&b.to_bigint()))),
            Promoted::Float(a, b) => Ok(a.to_f64().partial_cmp(&b.to_f64())),
        },
    }
}

fn coerce_none_to_zero(v: &Value) -> Value {
    match v {
        Value::None => Value::Int(IntValue::I8(0)),
        other => other.clone(),
    }
}

fn as_compare_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(i.to_f64()),
        Value::Float(f) => Some(f.to_f64()),
        Value::Bool(b) => Some(*b as i64 as f64),
        Value::Char(c) => Some(*c as u32 as f64),
        Value::None => Some(0.0),
        _ => None,
    }
}

/// The language-level `equals`, distinct from `Value`'s structural
/// `PartialEq` (§4.1): `None == None`, `NaN` never equals anything
/// including itself, numerics compare by promoted value.
pub fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::NaN, _) | (_, Value::NaN) => false,
        (Value::None, Value::None) => true,
        (Value::None, _) | (_, Value::None) => false,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ if l.is_numeric() && r.is_numeric() => matches!(compare(l, r), Ok(Some(Ordering::Equal))),
        _ => l == r,
    }
}

pub fn equals(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(values_equal(l, r)))
}

pub fn not_equals(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(!values_equal(l, r)))
}

pub fn less_than(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(compare(l, r)?, Some(Ordering::Less))))
}

pub fn less_than_equals(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(
        compare(l, r)?,
        Some(Ordering::Less) | Some(Ordering::Equal)
    )))
}

pub fn greater_than(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(compare(l, r)?, Some(Ordering::Greater))))
}

pub fn greater_than_equals(l: &Value, r: &Value) -> Result<Value> {
    Ok(Value::Bool(matches!(
        compare(l, r)?,
        Some(Ordering::Greater) | Some(Ordering::Equal)
    )))
}

// --- Bitwise ----------------------------------------------------------

fn bitwise_dispatch(
    l: &Value,
    r: &Value,
    name: &'static str,
    big_op: impl Fn(&BigInt, &BigInt) -> BigInt + Copy,
    char_op: impl Fn(u32, u32) -> u32 + Copy,
) -> Result<Value> {
    if matches!(l, Value::NaN) || matches!(r, Value::NaN) {
        return Ok(Value::NaN);
    }
    match (l, r) {
        (Value::Seq(_) | Value::Tuple(_), Value::Seq(_) | Value::Tuple(_)) => {
            element_wise(l, r, |a, b| bitwise_dispatch(a, b, name, big_op, char_op))
        }
        (Value::Map(_), Value::Map(_)) => {
            element_wise_map(l, r, |a, b| bitwise_dispatch(a, b, name, big_op, char_op))
        }
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(char_wise(a, b, char_op))),
        (Value::Str(a), b) if b.is_numeric() || matches!(b, Value::None) => {
            let bi = operand_as_int(b, name)?.to_bigint().to_u32().unwrap_or(0);
            Ok(Value::str(
                a.chars().map(|c| clamp_codepoint(char_op(c as u32, bi))).collect::<String>(),
            ))
        }
        (Value::Float(_), _) | (_, Value::Float(_)) => Err(Error::UnsupportedOperation {
            op: name,
            left: l.kind(),
            right: Some(r.kind()),
        }),
        _ => {
            let li = operand_as_int(l, name)?;
            let ri = operand_as_int(r, name)?;
            let rank = li.rank().max(ri.rank());
            Ok(Value::Int(int_result_from_big(
                big_op(&li.to_bigint(), &ri.to_bigint()),
                rank,
            )))
        }
    }
}

pub fn bit_and(l: &Value, r: &Value) -> Result<Value> {
    bitwise_dispatch(l, r, "bit_and", |a, b| a & b, |a, b| a & b)
}

pub fn bit_or(l: &Value, r: &Value) -> Result<Value> {
    bitwise_dispatch(l, r, "bit_or", |a, b| a | b, |a, b| a | b)
}

pub fn bit_xor(l: &Value, r: &Value) -> Result<Value> {
    bitwise_dispatch(l, r, "bit_xor", |a, b| a ^ b, |a, b| a ^ b)
}

pub fn shift_left(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::Seq(_) | Value::Tuple(_)) {
        return element_wise(l, r, shift_left);
    }
    let li = operand_as_int(l, "shift_left")?;
    let amt = operand_as_int(r, "shift_left")?.to_bigint().to_u32().unwrap_or(0);
    Ok(Value::Int(int_result_from_big(
        li.to_bigint() << amt as usize,
        li.rank(),
    )))
}

pub fn shift_right_arithmetic(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::Seq(_) | Value::Tuple(_)) {
        return element_wise(l, r, shift_right_arithmetic);
    }
    let li = operand_as_int(l, "shift_right_arithmetic")?;
    let amt = operand_as_int(r, "shift_right_arithmetic")?
        .to_bigint()
        .to_u32()
        .unwrap_or(0);
    Ok(Value::Int(int_result_from_big(
        li.to_bigint() >> amt as usize,
        li.rank(),
    )))
}

/// Arbitrary-precision integers have no fixed width, so "logical" shift
/// only has its usual unsigned-bit-pattern meaning for the fixed-width
/// rungs; a `Big` operand falls back to the arithmetic shift.
pub fn shift_right_logical(l: &Value, r: &Value) -> Result<Value> {
    if matches!(l, Value::Seq(_) | Value::Tuple(_)) {
        return element_wise(l, r, shift_right_logical);
    }
    let li = operand_as_int(l, "shift_right_logical")?;
    let amt = operand_as_int(r, "shift_right_logical")?
        .to_bigint()
        .to_u32()
        .unwrap_or(0);
    let result = match li {
        IntValue::I8(v) => IntValue::I8(((v as u8) >> (amt % 8)) as i8),
        IntValue::I16(v) => IntValue::I16(((v as u16) >> (amt % 16)) as i16),
        IntValue::I32(v) => IntValue::I32(((v as u32) >> (amt % 32)) as i32),
        IntValue::I64(v) => IntValue::I64(((v as u64) >> (amt % 64)) as i64),
        IntValue::Big(v) => IntValue::Big(v >> amt as usize),
    };
    Ok(Value::Int(result))
}

// --- Extra arithmetic-family built-ins (§6's surface list exceeds
// §4.2's operator set; these have no dedicated operator token but are
// wired to the same numeric representation). ---------------------------

pub fn pow(l: &Value, r: &Value) -> Result<Value> {
    match promote(l, r)? {
        Promoted::Int(a, b) => match b.to_bigint().to_u32() {
            Some(exp) => Ok(Value::Int(int_result_from_big(a.to_bigint().pow(exp), a.rank()))),
            None => Ok(Value::Float(FloatValue::F64(a.to_f64().powf(b.to_f64())))),
        },
        Promoted::Float(a, b) => Ok(Value::Float(FloatValue::F64(a.to_f64().powf(b.to_f64())))),
    }
}

fn to_int_via(v: &Value, op: &'static str, f: impl Fn(f64) -> f64) -> Result<Value> {
    match v {
        Value::Int(i) => Ok(Value::Int(i.clone())),
        Value::Float(fl) => Ok(Value::Int(IntValue::narrowest(BigInt::from(
            f(fl.to_f64()) as i64,
        )))),
        Value::Bool(b) => Ok(Value::Int(IntValue::I8(*b as i8))),
        Value::Char(c) => Ok(Value::Int(IntValue::I32(*c as i32))),
        Value::None => Ok(Value::Int(IntValue::I8(0))),
        other => Err(Error::UnsupportedOperation {
            op,
            left: other.kind(),
            right: None,
        }),
    }
}

pub fn round(v: &Value) -> Result<Value> {
    to_int_via(v, "round", f64::round)
}

pub fn floor(v: &Value) -> Result<Value> {
    to_int_via(v, "floor", f64::floor)
}

pub fn ceil(v: &Value) -> Result<Value> {
    to_int_via(v, "ceil", f64::ceil)
}

pub fn abs(v: &Value) -> Result<Value> {
    match v {
        Value::Int(i) => Ok(Value::Int(int_result_from_big(i.to_bigint().abs(), i.rank()))),
        Value::Float(f) => Ok(Value::Float(abs_float(f))),
        Value::Bool(b) => Ok(Value::Int(IntValue::I8((*b as i8).abs()))),
        Value::Char(c) => Ok(Value::Int(IntValue::I32((*c as i32).abs()))),
        Value::None => Ok(Value::Int(IntValue::I8(0))),
        other => Err(Error::UnsupportedOperation {
            op: "abs",
            left: other.kind(),
            right: None,
        }),
    }
}

fn abs_float(f: &FloatValue) -> FloatValue {
    match f {
        FloatValue::F32(v) => FloatValue::F32(v.abs()),
        FloatValue::F64(v) => FloatValue::F64(v.abs()),
        FloatValue::Big(v) => FloatValue::Big(v.abs()),
    }
}

pub fn signum(v: &Value) -> Result<Value> {
    match v {
        Value::Int(i) => Ok(Value::Int(IntValue::I8(
            i.to_bigint().signum().to_i8().unwrap_or(0),
        ))),
        Value::Float(f) => {
            if f.is_zero() {
                Ok(Value::Int(IntValue::I8(0)))
            } else {
                Ok(Value::Int(IntValue::I8(if f.to_f64() > 0.0 { 1 } else { -1 })))
            }
        }
        Value::Bool(b) => Ok(Value::Int(IntValue::I8(*b as i8))),
        Value::Char(c) => Ok(Value::Int(IntValue::I8(if *c == '\0' { 0 } else { 1 }))),
        Value::None => Ok(Value::Int(IntValue::I8(0))),
        other => Err(Error::UnsupportedOperation {
            op: "signum",
            left: other.kind(),
            right: None,
        }),
    }
}

pub fn is_zero(v: &Value) -> Result<Value> {
    match v {
        Value::Int(i) => Ok(Value::Bool(i.is_zero())),
        Value::Float(f) => Ok(Value::Bool(f.is_zero())),
        Value::Bool(b) => Ok(Value::Bool(!*b)),
        Value::Char(c) => Ok(Value::Bool(*c == '\0')),
        Value::None => Ok(Value::Bool(true)),
        Value::NaN => Ok(Value::Bool(false)),
        other => Err(Error::UnsupportedOperation {
            op: "is_zero",
            left: other.kind(),
            right: None,
        }),
    }
}

pub fn sqrt(v: &Value) -> Result<Value> {
    let f = match v {
        Value::Int(i) => i.to_f64(),
        Value::Float(f) => f.to_f64(),
        Value::Bool(b) => *b as i64 as f64,
        Value::Char(c) => *c as u32 as f64,
        Value::None => 0.0,
        other => {
            return Err(Error::UnsupportedOperation {
                op: "sqrt",
                left: other.kind(),
                right: None,
            })
        }
    };
    if f.is_nan() {
        return Ok(Value::NaN);
    }
    Ok(Value::Float(FloatValue::F64(f.sqrt())))
}

pub fn max(l: &Value, r: &Value) -> Result<Value> {
    match compare(l, r)? {
        Some(Ordering::Less) => Ok(r.clone()),
        Some(_) => Ok(l.clone()),
        None => Ok(Value::NaN),
    }
}

pub fn min(l: &Value, r: &Value) -> Result<Value> {
    match compare(l, r)? {
        Some(Ordering::Greater) => Ok(r.clone()),
        Some(_) => Ok(l.clone()),
        None => Ok(Value::NaN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_concatenation() {
        let v = add(&Value::str("hi "), &Value::str("there")).unwrap();
        assert_eq!(v, Value::str("hi there"));
    }

    #[test]
    fn none_is_zero_in_arithmetic() {
        let v = add(&Value::None, &Value::Int(IntValue::I8(5))).unwrap();
        assert_eq!(v, Value::Int(IntValue::I8(5)));
    }

    #[test]
    fn nan_propagates_through_add() {
        assert!(matches!(add(&Value::NaN, &Value::Int(IntValue::I8(5))).unwrap(), Value::NaN));
    }

    #[test]
    fn nan_never_equals_itself() {
        assert!(!values_equal(&Value::NaN, &Value::NaN));
    }

    #[test]
    fn none_equals_none() {
        assert!(values_equal(&Value::None, &Value::None));
    }

    #[test]
    fn integer_division_by_zero_raises() {
        let err = divide(&Value::Int(IntValue::I8(1)), &Value::Int(IntValue::I8(0)));
        assert!(matches!(err, Err(Error::ArithmeticError(_))));
    }

    #[test]
    fn float_division_by_zero_is_infinity_not_an_error() {
        let v = divide(
            &Value::Float(FloatValue::F64(1.0)),
            &Value::Float(FloatValue::F64(0.0)),
        )
        .unwrap();
        assert!(matches!(v, Value::Float(FloatValue::F64(f)) if f.is_infinite()));
    }

    #[test]
    fn element_wise_add_requires_matching_length() {
        let a = Value::seq(vec![Value::Int(IntValue::I8(1))]);
        let b = Value::seq(vec![Value::Int(IntValue::I8(1)), Value::Int(IntValue::I8(2))]);
        assert!(element_add(&a, &b).is_err());
    }

    #[test]
    fn element_wise_add_sums_pairwise() {
        let a = Value::seq(vec![Value::Int(IntValue::I8(1)), Value::Int(IntValue::I8(2))]);
        let b = Value::seq(vec![Value::Int(IntValue::I8(10)), Value::Int(IntValue::I8(20))]);
        let sum = element_add(&a, &b).unwrap();
        assert_eq!(
            sum,
            Value::seq(vec![Value::Int(IntValue::I8(11)), Value::Int(IntValue::I8(22))])
        );
    }

    #[test]
    fn string_multiply_repeats() {
        let v = multiply(&Value::str("ab"), &Value::Int(IntValue::I8(3))).unwrap();
        assert_eq!(v, Value::str("ababab"));
    }

    #[test]
    fn negative_repeat_is_empty_string() {
        let v = multiply(&Value::str("ab"), &Value::Int(IntValue::I8(-1))).unwrap();
        assert_eq!(v, Value::str(""));
    }

    #[test]
    fn bitwise_on_float_is_unsupported() {
        let err = bit_and(&Value::Float(FloatValue::F64(1.0)), &Value::Int(IntValue::I8(1)));
        assert!(matches!(err, Err(Error::UnsupportedOperation { .. })));
    }

    #[test]
    fn comparison_between_sequences_is_unsupported() {
        let err = compare(&Value::seq(vec![]), &Value::seq(vec![]));
        assert!(err.is_err());
    }

    #[test]
    fn pow_of_small_ints_stays_in_the_int_tower() {
        let v = pow(&Value::Int(IntValue::I8(2)), &Value::Int(IntValue::I8(10))).unwrap();
        assert_eq!(v, Value::Int(IntValue::I16(1024)));
    }

    #[test]
    fn max_picks_the_larger_operand() {
        let v = max(&Value::Int(IntValue::I8(2)), &Value::Int(IntValue::I8(9))).unwrap();
        assert_eq!(v, Value::Int(IntValue::I8(9)));
    }

    #[test]
    fn is_zero_treats_none_as_zero_and_nan_as_not() {
        assert_eq!(is_zero(&Value::None).unwrap(), Value::Bool(true));
        assert_eq!(is_zero(&Value::NaN).unwrap(), Value::Bool(false));
    }
}
