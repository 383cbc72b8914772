// Value model & numeric tower (spec §3, §4.1 / component C1).
//
// `Value` is a tagged sum. Numeric variants live in a small tower of
// their own (`IntValue`, `FloatValue`) so that promotion can be written
// as ordinary pattern matches over a handful of variants instead of a
// 5x5 table hand-rolled against `Value` itself.

use std::cell::RefCell;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::function::FuncHandle;

/// The narrowest-fitting rung of the integer tower currently occupied by
/// a value. Arithmetic promotes upward per §4.1; it is never demoted.
#[derive(Clone, Debug)]
pub enum IntValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Big(BigInt),
}

/// The narrowest-fitting rung of the decimal tower.
#[derive(Clone, Debug)]
pub enum FloatValue {
    F32(f32),
    F64(f64),
    Big(BigDecimal),
}

/// A reference to a host-owned object, opaque to the interpreter except
/// for its type tag. Produced and consumed only by the native bridge
/// (C6); the evaluator never inspects `inner` directly.
#[derive(Clone)]
pub struct WrappedValue {
    pub tag: &'static str,
    pub inner: Rc<dyn std::any::Any>,
}

impl fmt::Debug for WrappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrapped({})", self.tag)
    }
}

/// The tagged value type that flows through every part of the evaluator.
#[derive(Clone, Debug)]
pub enum Value {
    /// Singleton "absence" marker, distinct from an unset binding.
    None,
    /// Singleton non-number marker. Never equal to anything, including
    /// itself.
    NaN,
    Bool(bool),
    /// A single Unicode scalar value; arithmetic treats it as its code
    /// point.
    Char(char),
    Int(IntValue),
    Float(FloatValue),
    Str(Rc<str>),
    /// Ordered, resizable sequence.
    Seq(Rc<RefCell<Vec<Value>>>),
    /// Fixed-arity immutable sequence. "Immutable" binds the language
    /// surface only — the native bridge may rebind cells during
    /// write-back (§4.6).
    Tuple(Rc<RefCell<Vec<Value>>>),
    /// Insertion-ordered mapping.
    Map(Rc<RefCell<IndexMap<Value, Value>>>),
    Func(FuncHandle),
    Wrapped(WrappedValue),
}

/// The discriminant of a `Value`, used by error messages and the
/// best-overload scorer (§4.5) where only the shape, not the payload,
/// matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    None,
    NaN,
    Bool,
    Char,
    Int,
    Float,
    Str,
    Seq,
    Tuple,
    Map,
    Func,
    Wrapped,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::None => Kind::None,
            Value::NaN => Kind::NaN,
            Value::Bool(_) => Kind::Bool,
            Value::Char(_) => Kind::Char,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Seq(_) => Kind::Seq,
            Value::Tuple(_) => Kind::Tuple,
            Value::Map(_) => Kind::Map,
            Value::Func(_) => Kind::Func,
            Value::Wrapped(_) => Kind::Wrapped,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Char(_)
        )
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn seq(items: Vec<Value>) -> Value {
        Value::Seq(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(RefCell::new(items)))
    }

    pub fn pair(a: Value, b: Value) -> Value {
        Value::tuple(vec![a, b])
    }

    pub fn triple(a: Value, b: Value, c: Value) -> Value {
        Value::tuple(vec![a, b, c])
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in entries {
            m.insert(k, v);
        }
        Value::Map(Rc::new(RefCell::new(m)))
    }

    /// Truthiness per §4.1: `None`, `NaN`, `false`, zero, empty string /
    /// sequence / tuple / map, and the NUL character are falsy; every
    /// other value is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::NaN => false,
            Value::Bool(b) => *b,
            Value::Char(c) => *c != '\0',
            Value::Int(i) => !i.is_zero(),
            Value::Float(f) => !f.is_zero(),
            Value::Str(s) => !s.is_empty(),
            Value::Seq(v) => !v.borrow().is_empty(),
            Value::Tuple(v) => !v.borrow().is_empty(),
            Value::Map(m) => !m.borrow().is_empty(),
            Value::Func(_) => true,
            Value::Wrapped(_) => true,
        }
    }

    /// Treats booleans and characters as integers, per §4.1 rule 3.
    /// Returns `None` for anything that is not itself numeric.
    pub fn as_int_value(&self) -> Option<IntValue> {
        match self {
            Value::Int(i) => Some(i.clone()),
            Value::Bool(b) => Some(IntValue::I8(*b as i8)),
            Value::Char(c) => Some(IntValue::I32(*c as i32)),
            _ => None,
        }
    }

    pub fn as_float_value(&self) -> Option<FloatValue> {
        match self {
            Value::Float(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// Best-effort integer extraction used by e.g. string-repeat /
    /// string-split-count operators (§4.2), which need a plain `i64`-ish
    /// count rather than a tower value.
    /// The normative user-facing rendering (§4.6), used by `print` and
    /// string interpolation. Distinct from `debug_form` so program output
    /// and tracing diagnostics can never be confused for one another.
    pub fn display(&self, cfg: &crate::bridge::FormatConfig) -> String {
        crate::bridge::format_value(self, cfg)
    }

    /// A `Debug`-style structural dump for `tracing` events only; never
    /// shown to a running program.
    pub fn debug_form(&self) -> String {
        format!("{self:?}")
    }

    pub fn integer_value(&self) -> Result<i64> {
        match self.as_int_value() {
            Some(IntValue::I8(v)) => Ok(v as i64),
            Some(IntValue::I16(v)) => Ok(v as i64),
            Some(IntValue::I32(v)) => Ok(v as i64),
            Some(IntValue::I64(v)) => Ok(v),
            Some(IntValue::Big(v)) => v
                .to_i64()
                .ok_or(Error::ArithmeticError("big integer does not fit in i64")),
            None => match self {
                Value::Float(f) => Ok(f.to_f64().round() as i64),
                Value::None | Value::NaN => Ok(0),
                other => Err(Error::UnsupportedOperation {
                    op: "integer_value",
                    left: other.kind(),
                    right: None,
                }),
            },
        }
    }
}

// --- Structural equality & hashing, for use as map keys / in assertions.
//
// This is deliberately *not* the language-level `equals` operator (see
// ops.rs `values_equal`, which encodes §4.1's NaN/None rules). Storage
// only needs a reflexive, transitive equality so `IndexMap<Value,
// Value>` behaves; the falsy-`NaN`-never-equal-itself rule is a language
// semantic layered on top in ops.rs, not a property of Rust's `Eq`.

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (None, None) => true,
            (NaN, NaN) => true,
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Seq(a), Seq(b)) => *a.borrow() == *b.borrow(),
            (Tuple(a), Tuple(b)) => *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => *a.borrow() == *b.borrow(),
            (Func(a), Func(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Wrapped(a), Wrapped(b)) => Rc::ptr_eq(&a.inner, &b.inner),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None | Value::NaN => {}
            Value::Bool(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Int(i) => i.canonical_string().hash(state),
            Value::Float(f) => f.canonical_string().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Seq(v) => v.borrow().iter().for_each(|x| x.hash(state)),
            Value::Tuple(v) => v.borrow().iter().for_each(|x| x.hash(state)),
            Value::Map(m) => {
                for (k, v) in m.borrow().iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Func(f) => (Rc::as_ptr(&f.0) as usize).hash(state),
            Value::Wrapped(w) => (Rc::as_ptr(&w.inner) as *const () as usize).hash(state),
        }
    }
}

impl PartialEq for IntValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_bigint() == other.to_bigint()
    }
}
impl Eq for IntValue {}

impl PartialEq for FloatValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_f64() == other.to_f64()
    }
}

impl IntValue {
    pub fn is_zero(&self) -> bool {
        match self {
            IntValue::I8(v) => *v == 0,
            IntValue::I16(v) => *v == 0,
            IntValue::I32(v) => *v == 0,
            IntValue::I64(v) => *v == 0,
            IntValue::Big(v) => v.is_zero(),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            IntValue::I8(v) => BigInt::from(*v),
            IntValue::I16(v) => BigInt::from(*v),
            IntValue::I32(v) => BigInt::from(*v),
            IntValue::I64(v) => BigInt::from(*v),
            IntValue::Big(v) => v.clone(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            IntValue::I8(v) => *v as f64,
            IntValue::I16(v) => *v as f64,
            IntValue::I32(v) => *v as f64,
            IntValue::I64(v) => *v as f64,
            IntValue::Big(v) => v.to_f64().unwrap_or(f64::INFINITY),
        }
    }

    fn canonical_string(&self) -> String {
        self.to_bigint().to_string()
    }

    /// Rank in the tower; higher promotes lower (§4.1 rule 2).
    pub fn rank(&self) -> u8 {
        match self {
            IntValue::I8(_) => 0,
            IntValue::I16(_) => 1,
            IntValue::I32(_) => 2,
            IntValue::I64(_) => 3,
            IntValue::Big(_) => 4,
        }
    }

    /// Narrowest rung that losslessly holds `n`, per §4.1's literal
    /// parsing rule.
    pub fn narrowest(n: BigInt) -> IntValue {
        if let Some(v) = n.to_i64() {
            if let Ok(v8) = i8::try_from(v) {
                return IntValue::I8(v8);
            }
            if let Ok(v16) = i16::try_from(v) {
                return IntValue::I16(v16);
            }
            if let Ok(v32) = i32::try_from(v) {
                return IntValue::I32(v32);
            }
            return IntValue::I64(v);
        }
        IntValue::Big(n)
    }
}

impl FloatValue {
    pub fn is_zero(&self) -> bool {
        match self {
            FloatValue::F32(v) => *v == 0.0,
            FloatValue::F64(v) => *v == 0.0,
            FloatValue::Big(v) => v.is_zero(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            FloatValue::F32(v) => *v as f64,
            FloatValue::F64(v) => *v,
            FloatValue::Big(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn to_big_decimal(&self) -> BigDecimal {
        match self {
            FloatValue::F32(v) => {
                BigDecimal::from_f64(*v as f64).unwrap_or_else(BigDecimal::default)
            }
            FloatValue::F64(v) => BigDecimal::from_f64(*v).unwrap_or_else(BigDecimal::default),
            FloatValue::Big(v) => v.clone(),
        }
    }

    fn canonical_string(&self) -> String {
        match self {
            FloatValue::F32(v) => v.to_string(),
            FloatValue::F64(v) => v.to_string(),
            FloatValue::Big(v) => v.to_string(),
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            FloatValue::F32(_) => 0,
            FloatValue::F64(_) => 1,
            FloatValue::Big(_) => 2,
        }
    }
}

/// Promotion lattice for two numeric operands (§4.1).
///
/// Booleans and characters are folded to integers first. If either side
/// is floating point, the result is floating point, widened to the
/// wider float rung present. Otherwise both sides are integral: widen to
/// the wider rung, and escalate to arbitrary precision if a 64-bit
/// operation would overflow (checked by the caller, since only the
/// caller knows which operator is being applied).
#[derive(Clone, Debug)]
pub enum Promoted {
    Int(IntValue, IntValue),
    Float(FloatValue, FloatValue),
}

pub fn promote(a: &Value, b: &Value) -> Result<Promoted> {
    let fa = a.as_float_value();
    let fb = b.as_float_value();

    if fa.is_some() || fb.is_some() {
        let fa = fa.unwrap_or_else(|| match a.as_int_value() {
            Some(i) => FloatValue::F64(i.to_f64()),
            None => FloatValue::F64(0.0),
        });
        let fb = fb.unwrap_or_else(|| match b.as_int_value() {
            Some(i) => FloatValue::F64(i.to_f64()),
            None => FloatValue::F64(0.0),
        });
        let rank = fa.rank().max(fb.rank());
        return Ok(Promoted::Float(
            widen_float(fa, rank),
            widen_float(fb, rank),
        ));
    }

    let ia = a
        .as_int_value()
        .ok_or(Error::UnsupportedOperation {
            op: "promote",
            left: a.kind(),
            right: Some(b.kind()),
        })?;
    let ib = b
        .as_int_value()
        .ok_or(Error::UnsupportedOperation {
            op: "promote",
            left: a.kind(),
            right: Some(b.kind()),
        })?;
    let rank = ia.rank().max(ib.rank());
    Ok(Promoted::Int(widen_int(ia, rank), widen_int(ib, rank)))
}

fn widen_int(v: IntValue, rank: u8) -> IntValue {
    if v.rank() >= rank {
        return v;
    }
    match rank {
        1 => IntValue::I16(match v {
            IntValue::I8(x) => x as i16,
            other => other.to_bigint().to_i64().unwrap_or_default() as i16,
        }),
        2 => IntValue::I32(v.to_bigint().to_i64().unwrap_or_default() as i32),
        3 => IntValue::I64(v.to_bigint().to_i64().unwrap_or_default()),
        4 => IntValue::Big(v.to_bigint()),
        _ => v,
    }
}

fn widen_float(v: FloatValue, rank: u8) -> FloatValue {
    if v.rank() >= rank {
        return v;
    }
    match rank {
        1 => FloatValue::F64(v.to_f64()),
        2 => FloatValue::Big(v.to_big_decimal()),
        _ => v,
    }
}

/// Narrows an integer arithmetic result back down, starting no narrower
/// than `rung` (the rung the operands were promoted to) and widening one
/// step at a time until it fits, only escalating to arbitrary precision
/// once it would not even fit in 64 bits (§4.1: "overflow that would
/// escape 64-bit promotes both to arbitrary precision").
pub fn int_result_from_big(result: BigInt, rung: u8) -> IntValue {
    if rung == 0 {
        if let Some(v) = result.to_i8() {
            return IntValue::I8(v);
        }
    }
    if rung <= 1 {
        if let Some(v) = result.to_i16() {
            return IntValue::I16(v);
        }
    }
    if rung <= 2 {
        if let Some(v) = result.to_i32() {
            return IntValue::I32(v);
        }
    }
    if rung <= 3 {
        if let Some(v) = result.to_i64() {
            return IntValue::I64(v);
        }
    }
    IntValue::Big(result)
}

/// Parses a numeric literal per §4.1: narrowest integer rung first (no
/// decimal point, no exponent), falling back to the float tower
/// otherwise. `±∞` is rejected; a literal that parses to `NaN` becomes
/// `Value::NaN`.
pub fn parse_numeric_literal(text: &str) -> Result<Value> {
    let looks_float = text.contains('.') || text.contains('e') || text.contains('E');
    if !looks_float {
        if let Ok(n) = text.parse::<BigInt>() {
            return Ok(Value::Int(IntValue::narrowest(n)));
        }
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(Value::NaN),
        Ok(v) if v.is_infinite() => Err(Error::ParseError(format!(
            "numeric literal `{text}` overflows to infinity"
        ))),
        Ok(v) => {
            if let Ok(v32) = text.parse::<f32>() {
                if (v32 as f64 - v).abs() < f64::EPSILON {
                    return Ok(Value::Float(FloatValue::F32(v32)));
                }
            }
            Ok(Value::Float(FloatValue::F64(v)))
        }
        Err(_) => text
            .parse::<BigDecimal>()
            .map(|d| Value::Float(FloatValue::Big(d)))
            .map_err(|_| Error::ParseError(format!("invalid numeric literal `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_picks_narrowest_int_rung() {
        assert!(matches!(
            parse_numeric_literal("5").unwrap(),
            Value::Int(IntValue::I8(5))
        ));
        assert!(matches!(
            parse_numeric_literal("200").unwrap(),
            Value::Int(IntValue::I16(200))
        ));
        assert!(matches!(
            parse_numeric_literal("99999999999999999999").unwrap(),
            Value::Int(IntValue::Big(_))
        ));
    }

    #[test]
    fn literal_nan_becomes_nan_value() {
        assert!(matches!(parse_numeric_literal("NaN").unwrap(), Value::NaN));
    }

    #[test]
    fn infinite_literal_is_an_error() {
        assert!(parse_numeric_literal("1e400").is_err());
    }

    #[test]
    fn truthiness_table() {
        assert!(!Value::None.truthy());
        assert!(!Value::NaN.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Int(IntValue::I8(0)).truthy());
        assert!(!Value::str("").truthy());
        assert!(!Value::seq(vec![]).truthy());
        assert!(!Value::Char('\0').truthy());
        assert!(Value::Bool(true).truthy());
        assert!(Value::str("x").truthy());
    }

    #[test]
    fn promotion_prefers_float_and_widest_rung() {
        let a = Value::Int(IntValue::I8(2));
        let b = Value::Float(FloatValue::F64(3.0));
        match promote(&a, &b).unwrap() {
            Promoted::Float(FloatValue::F64(_), FloatValue::F64(_)) => {}
            other => panic!("expected promotion to f64 pair, got {other:?}"),
        }
    }
}
