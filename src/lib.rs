//! Core evaluator for the Naftah scripting language.
//!
//! This crate is the back half of an embeddable tree-walking
//! interpreter: given an AST built from the node set in `ast`, it
//! evaluates it against a dynamically-typed value model with automatic
//! numeric promotion, lexical scoping, and a bridge for exposing host
//! (native) functions to scripts. It does not include a parser — front
//! ends build `ast::Node` trees directly.

pub mod ast;
pub mod bridge;
pub mod builtins;
pub mod context;
pub mod error;
pub mod eval;
pub mod function;
pub mod ops;
pub mod value;

pub use error::{Error, Result};
pub use eval::Interpreter;
