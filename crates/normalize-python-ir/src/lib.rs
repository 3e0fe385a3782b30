//! Normalize Python syntax trees into a declaration IR.
//!
//! `normalize-python-ir` turns a parsed Python module into an ordered tree of
//! declaration records (assignments, annotated assignments, functions,
//! classes, attribute accesses, decorators) whose expressions are resolved to
//! literal values where possible and kept as source text where not.
//!
//! # Architecture
//!
//! ```text
//! Source              Host tree           Declaration IR
//! ──────────    ──────────────────    ──────────────────────
//! .py file  ─>  input::read_python ─>  Normalizer::normalize ─> Vec<Declaration>
//!                  (ast::Module)          │
//!                                         ├─ literal   expr -> LiteralValue
//!                                         ├─ operator  BinOp/BoolOp -> "a + b"
//!                                         ├─ signature Arguments -> Signature
//!                                         └─ unparse   anything else -> source
//! ```
//!
//! # Example
//!
//! ```ignore
//! use normalize_python_ir::{Normalizer, input};
//!
//! let module = input::read_python("TIMEOUT = 3 * 4")?;
//! let decls = Normalizer::default().normalize(&module);
//! // => [ASSIGN names=["TIMEOUT"] value=raw("3 * 4")]
//! ```
//!
//! Nothing is evaluated: `3 * 4` stays `"3 * 4"`, names stay references, and
//! any construct without a dedicated rule comes through as an `UNKNOWN`
//! record instead of an error.

pub mod ast;
pub mod classify;
pub mod config;
pub mod docstring;
pub mod error;
pub mod ir;
pub mod literal;
pub mod operator;
pub mod signature;
pub mod traits;
pub mod unparse;

pub mod input;

// Re-exports: IR types
pub use ir::{
    Declaration, DeclarationKind, LiteralValue, Number, Parameter, ParameterRole, Signature,
};

// Re-exports: core
pub use classify::Normalizer;
pub use config::{ConfigError, NormalizeConfig};
pub use error::NormalizeError;
pub use traits::{ReadError, Reader};
