//! # Resumable Function Compiler
//!
//! Rewrites generator and async functions into plain functions driven by an
//! explicit dispatch loop, so the output runs on engines without native
//! suspension.
//!
//! ## Pipeline
//!
//! 1. **Parse**: oxc parses the source; the tree is lowered into an arena of
//!    [`ast::NodeKind`] nodes addressed by [`ast::NodeId`].
//! 2. **Annotate**: every scope-opening node records the names it binds, so
//!    later rewrites can respect shadowing.
//! 3. **Hoist**: declarations inside a resumable function become assignments
//!    and the names move into one function-level `var`.
//! 4. **Emit**: the body is flattened into a listing of statements, cut at
//!    every resumption point into the cases of one `switch`.
//! 5. **Print**: the arena is serialized back to JavaScript.
//!
//! ## Invariants
//!
//! 1. **One parent per node**: every generated node is freshly allocated; no
//!    node id appears in two child slots.
//! 2. **Per-run state**: analysis memos, scope tables and name reservations
//!    belong to one compile and are dropped with it.
//! 3. **All-or-nothing**: a function that cannot be exploded fails the whole
//!    compile with a coded diagnostic; nothing is emitted half-transformed.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod ast;
pub mod codegen;
pub mod emit;
pub mod hoist;
pub mod leap;
pub mod meta;
pub mod options;
pub mod parse;
pub mod scope;
pub mod transform;
mod validate;
pub mod visitor;

#[cfg(test)]
mod codegen_tests;
#[cfg(test)]
mod emit_tests;
#[cfg(test)]
mod hoist_tests;

pub use options::{CompileOptions, SourceKind};
pub use transform::{compile, compile_batch, CompileOutput, TransformContext};
pub use validate::*;

// ═══════════════════════════════════════════════════════════════════════════════
// NODE BINDING
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
fn options_from_json(options_json: Option<String>) -> napi::Result<CompileOptions> {
    match options_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| napi::Error::from_reason(format!("Invalid options: {}", e))),
        None => Ok(CompileOptions::default()),
    }
}

#[cfg(feature = "napi")]
fn result_to_json(result: Result<CompileOutput, CompilerError>) -> napi::Result<serde_json::Value> {
    let value = match result {
        Ok(output) => serde_json::json!({ "ok": true, "output": output }),
        Err(error) => serde_json::json!({ "ok": false, "error": error }),
    };
    Ok(value)
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_source(source: String, options_json: Option<String>) -> napi::Result<serde_json::Value> {
    let options = options_from_json(options_json)?;
    result_to_json(compile(&source, &options))
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_batch(
    sources: Vec<String>,
    options_json: Option<String>,
) -> napi::Result<Vec<serde_json::Value>> {
    let options = options_from_json(options_json)?;
    compile_batch(&sources, &options).into_iter().map(result_to_json).collect()
}
