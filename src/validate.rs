#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const INV_WITH_STATEMENT: &str = "RG-INPUT-001";
pub const INV_UNRESOLVED_JUMP: &str = "RG-INPUT-002";
pub const INV_UNHOISTED_DECLARATION: &str = "RG-INPUT-003";
pub const INV_UNSUPPORTED: &str = "RG-INPUT-004";
pub const INV_ENTRY_MISMATCH: &str = "RG-INTERNAL-001";
pub const INV_LOCATION: &str = "RG-INTERNAL-002";
pub const INV_COMPLETION_RECORD: &str = "RG-INTERNAL-003";
pub const INV_PARSE: &str = "RG-PARSE-001";
pub const INV_CONFIG: &str = "RG-CONFIG-001";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        INV_WITH_STATEMENT => "Transformed functions never contain dynamic scope.",
        INV_UNRESOLVED_JUMP => {
            "Every break and continue resolves to an enclosing loop, switch or label."
        }
        INV_UNHOISTED_DECLARATION => "Declarations are hoisted before the body is exploded.",
        INV_UNSUPPORTED => "Only constructs the dispatch loop can resume are transformed.",
        INV_ENTRY_MISMATCH => "Control-transfer entries are released in the order they were acquired.",
        INV_LOCATION => "Every jump location is bound to exactly one listing offset.",
        INV_COMPLETION_RECORD => "Abrupt completions always carry a valid target or value.",
        INV_PARSE => "Only syntactically valid sources are transformed.",
        INV_CONFIG => "Generated names are valid, non-reserved identifiers.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Hard failures of the pass. None of these are recoverable: a function that
/// cannot be exploded is never emitted half-transformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("`with` statements cannot be transformed")]
    WithStatement { at: u32 },

    #[error("`{keyword}` has no matching enclosing {target}")]
    UnresolvedJump { keyword: &'static str, target: String, at: u32 },

    #[error("declaration reached the emitter without being hoisted")]
    UnhoistedDeclaration { at: u32 },

    #[error("unsupported construct: {what}")]
    Unsupported { what: String, at: u32 },

    #[error("control-transfer entry popped out of order (expected #{expected}, found {found})")]
    EntryMismatch { expected: u32, found: String },

    #[error("location error: {0}")]
    Location(String),

    #[error("malformed completion record: {0}")]
    CompletionRecord(String),

    #[error("{message}")]
    Parse { message: String, at: u32 },

    #[error("invalid option `{name}`: {reason}")]
    Config { name: &'static str, reason: String },
}

impl TransformError {
    pub fn unsupported(what: impl Into<String>, at: u32) -> Self {
        TransformError::Unsupported { what: what.into(), at }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TransformError::WithStatement { .. } => INV_WITH_STATEMENT,
            TransformError::UnresolvedJump { .. } => INV_UNRESOLVED_JUMP,
            TransformError::UnhoistedDeclaration { .. } => INV_UNHOISTED_DECLARATION,
            TransformError::Unsupported { .. } => INV_UNSUPPORTED,
            TransformError::EntryMismatch { .. } => INV_ENTRY_MISMATCH,
            TransformError::Location(_) => INV_LOCATION,
            TransformError::CompletionRecord(_) => INV_COMPLETION_RECORD,
            TransformError::Parse { .. } => INV_PARSE,
            TransformError::Config { .. } => INV_CONFIG,
        }
    }

    /// Byte offset into the source, when the failure is tied to a node.
    pub fn offset(&self) -> Option<u32> {
        match self {
            TransformError::WithStatement { at }
            | TransformError::UnresolvedJump { at, .. }
            | TransformError::UnhoistedDeclaration { at }
            | TransformError::Unsupported { at, .. }
            | TransformError::Parse { at, .. } => Some(*at),
            _ => None,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            TransformError::EntryMismatch { .. }
            | TransformError::Location(_)
            | TransformError::CompletionRecord(_) => "COMPILER_INTERNAL_ERROR",
            TransformError::Parse { .. } => "SYNTAX_ERROR",
            TransformError::Config { .. } => "CONFIGURATION_ERROR",
            _ => "INPUT_VALIDATION_FAILURE",
        }
    }

    pub fn to_compiler_error(&self, source: &str, file: &str) -> CompilerError {
        let (line, column) = self.offset().map(|at| line_column(source, at)).unwrap_or((0, 0));
        let context = source_line(source, line);
        let mut error = CompilerError::with_details(
            self.code(),
            &self.to_string(),
            file,
            line,
            column,
            context,
            self.hints(),
        );
        error.error_type = self.error_type().to_string();
        error
    }

    fn hints(&self) -> Vec<String> {
        match self {
            TransformError::WithStatement { .. } => {
                vec!["Replace the `with` block with explicit property access.".to_string()]
            }
            TransformError::Unsupported { .. } => {
                vec!["Move the construct out of the generator or async function.".to_string()]
            }
            TransformError::Config { .. } => {
                vec!["Runtime and prefix names must be plain JavaScript identifiers.".to_string()]
            }
            _ => vec![],
        }
    }
}

/// 1-based line and column of a byte offset.
pub fn line_column(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() as u32 + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() as u32 + 1,
        None => before.chars().count() as u32 + 1,
    };
    (line, column)
}

/// The text of 1-based `line`, if the source has it.
fn source_line(source: &str, line: u32) -> Option<String> {
    let index = (line as usize).checked_sub(1)?;
    source.lines().nth(index).map(|text| text.trim_end().to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        line: u32,
        column: u32,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            error_type: "INPUT_VALIDATION_FAILURE".to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            line,
            column,
            context,
            hints,
        }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({}:{}:{})", self.code, self.message, self.file, self.line, self.column)
    }
}

impl std::error::Error for CompilerError {}
