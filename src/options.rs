//! Compile options
//!
//! Names injected into generated code are configurable so the output can be
//! linked against a differently named runtime object.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::validate::TransformError;

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();

    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for word in [
            "break", "case", "catch", "class", "const", "continue", "debugger", "default",
            "delete", "do", "else", "export", "extends", "false", "finally", "for", "function",
            "if", "import", "in", "instanceof", "new", "null", "return", "super", "switch",
            "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
            "let", "static", "enum", "await", "implements", "package", "protected",
            "interface", "private", "public", "arguments", "eval",
        ] {
            s.insert(word);
        }
        s
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Module,
    Script,
    Typescript,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Global the generated code calls into (`mark`, `async`, `awrap`, `keys`, `values`).
    pub runtime_name: String,
    /// Parameter name of every dispatch function; suffixed when it would collide.
    pub context_name: String,
    /// Prefix of every compiler-generated binding.
    pub name_prefix: String,
    pub source_type: SourceKind,
    /// File name reported in diagnostics.
    pub file_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            runtime_name: "resyncRuntime".to_string(),
            context_name: "context".to_string(),
            name_prefix: "_rs_".to_string(),
            source_type: SourceKind::Module,
            file_name: "input.js".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn validate(&self) -> Result<(), TransformError> {
        check_identifier("runtimeName", &self.runtime_name)?;
        check_identifier("contextName", &self.context_name)?;
        // A prefix is only ever used with a suffix, so it just has to start a name.
        if !IDENT_RE.is_match(&format!("{}x", self.name_prefix)) {
            return Err(TransformError::Config {
                name: "namePrefix",
                reason: format!("`{}` cannot start an identifier", self.name_prefix),
            });
        }
        Ok(())
    }
}

fn check_identifier(name: &'static str, value: &str) -> Result<(), TransformError> {
    if !IDENT_RE.is_match(value) {
        return Err(TransformError::Config {
            name,
            reason: format!("`{}` is not an identifier", value),
        });
    }
    if RESERVED_WORDS.contains(value) {
        return Err(TransformError::Config {
            name,
            reason: format!("`{}` is a reserved word", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = CompileOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.runtime_name, "resyncRuntime");
        assert_eq!(options.name_prefix, "_rs_");
    }

    #[test]
    fn test_rejects_reserved_and_malformed_names() {
        let mut options = CompileOptions::default();
        options.context_name = "this".to_string();
        assert!(matches!(
            options.validate(),
            Err(TransformError::Config { name: "contextName", .. })
        ));

        let mut options = CompileOptions::default();
        options.runtime_name = "my-runtime".to_string();
        assert!(options.validate().is_err());

        let mut options = CompileOptions::default();
        options.name_prefix = "9".to_string();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_deserializes_camel_case_with_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{"runtimeName":"regeneratorRuntime","sourceType":"script"}"#)
                .unwrap();
        assert_eq!(options.runtime_name, "regeneratorRuntime");
        assert_eq!(options.source_type, SourceKind::Script);
        assert_eq!(options.context_name, "context");
    }
}
