//! Compilation units and the JSON interchange format
//!
//! The front-end is external: parser output reaches this crate as a JSON
//! document listing the declared variables followed by the program body.
//!
//! ```json
//! {
//!   "variables": [ { "name": "x", "type": "int" } ],
//!   "body": { "Assign": { "target": 0, "value": { "Int": 5 } } }
//! }
//! ```
//!
//! Variable identifiers are assigned in declaration order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ast::{Stmt, VarId};
use crate::symbols::{Context, Width};
use crate::{PlumeError, Result};

/// A compilation unit: one flat program body and its context
#[derive(Debug, Clone)]
pub struct Program {
    pub context: Context,
    pub body: Stmt,
}

/// Declared variable type in the interchange document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclType {
    Int,
    Bool,
}

impl From<DeclType> for Width {
    fn from(ty: DeclType) -> Self {
        match ty {
            DeclType::Int => Width::I32,
            DeclType::Bool => Width::I1,
        }
    }
}

impl From<Width> for DeclType {
    fn from(width: Width) -> Self {
        match width {
            Width::I1 => DeclType::Bool,
            Width::I32 => DeclType::Int,
        }
    }
}

/// A variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclType,
}

/// Serialized form of a [`Program`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDocument {
    #[serde(default)]
    pub variables: Vec<Declaration>,
    pub body: Stmt,
}

impl Program {
    pub fn new(context: Context, body: Stmt) -> Self {
        Self { context, body }
    }

    /// Parse a JSON interchange document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: ProgramDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Build a program from a deserialized document, checking that every
    /// variable handle in the body was declared.
    pub fn from_document(document: ProgramDocument) -> Result<Self> {
        let mut context = Context::new();
        let mut seen = HashSet::new();

        for decl in &document.variables {
            if !seen.insert(decl.name.as_str()) {
                return Err(PlumeError::Interchange {
                    message: format!("variable '{}' declared twice", decl.name),
                });
            }
            context.declare(&decl.name, decl.ty.into());
        }

        for id in document.body.variables() {
            if context.storage.storage_of(id).is_none() {
                return Err(PlumeError::UnknownVariable {
                    name: format!("#{}", id),
                });
            }
        }

        Ok(Self::new(context, document.body))
    }

    /// Serialize back to the interchange format
    pub fn to_document(&self) -> ProgramDocument {
        let variables = self
            .context
            .symbols
            .iter()
            .filter_map(|(id, name)| {
                self.context.storage.storage_of(id).map(|slot| Declaration {
                    name: name.to_string(),
                    ty: slot.width.into(),
                })
            })
            .collect();

        ProgramDocument {
            variables,
            body: self.body.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Identifier of a declared variable
    pub fn var(&self, name: &str) -> Result<VarId> {
        self.context
            .symbols
            .lookup(name)
            .ok_or_else(|| PlumeError::UnknownVariable {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Type};

    const COUNTDOWN: &str = r#"{
        "variables": [
            { "name": "n", "type": "int" },
            { "name": "done", "type": "bool" }
        ],
        "body": {
            "Seq": {
                "first": { "Assign": { "target": 0, "value": { "Int": 3 } } },
                "second": { "Print": { "value": { "Var": 1 } } }
            }
        }
    }"#;

    #[test]
    fn test_from_json() {
        let program = Program::from_json(COUNTDOWN).unwrap();
        let n = program.var("n").unwrap();
        let done = program.var("done").unwrap();

        assert_eq!(n, VarId(0));
        assert_eq!(program.context.type_of_var(n), Type::Integer);
        assert_eq!(program.context.type_of_var(done), Type::Boolean);
        assert!(matches!(program.body, Stmt::Seq { .. }));
    }

    #[test]
    fn test_undeclared_variable_rejected() {
        let json = r#"{ "variables": [], "body": { "Print": { "value": { "Var": 4 } } } }"#;
        let err = Program::from_json(json).unwrap_err();
        assert!(matches!(err, PlumeError::UnknownVariable { .. }));
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let json = r#"{
            "variables": [ { "name": "x", "type": "int" }, { "name": "x", "type": "bool" } ],
            "body": { "Print": { "value": { "Int": 1 } } }
        }"#;
        let err = Program::from_json(json).unwrap_err();
        assert!(matches!(err, PlumeError::Interchange { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = Program::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PlumeError::Interchange { .. }));
    }

    #[test]
    fn test_document_keeps_declarations() {
        let mut context = Context::new();
        let flag = context.declare("flag", Width::I1);
        let program = Program::new(context, Stmt::print(Expr::var(flag)));

        let reparsed = Program::from_json(&program.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reparsed.var("flag").unwrap(), flag);
        assert_eq!(reparsed.context.type_of_var(flag), Type::Boolean);
        assert_eq!(reparsed.body, program.body);
    }
}
