//! Abstract Syntax Tree definitions for Plume
//!
//! Expressions and statements are immutable owned trees: a parent owns its
//! children exclusively and dropping the root tears down the whole program.
//! Variables appear only as [`VarId`] handles; names live in the
//! [`SymbolTable`](crate::symbols::SymbolTable).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static types of the language
///
/// `Error` is the sentinel the checker propagates upward on a mismatch and is
/// never produced by a literal. `Untyped` is only a default and never reaches
/// a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    #[default]
    Untyped,
    Integer,
    Boolean,
    Error,
}

impl Type {
    /// Source-level name of the type
    pub fn name(&self) -> &'static str {
        match self {
            Type::Integer => "int",
            Type::Boolean => "bool",
            Type::Error => "error",
            Type::Untyped => "not-a-type",
        }
    }

    /// Integer or boolean, the only types a well-typed expression can have
    pub fn is_value_type(&self) -> bool {
        matches!(self, Type::Integer | Type::Boolean)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Interned variable handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,

    // Equality
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,

    // Relational
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,

    // Logical on booleans, bitwise on integers
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    /// Infix spelling used by the source printer
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Opcode mnemonic shared by the stack and register listings
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Ge => "ge",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Lt => "lt",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, BinaryOp::Ge | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Lt)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    pub const ALL: [BinaryOp; 12] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Ge,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Lt,
        BinaryOp::And,
        BinaryOp::Or,
    ];
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Boolean literal: true, false
    Bool(bool),
    /// 32-bit integer literal
    Int(i32),
    /// Variable reference
    Var(VarId),
    /// Binary operation: a + b, x == y
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn bool_lit(value: bool) -> Self {
        Expr::Bool(value)
    }

    pub fn int_lit(value: i32) -> Self {
        Expr::Int(value)
    }

    pub fn var(id: VarId) -> Self {
        Expr::Var(id)
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The referenced variable, if this expression is a bare variable
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Expr::Var(id) => Some(*id),
            _ => None,
        }
    }

    /// Number of leaf nodes (literals and variable references)
    pub fn leaf_count(&self) -> usize {
        match self {
            Expr::Binary { left, right, .. } => left.leaf_count() + right.leaf_count(),
            _ => 1,
        }
    }

    /// Number of binary operation nodes
    pub fn binary_count(&self) -> usize {
        match self {
            Expr::Binary { left, right, .. } => 1 + left.binary_count() + right.binary_count(),
            _ => 0,
        }
    }

    /// Collect every variable referenced by this expression, left to right
    pub fn variables(&self, out: &mut Vec<VarId>) {
        match self {
            Expr::Var(id) => out.push(*id),
            Expr::Binary { left, right, .. } => {
                left.variables(out);
                right.variables(out);
            }
            Expr::Bool(_) | Expr::Int(_) => {}
        }
    }
}

/// A statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// Ordered composition of two statements
    Seq { first: Box<Stmt>, second: Box<Stmt> },
    /// Assignment: x = value
    Assign { target: VarId, value: Expr },
    /// Conditional with optional else branch
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
    },
    /// Pretest loop
    While { cond: Expr, body: Box<Stmt> },
    /// Print an integer or boolean
    Print { value: Expr },
    /// x++ on an integer variable
    Increment { value: Expr },
    /// x-- on an integer variable
    Decrement { value: Expr },
}

impl Stmt {
    pub fn seq(first: Stmt, second: Stmt) -> Self {
        Stmt::Seq {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn assign(target: VarId, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    pub fn if_then(cond: Expr, then_branch: Stmt) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: None,
        }
    }

    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Stmt) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        }
    }

    pub fn while_loop(cond: Expr, body: Stmt) -> Self {
        Stmt::While {
            cond,
            body: Box::new(body),
        }
    }

    pub fn print(value: Expr) -> Self {
        Stmt::Print { value }
    }

    pub fn increment(value: Expr) -> Self {
        Stmt::Increment { value }
    }

    pub fn decrement(value: Expr) -> Self {
        Stmt::Decrement { value }
    }

    /// Chain statements into a right-nested sequence.
    ///
    /// Returns `None` for an empty iterator.
    pub fn sequence(stmts: impl IntoIterator<Item = Stmt>) -> Option<Self> {
        let mut stmts: Vec<Stmt> = stmts.into_iter().collect();
        let mut acc = stmts.pop()?;
        while let Some(prev) = stmts.pop() {
            acc = Stmt::seq(prev, acc);
        }
        Some(acc)
    }

    /// Short name of the statement form
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Seq { .. } => "sequence",
            Stmt::Assign { .. } => "assign",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::Print { .. } => "print",
            Stmt::Increment { .. } => "increment",
            Stmt::Decrement { .. } => "decrement",
        }
    }

    /// Every expression carried by this statement tree, in execution order
    /// (a condition precedes the statements it guards).
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_expressions(&mut out);
        out
    }

    fn collect_expressions<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Stmt::Seq { first, second } => {
                first.collect_expressions(out);
                second.collect_expressions(out);
            }
            Stmt::Assign { value, .. }
            | Stmt::Print { value }
            | Stmt::Increment { value }
            | Stmt::Decrement { value } => out.push(value),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(cond);
                then_branch.collect_expressions(out);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_expressions(out);
                }
            }
            Stmt::While { cond, body } => {
                out.push(cond);
                body.collect_expressions(out);
            }
        }
    }

    /// Every variable written or read by this statement tree
    pub fn variables(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<VarId>) {
        match self {
            Stmt::Seq { first, second } => {
                first.collect_variables(out);
                second.collect_variables(out);
            }
            Stmt::Assign { target, value } => {
                out.push(*target);
                value.variables(out);
            }
            Stmt::Print { value } | Stmt::Increment { value } | Stmt::Decrement { value } => {
                value.variables(out)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.variables(out);
                then_branch.collect_variables(out);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_variables(out);
                }
            }
            Stmt::While { cond, body } => {
                cond.variables(out);
                body.collect_variables(out);
            }
        }
    }
}
