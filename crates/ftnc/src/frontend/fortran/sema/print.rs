//! Fortran-like rendering of an analyzed program
//!
//! Used by `--dump-sema`. Implicit conversions are shown as the intrinsic
//! that performs them, so `X = I` with a REAL `X` prints as `X = REAL(I)`.

use std::fmt::Write;

use super::{Decl, DeclKind, SemaExpr, SemaExprKind, SemaLhs, SemaLhsKind, SemaProgram, SemaStmt, SemaStmtKind};
use crate::frontend::fortran::ast::UnaryOp;
use crate::types::{TypeId, TypeRegistry, TypeTag};

const INDENT: &str = "  ";

pub fn print_program(program: &SemaProgram, types: &TypeRegistry) -> String {
    let mut out = String::new();
    let name = program.name.as_deref().unwrap_or("MAIN");
    let _ = writeln!(out, "PROGRAM {}", name);

    for decl in &program.decls {
        if let Some(line) = print_decl(decl, types) {
            let _ = writeln!(out, "{}{}", INDENT, line);
        }
    }

    for func in &program.functions {
        let _ = writeln!(
            out,
            "{}{} {}({}) = {}",
            INDENT,
            types.display(func.ty),
            func.name,
            func.args.join(", "),
            print_expr(&func.body, types)
        );
    }

    for stmt in &program.body {
        let _ = writeln!(out, "{}", print_stmt(stmt, types));
    }

    let _ = writeln!(out, "END PROGRAM {}", name);
    out
}

fn print_decl(decl: &Decl, types: &TypeRegistry) -> Option<String> {
    let ty = types.display(decl.ty);
    match &decl.kind {
        DeclKind::Variable => Some(match &decl.init {
            Some(init) => format!("{} {} = {}", ty, decl.name, init),
            None => format!("{} {}", ty, decl.name),
        }),
        DeclKind::Constant(value) => Some(format!("{}, PARAMETER :: {} = {}", ty, decl.name, value)),
        DeclKind::Intrinsic => Some(format!("INTRINSIC {}", decl.name)),
        // Printed with its body
        DeclKind::StatementFunction { .. } => None,
    }
}

pub fn print_stmt(stmt: &SemaStmt, types: &TypeRegistry) -> String {
    let label = match stmt.label {
        Some(label) => format!("{:<5} ", label),
        None => " ".repeat(6),
    };

    let body = match &stmt.kind {
        SemaStmtKind::Assignment(assign) => format!(
            "{} = {}",
            print_lhs(&assign.dest, types),
            print_expr(&assign.expr, types)
        ),
        SemaStmtKind::If { cond, stmt } => {
            let nested = print_stmt(stmt, types);
            format!("IF ({}) {}", print_expr(cond, types), nested.trim_start())
        }
        SemaStmtKind::IfComputed { cond, labels } => {
            let labels: Vec<String> = labels.iter().map(ToString::to_string).collect();
            format!("IF ({}) {}", print_expr(cond, types), labels.join(", "))
        }
        SemaStmtKind::Goto(label) => format!("GO TO {}", label),
        SemaStmtKind::Continue => "CONTINUE".to_string(),
    };

    format!("{}{}", label, body)
}

fn print_lhs(lhs: &SemaLhs, types: &TypeRegistry) -> String {
    match &lhs.kind {
        SemaLhsKind::Variable(name) => name.clone(),
        SemaLhsKind::Element { parent, index } => {
            let index: Vec<String> = index.iter().map(|e| print_expr(e, types)).collect();
            format!("{}({})", print_lhs(parent, types), index.join(", "))
        }
        SemaLhsKind::Member { parent, name, .. } => format!("{}%{}", print_lhs(parent, types), name),
    }
}

pub fn print_expr(expr: &SemaExpr, types: &TypeRegistry) -> String {
    match &expr.kind {
        SemaExprKind::Constant => match &expr.constant {
            Some(value) => value.to_string(),
            None => "?".to_string(),
        },
        SemaExprKind::Lhs(lhs) => print_lhs(lhs, types),
        SemaExprKind::Cast(operand) => {
            format!("{}({})", cast_name(types, expr.ty), print_expr(operand, types))
        }
        SemaExprKind::Unary { op, operand } => {
            let operand = print_operand(operand, types);
            match op {
                UnaryOp::Not => format!(".NOT. {}", operand),
                UnaryOp::Plus | UnaryOp::Neg => format!("{}{}", op.symbol(), operand),
            }
        }
        SemaExprKind::Binary { op, left, right } => format!(
            "{} {} {}",
            print_operand(left, types),
            op.symbol(),
            print_operand(right, types)
        ),
        SemaExprKind::Call { name, args } => {
            let args: Vec<String> = args.iter().map(|e| print_expr(e, types)).collect();
            format!("{}({})", name, args.join(", "))
        }
    }
}

/// Nested operators are always parenthesized
fn print_operand(expr: &SemaExpr, types: &TypeRegistry) -> String {
    match expr.kind {
        SemaExprKind::Binary { .. } => format!("({})", print_expr(expr, types)),
        _ => print_expr(expr, types),
    }
}

fn cast_name(types: &TypeRegistry, ty: TypeId) -> String {
    match types.tag(ty) {
        TypeTag::Integer | TypeTag::Byte => "INT".to_string(),
        TypeTag::Real => "REAL".to_string(),
        TypeTag::Complex => "CMPLX".to_string(),
        TypeTag::Logical => "LOGICAL".to_string(),
        _ => types.display(ty),
    }
}
