use pretty_assertions::assert_eq;

use super::*;
use crate::ast::{AssignTarget, BinaryOp, ExprId, ExprKind};
use lq_value::Value;

fn body_expr(parsed: &ParsedLambda) -> ExprId {
    match &parsed.body {
        Body::Expr(id) => *id,
        Body::Block(_) => panic!("expected expression body"),
    }
}

fn offset(source: &str) -> u32 {
    parse(source).unwrap_err().lambda_offset().unwrap()
}

#[test]
fn single_param_without_parens() {
    let p = parse("$x => $x * 2").unwrap();
    assert_eq!(p.params.as_slice(), ["x".to_string()]);
    let ExprKind::Binary { op, .. } = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Mul);
}

#[test]
fn param_list_forms() {
    assert!(parse("() => 1").unwrap().params.is_empty());
    assert_eq!(parse("($v, $k) => $k").unwrap().params.len(), 2);
    assert_eq!(parse("($v) => $v").unwrap().params.len(), 1);
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    let p = parse("$x => 1 + 2 * 3").unwrap();
    let ExprKind::Binary { op, right, .. } = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        p.arena.get(*right).kind,
        ExprKind::Binary { op: BinaryOp::Mul, .. }
    ));
}

#[test]
fn concat_shares_additive_level() {
    let p = parse("$x => 'a' . $x + 1").unwrap();
    let ExprKind::Binary { op, left, .. } = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        p.arena.get(*left).kind,
        ExprKind::Binary { op: BinaryOp::Concat, .. }
    ));
}

#[test]
fn block_body_with_statements() {
    let p = parse("$x => { $y = $x + 1;\n  return $y * 2; }").unwrap();
    let Body::Block(stmts) = &p.body else {
        panic!("expected block");
    };
    assert_eq!(stmts.len(), 2);
    let Stmt::Expr(first) = stmts[0] else {
        panic!("expected expression statement");
    };
    assert!(matches!(
        &p.arena.get(first).kind,
        ExprKind::Assign { target: AssignTarget::Var(name), .. } if name == "y"
    ));
    assert!(matches!(stmts[1], Stmt::Return(_)));
}

#[test]
fn return_in_expression_body() {
    let p = parse("$x => return $x;").unwrap();
    assert!(matches!(p.arena.get(body_expr(&p)).kind, ExprKind::Var(_)));
}

#[test]
fn ctx_fields_read_and_write() {
    let p = parse("$x => $ctx->cancel = $ctx->index >= 2").unwrap();
    let ExprKind::Assign { target, value } = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected assignment");
    };
    assert_eq!(*target, AssignTarget::Ctx("cancel".into()));
    let ExprKind::Binary { left, .. } = &p.arena.get(*value).kind else {
        panic!("expected comparison");
    };
    assert_eq!(p.arena.get(*left).kind, ExprKind::CtxField("index".into()));
}

#[test]
fn member_method_and_index_chain() {
    let p = parse("$g => $g->items()[0]->name").unwrap();
    let ExprKind::Member { target, name } = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected member");
    };
    assert_eq!(name, "name");
    let ExprKind::Index { target, .. } = &p.arena.get(*target).kind else {
        panic!("expected index");
    };
    assert!(matches!(
        &p.arena.get(*target).kind,
        ExprKind::MethodCall { method, args, .. } if method == "items" && args.is_empty()
    ));
}

#[test]
fn array_literal_entries() {
    let p = parse("$x => ['k' => $x, 2,]").unwrap();
    let ExprKind::Array(entries) = &p.arena.get(body_expr(&p)).kind else {
        panic!("expected array");
    };
    assert_eq!(entries.len(), 2);
    assert!(entries[0].0.is_some());
    assert!(entries[1].0.is_none());
}

#[test]
fn ternary_and_short_ternary() {
    let p = parse("$x => $x ? 1 : 2").unwrap();
    assert!(matches!(
        p.arena.get(body_expr(&p)).kind,
        ExprKind::Ternary { then: Some(_), .. }
    ));
    let p = parse("$x => $x ?: 'none'").unwrap();
    assert!(matches!(
        p.arena.get(body_expr(&p)).kind,
        ExprKind::Ternary { then: None, .. }
    ));
}

#[test]
fn builtin_call() {
    let p = parse("$s => strlen($s)").unwrap();
    assert!(matches!(
        &p.arena.get(body_expr(&p)).kind,
        ExprKind::Call { name, args } if name == "strlen" && args.len() == 1
    ));
}

#[test]
fn literal_values() {
    let p = parse("() => 'hi'").unwrap();
    assert_eq!(
        p.arena.get(body_expr(&p)).kind,
        ExprKind::Literal(Value::string("hi"))
    );
}

#[test]
fn error_offsets() {
    assert_eq!(offset("$x $x"), 3);
    assert_eq!(offset("x => 1"), 0);
    assert_eq!(offset("$x =>"), 5);
    assert_eq!(offset("$x => (1 + 2"), 12);
    assert_eq!(offset("$x => { return 1 "), 17);
    assert_eq!(offset("$x => 1 2"), 8);
    assert_eq!(offset("$x => foo"), 6);
    assert_eq!(offset("$x => 1 = 2"), 8);
}

#[test]
fn reserved_and_duplicate_params() {
    assert_eq!(offset("$ctx => 1"), 0);
    assert_eq!(offset("($a, $a) => 1"), 5);
    assert!(parse("$x => $ctx")
        .unwrap_err()
        .to_string()
        .contains("`->` after `$ctx`"));
    assert!(parse("$x => $ctx->index()").is_err());
}

#[test]
fn deeply_nested_parentheses() {
    let depth = 5_000;
    let source = format!("$x => {}$x{}", "(".repeat(depth), ")".repeat(depth));
    assert!(parse(&source).is_ok());
}
