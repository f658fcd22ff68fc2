// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parent chains, overrides and `super` dispatch.

use ometa_codegen::{GrammarAssembler, GrammarHandle, GrammarRegistry};
use ometa_ir::build::*;
use ometa_ir::Value;
use ometa_runtime::ParseError;

fn chars(s: &str) -> Value {
    Value::from(Value::chars(s))
}

/// base: binary digits. child: adds '2' and defers to base. grand: adds '3'.
fn family(registry: &GrammarRegistry) -> (GrammarHandle, GrammarHandle, GrammarHandle) {
    let base = GrammarBuilder::new()
        .rule("digit", or_(vec![exactly('0'), exactly('1')]))
        .rule("number", many1(apply("digit", vec![])))
        .finish();
    let child = GrammarBuilder::new()
        .rule("digit", or_(vec![exactly('2'), super_apply("digit", vec![])]))
        .finish();
    let grand = GrammarBuilder::new()
        .rule("digit", or_(vec![exactly('3'), super_apply("digit", vec![])]))
        .finish();

    let base = GrammarAssembler::new(registry, "base").assemble(&base).unwrap();
    let child = GrammarAssembler::new(registry, "child")
        .parent("base")
        .assemble(&child)
        .unwrap();
    let grand = GrammarAssembler::new(registry, "grand")
        .parent("child")
        .assemble(&grand)
        .unwrap();
    (base, child, grand)
}

#[test]
fn super_from_override_runs_parent_body() {
    let registry = GrammarRegistry::new();
    let (_, child, _) = family(&registry);

    assert_eq!(child.parser("2").apply("digit").unwrap(), Value::Char('2'));
    assert_eq!(child.parser("1").apply("digit").unwrap(), Value::Char('1'));
    let mut p = child.parser("5");
    assert!(p.apply("digit").unwrap_err().is_backtrack());
    assert_eq!(p.position(), 0);
}

#[test]
fn inherited_rules_dispatch_to_the_most_derived_override() {
    let registry = GrammarRegistry::new();
    let (base, child, grand) = family(&registry);

    assert!(base.parser("210").apply("number").is_err());
    assert_eq!(child.parser("210").apply("number").unwrap(), chars("210"));
    assert_eq!(grand.parser("3210").apply("number").unwrap(), chars("3210"));

    let mut p = grand.parser("3");
    p.apply("number").unwrap();
    assert_eq!(p.trace().get("number").unwrap().grammar, "base");
    assert_eq!(p.trace().get("digit").unwrap().grammar, "grand");
}

#[test]
fn super_chains_through_every_ancestor() {
    let registry = GrammarRegistry::new();
    let (_, _, grand) = family(&registry);
    for (input, expected) in [("3", '3'), ("2", '2'), ("1", '1'), ("0", '0')] {
        assert_eq!(grand.parser(input).apply("digit").unwrap(), Value::Char(expected));
    }
}

#[test]
fn rule_resolution_reports_owner() {
    let registry = GrammarRegistry::new();
    let (_, _, grand) = family(&registry);
    let (owner, _) = grand.resolve("number").unwrap();
    assert_eq!(owner.name(), "base");
    let (owner, _) = grand.resolve("digit").unwrap();
    assert_eq!(owner.name(), "grand");
    assert!(grand.responds_to("letter"));
    assert!(!grand.responds_to("nothing"));
}

#[test]
fn host_code_uses_owner_globals() {
    let registry = GrammarRegistry::new();
    let base = GrammarBuilder::new()
        .rule(
            "val",
            sequence(vec![
                bind(apply("digit", vec![]), "c"),
                host_expr("v", "int(c) + offset"),
            ]),
        )
        .finish();
    GrammarAssembler::new(&registry, "base")
        .global("offset", 10i64)
        .assemble(&base)
        .unwrap();

    let child = GrammarBuilder::new()
        .rule("twice", sequence(vec![apply("val", vec![]), apply("val", vec![])]))
        .finish();
    let child = GrammarAssembler::new(&registry, "child")
        .parent("base")
        .global("offset", 100i64)
        .assemble(&child)
        .unwrap();

    assert_eq!(child.parser("12").apply("twice").unwrap(), Value::Int(12));
}

#[test]
fn super_to_a_primitive_reaches_the_base_runtime() {
    let registry = GrammarRegistry::new();
    let base = GrammarBuilder::new().rule("start", apply("digit", vec![])).finish();
    GrammarAssembler::new(&registry, "base").assemble(&base).unwrap();

    let child = GrammarBuilder::new()
        .rule(
            "digit",
            sequence(vec![
                bind(super_apply("digit", vec![]), "d"),
                host_expr("n", "int(d)"),
            ]),
        )
        .finish();
    let child = GrammarAssembler::new(&registry, "child")
        .parent("base")
        .assemble(&child)
        .unwrap();

    assert_eq!(child.parser("7").apply("start").unwrap(), Value::Int(7));
    let err = child.parser("x").apply("start").unwrap_err();
    assert!(matches!(err, ParseError::Backtrack(_)));
}

#[test]
fn re_registration_replaces_but_keeps_existing_children() {
    let registry = GrammarRegistry::new();
    let (base, child, _) = family(&registry);

    let replacement = GrammarBuilder::new()
        .rule("digit", exactly('9'))
        .rule("number", many1(apply("digit", vec![])))
        .finish();
    let new_base = GrammarAssembler::new(&registry, "base")
        .assemble(&replacement)
        .unwrap();

    assert!(registry.get("base").unwrap().ptr_eq(&new_base));
    assert!(!new_base.ptr_eq(&base));
    assert!(child.parent().unwrap().ptr_eq(&base));
    assert_eq!(child.parser("1").apply("digit").unwrap(), Value::Char('1'));

    assert!(registry.unregister("grand").is_some());
    assert_eq!(registry.names(), vec!["base".to_string(), "child".to_string()]);
}
