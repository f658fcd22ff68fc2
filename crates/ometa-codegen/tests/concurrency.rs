// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Building and running grammars from several threads at once.

use std::thread;

use ometa_codegen::{GrammarAssembler, GrammarHandle, GrammarRegistry};
use ometa_ir::build::*;
use ometa_ir::Value;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_types_are_thread_safe() {
    assert_send_sync::<GrammarRegistry>();
    assert_send_sync::<GrammarHandle>();
}

#[test]
fn parallel_assembly_against_one_registry() {
    let registry = GrammarRegistry::new();
    let base = GrammarBuilder::new()
        .rule("bit", or_(vec![exactly('0'), exactly('1')]))
        .finish();
    GrammarAssembler::new(&registry, "base").assemble(&base).unwrap();

    thread::scope(|s| {
        for i in 0..8u32 {
            let registry = &registry;
            s.spawn(move || {
                let mark = char::from_digit(i + 2, 10).unwrap();
                let tree = GrammarBuilder::new()
                    .rule("bit", or_(vec![exactly(mark), super_apply("bit", vec![])]))
                    .rule("bits", many1(apply("bit", vec![])))
                    .finish();
                let name = format!("g{}", i);
                let handle = GrammarAssembler::new(registry, name.as_str())
                    .parent("base")
                    .assemble(&tree)
                    .unwrap();
                let input = format!("{}01", mark);
                let parsed = handle.parser(input.as_str()).apply("bits").unwrap();
                assert_eq!(parsed, Value::from(Value::chars(&input)));
            });
        }
    });

    assert_eq!(registry.len(), 9);
    for i in 0..8 {
        assert!(registry.contains(&format!("g{}", i)));
    }
}

#[test]
fn one_grammar_many_concurrent_parsers() {
    let registry = GrammarRegistry::new();
    let tree = GrammarBuilder::new()
        .rule(
            "number",
            sequence(vec![
                bind(many1(apply("digit", vec![])), "ds"),
                host_expr("n", "int(join(ds))"),
            ]),
        )
        .finish();
    let grammar = GrammarAssembler::new(&registry, "num").assemble(&tree).unwrap();

    let results: Vec<Value> = thread::scope(|s| {
        let workers: Vec<_> = (0..16i64)
            .map(|n| {
                let grammar = grammar.clone();
                s.spawn(move || {
                    let text = (n * 37).to_string();
                    let mut parser = grammar.parser(text.as_str());
                    let value = parser.apply_complete("number").unwrap();
                    assert_eq!(
                        parser.trace().binding("number", "ds"),
                        Some(&Value::from(Value::chars(&text)))
                    );
                    value
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let expected: Vec<Value> = (0..16i64).map(|n| Value::Int(n * 37)).collect();
    assert_eq!(results, expected);
}
