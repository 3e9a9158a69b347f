use super::*;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

const AND_HDL: &str = "
    CHIP And {
        IN a, b;
        OUT out;

        PARTS:
        Nand(a=a, b=b, out=n);   // n = !(a & b)
        Not(in=n, out=out);
    }
";

const XOR_HDL: &str = "
    CHIP Xor {
        IN a, b;
        OUT out;
        PARTS:
        Not(in=a, out=nota);
        Not(in=b, out=notb);
        And(a=a, b=notb, out=w1);
        And(a=nota, b=b, out=w2);
        Or(a=w1, b=w2, out=out);
    }
";

fn sim_with(chips: &[(&str, &str)]) -> Simulator {
    let mut loader = MemLoader::new();
    for (name, text) in chips {
        loader.insert(name, text);
    }
    Simulator::new(Box::new(loader))
}

fn bits(pairs: &[(&str, bool)]) -> BTreeMap<PinName, Value> {
    pairs
        .iter()
        .map(|(pin, b)| (pin.to_string(), Value::from(*b)))
        .collect()
}

#[test]
fn tokenize_keywords_and_idents() {
    let tokens = tokenize("CHIP Foo { IN a; } // trailing comment").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Chip,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::In,
            TokenKind::Ident,
            TokenKind::Semi,
            TokenKind::RBrace,
        ]
    );
    assert_eq!(tokens[1].lexeme, "Foo");

    // Longest match wins: a keyword prefix inside a longer word is an
    // identifier, and keywords are case-sensitive.
    let tokens = tokenize("CHIPx INPUT parts chip").unwrap();
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Ident));
}

#[test]
fn tokenize_drops_comments_and_whitespace() {
    let tokens = tokenize("// a whole line\n  \t a = // rest\n b").unwrap();
    let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(lexemes, vec!["a", "=", "b"]);
}

#[test]
fn tokenize_rejects_unknown_characters() {
    let err = tokenize("CHIP ^And").unwrap_err();
    match err {
        HdlError::Lex(loc, message) => {
            assert_eq!(loc.start(), 5);
            assert!(message.contains('^'), "{message}");
        },
        other => panic!("expected a lex error, got {other}"),
    }
}

#[test]
fn parse_round_trip() {
    let def = parse_chip(AND_HDL).unwrap();
    assert_eq!(def.name, "And");
    assert_eq!(def.inputs, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(def.outputs, vec!["out".to_string()]);
    assert_eq!(def.parts.len(), 2);

    assert_eq!(def.parts[0].chip_type, "Nand");
    assert_eq!(
        def.parts[0].connections,
        vec![
            ("a".to_string(), "a".to_string()),
            ("b".to_string(), "b".to_string()),
            ("out".to_string(), "n".to_string()),
        ]
        .into_iter()
        .collect::<BTreeMap<_, _>>()
    );
    assert_eq!(def.parts[1].chip_type, "Not");

    // Parsing the same text again reproduces the same structure.
    assert_eq!(parse_chip(AND_HDL).unwrap(), def);
}

#[test]
fn parse_reports_expected_vs_found() {
    let err = parse_chip("CHIP And { IN a b; OUT out; PARTS: }").unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("expected ';'"), "{message}");
            assert!(message.contains("found 'b'"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn parse_requires_section_order() {
    let err = parse_chip("CHIP And { OUT out; IN a, b; PARTS: }").unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("expected 'IN'"), "{message}");
            assert!(message.contains("found 'OUT'"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn parse_rejects_trailing_input() {
    let text = format!("{AND_HDL} CHIP Or");
    let err = parse_chip(&text).unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("expected end of input"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn parse_rejects_truncated_input() {
    let err = parse_chip("CHIP And { IN a, b;").unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("found end of input"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn parse_rejects_duplicate_pins() {
    let err = parse_chip("CHIP Bad { IN a, b; OUT a; PARTS: }").unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("duplicate pin name 'a'"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }

    let err = parse_chip("CHIP Bad { IN a; OUT out; PARTS: Not(in=a, in=a, out=out); }").unwrap_err();
    match err {
        HdlError::Parse(_, message) => {
            assert!(message.contains("bound twice"), "{message}");
        },
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn and_from_nand_and_not() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    for a in [false, true] {
        for b in [false, true] {
            let outputs = sim.simulate("And", &bits(&[("a", a), ("b", b)])).unwrap();
            assert_eq!(outputs, bits(&[("out", a && b)]), "a={a} b={b}");
        }
    }
}

#[test]
fn composition_matches_direct_gate_eval() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    for a in [false, true] {
        for b in [false, true] {
            let outputs = sim.simulate("And", &bits(&[("a", a), ("b", b)])).unwrap();
            let direct = Gate::Not.eval(&[Gate::Nand.eval(&[a, b])]);
            assert_eq!(outputs[&"out".to_string()], Value::from(direct));
        }
    }
}

#[test]
fn xor_through_nested_chips() {
    // Top references Xor twice; the diamond shares one cached definition
    // but never a signal table.
    let top = "
        CHIP Top {
            IN a, b;
            OUT straight, swapped;
            PARTS:
            Xor(a=a, b=b, out=straight);
            Xor(a=b, b=a, out=swapped);
        }
    ";
    let mut sim = sim_with(&[("Xor", XOR_HDL), ("Top", top)]);
    for a in [false, true] {
        for b in [false, true] {
            let outputs = sim.simulate("Top", &bits(&[("a", a), ("b", b)])).unwrap();
            assert_eq!(
                outputs,
                bits(&[("straight", a ^ b), ("swapped", a ^ b)]),
                "a={a} b={b}"
            );
        }
    }
}

#[test]
fn simulation_is_idempotent() {
    let mut sim = sim_with(&[("Xor", XOR_HDL)]);
    let inputs = bits(&[("a", true), ("b", false)]);
    let first = sim.simulate("Xor", &inputs).unwrap();
    let second = sim.simulate("Xor", &inputs).unwrap();
    assert_eq!(first, second);
}

#[test]
fn definitions_are_loaded_once() {
    struct CountingLoader {
        inner: MemLoader,
        loads: Rc<Cell<usize>>,
    }

    impl ChipLoader for CountingLoader {
        fn load(&self, chip: &str) -> Result<String, HdlError> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load(chip)
        }
    }

    let top = "
        CHIP Top {
            IN a, b;
            OUT p, q;
            PARTS:
            Xor(a=a, b=b, out=p);
            Xor(a=b, b=a, out=q);
        }
    ";
    let loads = Rc::new(Cell::new(0));
    let loader = CountingLoader {
        inner: MemLoader::new().with("Xor", XOR_HDL).with("Top", top),
        loads: loads.clone(),
    };
    let mut sim = Simulator::new(Box::new(loader));

    sim.simulate("Top", &bits(&[("a", true), ("b", true)])).unwrap();
    assert_eq!(loads.get(), 2);

    sim.simulate("Top", &bits(&[("a", false), ("b", true)])).unwrap();
    assert_eq!(loads.get(), 2);
}

#[test]
fn missing_input_is_rejected() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    let err = sim.simulate("And", &bits(&[("a", true)])).unwrap_err();
    match err {
        HdlError::InvalidInput { chip, missing, .. } => {
            assert_eq!(chip, "And");
            assert_eq!(missing, vec!["b".to_string()]);
        },
        other => panic!("expected an invalid-input error, got {other}"),
    }
}

#[test]
fn unexpected_and_nonbinary_inputs_are_rejected() {
    let mut sim = sim_with(&[("And", AND_HDL)]);

    let mut inputs = bits(&[("a", true), ("b", true)]);
    inputs.insert("c".to_string(), Value::ONE);
    let err = sim.simulate("And", &inputs).unwrap_err();
    match err {
        HdlError::InvalidInput { unexpected, .. } => {
            assert_eq!(unexpected, vec!["c".to_string()]);
        },
        other => panic!("expected an invalid-input error, got {other}"),
    }

    let mut inputs = bits(&[("a", true)]);
    inputs.insert("b".to_string(), Value::X);
    let err = sim.simulate("And", &inputs).unwrap_err();
    match err {
        HdlError::InvalidInput { nonbinary, .. } => {
            assert_eq!(nonbinary, vec!["b".to_string()]);
        },
        other => panic!("expected an invalid-input error, got {other}"),
    }
}

#[test]
fn unknown_chip_is_reported() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    let err = sim.simulate("Xor", &bits(&[("a", true), ("b", true)])).unwrap_err();
    match err {
        HdlError::ChipNotFound(chip, _) => assert_eq!(chip, "Xor"),
        other => panic!("expected a chip-not-found error, got {other}"),
    }
}

#[test]
fn declaration_order_is_evaluation_order() {
    // Same netlist as And, but listed backwards. There is no dependency
    // scheduling, so Not consumes n before Nand has driven it.
    let backwards = "
        CHIP Backwards {
            IN a, b;
            OUT out;
            PARTS:
            Not(in=n, out=out);
            Nand(a=a, b=b, out=n);
        }
    ";
    let mut sim = sim_with(&[("Backwards", backwards)]);
    for _ in 0..2 {
        let err = sim
            .simulate("Backwards", &bits(&[("a", true), ("b", true)]))
            .unwrap_err();
        match err {
            HdlError::InvalidSignal { gate, pin, signal, .. } => {
                assert_eq!(gate, Gate::Not);
                assert_eq!(pin, "in");
                assert_eq!(signal, Some("n".to_string()));
            },
            other => panic!("expected an invalid-signal error, got {other}"),
        }
    }
}

#[test]
fn unconnected_gate_pin_is_reported() {
    let lonely = "CHIP Lonely { IN a; OUT out; PARTS: Nand(a=a, out=out); }";
    let mut sim = sim_with(&[("Lonely", lonely)]);
    let err = sim.simulate("Lonely", &bits(&[("a", true)])).unwrap_err();
    match err {
        HdlError::InvalidSignal { gate, pin, signal, .. } => {
            assert_eq!(gate, Gate::Nand);
            assert_eq!(pin, "b");
            assert_eq!(signal, None);
        },
        other => panic!("expected an invalid-signal error, got {other}"),
    }
}

#[test]
fn unset_sub_chip_input_fails_at_the_gate() {
    // ghost is never driven; the failure surfaces inside Xor when a gate
    // consumes the copied-in X, not at the boundary.
    let outer = "CHIP Outer { IN a; OUT out; PARTS: Xor(a=a, b=ghost, out=out); }";
    let mut sim = sim_with(&[("Outer", outer), ("Xor", XOR_HDL)]);
    let err = sim.simulate("Outer", &bits(&[("a", true)])).unwrap_err();
    match err {
        HdlError::InvalidSignal { chip, signal, .. } => {
            assert_eq!(chip, "Xor");
            assert_eq!(signal, Some("b".to_string()));
        },
        other => panic!("expected an invalid-signal error, got {other}"),
    }
}

#[test]
fn undriven_output_is_reported() {
    let dangling = "
        CHIP Dangling {
            IN a;
            OUT out, led;
            PARTS:
            Not(in=a, out=out);
        }
    ";
    let mut sim = sim_with(&[("Dangling", dangling)]);
    let err = sim.simulate("Dangling", &bits(&[("a", false)])).unwrap_err();
    match err {
        HdlError::UnresolvedOutput(chip, pin) => {
            assert_eq!(chip, "Dangling");
            assert_eq!(pin, "led");
        },
        other => panic!("expected an unresolved-output error, got {other}"),
    }
}

#[test]
fn cyclic_definitions_fail_fast() {
    let a = "CHIP A { IN x; OUT out; PARTS: B(x=x, out=out); }";
    let b = "CHIP B { IN x; OUT out; PARTS: A(x=x, out=out); }";
    let mut sim = sim_with(&[("A", a), ("B", b)]);
    let err = sim.simulate("A", &bits(&[("x", true)])).unwrap_err();
    match err {
        HdlError::CyclicDefinition(chain) => {
            assert_eq!(chain, vec!["A".to_string(), "B".to_string(), "A".to_string()]);
        },
        other => panic!("expected a cyclic-definition error, got {other}"),
    }

    let loopy = "CHIP Loop { IN x; OUT out; PARTS: Loop(x=x, out=out); }";
    let mut sim = sim_with(&[("Loop", loopy)]);
    let err = sim.simulate("Loop", &bits(&[("x", true)])).unwrap_err();
    match err {
        HdlError::CyclicDefinition(chain) => {
            assert_eq!(chain, vec!["Loop".to_string(), "Loop".to_string()]);
        },
        other => panic!("expected a cyclic-definition error, got {other}"),
    }
}

#[test]
fn vector_files_parse() {
    let suite = TestSuite::parse("And", "a,b;out\n0,0;0\n0,1;0\n1,0;0\n1,1;1\n").unwrap();
    assert_eq!(suite.chip, "And");
    assert_eq!(suite.input_pins, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(suite.output_pins, vec!["out".to_string()]);
    assert_eq!(suite.vectors.len(), 4);
    assert_eq!(
        suite.vectors[3],
        TestVector {
            inputs: bits(&[("a", true), ("b", true)]),
            expected: bits(&[("out", true)]),
        }
    );
}

#[test]
fn vector_files_report_bad_lines() {
    assert_eq!(
        TestSuite::parse("And", "").unwrap_err(),
        VectorError::Empty
    );

    let err = TestSuite::parse("And", "a,b out\n").unwrap_err();
    assert!(matches!(err, VectorError::Header(_)), "{err:?}");

    let err = TestSuite::parse("And", "a,b;out\n0,0;0\n\n0;1\n").unwrap_err();
    match err {
        VectorError::Row(line, message) => {
            assert_eq!(line, 4);
            assert!(message.contains("expected 2 input values"), "{message}");
        },
        other => panic!("expected a row error, got {other:?}"),
    }

    let err = TestSuite::parse("And", "a,b;out\n0,2;1\n").unwrap_err();
    match err {
        VectorError::Row(line, message) => {
            assert_eq!(line, 2);
            assert!(message.contains("must be 0 or 1"), "{message}");
        },
        other => panic!("expected a row error, got {other:?}"),
    }
}

#[test]
fn suite_runs_record_failures_and_continue() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    // Second vector expects the wrong output on purpose.
    let suite = TestSuite::parse("And", "a,b;out\n0,0;0\n0,1;1\n1,1;1\n").unwrap();
    let report = run_suite(&mut sim, &suite);
    assert_eq!(report.total(), 3);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.all_passed());
    assert!(report.results[1].message.contains("FAIL"), "{}", report.results[1].message);
    assert!(report.results[1].message.contains("out: expected 1, got 0"));
    assert!(report.results[2].passed);
}

#[test]
fn suite_runs_survive_simulation_errors() {
    let mut sim = sim_with(&[("And", AND_HDL)]);
    let suite = TestSuite::parse("Ghost", "a;out\n0;1\n1;0\n").unwrap();
    let report = run_suite(&mut sim, &suite);
    assert_eq!(report.total(), 2);
    assert_eq!(report.passed, 0);
    for result in &report.results {
        assert!(result.message.starts_with("ERROR"), "{}", result.message);
        assert!(result.message.contains("Ghost"), "{}", result.message);
    }
}
