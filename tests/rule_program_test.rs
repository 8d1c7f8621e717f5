// Behavioural tests for compiled rule programs through the public API

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use scorecard::{compile, CompilerError, Program, RuntimeError, Scores};
use test_log::test;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn scores(entries: &[(&str, i64)]) -> Scores {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn run_with(program: &Program, pairs: &[(&str, &str)]) -> Scores {
    program.run(&vars(pairs)).unwrap()
}

#[test]
fn test_only_written_scores_are_returned() {
    let program = compile(
        r#"
        score(base) = 3
        when var(t) == "yes" then score(hit) += 1 done
        when var(t) == "no" then score(miss) -= 1 done
        "#,
    )
    .unwrap();

    assert_eq!(
        run_with(&program, &[("t", "yes")]),
        scores(&[("base", 3), ("hit", 1)])
    );
    assert_eq!(run_with(&program, &[]), scores(&[("base", 3)]));
}

#[test]
fn test_and_short_circuits() {
    let program = compile("when score(a) == 1 and score(b) == 1 then score(x) = 1 done").unwrap();
    assert!(run_with(&program, &[]).is_empty());

    let program = compile(
        "score(a) = 1 score(b) = 1 when score(a) == 1 and score(b) == 1 then score(x) = 1 done",
    )
    .unwrap();
    assert_eq!(run_with(&program, &[])["x"], 1);

    let program = compile(
        "score(a) = 1 when score(a) == 1 and score(b) == 1 then score(x) = 1 done",
    )
    .unwrap();
    assert!(!run_with(&program, &[]).contains_key("x"));

    // A false first operand skips the second, which would fail on its own
    let program = compile("when score(a) == 1 and var(t) == 1 then score(x) = 1 done").unwrap();
    let result = program.run(&vars(&[("t", "1")])).unwrap();
    assert!(!result.contains_key("x"));

    let program =
        compile("score(a) = 1 when score(a) == 1 and var(t) == 1 then score(x) = 1 done").unwrap();
    assert!(program.run(&vars(&[("t", "1")])).is_err());
}

#[test]
fn test_or_takes_first_true_clause() {
    let program =
        compile(r#"when var(t) contains "x" or var(t) contains "y" then score(s) += 1 done"#)
            .unwrap();

    assert_eq!(run_with(&program, &[("t", "x")]), scores(&[("s", 1)]));
    assert_eq!(run_with(&program, &[("t", "y")]), scores(&[("s", 1)]));
    assert_eq!(run_with(&program, &[("t", "xy")]), scores(&[("s", 1)]));
    assert!(run_with(&program, &[("t", "z")]).is_empty());
}

#[test]
fn test_list_membership() {
    let program = compile(r#"when var(t) in ["a", "b", "c"] then score(s) += 1 done"#).unwrap();
    assert_eq!(run_with(&program, &[("t", "b")]), scores(&[("s", 1)]));
    assert!(run_with(&program, &[("t", "d")]).is_empty());

    let program =
        compile(r#"when var(t) not in ["a", "b", "c"] then score(s) += 1 done"#).unwrap();
    assert!(run_with(&program, &[("t", "b")]).is_empty());
    assert_eq!(run_with(&program, &[("t", "d")]), scores(&[("s", 1)]));
}

#[test]
fn test_integer_list_against_score() {
    let program =
        compile("score(n) = 2 when score(n) in [1, 2, 3] then score(s) = 7 done").unwrap();
    assert_eq!(run_with(&program, &[]), scores(&[("n", 2), ("s", 7)]));
}

#[test]
fn test_nested_rules() {
    let program = compile(
        "when score(a) == 0 then score(a) += 1 when score(a) == 1 then score(a) += 10 done done",
    )
    .unwrap();
    assert_eq!(run_with(&program, &[]), scores(&[("a", 11)]));
}

#[test]
fn test_nested_conditions_and_precedence() {
    let program = compile(
        r#"
        when (var(a) == "1" or var(b) == "1") and var(c) == "1" then score(p) = 1 done
        when var(a) == "1" or var(b) == "1" and var(c) == "1" then score(q) = 1 done
        "#,
    )
    .unwrap();

    assert_eq!(
        run_with(&program, &[("a", "1"), ("c", "0")]),
        scores(&[("q", 1)])
    );
    assert_eq!(
        run_with(&program, &[("b", "1"), ("c", "1")]),
        scores(&[("p", 1), ("q", 1)])
    );
    assert!(run_with(&program, &[("b", "1")]).is_empty());
}

#[test]
fn test_ordering_and_score_operands() {
    let program = compile(
        r#"
        score(a) = 5
        score(b) = score(a)
        score(b) += score(a)
        when score(b) >= 10 and score(a) < score(b) then score(ok) = 1 done
        when score(b) > 10 then score(bad) = 1 done
        when score(a) <= -1 then score(bad) = 1 done
        when score(b) != 10 then score(bad) = 1 done
        "#,
    )
    .unwrap();
    assert_eq!(
        run_with(&program, &[]),
        scores(&[("a", 5), ("b", 10), ("ok", 1)])
    );
}

#[test]
fn test_regex_conditions() {
    let program = compile(
        r#"
        when var(t) matches /^ab+c$/ then score(full) = 1 done
        when var(t) matches /b/ then score(part) = 1 done
        when var(t) does not match /z/ then score(noz) = 1 done
        when var(p) matches /a\/b/ then score(slash) = 1 done
        "#,
    )
    .unwrap();

    assert_eq!(
        run_with(&program, &[("t", "abbc"), ("p", "xa/by")]),
        scores(&[("full", 1), ("part", 1), ("noz", 1), ("slash", 1)])
    );
    assert_eq!(
        run_with(&program, &[("t", "xbz")]),
        scores(&[("part", 1)])
    );
}

#[test]
fn test_exit_stops_the_program() {
    let program = compile("score(a) = 1 exit score(a) = 2").unwrap();
    assert_eq!(run_with(&program, &[]), scores(&[("a", 1)]));

    // exit inside a nested rule halts everything, not just the rule
    let program = compile(
        r#"
        when var(t) == "stop" then
            when score(x) == 0 then score(x) = 1 exit done
            score(x) = 2
        done
        score(y) = 1
        "#,
    )
    .unwrap();
    assert_eq!(run_with(&program, &[("t", "stop")]), scores(&[("x", 1)]));
    assert_eq!(run_with(&program, &[("t", "go")]), scores(&[("y", 1)]));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = r#"
        when var(t) matches /a|b/ or (var(u) in ["c", "d"] and score(s) > 1) then
            score(x) += 1
        done
    "#;
    let a = compile(source).unwrap();
    let b = compile(source).unwrap();
    assert_eq!(a.instructions(), b.instructions());
}

#[test]
fn test_repeated_runs_do_not_leak_state() {
    let program = compile(
        r#"
        score(n) += 1
        when var(t) == "x" then score(seen) = 1 done
        "#,
    )
    .unwrap();

    assert_eq!(
        run_with(&program, &[("t", "x")]),
        scores(&[("n", 1), ("seen", 1)])
    );
    assert_eq!(run_with(&program, &[("t", "y")]), scores(&[("n", 1)]));
    assert_eq!(run_with(&program, &[("t", "y")]), scores(&[("n", 1)]));
}

#[test]
fn test_concurrent_runs_share_one_program() {
    let program = Arc::new(
        compile(r#"when var(t) contains "hit" then score(s) += 1 done score(total) += 1"#)
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let program = Arc::clone(&program);
            thread::spawn(move || {
                let title = if n % 2 == 0 { "hit" } else { "miss" };
                let result = program.run(&vars(&[("t", title)])).unwrap();
                (n, result)
            })
        })
        .collect();

    for handle in handles {
        let (n, result) = handle.join().unwrap();
        if n % 2 == 0 {
            assert_eq!(result, scores(&[("s", 1), ("total", 1)]));
        } else {
            assert_eq!(result, scores(&[("total", 1)]));
        }
    }
}

#[test]
fn test_runtime_error_discards_scores() {
    // A variable compared against an integer is a kind mismatch at run time
    let program = compile("score(a) = 1 when var(t) == 1 then score(b) = 1 done").unwrap();
    match program.run(&vars(&[("t", "1")])) {
        Err(RuntimeError::InvalidOperand {
            expected, found, ..
        }) => {
            assert_eq!(expected, "string or var");
            assert_eq!(found, "int");
        }
        other => panic!("expected invalid operand error, got {:?}", other),
    }

    let program = compile(r#"when score(a) > "3" then done"#).unwrap();
    assert!(program.run(&vars(&[])).is_err());
}

#[test]
fn test_compile_errors() {
    match compile("when var(t) == \"x\" then score(a) = 1") {
        Err(CompilerError::ExpectedToken(_, _, location)) => assert_eq!(location.line, 1),
        other => panic!("expected parse error, got {:?}", other.map(|_| ())),
    }

    match compile("when var(t) matches /[a-/ then done") {
        Err(err) => {
            assert!(err.is_generation_error());
            assert!(err.to_string().contains("[a-"));
        }
        Ok(_) => panic!("expected regex error"),
    }

    let err = compile("score(a) = \"text\"").err().unwrap();
    assert!(!err.is_generation_error());
}

#[test]
fn test_compile_reader_reports_io_errors() {
    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
        }
    }

    match scorecard::compile_reader(FailingReader) {
        Err(CompilerError::IOError(msg)) => assert!(msg.contains("disk on fire")),
        other => panic!("expected IO error, got {:?}", other.map(|_| ())),
    }

    let program = scorecard::compile_reader("score(a) = 4".as_bytes()).unwrap();
    assert_eq!(run_with(&program, &[]), scores(&[("a", 4)]));
}

#[test]
fn test_program_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Program>();
}
