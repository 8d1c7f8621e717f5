// Parser tests

use crate::rule_compiler::ast::*;
use crate::rule_compiler::error::CompilerError;
use crate::rule_compiler::lexer::Lexer;
use crate::rule_compiler::parser::Parser;
use test_log::test;

fn parse_source(source: &str) -> Result<Root, CompilerError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

fn single_rule(source: &str) -> Rule {
    let root = parse_source(source).unwrap();
    assert_eq!(root.statements.len(), 1);
    match root.statements.into_iter().next() {
        Some(Statement::Rule(rule)) => rule,
        other => panic!("expected a rule, got {:?}", other),
    }
}

fn scalar(left: Value, op: CompareOp, right: Value) -> AndOperand {
    AndOperand::Condition(Condition::Scalar(ScalarCondition { left, op, right }))
}

#[test]
fn test_empty_program() {
    let root = parse_source("# nothing but a comment\n").unwrap();
    assert!(root.statements.is_empty());
}

#[test]
fn test_score_changes() {
    let root = parse_source("score(a) = 1 score(b) += score(a) score(c) -= -2").unwrap();
    assert_eq!(
        root.statements,
        vec![
            Statement::ScoreChange(ScoreChange {
                score: "a".to_string(),
                op: ScoreOp::Set,
                value: IntValue::Int(1),
            }),
            Statement::ScoreChange(ScoreChange {
                score: "b".to_string(),
                op: ScoreOp::Add,
                value: IntValue::Score("a".to_string()),
            }),
            Statement::ScoreChange(ScoreChange {
                score: "c".to_string(),
                op: ScoreOp::Subtract,
                value: IntValue::Int(-2),
            }),
        ]
    );
}

#[test]
fn test_exit_statement() {
    let root = parse_source("score(a) = 1 exit").unwrap();
    assert_eq!(root.statements.len(), 2);
    assert_eq!(root.statements[1], Statement::Exit);
}

#[test]
fn test_simple_rule() {
    let rule = single_rule(r#"when var(title) contains "brexit" then score(politics) += 5 done"#);

    assert_eq!(
        rule.condition,
        Expression {
            clauses: vec![OrClause {
                operands: vec![scalar(
                    Value::Var("title".to_string()),
                    CompareOp::Contains,
                    Value::String("brexit".to_string()),
                )],
            }],
        }
    );
    assert_eq!(
        rule.consequences,
        vec![Statement::ScoreChange(ScoreChange {
            score: "politics".to_string(),
            op: ScoreOp::Add,
            value: IntValue::Int(5),
        })]
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let rule = single_rule("when score(a) == 1 or score(b) == 2 and score(c) == 3 then done");

    assert_eq!(rule.condition.clauses.len(), 2);
    assert_eq!(rule.condition.clauses[0].operands.len(), 1);
    assert_eq!(rule.condition.clauses[1].operands.len(), 2);
    assert!(rule.consequences.is_empty());
}

#[test]
fn test_parenthesized_expression() {
    let rule = single_rule(
        r#"when (var(t) contains "a" or var(t) contains "b") and var(t) != "ab" then exit done"#,
    );

    let operands = &rule.condition.clauses[0].operands;
    assert_eq!(operands.len(), 2);
    match &operands[0] {
        AndOperand::Nested(inner) => assert_eq!(inner.clauses.len(), 2),
        other => panic!("expected nested expression, got {:?}", other),
    }
    assert_eq!(rule.consequences, vec![Statement::Exit]);
}

#[test]
fn test_all_comparison_operators() {
    let cases = [
        ("==", CompareOp::Equal),
        ("!=", CompareOp::NotEqual),
        (">", CompareOp::Greater),
        (">=", CompareOp::GreaterOrEqual),
        ("<", CompareOp::Less),
        ("<=", CompareOp::LessOrEqual),
        ("contains", CompareOp::Contains),
        ("does not contain", CompareOp::DoesNotContain),
        ("matches", CompareOp::Matches),
        ("does not match", CompareOp::DoesNotMatch),
    ];

    for (text, expected) in cases {
        let source = format!("when score(a) {} 1 then done", text);
        let rule = single_rule(&source);
        match &rule.condition.clauses[0].operands[0] {
            AndOperand::Condition(Condition::Scalar(cond)) => {
                assert_eq!(cond.op, expected, "operator {}", text)
            }
            other => panic!("expected scalar condition, got {:?}", other),
        }
    }
}

#[test]
fn test_list_conditions() {
    let rule = single_rule(r#"when var(topic) in ["eu", "economics"] then done"#);
    match &rule.condition.clauses[0].operands[0] {
        AndOperand::Condition(Condition::List(list)) => {
            assert!(!list.negated);
            assert_eq!(list.left, Value::Var("topic".to_string()));
            assert_eq!(
                list.values,
                vec![
                    Value::String("eu".to_string()),
                    Value::String("economics".to_string())
                ]
            );
        }
        other => panic!("expected list condition, got {:?}", other),
    }

    let rule = single_rule("when score(x) not in [1, 2, 3] then done");
    match &rule.condition.clauses[0].operands[0] {
        AndOperand::Condition(Condition::List(list)) => {
            assert!(list.negated);
            assert_eq!(list.values.len(), 3);
        }
        other => panic!("expected list condition, got {:?}", other),
    }
}

#[test]
fn test_regex_value_keeps_location() {
    let rule = single_rule("when var(t)\n  matches /(film|movie)/ then done");
    match &rule.condition.clauses[0].operands[0] {
        AndOperand::Condition(Condition::Scalar(cond)) => match &cond.right {
            Value::Regex(regex) => {
                assert_eq!(regex.pattern, "(film|movie)");
                assert_eq!(regex.location.line, 2);
                assert_eq!(regex.location.column, 11);
            }
            other => panic!("expected regex, got {:?}", other),
        },
        other => panic!("expected scalar condition, got {:?}", other),
    }
}

#[test]
fn test_nested_rules() {
    let rule = single_rule(
        "when score(a) == 0 then score(a) += 1 when score(a) == 1 then score(a) += 10 done done",
    );
    assert_eq!(rule.consequences.len(), 2);
    assert!(matches!(rule.consequences[1], Statement::Rule(_)));
}

#[test]
fn test_keywords_allowed_as_names() {
    let rule = single_rule(r#"when var(match) == "x" then score(done) = 1 done"#);
    match &rule.condition.clauses[0].operands[0] {
        AndOperand::Condition(Condition::Scalar(cond)) => {
            assert_eq!(cond.left, Value::Var("match".to_string()))
        }
        other => panic!("expected scalar condition, got {:?}", other),
    }
}

#[test]
fn test_missing_done_is_an_error() {
    let err = parse_source("when score(a) == 1 then score(a) = 2").unwrap_err();
    match err {
        CompilerError::ExpectedToken(expected, found, _) => {
            assert_eq!(expected, "'done'");
            assert_eq!(found, "end of input");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_parse_errors_report_location() {
    let err = parse_source("score(a) = 1\nscore(b) ? 2").unwrap_err();
    assert!(matches!(err, CompilerError::UnexpectedCharacter('?', loc) if loc.line == 2));

    let err = parse_source("score(a) = 1\n  when var(x) 5 then done").unwrap_err();
    match err {
        CompilerError::ExpectedToken(expected, _, loc) => {
            assert_eq!(expected, "comparison operator");
            assert_eq!(loc.line, 2);
            assert_eq!(loc.column, 15);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_invalid_statements() {
    for source in [
        "var(x) == 1",
        "when then done",
        "when score(a) == 1 done",
        "score(a) = \"text\"",
        "score(a) == 1",
        "when var(x) in [] then done",
        "when var(x) does not equal 1 then done",
        "when (var(x) == 1 then done",
    ] {
        assert!(
            parse_source(source).is_err(),
            "expected parse failure for {:?}",
            source
        );
    }
}
