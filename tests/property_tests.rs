// Property-based tests for the Khwarizmi interpreter
//
// Generates small programs from random integers and checks the results
// against Rust's own arithmetic.

use khwarizmi::interpreter::OutputEvent;
use proptest::prelude::*;
use std::collections::VecDeque;

fn run_code(code: &str) -> Vec<String> {
    let program = khwarizmi::compile(code).expect("program should compile");
    let mut input = VecDeque::new();
    let mut output: Vec<OutputEvent> = Vec::new();
    khwarizmi::run(&program, &mut input, &mut output).expect("program should run");
    output.into_iter().map(|e| e.text).collect()
}

proptest! {
    #[test]
    fn integer_literal_evaluates_to_itself(n in 0i64..=i64::MAX) {
        let output = run_code(&format!("begin\n print {}\nend", n));
        prop_assert_eq!(output, vec![n.to_string()]);
    }

    #[test]
    fn arithmetic_matches_wrapping_semantics(a in (i64::MIN + 1)..=i64::MAX, b in (i64::MIN + 1)..=i64::MAX, c in 1i64..1000) {
        let output = run_code(&format!(
            "begin\n int a = {}\n int b = {}\n print a + b, a - b, a * b, a / {}\nend",
            a, b, c
        ));
        let expected = format!(
            "{} {} {} {}",
            a.wrapping_add(b),
            a.wrapping_sub(b),
            a.wrapping_mul(b),
            a.wrapping_div(c)
        );
        prop_assert_eq!(output, vec![expected]);
    }

    #[test]
    fn solve_recovers_chosen_value(
        a in (-50i64..50).prop_filter("coefficient must be non-zero", |a| *a != 0),
        x in -1000i64..1000,
        b in -1000i64..1000
    ) {
        let c = a * x + b;
        let output = run_code(&format!("begin\n solve {} * x + {} == {}\n print x\nend", a, b, c));
        prop_assert_eq!(output, vec![format!("x = {}", x), x.to_string()]);
    }

    #[test]
    fn solve_accepts_unknown_on_either_side(x in -1000i64..1000, k in -1000i64..1000) {
        let output = run_code(&format!("begin\n solve {} == x - {}\nend", x - k, k));
        prop_assert_eq!(output, vec![format!("x = {}", x)]);
    }

    #[test]
    fn comparisons_match_rust(a in -100i64..100, b in -100i64..100) {
        let output = run_code(&format!("begin\n print {a} < {b}, {a} <= {b}, {a} == {b}, {a} != {b}\nend", a = a, b = b));
        let expected = format!("{} {} {} {}", a < b, a <= b, a == b, a != b);
        prop_assert_eq!(output, vec![expected]);
    }
}
