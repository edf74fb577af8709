mod common;

use common::{eval_forms, eval_forms_err, eval_one};
use sprig_core::SprigError;
use sprig_eval::Interpreter;

// Scenario 1: defining and applying the identity procedure.
#[test]
fn define_sugar_and_application() {
    assert_eq!(eval_forms(&["(define (id x) x)", "(id 5)"]), "5");
}

// Scenario 2: if with a comparison predicate.
#[test]
fn if_on_comparison() {
    assert_eq!(eval_one("(if (= 1 1) 10 20)"), "10");
}

// Scenario 3: cond falls through false clauses to the first truthy one.
#[test]
fn cond_selects_first_truthy_clause() {
    assert_eq!(eval_one("(cond (#false 1) (#true 2) (else 3))"), "2");
}

// Scenario 4: define + set! mutate, frame-local redefinition fails.
#[test]
fn define_set_and_redefinition() {
    assert_eq!(eval_forms(&["(define x 1)", "(set! x 2)", "x"]), "2");
    let err = eval_forms_err(&["(define x 1)", "(set! x 2)", "(define x 3)"]);
    assert!(matches!(err, SprigError::Redefined(name) if name == "x"));
}

// Scenario 5: cons cells through car and cdr.
#[test]
fn cons_car_cdr() {
    assert_eq!(eval_one("(car (cons 1 2))"), "1");
    assert_eq!(eval_one("(cdr (cons 1 2))"), "2");
}

// Scenario 6: one form per parse call.
#[test]
fn multiple_top_level_forms_are_a_parse_error() {
    let mut interp = Interpreter::new();
    let err = interp.eval_str("(+ 1 2) (+ 3 4)").unwrap_err();
    assert!(matches!(err, SprigError::Parse { .. }));
}

#[test]
fn closures_capture_their_defining_scope() {
    assert_eq!(
        eval_forms(&[
            "(define (compose f g) (lambda (x) (f (g x))))",
            "(define (inc n) (+ n 1))",
            "(define (double n) (* n 2))",
            "(define inc-then-double (compose double inc))",
            "(inc-then-double 4)",
        ]),
        "10"
    );
}

#[test]
fn list_building_and_walking() {
    assert_eq!(
        eval_forms(&[
            "(define (sum-list l) (if (null? l) 0 (+ (car l) (sum-list (cdr l)))))",
            "(sum-list (list 1 2 3 4))",
        ]),
        "10"
    );
}

#[test]
fn tail_recursive_loop_at_scale() {
    assert_eq!(
        eval_forms(&[
            "(define (loop n) (if (= n 0) \"ok\" (loop (- n 1))))",
            "(loop 100000)",
        ]),
        "\"ok\""
    );
}

#[test]
fn small_heap_completes_a_working_session() {
    // Everything above runs with the default heap; this drives a small one
    // through definitions, closures, and collection churn.
    let mut interp = Interpreter::with_heap_capacity(512);
    for form in [
        "(define (make-adder n) (lambda (x) (+ x n)))",
        "(define add3 (make-adder 3))",
        "(define (iterate f n x) (if (= n 0) x (iterate f (- n 1) (f x))))",
    ] {
        interp.eval_str(form).unwrap();
    }
    let result = interp.eval_str("(iterate add3 100 0)").unwrap();
    assert_eq!(interp.print(result), "300");
}

#[test]
fn errors_unwind_but_the_session_continues() {
    let mut interp = Interpreter::new();
    interp.eval_str("(define x 41)").unwrap();
    assert!(interp.eval_str("(car x)").is_err());
    assert!(interp.eval_str("(ghost)").is_err());
    let v = interp.eval_str("(+ x 1)").unwrap();
    assert_eq!(interp.print(v), "42");
}

#[test]
fn parse_errors_are_distinct_from_eval_errors() {
    let mut interp = Interpreter::new();
    assert!(matches!(
        interp.eval_str("(+ 1"),
        Err(SprigError::Parse { .. })
    ));
    assert!(matches!(
        interp.eval_str("#what"),
        Err(SprigError::Parse { .. })
    ));
    assert!(matches!(
        interp.eval_str("(undefined-proc 1)"),
        Err(SprigError::Unbound(_))
    ));
}

#[test]
fn display_forms_round_trip_through_the_reader() {
    let mut interp = Interpreter::new();
    for (input, expected) in [
        ("(list 1 2 3)", "(1 2 3)"),
        ("(cons 1 (cons 2 3))", "(1 2 . 3)"),
        ("(cons \"a\" #nil)", "(\"a\")"),
        ("#false", "#false"),
    ] {
        let v = interp.eval_str(input).unwrap();
        assert_eq!(interp.print(v), expected, "for {input}");
    }
}
