//! Cross-scope lookup rules exercised end to end through `compile`,
//! beyond the unit-level coverage already in `symbol.rs`.

#[test]
fn local_variable_does_not_leak_into_a_later_subroutine() {
    let source = r#"
program p:
f(): int x; chillax
g(): chillax
main:
    let x = 1
"#;
    let err = amplc::compile(source).expect_err("x is local to f, not visible in main");
    assert_eq!(err.kind.to_string(), "unknown identifier 'x'");
}

#[test]
fn parameter_shadows_nothing_but_is_visible_throughout_the_body() {
    let source = r#"
program p:
f(int x): let x = x + 1
main:
    f(1)
"#;
    assert!(amplc::compile(source).is_ok());
}

#[test]
fn a_later_subroutine_can_reuse_an_earlier_subroutines_local_name() {
    let source = r#"
program p:
f(): int x; chillax
g(): int x; chillax
main:
    f();
    g()
"#;
    assert!(amplc::compile(source).is_ok());
}

#[test]
fn global_scope_only_ever_holds_callables() {
    // A variable can never collide with a subroutine name across scopes:
    // `x` as a local in `main` and `x` is simply never visible to a
    // `find_name` that resolves to the global scope, since `main`'s own
    // local scope shadows it first.
    let source = r#"
program p:
main:
    int x;
    let x = 1
"#;
    assert!(amplc::compile(source).is_ok());
}
