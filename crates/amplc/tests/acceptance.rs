//! End-to-end acceptance scenarios: programs that must compile cleanly.
//! Covers boundary shapes of the grammar — empty subdef list, no-semicolon
//! single statement body, nested if/elif/else, indexed and whole-array
//! assignment, zero-arg calls, and `chillax` as a complete body.

macro_rules! accept_tests {
    ($($name:ident: $code:literal;)*) => {
        $(
            paste::item! {
                #[test]
                fn [< accepts_ $name >]() {
                    match amplc::compile($code) {
                        Ok(_) => {}
                        Err(d) => panic!("expected acceptance, got diagnostic: {}", d.render("test.ampl")),
                    }
                }
            }
        )*
    };
}

accept_tests! {
    empty_subdef_list: "program p: main: chillax";

    single_statement_no_semicolon: "program p: main: int a; let a = 1";

    nested_if_elif_else: r#"
program p:
main:
    int a;
    let a = 1;
    if a = 1:
        let a = 2
    elif a = 2:
        let a = 3
    else:
        let a = 4
    end
"#;

    array_assignment_with_index: r#"
program p:
main:
    int a array;
    let a = array 5;
    let a[0] = 7
"#;

    array_assignment_without_index: "program p: main: int a array; let a = array 5";

    zero_arg_call: r#"
program p:
g(): chillax
main:
    g()
"#;

    chillax_complete_body: "program p: main: chillax";

    subroutine_calling_earlier_sibling: r#"
program p:
g(): chillax
f(): g()
main:
    f()
"#;

    function_return_value_used: r#"
program p:
f() -> int: return 1
main:
    int a;
    let a = f()
"#;

    while_loop_and_input_output: r#"
program p:
main:
    int a;
    input(a);
    while a > 0:
        output("counting down: " .. a);
        let a = a - 1
    end
"#;

    boolean_equality_comparison: r#"
program p:
main:
    bool a;
    bool b;
    let a = true;
    let b = a = false
"#;
}
