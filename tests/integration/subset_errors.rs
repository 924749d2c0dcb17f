mod common;

use common::{TestProgram, flatten, translate_should_fail_with};
use j2ir::diagnostics::WarningKind;

fn kernel_body(body: &str) -> TestProgram {
    TestProgram::new("K.run").class("K", &format!("class K {{ static void run(int n, Object o) {{ {body} }} }}"))
}

fn error_of(program: &TestProgram) -> String {
    program.translate().unwrap_err().to_string()
}

#[test]
fn lambdas_and_method_references() {
    insta::assert_snapshot!(
        error_of(&kernel_body("Object r = () -> { };")),
        @"K.java: Unsupported construct: Not support lambda expressions"
    );
    insta::assert_snapshot!(
        error_of(&kernel_body("Object f = o::hashCode;")),
        @"K.java: Unsupported construct: Not support method references"
    );
}

#[test]
fn anonymous_and_local_classes() {
    let program = TestProgram::new("K.run")
        .class("K", "class K { static void run() { Task t = new Task() { }; } }")
        .class("Task", "class Task { }");
    insta::assert_snapshot!(error_of(&program), @"K.java: Unsupported construct: Not support anonymous classes");
    insta::assert_snapshot!(
        error_of(&kernel_body("class Local { } n = 1;")),
        @"K.java: Unsupported construct: Not support local classes"
    );
}

#[test]
fn labeled_jumps() {
    insta::assert_snapshot!(
        error_of(&kernel_body("outer: for (int i = 0; i < n; i++) { break outer; }")),
        @"K.java: Unsupported construct: Not support labeled jump statements"
    );
}

#[test]
fn try_with_resources() {
    let program = TestProgram::new("K.run")
        .class("K", "class K { static void run() { try (Res r = new Res()) { } } }")
        .class("Res", "class Res { }");
    insta::assert_snapshot!(error_of(&program), @"K.java: Unsupported construct: Not support try-block with resources");
}

#[test]
fn nested_and_generic_classes() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Outer o = new Outer(); } }")
        .class("Outer", "class Outer { class Inner { } }");
    translate_should_fail_with(&program, "Not support nested classes");

    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Box b = new Box(); } }")
        .class("Box", "class Box<T> { }");
    translate_should_fail_with(&program, "Not support generic classes");
}

#[test]
fn initializer_blocks() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Cfg c = new Cfg(); } }")
        .class("Cfg", "class Cfg { static { } }");
    translate_should_fail_with(&program, "Not support initializer blocks");
}

#[test]
fn array_suffix_on_method_declaration() {
    let program = TestProgram::new("K.run").class("K", "class K { static int run()[] { return null; } }");
    insta::assert_snapshot!(error_of(&program), @"K.java: Unsupported construct: Not support method declaration with array count");
}

#[test]
fn dropped_constructs_only_warn() {
    let program = kernel_body(
        "try { n = 1; } catch (IllegalStateException e) { n = 2; } if (n < 0) throw new IllegalArgumentException();",
    );
    let translation = program.translate().unwrap();
    let warnings: Vec<(WarningKind, &str)> =
        translation.warnings.iter().map(|w| (w.kind, w.msg.as_str())).collect();
    assert_eq!(
        warnings,
        vec![
            (WarningKind::DroppedCatch, "Ignore catch clause for IllegalStateException"),
            (WarningKind::DroppedThrow, "Ignore throw statement"),
        ]
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int n, Object o) {
    	{
    		n = 1;
    	}
    	if (n < 0)
    		;
    }
    ");
}

#[test]
fn throws_clause_on_constructor_warns() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Conn c = new Conn(); } }")
        .class("Conn", "class Conn { @Inject Conn() throws Exception { } }");
    let translation = program.translate().unwrap();
    let msgs: Vec<&str> = translation.warnings.iter().map(|w| w.msg.as_str()).collect();
    assert_eq!(msgs, vec!["Ignore throws in the constructor", "Ignore annotation @Inject"]);
}
