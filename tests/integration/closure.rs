mod common;

use common::{TestProgram, declarations, flatten};

fn keys(program: &TestProgram, class: &str) -> Vec<String> {
    let closure = program.collect().unwrap();
    let resolved = closure.workspace.resolved(class).unwrap_or_else(|| panic!("{class} not resolved"));
    resolved.methods.keys().map(|k| k.to_string()).collect()
}

fn pipeline() -> TestProgram {
    TestProgram::new("App.run")
        .class(
            "App",
            "class App {
                static int run(int n) {
                    Stage a = new Stage(n);
                    return a.next().value();
                }
                static int neverCalled() { Unrelated u = new Unrelated(); return u.x; }
            }",
        )
        .class(
            "Stage",
            "class Stage {
                int v;
                int spare;
                Stage(int v) { this.v = v; }
                Stage next() { return new Stage(v + 1); }
                int value() { return v; }
                int other() { return spare; }
            }",
        )
        .class("Unrelated", "class Unrelated { int x; }")
}

#[test]
fn only_reachable_members_are_collected() {
    let program = pipeline();
    let mut stage_keys = keys(&program, "Stage");
    stage_keys.sort();
    assert_eq!(stage_keys, vec!["Stage-int", "next", "value"]);

    let closure = program.collect().unwrap();
    assert!(closure.workspace.class("Unrelated").is_none());
    let stage = closure.workspace.resolved("Stage").unwrap();
    let fields: Vec<&String> = stage.fields.keys().collect();
    assert_eq!(fields, vec!["v"]);
}

#[test]
fn unused_members_are_not_emitted() {
    let out = declarations(&pipeline());
    assert!(!out.contains("spare"), "{out}");
    assert!(!out.contains("other"), "{out}");
    assert!(out.contains("\tStage next() {\n\t\treturn new Stage(v + 1);\n\t}"), "{out}");
}

#[test]
fn iterations_count_fixpoint_passes() {
    // Kernel body only: no pass needed once it is traversed.
    let alone = TestProgram::new("One.run").class("One", "class One { static int run(int n) { return n; } }");
    assert_eq!(alone.collect().unwrap().iterations, 0);

    // Stage is discovered by the kernel, then its constructor and methods.
    let closure = pipeline().collect().unwrap();
    assert!(closure.iterations >= 1);
}

#[test]
fn kernel_signature_is_recorded() {
    let closure = pipeline().collect().unwrap();
    assert_eq!(closure.kernel.to_string(), "run-int");
}

#[test]
fn null_argument_selects_the_single_candidate() {
    let program = TestProgram::new("N.run").class(
        "N",
        "class N {
            static int run() { return size(null, 3); }
            static int size(int[] xs, int fallback) { return fallback; }
        }",
    );
    assert_eq!(keys(&program, "N"), vec!["run", "size-int[]-int"]);
}

#[test]
fn overloads_called_with_null_and_int_are_both_emitted() {
    let program = TestProgram::new("K.run").class(
        "K",
        "class K {
            static int f(String s) { return 1; }
            static int f(int x) { return x; }
            static int run() { return f(null) + f(7); }
        }",
    );
    let mut k = keys(&program, "K");
    k.sort();
    assert_eq!(k, vec!["f-String", "f-int", "run"]);

    let out = flatten(&program);
    assert!(out.contains("int f(char* s)"), "{out}");
    assert!(out.contains("int f(int x)"), "{out}");
    assert!(out.contains("run_ret = f(NULL) + f(7);"), "{out}");
}

#[test]
fn field_initializers_pull_in_their_classes() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static int run() { Holder h = new Holder(); return h.c.get(); } }")
        .class("Holder", "class Holder { Counter c = new Counter(5); }")
        .class("Counter", "class Counter { int n; Counter(int n) { this.n = n; } int get() { return n; } }");
    let counter = keys(&program, "Counter");
    assert!(counter.contains(&"Counter-int".to_string()), "{counter:?}");
    assert!(counter.contains(&"get".to_string()), "{counter:?}");
}

#[test]
fn missing_class_reports_resolution_error() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Ghost g = new Ghost(); } }");
    let err = program.collect().unwrap_err();
    assert_eq!(err.kind(), "resolution");
    insta::assert_snapshot!(err.message(), @"Cannot find class Ghost in the provided archives");
}

#[test]
fn cyclic_inheritance_is_rejected() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { A a = new A(); } }")
        .class("A", "class A extends B { }")
        .class("B", "class B extends A { }");
    let err = program.collect().unwrap_err();
    assert_eq!(err.kind(), "resolution");
    assert!(err.message().contains("Cyclic inheritance"), "{err}");
}

#[test]
fn enums_are_outside_the_subset() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run() { Color c = new Color(); } }")
        .class("Color", "enum Color { RED, GREEN }");
    let err = program.collect().unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Color.java: Unsupported construct: Not support enum Color");
}
