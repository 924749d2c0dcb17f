mod common;

use common::{TestProgram, declarations, flatten, translate_should_fail_with};

fn shapes() -> TestProgram {
    TestProgram::new("Main.total")
        .class(
            "Main",
            "class Main {
                static double total(double w, double h) {
                    Rect r = new Rect(w, h);
                    return r.area() + r.scaled(2.0);
                }
            }",
        )
        .class(
            "Shape",
            "abstract class Shape implements Comparable {
                String name;
                int unused;
                Shape(String name) { this.name = name; }
                double scaled(double k) { return k * this.area(); }
                abstract double area();
            }",
        )
        .class(
            "Rect",
            "class Rect extends Shape {
                double w, h;
                Rect(double w, double h) { super(\"rect\"); this.w = w; this.h = h; }
                double area() { return w * h; }
            }",
        )
}

#[test]
fn base_classes_precede_subclasses() {
    insta::assert_snapshot!(declarations(&shapes()), @r#"
    class Shape {
    public:
    	char* name;

    	Shape(char* name) {
    		this->name = name;
    	}

    	double scaled(double k) {
    		return k * this->area();
    	}

    	double area();
    };

    class Rect : public Shape {
    public:
    	double w, h;

    	Rect(double w, double h) : Shape("rect") {
    		this->w = w;
    		this->h = h;
    	}

    	double area() {
    		return w * h;
    	}
    };
    "#);
}

#[test]
fn entry_calls_go_through_the_object() {
    insta::assert_snapshot!(flatten(&shapes()), @r"
    void total(double w, double h, double total_ret) {
    	Rect r = new Rect(w, h);
    	total_ret = r.area() + r.scaled(2.0);
    }
    ");
}

#[test]
fn inherited_method_is_emitted_on_its_declaring_class() {
    let closure = shapes().collect().unwrap();
    let ws = &closure.workspace;
    let rect: Vec<String> = ws.resolved("Rect").unwrap().methods.keys().map(|k| k.to_string()).collect();
    assert_eq!(rect, vec!["Rect-double-double", "area"]);
    let shape = ws.resolved("Shape").unwrap();
    assert!(shape.methods.keys().any(|k| k.to_string() == "scaled-double"));
    assert!(shape.fields.contains_key("name"));
    assert!(!shape.fields.contains_key("unused"));
}

#[test]
fn this_constructor_chains_to_own_class() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static int run() { Pt p = new Pt(); return p.x; } }")
        .class(
            "Pt",
            "class Pt {
                int x, y;
                Pt() { this(0, 0); }
                Pt(int x, int y) { this.x = x; this.y = y; }
            }",
        );
    insta::assert_snapshot!(declarations(&program), @r"
    class Pt {
    public:
    	int x, y;

    	Pt() : Pt(0, 0) {
    	}

    	Pt(int x, int y) {
    		this->x = x;
    		this->y = y;
    	}
    };
    ");
}

#[test]
fn super_method_call_names_the_base() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static int run() { Child c = new Child(); return c.value(); } }")
        .class("Parent", "class Parent { int value() { return 1; } }")
        .class("Child", "class Child extends Parent { int value() { return super.value() + 1; } }");
    let out = declarations(&program);
    assert!(out.contains("return Parent::value() + 1;"), "{out}");
    assert!(out.contains("class Child : public Parent {"), "{out}");
}

#[test]
fn static_members_use_scope_resolution() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static int run(int n) { return Util.twice(n) + Util.BASE; } }")
        .class(
            "Util",
            "class Util {
                static int BASE = 7;
                static int twice(int n) { return 2 * n; }
            }",
        );
    insta::assert_snapshot!(declarations(&program), @r"
    class Util {
    public:
    	int BASE = 7;

    	static int twice(int n) {
    		return 2 * n;
    	}
    };
    ");
    assert!(flatten(&program).contains("run_ret = Util::twice(n) + Util::BASE;"));
}

#[test]
fn qualified_super_constructor_is_rejected() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static void run(Outer o) { Inner i = new Inner(o); } }")
        .class("Outer", "class Outer { }")
        .class("Base", "class Base { }")
        .class("Inner", "class Inner extends Base { Inner(Outer o) { o.super(); } }");
    translate_should_fail_with(&program, "Not support multiple inheritance");
}
