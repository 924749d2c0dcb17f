mod common;

use common::{TestProgram, XML_TEST, declarations, flatten, strip_preamble};

fn xml_test() -> TestProgram {
    TestProgram::new("XMLTest.main").class("XMLTest", XML_TEST)
}

#[test]
fn translates_static_kernel_with_helper() {
    let out = flatten(&xml_test());
    insta::assert_snapshot!(out, @r"
    void main(char** args) {
    	int* a = new int[10];
    	for (int i = 0; i < 10; i++)
    		a[i] = i;
    	int** b = compute(10, a);
    }

    int** compute(int N, int* a) {
    	int** b = new int[N][N + 10];
    	for (int i = 0; i < N; i++) {
    		for (int j = 0; j < N + 10; j++)
    			b[i][j] = a[i] + 5 + j;
    	}
    	return b;
    }
    ");
}

#[test]
fn length_override_replaces_array_dimensions() {
    let out = flatten(&xml_test().length("b", "10,20"));
    assert!(out.contains("int** b = new int[10][20];"), "{out}");
    // Only array creations are rewritten.
    assert!(out.contains("int** b = compute(10, a);"), "{out}");
}

#[test]
fn entry_only_program_has_empty_declarations() {
    assert_eq!(declarations(&xml_test()), "");
}

#[test]
fn kernel_helper_needs_one_pass() {
    let translation = xml_test().translate().unwrap();
    assert_eq!(translation.iterations, 1);
    assert!(translation.warnings.is_empty());
}

#[test]
fn translation_is_deterministic() {
    let program = TestProgram::new("Main.run")
        .class("Main", "class Main { static double run(double x) { Vec v = new Vec(x, 2 * x); return v.dot(v); } }")
        .class(
            "Vec",
            "class Vec {
                double x, y;
                Vec(double x, double y) { this.x = x; this.y = y; }
                double dot(Vec o) { return x * o.x + y * o.y; }
            }",
        );
    let first = program.translate().unwrap();
    let second = program.translate().unwrap();
    assert_eq!(first, second);
}

#[test]
fn non_void_kernel_returns_through_parameter() {
    let program = TestProgram::new("Stats.mean").class(
        "Stats",
        "class Stats {
            static double mean(double[] xs, int n) {
                double sum = 0;
                for (int i = 0; i < n; i++) sum += xs[i];
                return sum / n;
            }
        }",
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void mean(double* xs, int n, double mean_ret) {
    	double sum = 0;
    	for (int i = 0; i < n; i++)
    		sum += xs[i];
    	mean_ret = sum / n;
    }
    ");
}

#[test]
fn helper_keeps_its_own_return() {
    let program = TestProgram::new("K.run").class(
        "K",
        "class K {
            static int run(int n) { return clamp(n) + 1; }
            static int clamp(int n) { if (n < 0) { return 0; } return n; }
        }",
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int n, int run_ret) {
    	run_ret = clamp(n) + 1;
    }

    int clamp(int n) {
    	if (n < 0) {
    		return 0;
    	}
    	return n;
    }
    ");
}

#[test]
fn math_calls_and_constants_lower_to_libm() {
    let program = TestProgram::new("Geo.circle").class(
        "Geo",
        "class Geo {
            static double circle(double r) { return Math.PI * Math.pow(r, 2) + Math.sqrt(Math.E); }
        }",
    );
    let out = flatten(&program);
    assert!(out.contains("circle_ret = M_PI * pow(r, 2) + sqrt(M_E);"), "{out}");
}

#[test]
fn literals_and_operators_are_rewritten() {
    let program = TestProgram::new("Lit.run").class(
        "Lit",
        "class Lit {
            static void run(int n, boolean flag, String label) {
                long big = 1_000_000L;
                double d = 2d;
                float f = 3f;
                int s = n >>> 2;
                n >>>= 1;
                Object o = null;
            }
        }",
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int n, char flag, char* label) {
    	long big = 1000000L;
    	double d = 2.0;
    	float f = 3.0f;
    	int s = n >> 2;
    	n >>= 1;
    	Object o = NULL;
    }
    ");
}

#[test]
fn kernel_selected_by_qualified_name() {
    let program = TestProgram::new("demo.kernels.Saxpy.run").class(
        "demo.kernels.Saxpy",
        "package demo.kernels;
         class Saxpy {
            static void run(float a, float[] x, float[] y, int n) {
                for (int i = 0; i < n; i++) y[i] = a * x[i] + y[i];
            }
         }",
    );
    let out = program.translate().unwrap();
    insta::assert_snapshot!(strip_preamble(&out.source), @r"
    void run(float a, float* x, float* y, int n) {
    	for (int i = 0; i < n; i++)
    		y[i] = a * x[i] + y[i];
    }
    ");
}
