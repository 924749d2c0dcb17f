mod common;

use common::{TestProgram, flatten};

fn grid() -> TestProgram {
    TestProgram::new("Grid.fill").class(
        "Grid",
        "class Grid {
            static void fill(int n) {
                float[][] cells = new float[n][n * 2];
                for (int i = 0; i < cells.length; i++)
                    for (int j = 0; j < cells[i].length; j++)
                        cells[i][j] = i * j;
            }
        }",
    )
}

#[test]
fn length_reads_use_the_configured_dimensions() {
    insta::assert_snapshot!(flatten(&grid().length("cells", "64, 128")), @r"
    void fill(int n) {
    	float** cells = new float[64][128];
    	for (int i = 0; i < 64; i++)
    		for (int j = 0; j < 128; j++)
    			cells[i][j] = i * j;
    }
    ");
}

#[test]
fn length_without_override_is_rejected() {
    let err = grid().translate().unwrap_err();
    assert_eq!(err.kind(), "unsupported");
    insta::assert_snapshot!(
        err.message(),
        @"Cannot determine the length of array cells without a length attribute"
    );
}

#[test]
fn override_with_wrong_rank_is_a_config_error() {
    let err = grid().length("cells", "64").translate().unwrap_err();
    assert_eq!(err.kind(), "config");
    insta::assert_snapshot!(err.to_string(), @"Configuration error: Dimension mismatch for array variable cells");
}

#[test]
fn reassignment_picks_up_the_override() {
    let program = TestProgram::new("Buf.run")
        .class(
            "Buf",
            "class Buf {
                static void run(int n) {
                    int[] tmp;
                    tmp = new int[n];
                    tmp[0] = n;
                }
            }",
        )
        .length("tmp", "256");
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int n) {
    	int* tmp;
    	tmp = new int[256];
    	tmp[0] = n;
    }
    ");
}

#[test]
fn array_initializers_keep_their_elements() {
    let program = TestProgram::new("Init.run").class(
        "Init",
        "class Init {
            static int run() {
                int[] primes = {2, 3, 5};
                int[] more = new int[] {7, 11};
                int[][] empty = {};
                return primes[0] + more[1];
            }
        }",
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int run_ret) {
    	int* primes = { 2, 3, 5 };
    	int* more = new int[2]{ 7, 11 };
    	int** empty = {};
    	run_ret = primes[0] + more[1];
    }
    ");
}

#[test]
fn entry_field_arrays_are_flattened_with_their_rank() {
    let program = TestProgram::new("Field.run").class(
        "Field",
        "class Field {
            double[][] data;
            int count;
            void run(int i) { data[i][0] = count; bump(); }
            void bump() { count++; }
        }",
    );
    insta::assert_snapshot!(flatten(&program), @r"
    void run(int i, double** data, int count) {
    	data[i][0] = count;
    	bump(data, count);
    }

    void bump(double** data, int count) {
    	count++;
    }
    ");
}
