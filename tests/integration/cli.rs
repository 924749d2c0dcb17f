mod common;

use common::{TestProgram, XML_TEST, j2ir};

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    TestProgram::new("XMLTest.main").class("XMLTest", XML_TEST).write_dir(dir.path());
    dir
}

#[test]
fn wrong_argument_count_prints_usage() {
    let output = j2ir().arg("only-one").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: j2ir <Jar files> <Config file> <Output file>"), "{stderr}");
}

#[test]
fn successful_run_writes_both_units() {
    let dir = workspace();
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"XMLTest.main\"\n\n[variables.b]\nlength = \"10,20\"\n").unwrap();
    let out = dir.path().join("xml_test");

    let output = j2ir().arg(dir.path()).arg(&config).arg(&out).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "j2ir failed: {stderr}");
    assert!(stderr.contains("translated in 1 iteration(s)"), "{stderr}");

    let source = std::fs::read_to_string(dir.path().join("xml_test.cpp")).unwrap();
    assert!(source.starts_with("#include <math.h>\n#include <string.h>\n"));
    assert!(source.contains("int** b = new int[10][20];"));
    assert!(dir.path().join("xml_test.h").exists());
}

#[test]
fn translation_error_exits_one_without_output() {
    let dir = workspace();
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"XMLTest.nothing\"\n").unwrap();
    let out = dir.path().join("out");

    let output = j2ir().arg(dir.path()).arg(&config).arg(&out).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[resolution]"), "{stderr}");
    assert!(stderr.contains("Cannot find the kernel method nothing in class XMLTest"), "{stderr}");
    assert!(!dir.path().join("out.h").exists());
    assert!(!dir.path().join("out.cpp").exists());
}

#[test]
fn subset_errors_name_the_source_file() {
    let dir = tempfile::tempdir().unwrap();
    TestProgram::new("S.run")
        .class("S", "class S {\n    static void run(Object o) {\n        synchronized (o) { }\n    }\n}\n")
        .write_dir(dir.path());
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"S.run\"\n").unwrap();

    let output = j2ir().arg(dir.path()).arg(&config).arg(dir.path().join("out")).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[unsupported]"), "{stderr}");
    let file = dir.path().join("S.java");
    assert!(stderr.contains(&file.display().to_string()), "{stderr}");
    assert!(!dir.path().join("out.cpp").exists());
}

#[test]
fn unknown_config_format_is_rejected() {
    let dir = workspace();
    let config = dir.path().join("kernel.json");
    std::fs::write(&config, "{}").unwrap();

    let output = j2ir().arg(dir.path()).arg(&config).arg(dir.path().join("out")).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[config]"), "{stderr}");
}

#[test]
fn verbose_flag_enables_progress_logs() {
    let dir = workspace();
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"XMLTest.main\"\n").unwrap();

    let output = j2ir()
        .arg("-v")
        .arg(dir.path())
        .arg(&config)
        .arg(dir.path().join("out"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Indexed 1 classes from the archive set"), "{stderr}");
}
