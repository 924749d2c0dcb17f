mod common;

use std::io::Write;
use std::path::Path;

use common::{TestProgram, XML_TEST, strip_preamble};
use j2ir::source::{ArchiveIndex, ArchiveResolver, SourceResolver};
use zip::write::SimpleFileOptions;

fn write_jar(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut jar = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        jar.start_file(*name, SimpleFileOptions::default()).unwrap();
        jar.write_all(contents.as_bytes()).unwrap();
    }
    jar.finish().unwrap();
}

const SHAPE: &str = "package geo;
public class Shape {
    double side;
    public Shape(double side) { this.side = side; }
    public double area() { return side * side; }
}
";

const MAIN: &str = "package app;
import geo.Shape;
public class Main {
    public static double run(double s) { Shape sh = new Shape(s); return sh.area(); }
}
";

#[test]
fn directory_index_uses_package_paths() {
    let dir = tempfile::tempdir().unwrap();
    TestProgram::new("XMLTest.main")
        .class("XMLTest", XML_TEST)
        .class("geo.Shape", SHAPE)
        .write_dir(dir.path());
    std::fs::write(dir.path().join("README.txt"), "not a source").unwrap();

    let index = ArchiveIndex::build(&dir.path().to_string_lossy()).unwrap();
    let names: Vec<&str> = index.class_names().collect();
    assert_eq!(names, vec!["XMLTest", "geo.Shape"]);
    assert!(index.locate("Shape").is_some());
}

#[test]
fn jar_entries_are_indexed_and_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("geo.jar");
    write_jar(&jar, &[("geo/Shape.java", SHAPE), ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")]);

    let index = ArchiveIndex::build(&jar.to_string_lossy()).unwrap();
    assert_eq!(index.len(), 1);
    let mut resolver = ArchiveResolver::new(index);
    assert!(resolver.contains("geo.Shape"));
    assert!(resolver.contains("Shape"));
    let shape = resolver.resolve("Shape").unwrap();
    assert_eq!(shape.decl.name.node, "Shape");
    assert_eq!(shape.origin.path, format!("{}!/geo/Shape.java", jar.display()));
}

#[test]
fn missing_archive_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.jar");
    let err = ArchiveIndex::build(&missing.to_string_lossy()).unwrap_err();
    assert_eq!(err.kind(), "io");
}

#[test]
fn translate_files_across_directory_and_jar() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(src.join("app")).unwrap();
    std::fs::write(src.join("app/Main.java"), MAIN).unwrap();
    let jar = dir.path().join("geo.jar");
    write_jar(&jar, &[("geo/Shape.java", SHAPE)]);

    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"app.Main.run\"\n").unwrap();
    let output = dir.path().join("out");
    let archives = format!("{};{}", src.display(), jar.display());

    let translation = j2ir::translate_files(&archives, &config, &output).unwrap();
    let header = std::fs::read_to_string(dir.path().join("out.h")).unwrap();
    let source = std::fs::read_to_string(dir.path().join("out.cpp")).unwrap();
    assert_eq!(header, translation.header);
    assert_eq!(source, translation.source);

    insta::assert_snapshot!(strip_preamble(&header), @r"
    class Shape {
    public:
    	double side;

    	Shape(double side) {
    		this->side = side;
    	}

    	double area() {
    		return side * side;
    	}
    };
    ");
    insta::assert_snapshot!(strip_preamble(&source), @r"
    void run(double s, double run_ret) {
    	Shape sh = new Shape(s);
    	run_ret = sh.area();
    }
    ");
}

#[test]
fn xml_selector_with_length_override() {
    let dir = tempfile::tempdir().unwrap();
    TestProgram::new("XMLTest.main").class("XMLTest", XML_TEST).write_dir(dir.path());
    let config = dir.path().join("kernel.xml");
    std::fs::write(
        &config,
        r#"<?xml version="1.0"?>
<kernel name="XMLTest.main">
  <variable>
    <name>b</name>
    <length>10,20</length>
  </variable>
</kernel>
"#,
    )
    .unwrap();
    let output = dir.path().join("kernel_out");

    let translation = j2ir::translate_files(&dir.path().to_string_lossy(), &config, &output).unwrap();
    assert!(translation.source.contains("int** b = new int[10][20];"));
    assert!(dir.path().join("kernel_out.cpp").exists());
}

#[test]
fn failed_translation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    TestProgram::new("XMLTest.main").class("XMLTest", XML_TEST).write_dir(dir.path());
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"XMLTest.missing\"\n").unwrap();
    let output = dir.path().join("out");

    let err = j2ir::translate_files(&dir.path().to_string_lossy(), &config, &output).unwrap_err();
    assert_eq!(err.kind(), "resolution");
    assert!(!dir.path().join("out.h").exists());
    assert!(!dir.path().join("out.cpp").exists());
}

#[test]
fn syntax_errors_name_the_archive_entry() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("bad.jar");
    write_jar(&jar, &[("Broken.java", "class Broken { void run( { } }")]);
    let config = dir.path().join("kernel.toml");
    std::fs::write(&config, "kernel = \"Broken.run\"\n").unwrap();

    let err = j2ir::translate_files(&jar.to_string_lossy(), &config, &dir.path().join("out")).unwrap_err();
    assert_eq!(err.kind(), "syntax");
    assert!(err.to_string().contains("bad.jar!/Broken.java"), "{err}");
}
