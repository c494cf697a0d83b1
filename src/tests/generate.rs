use super::{Generator, Mode, ScriptPath};
use crate::archive::RuntimeSource;
use crate::bootstrap::{Bootstrap, EMBEDDED_NOTICE};
use crate::document::{Document, DIRECTIVE};
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRIPT: &str = "print('hello')\n";

fn generator(runtime: &Path) -> Generator {
    Generator::new(
        Bootstrap::default(),
        RuntimeSource {
            root: runtime.to_path_buf(),
            module: "pysh".to_string(),
            extensions: vec!["py".to_string()],
        },
    )
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let runtime = dir.path().join("runtime");
    fs::create_dir_all(&runtime).unwrap();
    fs::write(runtime.join("__init__.py"), "def main(path):\n  pass\n").unwrap();
    (dir, runtime)
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[cfg(unix)]
fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn test_script_path_dash_is_stdio() {
    assert_eq!(ScriptPath::new("-"), ScriptPath::Stdio);
    assert_eq!(
        ScriptPath::new("tool.py"),
        ScriptPath::File(PathBuf::from("tool.py"))
    );
    assert_eq!(ScriptPath::Stdio.to_string(), "<stdin>");
}

#[test]
fn test_generate_rewrites_file_in_place() {
    let (dir, runtime) = workspace();
    let path = dir.path().join("tool");
    fs::write(&path, SCRIPT).unwrap();

    generator(&runtime)
        .generate(&ScriptPath::File(path.clone()), Mode::Header)
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&format!("{DIRECTIVE}\n")));
    assert!(text.ends_with(SCRIPT));
    assert!(!text.contains(EMBEDDED_NOTICE));
}

#[cfg(unix)]
#[test]
fn test_generated_file_is_executable() {
    let (dir, runtime) = workspace();
    let plain = dir.path().join("plain");
    let already = dir.path().join("already");
    fs::write(&plain, SCRIPT).unwrap();
    fs::write(&already, SCRIPT).unwrap();
    set_mode(&plain, 0o640);
    set_mode(&already, 0o755);

    let generator = generator(&runtime);
    generator
        .generate(&ScriptPath::File(plain.clone()), Mode::Header)
        .unwrap();
    generator
        .generate(&ScriptPath::File(already.clone()), Mode::Header)
        .unwrap();

    assert_eq!(mode(&plain), 0o740);
    assert_eq!(mode(&already), 0o755);
}

#[test]
fn test_no_temporary_files_are_left_behind() {
    let (dir, runtime) = workspace();
    let path = dir.path().join("tool");
    fs::write(&path, SCRIPT).unwrap();

    let generator = generator(&runtime);
    generator
        .generate(&ScriptPath::File(path.clone()), Mode::Header)
        .unwrap();
    generator
        .generate(&ScriptPath::File(path), Mode::Distributable)
        .unwrap();

    assert_eq!(entries(dir.path()), ["runtime", "tool"]);
}

#[test]
fn test_malformed_script_is_left_untouched() {
    let (dir, runtime) = workspace();
    let path = dir.path().join("tool");
    let text = "#!/bin/sh -e\n# A -->\nx\n# <-- B\n";
    fs::write(&path, text).unwrap();

    let result = generator(&runtime).generate(&ScriptPath::File(path.clone()), Mode::Header);

    assert!(matches!(result, Err(Error::SectionMismatch { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), text);
    assert_eq!(entries(dir.path()), ["runtime", "tool"]);
}

#[test]
fn test_missing_runtime_leaves_script_untouched() {
    let (dir, _) = workspace();
    let path = dir.path().join("tool");
    fs::write(&path, SCRIPT).unwrap();

    let result = generator(&dir.path().join("empty"))
        .generate(&ScriptPath::File(path.clone()), Mode::Distributable);

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), SCRIPT);
}

#[test]
fn test_missing_script_is_an_io_error() {
    let (dir, runtime) = workspace();
    let result =
        generator(&runtime).generate(&ScriptPath::File(dir.path().join("nope")), Mode::Header);

    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_distributable_embeds_runtime() {
    let (dir, runtime) = workspace();
    let path = dir.path().join("tool");
    fs::write(&path, SCRIPT).unwrap();

    generator(&runtime)
        .generate(&ScriptPath::File(path.clone()), Mode::Distributable)
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let (script, payload) = text.split_once(&format!("\n{EMBEDDED_NOTICE}\n")).unwrap();
    assert!(script.ends_with(SCRIPT));
    assert!(payload.starts_with("\"\"\"\n"));
    assert!(payload.ends_with("\"\"\"\n"));

    let document = generator(&runtime)
        .read(&ScriptPath::File(path))
        .unwrap();
    assert!(document.is_distributable());
}

#[test]
fn test_regeneration_is_idempotent() {
    let (dir, runtime) = workspace();
    let path = dir.path().join("tool");
    fs::write(&path, SCRIPT).unwrap();
    let generator = generator(&runtime);

    for mode in [Mode::Header, Mode::Distributable] {
        generator
            .generate(&ScriptPath::File(path.clone()), mode)
            .unwrap();
        let once = fs::read_to_string(&path).unwrap();
        generator
            .generate(&ScriptPath::File(path.clone()), mode)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), once);
    }
}

#[test]
fn test_render_matches_document_normalize() {
    let (_dir, runtime) = workspace();
    let rendered = generator(&runtime)
        .render(SCRIPT.as_bytes(), Mode::Header)
        .unwrap();

    let mut expected = Document::parse_str(SCRIPT).unwrap();
    expected.normalize(&Bootstrap::default(), None);
    assert_eq!(rendered, expected);
}
