// Tests for output formatting
//
// Output is captured through a shared buffer so each format can be checked
// byte for byte.

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, Box::new(buffer.clone()));
    (writer, buffer)
}

fn sample_outcomes() -> Vec<Outcome> {
    vec![
        Outcome::new("image.png", Ok("image/png; charset=binary".to_string())),
        Outcome::new(
            "missing",
            Err(MagicError::Native {
                errno: 2,
                message: "cannot open `missing' (No such file or directory)".to_string(),
            }),
        ),
    ]
}

#[test]
fn test_human_outcomes() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.outcomes(&sample_outcomes()).unwrap();

    assert_eq!(
        buffer.contents(),
        "image.png: image/png; charset=binary\n\
         missing: cannot open `missing' (No such file or directory)\n"
    );
}

#[test]
fn test_json_outcomes() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output.outcomes(&sample_outcomes()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            {"path": "image.png", "result": "image/png; charset=binary"},
            {"path": "missing", "error": {
                "code": 2,
                "message": "cannot open `missing' (No such file or directory)"
            }}
        ])
    );
}

#[test]
fn test_yaml_outcomes() {
    let (mut output, buffer) = writer(OutputFormat::Yaml, false);
    output
        .outcomes(&[Outcome::new("a.sh", Ok("text/x-shellscript".to_string()))])
        .unwrap();

    let contents = buffer.contents();
    assert!(contents.contains("path: a.sh"), "{contents}");
    assert!(contents.contains("result: text/x-shellscript"), "{contents}");
    assert!(!contents.ends_with("\n\n"));
}

#[test]
fn test_success_respects_quiet_and_format() {
    let (mut output, buffer) = writer(OutputFormat::Human, true);
    output.success("compiled").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output.success("compiled").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.success("compiled").unwrap();
    assert_eq!(buffer.contents(), "compiled\n");
}

#[test]
fn test_fields_are_aligned() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output
        .fields(&[("libmagic", "5.45".to_string()), ("parameters", "yes".to_string())])
        .unwrap();

    assert_eq!(buffer.contents(), "libmagic:   5.45\nparameters: yes\n");
}

#[test]
fn test_outcome_failure_detection() {
    let outcomes = sample_outcomes();
    assert!(!outcomes[0].is_failure());
    assert!(outcomes[1].is_failure());
}
