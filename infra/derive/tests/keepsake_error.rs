use keepsake_derive::keepsake_error;
use std::borrow::Cow;

#[keepsake_error]
pub enum RecordError {
    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Malformed record{}: {message}", format_context(.context))]
    Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal record error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn missing_file() -> Result<Vec<u8>, std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
}

#[test]
fn keepsake_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/keepsake_error_pass.rs");
}

#[test]
fn source_errors_convert_with_context() {
    let err = missing_file().context("Reading record").expect_err("expected failure");

    assert!(matches!(err, RecordError::Io { context: Some(ref c), .. } if c == "Reading record"));
    assert_eq!(err.to_string(), "I/O failure (Reading record): gone");
}

#[test]
fn context_overrides_existing_variant_context() {
    let result: Result<(), RecordError> =
        Err(RecordError::Malformed { message: "short blob".into(), context: None });

    let err = result.context("session abc").expect_err("expected failure");
    assert_eq!(err.to_string(), "Malformed record (session abc): short blob");
}

#[test]
fn question_mark_lifts_source_errors() {
    fn load() -> Result<Vec<u8>, RecordError> {
        Ok(missing_file()?)
    }

    let err = load().expect_err("expected failure");
    assert!(matches!(err, RecordError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "I/O failure: gone");
}

#[test]
fn strings_become_internal_errors() {
    let from_static: RecordError = "boom".into();
    let from_owned: RecordError = String::from("bang").into();

    assert!(matches!(from_static, RecordError::Internal { .. }));
    assert_eq!(from_owned.to_string(), "Internal record error: bang");
}
