use std::borrow::Cow;
use tessera_derive::tessera_error;

#[tessera_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Lookup failed: {key}")]
    Missing { key: String },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn load() -> Result<(), DemoError> {
    Err::<(), _>(std::io::Error::other("disk")).context("reading manifest")?;
    Ok(())
}

fn main() {
    let err = load().context("bootstrapping").unwrap_err();
    assert_eq!(err.context_message(), Some("reading manifest; bootstrapping"));

    let missing = DemoError::Missing { key: "color".to_owned() };
    assert_eq!(missing.context_message(), None);

    let internal: DemoError = "boom".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
