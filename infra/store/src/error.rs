use std::borrow::Cow;

/// A specialized [`StoreError`] enum of this crate.
#[keepsake_derive::keepsake_error]
pub enum StoreError {
    #[error("Invalid session id{}: {message}", format_context(.context))]
    InvalidSessionId { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid store configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Store I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}
