//! Credential redaction for log output
//!
//! Secret values are taken once from the request's [`Source`] using a fixed
//! list of field names. Everything written through a [`RedactingWriter`] has
//! those values replaced before it reaches the underlying sink.

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use super::request::Source;

/// Fields of [`Source`] whose values must never appear in logs
pub const SECRET_FIELDS: &[&str] = &["api_token"];

#[derive(Debug, Clone, Default)]
pub struct Redactor {
    /// (secret, replacement), longest secret first
    secrets: Arc<Vec<(String, String)>>,
}

impl Redactor {
    pub fn from_source(source: &Source) -> Self {
        let fields = serde_json::to_value(source).unwrap_or_default();

        let mut secrets: Vec<(String, String)> = SECRET_FIELDS
            .iter()
            .filter_map(|field| {
                let value = fields.get(*field)?.as_str()?;
                (!value.is_empty()).then(|| (value.to_string(), replacement(field)))
            })
            .collect();
        secrets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            secrets: Arc::new(secrets),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        for (secret, replacement) in self.secrets.iter() {
            if text.contains(secret.as_str()) {
                text = Cow::Owned(text.replace(secret.as_str(), replacement));
            }
        }
        text
    }
}

fn replacement(field: &str) -> String {
    format!("***REDACTED-{}***", field.to_uppercase())
}

/// Writer that redacts each buffer before forwarding it
pub struct RedactingWriter<W> {
    inner: W,
    redactor: Redactor,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.redactor.is_empty() {
            return self.inner.write(buf);
        }

        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(self.redactor.redact(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// [`MakeWriter`] wrapper handing out [`RedactingWriter`]s
///
/// The fmt layer writes each formatted event in a single call, so a secret is
/// never split across two buffers.
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Redactor,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer(), self.redactor.clone())
    }
}
