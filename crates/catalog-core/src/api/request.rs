use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::warn;

/// Form field carrying the real verb when a multipart body is sent as POST.
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// A binary file attached to a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Guess a MIME type from the file extension.
    pub fn mime_for(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FilePart),
}

/// Ordered multipart form fields. Names may repeat (`files[]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.fields.push((name.into(), FormValue::File(file)));
        self
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// First text value for `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FormValue::Text(text) if n == name => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn files_named(&self, name: &str) -> Vec<&FilePart> {
        self.fields
            .iter()
            .filter_map(|(n, v)| match v {
                FormValue::File(file) if n == name => Some(file),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(FormData),
}

/// A call to a protected endpoint, before credentials are attached.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl AuthenticatedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a caller header. Invalid names or values are skipped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!(header = name, "Skipping invalid request header"),
        }
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, form: FormData) -> Self {
        self.body = Some(RequestBody::Form(form));
        self
    }

    /// Send as POST with the intended verb in the `_method` form field.
    ///
    /// Multipart bodies only reach the API intact over POST.
    pub fn method_override(mut self, method: Method) -> Self {
        let form = match self.body.take() {
            Some(RequestBody::Form(form)) => form,
            _ => FormData::new(),
        };
        self.body = Some(RequestBody::Form(
            form.text(METHOD_OVERRIDE_FIELD, method.as_str()),
        ));
        self.method = Method::POST;
        self
    }
}
