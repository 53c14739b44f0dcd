use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::bundle::CertificateBundle;
use crate::error::{Error, Result};
use crate::inspect::SSL_CONTEXT;
use crate::session::{success_body, Session};
use crate::token::CSRF_TOKEN_HEADER;

const UPLOAD_PATH: &str = "/cgi/upload_ssl.cgi";
const ATTACHMENT_MIME: &str = "application/octet-stream";

/// A rejected upload comes back as chunked `text/plain` instead.
const EXPECTED_CONTENT_TYPE: &str = "text/html";

/// The accepted-upload page schedules a configuration page reset.
const ACCEPTED_MARKER: &str = "CONFPAGE_RESET";

impl Session {
    /// Sends the certificate chain and private key. The key is passed through untouched.
    pub fn upload(&mut self, bundle: &CertificateBundle, key: &[u8]) -> Result<()> {
        if bundle.is_empty() {
            return Err(Error::EmptyBundle);
        }
        self.ensure_authenticated()?;

        let headers = self.headers_for(SSL_CONTEXT, false)?;
        let fields = self.config.variant.upload_fields();
        let cert_part = Part::bytes(bundle.as_bytes().to_vec())
            .file_name(fields.cert_file_name)
            .mime_str(ATTACHMENT_MIME)?;
        let key_part = Part::bytes(key.to_vec())
            .file_name(fields.key_file_name)
            .mime_str(ATTACHMENT_MIME)?;
        let mut form = Form::new();
        if let Some(token) = self.token_for(SSL_CONTEXT)? {
            form = form.text(CSRF_TOKEN_HEADER, token);
        }
        let form = form
            .part(fields.cert_field, cert_part)
            .part(fields.key_field, key_part);

        let url = self.config.endpoint(UPLOAD_PATH);
        debug!(
            "POST {url} with {} certificate block(s) and a {} byte key",
            bundle.len(),
            key.len()
        );
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .multipart(form)
            .send()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        let body = success_body(response)?;
        if content_type.as_deref() != Some(EXPECTED_CONTENT_TYPE) {
            return Err(Error::UnexpectedContentType {
                expected: EXPECTED_CONTENT_TYPE,
                actual: content_type,
            });
        }
        if !body.contains(ACCEPTED_MARKER) {
            return Err(Error::MissingMarker(ACCEPTED_MARKER));
        }
        info!("controller accepted the new certificate");
        Ok(())
    }
}
