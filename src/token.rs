use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::{success_body, Session};

const REDIRECT_PATH: &str = "/cgi/url_redirect.cgi";

pub const CSRF_TOKEN_HEADER: &str = "CSRF_TOKEN";
const XHR_HEADER: &str = "X-Requested-With";

/// Matches `SmcCsrfInsert ("CSRF_TOKEN", "<token>");` in the page's inline script.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"SmcCsrfInsert\s*\("CSRF_TOKEN",\s*"([^"]*)"\);"#)
            .expect("token pattern is valid")
    })
}

impl Session {
    pub(crate) fn page_url(&self, context: &str) -> String {
        format!("{}?url_name={context}", self.config.endpoint(REDIRECT_PATH))
    }

    /// Token embedded in the console page for `context`, fetched at most once per run.
    ///
    /// `Ok(None)` means the page carried no token; some firmware does not use one.
    pub fn token_for(&mut self, context: &str) -> Result<Option<String>> {
        if let Some(cached) = self.tokens.get(context) {
            return Ok(cached.clone());
        }
        self.ensure_authenticated()?;

        let url = self.page_url(context);
        debug!("GET {url}");
        let body = success_body(self.client.get(&url).send()?)?;
        let token = token_pattern()
            .captures(&body)
            .map(|captures| captures[1].to_string());
        if token.is_none() {
            warn!("no anti-forgery token on the {context} page, continuing without one");
        }
        self.tokens.insert(context.to_string(), token.clone());
        Ok(token)
    }

    /// `Origin`/`Referer` for `context`, the token header when one exists, and
    /// the XHR marker when `xhr` is set.
    pub fn headers_for(&mut self, context: &str, xhr: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, header_value(self.config.base_url())?);
        headers.insert(REFERER, header_value(&self.page_url(context))?);
        if let Some(token) = self.token_for(context)? {
            headers.insert(
                HeaderName::from_static("csrf_token"),
                header_value(&token)?,
            );
        }
        if xhr {
            headers.insert(
                HeaderName::from_static("x-requested-with"),
                HeaderValue::from_static("XMLHttpRequest"),
            );
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidAttribute {
        name: "header value",
        value: value.to_string(),
    })
}
