use std::collections::HashMap;
use std::sync::Arc;

use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::cookie::Jar;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};

const LOGIN_PATH: &str = "/cgi/login.cgi";

/// Only present in the body when login lands on the main menu.
const LANDING_MARKER: &str = "/cgi/url_redirect.cgi?url_name=mainmenu";

/// The console refuses session cookies that arrive without these.
const MANDATORY_COOKIES: [(&str, &str); 2] = [("langSetFlag", "0"), ("language", "English")];

/// Cookie jar, client and per-run state for one controller.
///
/// Exactly one session exists per run. Operations that change the controller
/// refuse to run until [`Session::login`] has succeeded.
pub struct Session {
    pub(crate) config: UpdaterConfig,
    pub(crate) client: Client,
    jar: Arc<Jar>,
    authenticated: bool,
    pub(crate) tokens: HashMap<String, Option<String>>,
}

impl Session {
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        warn!(
            "TLS certificate verification is disabled for {}",
            config.base_url()
        );
        let client = ClientBuilder::new()
            // The controller serves a self-signed or expired certificate until
            // this tool replaces it, so there is nothing to verify against yet.
            .danger_accept_invalid_certs(true)
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            jar,
            authenticated: false,
            tokens: HashMap::new(),
        })
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let url = self.config.endpoint(LOGIN_PATH);
        let form = self.config.variant.login_form(username, password);
        debug!("POST {url} as {username}");
        let response = self.client.post(&url).form(&form).send()?;
        let body = success_body(response)?;
        if !body.contains(LANDING_MARKER) {
            return Err(Error::MissingMarker(LANDING_MARKER));
        }

        let cookie_url = Url::parse(&self.config.endpoint("/"))
            .map_err(|e| Error::invalid_url(self.config.base_url(), e))?;
        for (name, value) in MANDATORY_COOKIES {
            // Host-only cookie, scoped to the controller's hostname.
            self.jar.add_cookie_str(&format!("{name}={value}; Path=/"), &cookie_url);
        }
        self.authenticated = true;
        info!("logged in to {}", self.config.host());
        Ok(())
    }

    /// Gate for every request that changes or queries controller state.
    pub(crate) fn ensure_authenticated(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::Rejected("not logged in"))
        }
    }
}

/// Fails on a non-2xx status, otherwise returns the body as text.
pub(crate) fn success_body(response: Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    Ok(response.text()?)
}
