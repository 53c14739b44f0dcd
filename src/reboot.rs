use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::inspect::SSL_CONTEXT;
use crate::session::{success_body, Session};

const RESET_OP: &str = "main_bmcreset";

impl Session {
    /// Asks the controller to restart so the new certificate is served.
    pub fn reboot(&mut self) -> Result<()> {
        self.ensure_authenticated()?;
        let headers = self.headers_for(SSL_CONTEXT, true)?;
        let variant = self.config.variant;
        let form = variant.operation(RESET_OP, None);
        let url = self.config.endpoint(variant.reboot_path());
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .form(&form)
            .send()?;
        let body = success_body(response)?;
        debug!("reboot response: {body}");
        if !variant.reboot_confirmed(&body) {
            return Err(Error::Rejected("reboot was not confirmed"));
        }
        info!("controller is rebooting");
        Ok(())
    }
}
