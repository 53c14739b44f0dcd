use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::{success_body, Session};

const IPMI_PATH: &str = "/cgi/ipmi.cgi";
pub(crate) const SSL_CONTEXT: &str = "config_ssl";
const STATUS_OP: &str = "SSL_STATUS.XML";
const VALIDATE_OP: &str = "SSL_VALIDATE.XML";
const COORDINATE: &str = "(0,0)";

/// Installed certificate as reported by the controller.
///
/// Timestamps are kept in the controller's own rendering; they are only shown
/// to the operator, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertificateInfo {
    pub has_certificate: bool,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
}

// <IPMI><SSL_INFO VALIDATE=".."><STATUS CERT_EXIST=".." VALID_FROM=".." VALID_UNTIL=".."/></SSL_INFO></IPMI>
#[derive(Debug, Deserialize)]
struct IpmiXml {
    #[serde(rename = "SSL_INFO")]
    ssl_info: Option<SslInfoXml>,
}

#[derive(Debug, Deserialize)]
struct SslInfoXml {
    #[serde(rename = "@VALIDATE")]
    validate: Option<String>,
    #[serde(rename = "STATUS")]
    status: Option<StatusXml>,
}

#[derive(Debug, Deserialize)]
struct StatusXml {
    #[serde(rename = "@CERT_EXIST")]
    cert_exist: Option<String>,
    #[serde(rename = "@VALID_FROM")]
    valid_from: Option<String>,
    #[serde(rename = "@VALID_UNTIL")]
    valid_until: Option<String>,
}

impl Session {
    pub fn inspect(&mut self) -> Result<CertificateInfo> {
        let body = self.query(STATUS_OP)?;
        parse_status(&body)
    }

    /// `Ok(false)` means the controller answered and does not consider the
    /// installed certificate valid.
    pub fn validate(&mut self) -> Result<bool> {
        let body = self.query(VALIDATE_OP)?;
        parse_validate(&body)
    }

    fn query(&mut self, op: &str) -> Result<String> {
        self.ensure_authenticated()?;
        let headers = self.headers_for(SSL_CONTEXT, true)?;
        let form = self.config.variant.operation(op, Some(COORDINATE));
        let url = self.config.endpoint(IPMI_PATH);
        debug!("POST {url} op={op}");
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .form(&form)
            .send()?;
        let body = success_body(response)?;
        debug!("{op}: {body}");
        Ok(body)
    }
}

fn ssl_info(body: &str) -> Result<SslInfoXml> {
    let root: IpmiXml = from_str(body)?;
    root.ssl_info.ok_or(Error::MissingElement("IPMI/SSL_INFO"))
}

fn flag(name: &'static str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Err(Error::MissingElement(name));
    };
    match value.trim().parse::<i64>() {
        Ok(n) => Ok(n != 0),
        Err(_) => Err(Error::InvalidAttribute { name, value }),
    }
}

pub(crate) fn parse_status(body: &str) -> Result<CertificateInfo> {
    let status = ssl_info(body)?
        .status
        .ok_or(Error::MissingElement("IPMI/SSL_INFO/STATUS"))?;
    if !flag("STATUS@CERT_EXIST", status.cert_exist)? {
        return Ok(CertificateInfo::default());
    }
    Ok(CertificateInfo {
        has_certificate: true,
        valid_from: status.valid_from,
        valid_until: status.valid_until,
    })
}

pub(crate) fn parse_validate(body: &str) -> Result<bool> {
    flag("SSL_INFO@VALIDATE", ssl_info(body)?.validate)
}
