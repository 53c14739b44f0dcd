//! Firmware generations share endpoints but not request formatting or reboot
//! confirmation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

/// `time_stamp` format expected by X10 firmware, e.g. `Thu 12 Jul 2018 19:52:48 GMT`.
const X10_TIMESTAMP_FORMAT: &str = "%a %d %b %Y %H:%M:%S GMT";

pub type FormFields = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    #[default]
    X10,
    X11,
}

/// Multipart field names and file names for the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadFields {
    pub cert_field: &'static str,
    pub cert_file_name: &'static str,
    pub key_field: &'static str,
    pub key_file_name: &'static str,
}

impl Variant {
    pub fn login_form(&self, username: &str, password: &str) -> FormFields {
        match self {
            Self::X10 => vec![
                ("name".into(), username.into()),
                ("pwd".into(), password.into()),
            ],
            Self::X11 => vec![
                ("name".into(), STANDARD.encode(username)),
                ("pwd".into(), STANDARD.encode(password)),
                ("check".into(), "00".into()),
            ],
        }
    }

    /// Builds the descriptor for `op`, with an optional coordinate such as `(0,0)`.
    pub fn operation(&self, op: &str, coordinate: Option<&str>) -> FormFields {
        self.operation_at(op, coordinate, Utc::now())
    }

    pub fn operation_at(
        &self,
        op: &str,
        coordinate: Option<&str>,
        now: DateTime<Utc>,
    ) -> FormFields {
        match self {
            Self::X10 => {
                let mut fields = vec![(
                    "time_stamp".to_string(),
                    now.format(X10_TIMESTAMP_FORMAT).to_string(),
                )];
                if let Some(r) = coordinate {
                    fields.push((op.to_string(), r.to_string()));
                }
                fields
            }
            Self::X11 => {
                let mut fields = vec![("op".to_string(), op.to_string())];
                if let Some(r) = coordinate {
                    fields.push(("r".to_string(), r.to_string()));
                }
                fields.push(("_".to_string(), String::new()));
                fields
            }
        }
    }

    pub fn upload_fields(&self) -> UploadFields {
        match self {
            Self::X10 => UploadFields {
                cert_field: "cert_file",
                cert_file_name: "cert.pem",
                key_field: "key_file",
                key_file_name: "key.pem",
            },
            Self::X11 => UploadFields {
                cert_field: "cert_file",
                cert_file_name: "cert.pem",
                key_field: "key_file",
                key_file_name: "privkey.pem",
            },
        }
    }

    pub fn reboot_path(&self) -> &'static str {
        match self {
            Self::X10 => "/cgi/BMCReset.cgi",
            Self::X11 => "/cgi/op.cgi",
        }
    }

    /// Whether a successful reboot response body confirms the reset was accepted.
    pub fn reboot_confirmed(&self, body: &str) -> bool {
        match self {
            Self::X10 => body.contains(r#"<STATE CODE="OK"/>"#),
            // X11 answers an accepted reset with an empty 200.
            Self::X11 => true,
        }
    }
}
