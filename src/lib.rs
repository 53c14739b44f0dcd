pub mod bundle;
pub mod config;
pub mod error;
pub mod inspect;
mod reboot;
pub mod session;
mod token;
mod upload;
pub mod variant;
pub mod workflow;

pub use bundle::CertificateBundle;
pub use config::{UpdaterConfig, REQUEST_TIMEOUT};
pub use error::{Error, ErrorKind, Result};
pub use inspect::CertificateInfo;
pub use session::Session;
pub use variant::Variant;
pub use workflow::{Credentials, RebootStatus, Report, Stage, StageFailure, State, Workflow};
