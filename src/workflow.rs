//! The first failing stage is terminal, except the reboot: by then the
//! certificate is installed, so a failed reboot is only recorded in the
//! [`Report`].

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::bundle::CertificateBundle;
use crate::error::{Error, Result};
use crate::inspect::CertificateInfo;
use crate::session::Session;

pub const EXIT_OK: u8 = 0;
pub const EXIT_REBOOT_FAILED: u8 = 1;
pub const EXIT_FAILED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    InspectBefore,
    Upload,
    Validate,
    InspectAfter,
    Reboot,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::InspectBefore => "certificate inspection",
            Self::Upload => "certificate upload",
            Self::Validate => "certificate validation",
            Self::InspectAfter => "post-upload inspection",
            Self::Reboot => "reboot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    pub error: Error,
}

#[derive(Debug)]
pub enum State {
    Unauthenticated,
    Authenticated,
    Inspected,
    Uploaded,
    Validated,
    Verified,
    Rebooting,
    Done,
    Failed(StageFailure),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

#[derive(Debug)]
pub enum RebootStatus {
    Skipped,
    Confirmed,
    Failed(Error),
}

/// What a completed run observed.
#[derive(Debug)]
pub struct Report {
    pub before: CertificateInfo,
    pub after: CertificateInfo,
    pub reboot: RebootStatus,
}

impl Report {
    pub fn exit_code(&self) -> u8 {
        match self.reboot {
            RebootStatus::Failed(_) => EXIT_REBOOT_FAILED,
            RebootStatus::Skipped | RebootStatus::Confirmed => EXIT_OK,
        }
    }
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct Workflow {
    session: Session,
    credentials: Credentials,
    bundle: CertificateBundle,
    key: Vec<u8>,
    reboot: bool,
    state: State,
    before: Option<CertificateInfo>,
    after: Option<CertificateInfo>,
    reboot_status: RebootStatus,
}

impl Workflow {
    /// `certificate` is normalized here; `key` is sent as given.
    pub fn new(
        session: Session,
        credentials: Credentials,
        certificate: &[u8],
        key: Vec<u8>,
        reboot: bool,
    ) -> Self {
        Self {
            session,
            credentials,
            bundle: CertificateBundle::normalize(certificate),
            key,
            reboot,
            state: State::Unauthenticated,
            before: None,
            after: None,
            reboot_status: RebootStatus::Skipped,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn before(&self) -> Option<&CertificateInfo> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&CertificateInfo> {
        self.after.as_ref()
    }

    /// Runs the next transition. Terminal states are left unchanged.
    pub fn step(&mut self) -> &State {
        if !self.state.is_terminal() {
            let current = std::mem::replace(&mut self.state, State::Unauthenticated);
            self.state = match self.advance(current) {
                Ok(next) => next,
                Err(failure) => State::Failed(failure),
            };
        }
        &self.state
    }

    pub fn run(mut self) -> std::result::Result<Report, StageFailure> {
        while !self.step().is_terminal() {}
        match self.state {
            State::Failed(failure) => Err(failure),
            _ => Ok(Report {
                before: self.before.unwrap_or_default(),
                after: self.after.unwrap_or_default(),
                reboot: self.reboot_status,
            }),
        }
    }

    fn advance(&mut self, current: State) -> std::result::Result<State, StageFailure> {
        match current {
            State::Unauthenticated => {
                info!("authenticating on {}", self.session.config().base_url());
                let Credentials { username, password } = &self.credentials;
                gate(Stage::Login, self.session.login(username, password))?;
                Ok(State::Authenticated)
            }
            State::Authenticated => {
                info!("fetching current certificate");
                let info = gate(Stage::InspectBefore, self.session.inspect())?;
                match &info.valid_until {
                    Some(until) if info.has_certificate => {
                        info!("there is a certificate installed, valid until {until}")
                    }
                    _ if info.has_certificate => info!("there is a certificate installed"),
                    _ => info!("there is no certificate installed"),
                }
                self.before = Some(info);
                Ok(State::Inspected)
            }
            State::Inspected => {
                info!("uploading {} certificate block(s)", self.bundle.len());
                gate(Stage::Upload, self.session.upload(&self.bundle, &self.key))?;
                Ok(State::Uploaded)
            }
            State::Uploaded => {
                info!("checking the new certificate was accepted");
                if !gate(Stage::Validate, self.session.validate())? {
                    return Err(failure(
                        Stage::Validate,
                        Error::Rejected("new certificate failed validation"),
                    ));
                }
                Ok(State::Validated)
            }
            State::Validated => {
                info!("fetching new certificate");
                let info = gate(Stage::InspectAfter, self.session.inspect())?;
                if !info.has_certificate {
                    return Err(failure(
                        Stage::InspectAfter,
                        Error::Rejected("no certificate installed after upload"),
                    ));
                }
                if let Some(until) = &info.valid_until {
                    info!("new certificate is valid until {until}");
                }
                self.after = Some(info);
                Ok(State::Verified)
            }
            State::Verified => {
                if self.reboot {
                    Ok(State::Rebooting)
                } else {
                    info!("skipping reboot");
                    Ok(State::Done)
                }
            }
            State::Rebooting => {
                info!("rebooting the controller to apply the certificate");
                self.reboot_status = match self.session.reboot() {
                    Ok(()) => RebootStatus::Confirmed,
                    Err(e) => {
                        warn!("{} failed: {e}; reboot the controller manually", Stage::Reboot);
                        RebootStatus::Failed(e)
                    }
                };
                Ok(State::Done)
            }
            State::Done => Ok(State::Done),
            State::Failed(failure) => Err(failure),
        }
    }
}

fn failure(stage: Stage, error: Error) -> StageFailure {
    StageFailure { stage, error }
}

fn gate<T>(stage: Stage, result: Result<T>) -> std::result::Result<T, StageFailure> {
    result.map_err(|error| failure(stage, error))
}
