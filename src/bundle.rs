use std::sync::OnceLock;

use regex::bytes::Regex;

/// Certificate blocks only, ready to hand to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertificateBundle {
    bytes: Vec<u8>,
    count: usize,
}

fn certificate_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)-----BEGIN CERTIFICATE-----.*?-----END CERTIFICATE-----")
            .expect("certificate pattern is valid")
    })
}

impl CertificateBundle {
    /// Keeps every certificate PEM block in `input` and drops everything else
    /// (DH parameters, keys, comments), since the controller rejects them.
    pub fn normalize(input: &[u8]) -> Self {
        let blocks: Vec<&[u8]> = certificate_block()
            .find_iter(input)
            .map(|m| m.as_bytes())
            .collect();
        if blocks.is_empty() {
            return Self::default();
        }
        let mut bytes = blocks.join(&b'\n');
        bytes.push(b'\n');
        Self {
            bytes,
            count: blocks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of certificate blocks kept.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
