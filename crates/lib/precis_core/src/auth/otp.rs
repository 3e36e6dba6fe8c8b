//! One-time passwords and the outbound mail seam.

use rand::{Rng, rng};
use thiserror::Error;

/// OTP length in digits.
pub const OTP_LENGTH: usize = 6;

/// Outbound mail failures.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Generate a numeric OTP of [`OTP_LENGTH`] digits.
pub fn generate_otp() -> String {
    let mut r = rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + r.random_range(0..10u8)))
        .collect()
}

/// Delivery seam for OTP emails. The transport is a black-box collaborator;
/// implementations must not block the async runtime for long.
pub trait Mailer: Send + Sync {
    fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError>;
}

/// Development mailer: logs the OTP instead of sending it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError> {
        tracing::info!(email, otp, "OTP issued (log mailer)");
        Ok(())
    }
}
