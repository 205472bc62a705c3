//! Background job payloads produced by the enrollment workflow.

use serde::{Deserialize, Serialize};

use crate::domain::entities::EnrollmentDetail;

/// Queue job name of the welcome notification.
pub const WELCOME_MAIL_JOB: &str = "WelcomeMail";

/// Payload of a welcome-mail job: the enrollment snapshot taken right after
/// the enrollment was persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeMailPayload {
    pub enrollment: EnrollmentDetail,
}

impl WelcomeMailPayload {
    pub fn new(enrollment: EnrollmentDetail) -> Self {
        Self { enrollment }
    }
}
