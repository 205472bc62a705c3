//! Welcome mail job: renders the enrollment confirmation and sends it.

use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use super::{JobError, JobHandler};
use crate::domain::entities::EnrollmentDetail;
use crate::domain::jobs::WelcomeMailPayload;
use crate::infrastructure::mail::{MailMessage, MailTransport};
use crate::infrastructure::queue::Job;

pub const WELCOME_SUBJECT: &str = "Welcome!";

/// Plain-text body of the welcome mail (`templates/welcome.txt`).
#[derive(Template)]
#[template(path = "welcome.txt")]
pub struct WelcomeMailTemplate<'a> {
    pub student_name: &'a str,
    pub plan_title: &'a str,
    pub plan_duration_months: i32,
    pub plan_monthly_price: String,
    pub formatted_end_date: String,
    pub price: String,
}

impl<'a> WelcomeMailTemplate<'a> {
    pub fn from_detail(detail: &'a EnrollmentDetail) -> Self {
        Self {
            student_name: &detail.student.name,
            plan_title: &detail.plan.title,
            plan_duration_months: detail.plan.duration_months,
            plan_monthly_price: detail.plan.monthly_price.to_string(),
            formatted_end_date: format_end_date(detail.end_date),
            price: detail.price.to_string(),
        }
    }
}

/// Formats a date as `10 June 2024`, in UTC like the start-date normalization.
pub fn format_end_date(end_date: DateTime<Utc>) -> String {
    end_date.format("%d %B %Y").to_string()
}

/// Builds the welcome message for an enrollment.
pub fn render_welcome(detail: &EnrollmentDetail) -> Result<MailMessage, JobError> {
    let body = WelcomeMailTemplate::from_detail(detail)
        .render()
        .map_err(|e| JobError::Render(e.to_string()))?;

    Ok(MailMessage {
        to: format!("{} <{}>", detail.student.name, detail.student.email),
        subject: WELCOME_SUBJECT.to_string(),
        body,
    })
}

/// Handles `WelcomeMail` jobs.
pub struct WelcomeMailHandler {
    transport: Arc<dyn MailTransport>,
}

impl WelcomeMailHandler {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl JobHandler for WelcomeMailHandler {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: WelcomeMailPayload = job
            .decode()
            .map_err(|e| JobError::Payload(e.to_string()))?;

        let message = render_welcome(&payload.enrollment)?;
        self.transport.send(message).await?;

        info!(
            job_id = %job.id,
            enrollment_id = payload.enrollment.id,
            student_id = payload.enrollment.student.id,
            "Welcome mail sent"
        );
        Ok(())
    }
}
