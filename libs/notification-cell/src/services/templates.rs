use crate::{EmailMessage, NotificationJob, NotificationKind, WorkerConfig};

pub fn render_email(job: &NotificationJob, config: &WorkerConfig) -> EmailMessage {
    let notice = &job.notice;
    let when = notice
        .appointment_datetime
        .format("%A, %B %-d %Y at %H:%M")
        .to_string();
    let cancel_link = format!(
        "{}/cancel/{}",
        config.public_base_url.trim_end_matches('/'),
        notice.cancellation_token
    );

    let (subject, text) = match job.kind {
        NotificationKind::BookingConfirmation => (
            format!("Booking received: {} at {}", notice.service_name, notice.business_name),
            format!(
                "Hi {},\n\nThanks for booking {} ({} min) with {} on {}.\n\n\
                 Need to cancel? Use this link: {}\n",
                notice.customer_name,
                notice.service_name,
                notice.duration_minutes,
                notice.business_name,
                when,
                cancel_link
            ),
        ),
        NotificationKind::Cancellation => {
            let reason = notice
                .cancellation_reason
                .as_deref()
                .map(|r| format!("\nReason: {}\n", r))
                .unwrap_or_default();
            (
                format!("Appointment cancelled: {} at {}", notice.service_name, notice.business_name),
                format!(
                    "Hi {},\n\nYour {} appointment with {} on {} has been cancelled.\n{}",
                    notice.customer_name, notice.service_name, notice.business_name, when, reason
                ),
            )
        }
        NotificationKind::Reminder => (
            format!("Reminder: {} tomorrow at {}", notice.service_name, notice.business_name),
            format!(
                "Hi {},\n\nThis is a reminder of your {} appointment with {} on {}.\n\n\
                 Can't make it? Cancel here: {}\n",
                notice.customer_name, notice.service_name, notice.business_name, when, cancel_link
            ),
        ),
    };

    EmailMessage {
        from: config.mail_from.clone(),
        to: notice.recipient_email.clone(),
        subject,
        text,
    }
}
