pub mod dispatcher;
pub mod email;
pub mod notice;
pub mod templates;
pub mod worker;

pub use dispatcher::NotificationDispatcher;
pub use email::{email_sender_from_config, EmailSender, HttpEmailSender, LogEmailSender};
pub use notice::build_notice;
pub use templates::render_email;
pub use worker::NotificationWorker;
