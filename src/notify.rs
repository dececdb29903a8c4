use std::sync::mpsc::{self, Sender};
use std::thread;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use uuid::Uuid;

use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// Sent to the owner when a session receives its first question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstMessageNotice {
    pub session_id: Uuid,
    pub message: String,
}

impl FirstMessageNotice {
    pub fn subject(&self) -> String {
        "New Arduino Expert chat session".to_string()
    }

    pub fn body(&self) -> String {
        format!(
            "A new chat session has started.\n\nSession: {}\n\nFirst message:\n{}\n",
            self.session_id, self.message
        )
    }
}

pub trait Notifier: Send {
    fn send(&self, notice: &FirstMessageNotice) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let transport = SmtpTransport::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = if config.from.is_empty() { &config.username } else { &config.from };

        Ok(Self {
            transport,
            from: from.parse()?,
            to: config.to.parse()?,
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, notice: &FirstMessageNotice) -> Result<(), NotifyError> {
        let email = lettre::Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notice.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body())?;

        self.transport.send(&email)?;
        Ok(())
    }
}

/// Handle to a background thread that delivers notices one by one.
///
/// Submitting never blocks and never reports delivery; failures are logged
/// on the worker thread.
#[derive(Clone)]
pub struct NotificationWorker {
    tx: Sender<FirstMessageNotice>,
}

impl NotificationWorker {
    pub fn spawn(notifier: Box<dyn Notifier>) -> Self {
        let (tx, rx) = mpsc::channel::<FirstMessageNotice>();

        thread::spawn(move || {
            while let Ok(notice) = rx.recv() {
                match notifier.send(&notice) {
                    Ok(()) => tracing::info!(session = %notice.session_id, "owner notified"),
                    Err(e) => tracing::warn!(session = %notice.session_id, error = %e, "notification failed"),
                }
            }
        });

        Self { tx }
    }

    pub fn submit(&self, notice: FirstMessageNotice) {
        if self.tx.send(notice).is_err() {
            tracing::warn!("notification worker is gone, notice dropped");
        }
    }
}

/// Starts the SMTP worker when notifications are enabled and configured.
pub fn start_worker(config: &NotifyConfig) -> Option<NotificationWorker> {
    if !config.enabled {
        return None;
    }

    match SmtpNotifier::new(config) {
        Ok(notifier) => Some(NotificationWorker::spawn(Box::new(notifier))),
        Err(e) => {
            tracing::error!(error = %e, "email notifications disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::time::Duration;

    struct Recording(Sender<FirstMessageNotice>);

    impl Notifier for Recording {
        fn send(&self, notice: &FirstMessageNotice) -> Result<(), NotifyError> {
            let _ = self.0.send(notice.clone());
            Ok(())
        }
    }

    /// Fails the first delivery, records every later one.
    struct FailsFirst {
        failed: std::sync::atomic::AtomicBool,
        delivered: Sender<FirstMessageNotice>,
    }

    impl Notifier for FailsFirst {
        fn send(&self, notice: &FirstMessageNotice) -> Result<(), NotifyError> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(NotifyError::Address(
                    "not-an-address".parse::<Mailbox>().unwrap_err(),
                ));
            }
            let _ = self.delivered.send(notice.clone());
            Ok(())
        }
    }

    fn recording_worker() -> (NotificationWorker, Receiver<FirstMessageNotice>) {
        let (tx, rx) = mpsc::channel();
        (NotificationWorker::spawn(Box::new(Recording(tx))), rx)
    }

    #[test]
    fn worker_delivers_in_background() {
        let (worker, rx) = recording_worker();
        let notice = FirstMessageNotice {
            session_id: Uuid::new_v4(),
            message: "How do I read a button?".into(),
        };

        worker.submit(notice.clone());

        let delivered = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delivered, notice);
    }

    #[test]
    fn worker_survives_a_failed_delivery() {
        let (tx, rx) = mpsc::channel();
        let worker = NotificationWorker::spawn(Box::new(FailsFirst {
            failed: std::sync::atomic::AtomicBool::new(false),
            delivered: tx,
        }));

        worker.submit(FirstMessageNotice {
            session_id: Uuid::new_v4(),
            message: "lost".into(),
        });
        let second = FirstMessageNotice {
            session_id: Uuid::new_v4(),
            message: "again".into(),
        };
        worker.submit(second.clone());

        let delivered = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delivered, second);
    }

    #[test]
    fn body_mentions_session_and_message() {
        let id = Uuid::new_v4();
        let notice = FirstMessageNotice {
            session_id: id,
            message: "Servo jitter".into(),
        };
        let body = notice.body();
        assert!(body.contains(&id.to_string()));
        assert!(body.contains("Servo jitter"));
    }

    #[test]
    fn disabled_config_starts_nothing() {
        assert!(start_worker(&NotifyConfig::default()).is_none());
    }

    #[test]
    fn bad_recipient_disables_worker() {
        let config = NotifyConfig {
            enabled: true,
            username: "bot@example.com".into(),
            to: "nobody".into(),
            ..NotifyConfig::default()
        };
        assert!(start_worker(&config).is_none());
    }
}
