//! Invio email - il trasporto reale (SMTP) è un collaboratore esterno

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), String>;
}

/// Scrive le email nei log invece di spedirle
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), String> {
        info!(to = %mail.to, subject = %mail.subject, "Outgoing mail");
        Ok(())
    }
}

/// Conserva le email inviate, usato dai test per leggere i link di reset
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), String> {
        self.outbox
            .lock()
            .map_err(|_| "outbox poisoned".to_string())?
            .push(mail);
        Ok(())
    }
}
