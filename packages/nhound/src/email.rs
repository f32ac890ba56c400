//! Email digest sending.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::user::Page;

const SUBJECT: &str = "Notion pages need your attention";

/// Digest sending seam, mockable in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one digest. Failures are reported, not raised: a false return
    /// means the digest may not have gone out.
    async fn send(&self, receivers: &[String], name: &str, pages: &[&Page]) -> bool;
}

/// SMTP-backed mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .context("failed to set up STARTTLS transport")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let sender = config
            .sender
            .parse::<Mailbox>()
            .context("NHOUND_SMTP_EMAIL_SENDER is not a valid mailbox")?;
        Ok(Self {
            transport: builder.build(),
            sender,
            host: config.host.clone(),
            port: config.port,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, receivers: &[String], name: &str, pages: &[&Page]) -> bool {
        let mut builder = Message::builder().from(self.sender.clone()).subject(SUBJECT);
        for receiver in receivers {
            match receiver.parse::<Mailbox>() {
                Ok(to) => builder = builder.to(to),
                Err(e) => {
                    tracing::error!(receiver, error = %e, "Invalid receiver address");
                    return false;
                }
            }
        }

        let message = match builder.multipart(MultiPart::alternative_plain_html(
            render_text(name, pages),
            render_html(name, pages),
        )) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build digest message");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    host = %self.host,
                    port = self.port,
                    receivers = ?receivers,
                    "Failed to send email"
                );
                false
            }
        }
    }
}

fn render_text(name: &str, pages: &[&Page]) -> String {
    let mut body = format!("Hi {name},\n\nThe following Notion page(s) require your attention:\n");
    for page in pages {
        body.push_str(&format!("  - {} ({})\n", page.title, page.url));
    }
    body.push_str("\nEither update them or archive them!\n\nThank you.\n\nNhound bot.\n");
    body
}

fn render_html(name: &str, pages: &[&Page]) -> String {
    let mut body = format!(
        "<h1>Hi {name},</h1>\n<p>The following Notion page(s) require your attention:</p>\n<dl>\n"
    );
    for page in pages {
        body.push_str(&format!("<dt>{}</dt>\n<dd>{}</dd>\n", page.title, page.url));
    }
    body.push_str(
        "</dl>\n<p>Either update them or archive them!</p>\n<p>Thank you.</p>\n<p>Nhound bot.</p>\n",
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pages() -> Vec<Page> {
        let t = Utc.with_ymd_and_hms(2077, 5, 21, 22, 0, 0).unwrap();
        vec![
            Page {
                id: "p1".into(),
                title: "Roadmap".into(),
                url: "https://www.notion.so/Roadmap-abc".into(),
                created_time: t,
                last_edited_time: t,
                threshold_time: t,
            },
            Page {
                id: "p2".into(),
                title: "Postmortem".into(),
                url: "https://www.notion.so/Postmortem-def".into(),
                created_time: t,
                last_edited_time: t,
                threshold_time: t,
            },
        ]
    }

    #[test]
    fn text_body_lists_every_page() {
        let pages = pages();
        let refs: Vec<&Page> = pages.iter().collect();
        let body = render_text("Malenia", &refs);
        assert!(body.starts_with("Hi Malenia,"));
        for page in &pages {
            assert!(body.contains(&page.title));
            assert!(body.contains(&page.url));
        }
    }

    #[test]
    fn html_body_lists_every_page() {
        let pages = pages();
        let refs: Vec<&Page> = pages.iter().collect();
        let body = render_html("Malenia", &refs);
        assert!(body.contains("<h1>Hi Malenia,</h1>"));
        assert!(body.contains("<dt>Roadmap</dt>"));
        assert!(body.contains("<dd>https://www.notion.so/Postmortem-def</dd>"));
    }

    #[test]
    fn mailer_builds_for_plain_and_starttls_configs() {
        let mut config = SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            use_starttls: false,
            username: None,
            password: None,
            sender: "hound@example.com".into(),
        };
        assert!(SmtpMailer::new(&config).is_ok());

        config.use_starttls = true;
        config.username = Some("hound".into());
        config.password = Some("woof".into());
        assert!(SmtpMailer::new(&config).is_ok());
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            use_starttls: false,
            username: None,
            password: None,
            sender: "not a mailbox".into(),
        };
        assert!(SmtpMailer::new(&config).is_err());
    }
}
