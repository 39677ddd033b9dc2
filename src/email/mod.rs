//! Transactional email for order confirmations.
//!
//! Primary delivery is direct SMTP; if the session fails the message is
//! piped to the local sendmail binary as a last resort. When SMTP is not
//! configured the mailer is disabled and sends are logged and skipped.

mod smtp;

pub use smtp::{send_message, OutgoingMessage};

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::config::SmtpConfig;
use crate::models::Order;

const SENDMAIL_PATH: &str = "/usr/sbin/sendmail";

/// Format a Unix timestamp as a human-readable date (e.g., "Jan 15, 2026")
fn format_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

#[derive(Clone)]
pub struct Mailer {
    config: Option<SmtpConfig>,
}

impl Mailer {
    pub fn new(config: Option<SmtpConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("SMTP not configured, order confirmation emails disabled");
        }
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send the purchase confirmation with the download link. Returns
    /// whether the message was handed off; failures are logged, never
    /// propagated, so a mail outage cannot break checkout.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        script_name: &str,
        download_url: &str,
    ) -> bool {
        let Some(ref config) = self.config else {
            tracing::debug!(
                order = %order.order_id,
                "Mailer disabled, skipping confirmation email"
            );
            return false;
        };

        let subject = format!("Your Adoscript Purchase: {}", script_name);
        let message = build_confirmation(config, order, script_name, download_url, &subject);

        match smtp::send_message(config, &message).await {
            Ok(()) => {
                tracing::info!(
                    to = %order.customer_email,
                    order = %order.order_id,
                    "Order confirmation email sent"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    to = %order.customer_email,
                    order = %order.order_id,
                    "SMTP delivery failed: {}",
                    e
                );
                self.send_via_sendmail(&message).await
            }
        }
    }

    /// Pipe the message to the local sendmail binary.
    async fn send_via_sendmail(&self, message: &OutgoingMessage) -> bool {
        use tokio::io::AsyncWriteExt;
        use tokio::process::Command;

        let mut raw = String::new();
        raw.push_str(&format!("To: {}\r\n", message.to));
        raw.push_str(&format!("Subject: {}\r\n", message.subject));
        for header in &message.headers {
            raw.push_str(header);
            raw.push_str("\r\n");
        }
        raw.push_str("\r\n");
        raw.push_str(&message.body);

        let child = Command::new(SENDMAIL_PATH)
            .arg("-t")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("sendmail fallback unavailable: {}", e);
                return false;
            }
        };
        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(raw.as_bytes()).await.is_err() {
                return false;
            }
        }
        match child.wait().await {
            Ok(status) if status.success() => {
                tracing::info!(to = %message.to, "Confirmation email sent via sendmail fallback");
                true
            }
            Ok(status) => {
                tracing::error!("sendmail exited with {}", status);
                false
            }
            Err(e) => {
                tracing::error!("sendmail failed: {}", e);
                false
            }
        }
    }
}

/// Assemble the multipart/alternative confirmation message.
fn build_confirmation(
    config: &SmtpConfig,
    order: &Order,
    script_name: &str,
    download_url: &str,
    subject: &str,
) -> OutgoingMessage {
    let mut boundary_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut boundary_bytes);
    let boundary = hex::encode(boundary_bytes);

    let expiry = order
        .token_expires_at
        .map(format_date)
        .unwrap_or_else(|| "7 days from now".to_string());

    let text = confirmation_text(order, script_name, download_url, &expiry);
    let html = confirmation_html(order, script_name, download_url, &expiry);

    let body = format!(
        "--{b}\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{text}\r\n--{b}\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{html}\r\n--{b}--",
        b = boundary,
        text = text,
        html = html,
    );

    OutgoingMessage {
        to: order.customer_email.clone(),
        subject: subject.to_string(),
        headers: vec![
            format!("From: {} <{}>", config.from_name, config.from_email),
            "MIME-Version: 1.0".to_string(),
            format!(
                "Content-Type: multipart/alternative; boundary=\"{}\"",
                boundary
            ),
        ],
        body,
    }
}

fn confirmation_text(
    order: &Order,
    script_name: &str,
    download_url: &str,
    expiry: &str,
) -> String {
    format!(
        "Thank you for your purchase!\n\nYour order has been confirmed.\n\nOrder ID: {}\nScript: {}\nAmount: ${} {}\n\nDownload your script here:\n{}\n\nThis download link expires on {}.\n\nIf you have any questions, just reply to this email.",
        order.order_id,
        script_name,
        order.amount(),
        order.currency,
        download_url,
        expiry
    )
}

fn confirmation_html(
    order: &Order,
    script_name: &str,
    download_url: &str,
    expiry: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f4f4f5;">
<div style="background-color: #7f22ea; padding: 30px; border-radius: 8px 8px 0 0; text-align: center;">
<h1 style="color: white; margin: 0; font-size: 24px;">Thank You for Your Purchase!</h1>
</div>
<div style="background-color: white; padding: 30px; border-radius: 0 0 8px 8px;">
<p>Your order has been confirmed. You can download your script using the button below.</p>
<table style="width: 100%; margin: 20px 0; border-collapse: collapse;">
<tr><td style="padding: 8px 0; color: #666;">Order ID</td><td style="padding: 8px 0; text-align: right;"><strong>{order_id}</strong></td></tr>
<tr><td style="padding: 8px 0; color: #666;">Script</td><td style="padding: 8px 0; text-align: right;"><strong>{script}</strong></td></tr>
<tr><td style="padding: 8px 0; color: #666;">Amount</td><td style="padding: 8px 0; text-align: right;"><strong>${amount} {currency}</strong></td></tr>
</table>
<div style="text-align: center; margin: 30px 0;">
<a href="{url}" style="display: inline-block; background-color: #7f22ea; color: white; text-decoration: none; padding: 15px 40px; border-radius: 8px; font-size: 16px; font-weight: bold;">Download Script</a>
</div>
<p style="color: #666; text-align: center;">This download link expires on <strong>{expiry}</strong></p>
<hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
<p style="color: #999; font-size: 12px;">If the button does not work, copy this link into your browser:<br>{url}</p>
</div>
</body>
</html>"#,
        order_id = order.order_id,
        script = script_name,
        amount = order.amount(),
        currency = order.currency,
        url = download_url,
        expiry = expiry
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;

    fn sample_order() -> Order {
        Order {
            id: 1,
            order_id: "ORD-AB12CD34EF56AB78".to_string(),
            script_id: 5,
            customer_email: "buyer@example.com".to_string(),
            amount_cents: 1200,
            currency: "USD".to_string(),
            payment_method: "paypal".to_string(),
            payment_id: Some("PAY-1".to_string()),
            transaction_id: Some("CAP-1".to_string()),
            status: OrderStatus::Completed,
            download_token: Some("ab".repeat(32)),
            token_expires_at: Some(1_767_225_600),
            download_count: 0,
            created_at: 1_766_620_800,
            updated_at: 1_766_620_800,
        }
    }

    #[test]
    fn test_confirmation_contains_link_and_amount() {
        let order = sample_order();
        let text = confirmation_text(
            &order,
            "Layer Export Pro",
            "https://example.com/download?token=abc",
            "Jan 01, 2026",
        );
        assert!(text.contains("https://example.com/download?token=abc"));
        assert!(text.contains("$12.00 USD"));
        assert!(text.contains("ORD-AB12CD34EF56AB78"));
    }

    #[test]
    fn test_multipart_structure() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from_email: "noreply@adoscript.com".to_string(),
            from_name: "Adoscript".to_string(),
        };
        let order = sample_order();
        let msg = build_confirmation(
            &config,
            &order,
            "Layer Export Pro",
            "https://example.com/download?token=abc",
            "Your Adoscript Purchase: Layer Export Pro",
        );
        assert!(msg
            .headers
            .iter()
            .any(|h| h.contains("multipart/alternative")));
        assert!(msg.body.contains("text/plain"));
        assert!(msg.body.contains("text/html"));
        assert!(msg.body.ends_with("--"));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(1_767_225_600), "Jan 01, 2026");
    }
}
