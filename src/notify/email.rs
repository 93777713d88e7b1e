//! Email delivery of order status notifications over SMTP via lettre.

use std::{fmt::Write as _, path::Path};

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::{Notifier, NotifyError, OrderNotice, format_amount, order_reference};
use crate::{config::SmtpConfig, models::OrderStatus};

/// SMTP-backed [`Notifier`].
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport from configuration. No connection is opened until
    /// the first message is sent.
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        let address: Address = config
            .from_email
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(config.from_email.clone()))?;

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_status_update(
        &self,
        notice: &OrderNotice<'_>,
        receipt: Option<&Path>,
    ) -> Result<String, NotifyError> {
        let to_address: Address = notice
            .user
            .email
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(notice.user.email.clone()))?;
        let to = Mailbox::new(Some(notice.user.name.clone()), to_address);

        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());
        let text = compose_body(notice, receipt.is_some());

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(compose_subject(notice))
            .message_id(Some(message_id.clone()));

        let email = match receipt {
            Some(path) => {
                let bytes = tokio::fs::read(path).await?;
                let filename = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("receipt.txt")
                    .to_string();
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(text))
                        .singlepart(Attachment::new(filename).body(bytes, ContentType::TEXT_PLAIN)),
                )?
            }
            None => builder.singlepart(SinglePart::plain(text))?,
        };

        self.mailer.send(email).await?;
        Ok(message_id)
    }
}

/// Fallback [`Notifier`] used when SMTP is not configured: the message is
/// written to the log instead of being sent.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_status_update(
        &self,
        notice: &OrderNotice<'_>,
        receipt: Option<&Path>,
    ) -> Result<String, NotifyError> {
        let message_id = format!("log-{}", Uuid::new_v4());
        tracing::info!(
            order_id = %notice.order.id,
            to = %notice.user.email,
            subject = %compose_subject(notice),
            receipt = ?receipt,
            message_id = %message_id,
            "smtp not configured, notification logged only"
        );
        Ok(message_id)
    }
}

pub fn compose_subject(notice: &OrderNotice<'_>) -> String {
    let reference = order_reference(notice.order);
    match notice.status {
        OrderStatus::Processing => format!("We received your order #{reference}"),
        OrderStatus::Shipped => format!("Your order #{reference} has shipped"),
        OrderStatus::Delivered => format!("Your order #{reference} has been delivered"),
    }
}

pub fn compose_body(notice: &OrderNotice<'_>, with_receipt: bool) -> String {
    let reference = order_reference(notice.order);
    let mut body = format!("Hi {},\n\n", notice.user.name);

    let headline = match notice.status {
        OrderStatus::Processing => format!("Thank you! Order #{reference} is being prepared."),
        OrderStatus::Shipped => format!("Good news! Order #{reference} is on its way to you."),
        OrderStatus::Delivered => format!("Order #{reference} has been delivered. Enjoy your flowers!"),
    };
    body.push_str(&headline);
    body.push_str("\n\n");

    for item in notice.items {
        let _ = writeln!(
            body,
            "  {} x {} @ {} = {}",
            item.quantity,
            item.name,
            format_amount(item.price),
            format_amount(item.line_total())
        );
    }
    let _ = writeln!(body, "\nTotal: {}", format_amount(notice.order.total_price));

    let shipping = &notice.order.shipping_info;
    let _ = writeln!(
        body,
        "Shipping to: {}, {} {}, {}",
        shipping.address, shipping.city, shipping.postal_code, shipping.country
    );

    if with_receipt {
        body.push_str("\nYour receipt is attached to this email.\n");
    }
    body.push_str("\nThank you for shopping with us.\n");
    body
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::{Order, OrderItem, Role, ShippingInfo, User};

    fn fixture() -> (Order, Vec<OrderItem>, User) {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            shipping_info: ShippingInfo {
                address: "1 Tulip Lane".into(),
                city: "Leiden".into(),
                phone: "555-0101".into(),
                postal_code: "2311".into(),
                country: "NL".into(),
            },
            payment_info: None,
            items_price: 2_400,
            tax_price: 240,
            shipping_price: 500,
            total_price: 3_140,
            status: OrderStatus::Delivered,
            paid_at: Some(now),
            delivered_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let items = vec![OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: Uuid::new_v4(),
            name: "Red Roses".into(),
            quantity: 2,
            price: 1_200,
            image: None,
        }];
        let user = User {
            id: order.user_id,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::Customer,
            created_at: now,
        };
        (order, items, user)
    }

    #[test]
    fn shipped_and_delivered_subjects_differ() {
        let (order, items, user) = fixture();
        let shipped = OrderNotice {
            status: OrderStatus::Shipped,
            order: &order,
            items: &items,
            user: &user,
        };
        let delivered = OrderNotice {
            status: OrderStatus::Delivered,
            ..shipped
        };
        assert!(compose_subject(&shipped).ends_with("has shipped"));
        assert!(compose_subject(&delivered).ends_with("has been delivered"));
    }

    #[test]
    fn body_lists_items_total_and_receipt_hint() {
        let (order, items, user) = fixture();
        let notice = OrderNotice {
            status: OrderStatus::Delivered,
            order: &order,
            items: &items,
            user: &user,
        };
        let body = compose_body(&notice, true);
        assert!(body.starts_with("Hi Ada,"));
        assert!(body.contains("2 x Red Roses @ 12.00 = 24.00"));
        assert!(body.contains("Total: 31.40"));
        assert!(body.contains("receipt is attached"));
        assert!(!compose_body(&notice, false).contains("receipt is attached"));
    }
}
