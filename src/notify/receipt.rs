use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{NotifyError, OrderNotice, ReceiptGenerator, format_amount};

const RECEIPT_WIDTH: usize = 48;

/// Renders a fixed-width plain-text receipt for an order.
pub struct ReceiptRenderer<'a> {
    notice: &'a OrderNotice<'a>,
    width: usize,
}

impl<'a> ReceiptRenderer<'a> {
    pub fn new(notice: &'a OrderNotice<'a>) -> Self {
        Self {
            notice,
            width: RECEIPT_WIDTH,
        }
    }

    pub fn render(&self) -> String {
        let order = self.notice.order;
        let user = self.notice.user;
        let mut out = String::new();

        self.center(&mut out, "FLOWER SHOP");
        self.center(&mut out, "RECEIPT");
        self.sep(&mut out, '=');

        let date = order.delivered_at.unwrap_or_else(Utc::now);
        self.line(&mut out, &format!("Order: {}", order.id));
        self.line(&mut out, &format!("Date:  {}", date.format("%Y-%m-%d %H:%M UTC")));
        self.line(&mut out, &format!("Customer: {} <{}>", user.name, user.email));
        self.sep(&mut out, '-');

        self.line(&mut out, &format!("{:>3} {:<26} {:>8} {:>8}", "QTY", "ITEM", "PRICE", "TOTAL"));
        for item in self.notice.items {
            let name: String = item.name.chars().take(26).collect();
            self.line(
                &mut out,
                &format!(
                    "{:>3} {:<26} {:>8} {:>8}",
                    item.quantity,
                    name,
                    format_amount(item.price),
                    format_amount(item.line_total())
                ),
            );
        }
        self.sep(&mut out, '-');

        self.line_lr(&mut out, "Items", &format_amount(order.items_price));
        self.line_lr(&mut out, "Tax", &format_amount(order.tax_price));
        self.line_lr(&mut out, "Shipping", &format_amount(order.shipping_price));
        self.line_lr(&mut out, "TOTAL", &format_amount(order.total_price));
        self.sep(&mut out, '=');

        let shipping = &order.shipping_info;
        self.line(&mut out, &format!("Ship to: {}", shipping.address));
        self.line(
            &mut out,
            &format!("         {} {}, {}", shipping.postal_code, shipping.city, shipping.country),
        );
        self.line(&mut out, &format!("Phone:   {}", shipping.phone));
        if let Some(payment) = &order.payment_info {
            self.line(&mut out, &format!("Payment: {} ({})", payment.id, payment.status));
        }
        out.push('\n');
        self.center(&mut out, "Thank you for shopping with us!");
        out
    }

    fn line(&self, out: &mut String, text: &str) {
        out.push_str(text);
        out.push('\n');
    }

    fn line_lr(&self, out: &mut String, left: &str, right: &str) {
        let used = left.chars().count() + right.chars().count();
        let pad = self.width.saturating_sub(used).max(1);
        out.push_str(left);
        out.push_str(&" ".repeat(pad));
        out.push_str(right);
        out.push('\n');
    }

    fn center(&self, out: &mut String, text: &str) {
        let pad = self.width.saturating_sub(text.chars().count()) / 2;
        out.push_str(&" ".repeat(pad));
        self.line(out, text);
    }

    fn sep(&self, out: &mut String, ch: char) {
        let rule: String = std::iter::repeat_n(ch, self.width).collect();
        self.line(out, &rule);
    }
}

/// Writes receipts as `receipt-<order id>.txt` under a directory.
#[derive(Debug, Clone)]
pub struct FileReceiptGenerator {
    dir: PathBuf,
}

impl FileReceiptGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReceiptGenerator for FileReceiptGenerator {
    async fn generate(&self, notice: &OrderNotice<'_>) -> Result<PathBuf, NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("receipt-{}.txt", notice.order.id));
        let body = ReceiptRenderer::new(notice).render();
        tokio::fs::write(&path, body).await?;
        tracing::debug!(order_id = %notice.order.id, path = %path.display(), "receipt written");
        Ok(path)
    }
}
