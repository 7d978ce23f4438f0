//! Monthly transaction report rendering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use common::Money;
use domain::{CustomerView, OrderView};
use serde::{Deserialize, Serialize};

use crate::mail::{Attachment, EmailMessage};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct InvalidMonth(pub String);

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidMonth> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month containing `now`.
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// The month before the one containing `now`.
    pub fn previous(now: DateTime<Utc>) -> Self {
        Self::containing(now).pred()
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Midnight UTC on the first day of the month.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// `[start of month, start of next month)`.
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start(), self.succ().start())
    }

    /// "March 2024".
    pub fn long_name(&self) -> String {
        self.start().format("%B %Y").to_string()
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ReportMonth {
    type Error = InvalidMonth;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportMonth> for String {
    fn from(month: ReportMonth) -> Self {
        month.to_string()
    }
}

/// One customer's orders for one month.
#[derive(Debug, Clone)]
pub struct MonthlyReport<'a> {
    pub customer: &'a CustomerView,
    pub month: ReportMonth,
    pub orders: &'a [OrderView],
}

impl MonthlyReport<'_> {
    pub fn total(&self) -> Money {
        self.orders
            .iter()
            .map(|o| Money::from_cents(o.total_amount_cents))
            .sum()
    }

    pub fn subject(&self) -> String {
        format!("Your Transaction Report for {}", self.month.long_name())
    }

    pub fn attachment_name(&self) -> String {
        format!("TransactionReport_{}.txt", self.month)
    }

    /// Plain-text report sent as the attachment.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Transaction Report - {}\n", self.month.long_name()));
        out.push_str(&format!(
            "Customer: {} {}\n",
            self.customer.first_name, self.customer.last_name
        ));
        out.push_str(&format!("Email: {}\n\n", self.customer.email));
        out.push_str("Orders:\n");
        for order in self.orders {
            out.push_str(&format!(
                "Order #{} - {} - {}\n",
                order.order_number,
                order.order_date.format("%Y-%m-%d"),
                Money::from_cents(order.total_amount_cents)
            ));
        }
        out.push_str(&format!("\nTotal Amount: {}\n", self.total()));
        out
    }

    pub fn render_html(&self) -> String {
        format!(
            "<html><body>\
             <h2>Monthly Transaction Report</h2>\
             <p>Dear {first} {last},</p>\
             <p>Please find attached your transaction report for {month}.</p>\
             <p>Summary:</p>\
             <ul><li>Total Orders: {count}</li><li>Total Amount: {total}</li></ul>\
             <p>Thank you for your continued business!</p>\
             <p>Best regards,<br/>Online Shopping Team</p>\
             </body></html>",
            first = escape(&self.customer.first_name),
            last = escape(&self.customer.last_name),
            month = self.month.long_name(),
            count = self.orders.len(),
            total = self.total(),
        )
    }

    pub fn to_email(&self) -> EmailMessage {
        EmailMessage {
            to: self.customer.email.clone(),
            subject: self.subject(),
            html_body: self.render_html(),
            attachments: vec![Attachment {
                file_name: self.attachment_name(),
                content_type: "text/plain".to_string(),
                content: self.render_text().into_bytes(),
            }],
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AddressId, CustomerId, OrderId, OrderStatus};

    fn customer() -> CustomerView {
        CustomerView {
            id: CustomerId::new(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            full_name: "Ada Lovelace".to_string(),
            phone: None,
            date_of_birth: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn order(number: &str, day: u32, cents: i64) -> OrderView {
        let date = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        OrderView {
            id: OrderId::new(),
            order_number: number.to_string(),
            customer_id: CustomerId::new(),
            order_date: date,
            status: OrderStatus::Delivered,
            total_amount_cents: cents,
            notes: None,
            payment_method: "CreditCard".to_string(),
            shipping_address_id: AddressId::new(),
            billing_address_id: AddressId::new(),
            shipped_date: None,
            delivered_date: None,
            items: Vec::new(),
            created_at: date,
            updated_at: None,
        }
    }

    #[test]
    fn test_month_parsing() {
        let month: ReportMonth = "2024-03".parse().unwrap();
        assert_eq!((month.year(), month.month()), (2024, 3));
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(month.long_name(), "March 2024");

        assert!("2024-13".parse::<ReportMonth>().is_err());
        assert!("2024-3".parse::<ReportMonth>().is_err());
        assert!("March".parse::<ReportMonth>().is_err());
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(
            ReportMonth::previous(now),
            ReportMonth::new(2024, 12).unwrap()
        );
    }

    #[test]
    fn test_range_is_half_open() {
        let (from, to) = ReportMonth::new(2024, 2).unwrap().range();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_text_report_layout() {
        let customer = customer();
        let orders = vec![
            order("ORD-20240305120000-1111", 5, 2500),
            order("ORD-20240320120000-2222", 20, 1099),
        ];
        let report = MonthlyReport {
            customer: &customer,
            month: ReportMonth::new(2024, 3).unwrap(),
            orders: &orders,
        };

        let text = report.render_text();
        assert!(text.starts_with("Transaction Report - March 2024\n"));
        assert!(text.contains("Customer: Ada Lovelace\n"));
        assert!(text.contains("Email: ada@example.com\n"));
        assert!(text.contains("Order #ORD-20240305120000-1111 - 2024-03-05 - $25.00\n"));
        assert!(text.contains("Order #ORD-20240320120000-2222 - 2024-03-20 - $10.99\n"));
        assert!(text.ends_with("Total Amount: $35.99\n"));
    }

    #[test]
    fn test_email_carries_attachment() {
        let customer = customer();
        let orders = vec![order("ORD-20240305120000-1111", 5, 2500)];
        let email = MonthlyReport {
            customer: &customer,
            month: ReportMonth::new(2024, 3).unwrap(),
            orders: &orders,
        }
        .to_email();

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Your Transaction Report for March 2024");
        assert!(email.html_body.contains("Dear Ada Lovelace"));
        assert!(email.html_body.contains("Total Orders: 1"));
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].file_name, "TransactionReport_2024-03.txt");
    }
}
