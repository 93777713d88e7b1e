//! Read-only sales statistics over the order table.
//!
//! Each query scans the orders inside the requested [`SalesWindow`]; an empty
//! window means the whole table.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::{
    dto::sales::{CustomerSales, MonthlySales, ProductSales, SalesWindow},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        users::{Column as UserCol, Entity as Users},
    },
};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One order reduced to what the aggregations need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sale {
    pub user_id: Uuid,
    pub total: i64,
    pub at: DateTime<Utc>,
}

pub async fn total_order_count<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<u64, DbErr> {
    Orders::find()
        .filter(window_condition(window))
        .count(conn)
        .await
}

pub async fn total_sales_amount<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<i64, DbErr> {
    let sales = load_sales(conn, window).await?;
    Ok(sales.iter().map(|sale| sale.total).sum())
}

pub async fn sales_by_customer<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<Vec<CustomerSales>, DbErr> {
    let totals = fold_by_customer(&load_sales(conn, window).await?);
    if totals.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = totals.keys().copied().collect();
    let users: HashMap<Uuid, (String, String)> = Users::find()
        .filter(UserCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|user| (user.id, (user.name, user.email)))
        .collect();

    let mut rows: Vec<CustomerSales> = totals
        .into_iter()
        .map(|(user_id, total)| {
            let (name, email) = match users.get(&user_id) {
                Some((name, email)) => (Some(name.clone()), Some(email.clone())),
                None => (None, None),
            };
            CustomerSales {
                user_id,
                name,
                email,
                total,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(rows)
}

pub async fn sales_by_month<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<Vec<MonthlySales>, DbErr> {
    Ok(fold_by_month(&load_sales(conn, window).await?))
}

/// Units sold and revenue per product, taken from the line item snapshots.
pub async fn sales_by_product<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<Vec<ProductSales>, DbErr> {
    let lines: Vec<(Uuid, String, i32, i64)> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::ProductId)
        .column(OrderItemCol::Name)
        .column(OrderItemCol::Quantity)
        .column(OrderItemCol::Price)
        .inner_join(Orders)
        .filter(window_condition(window))
        .into_tuple()
        .all(conn)
        .await?;

    let mut by_product: HashMap<Uuid, ProductSales> = HashMap::new();
    for (product_id, name, quantity, price) in lines {
        let entry = by_product.entry(product_id).or_insert_with(|| ProductSales {
            product_id,
            name,
            quantity: 0,
            revenue: 0,
        });
        entry.quantity += i64::from(quantity);
        entry.revenue += price * i64::from(quantity);
    }

    let mut rows: Vec<ProductSales> = by_product.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(rows)
}

async fn load_sales<C: ConnectionTrait>(
    conn: &C,
    window: &SalesWindow,
) -> Result<Vec<Sale>, DbErr> {
    let rows: Vec<(Uuid, i64, Option<DateTimeWithTimeZone>, DateTimeWithTimeZone)> =
        Orders::find()
            .select_only()
            .column(OrderCol::UserId)
            .column(OrderCol::TotalPrice)
            .column(OrderCol::PaidAt)
            .column(OrderCol::CreatedAt)
            .filter(window_condition(window))
            .into_tuple()
            .all(conn)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, total, paid_at, created_at)| Sale {
            user_id,
            total,
            at: paid_at.unwrap_or(created_at).with_timezone(&Utc),
        })
        .collect())
}

/// Sale date is `paid_at`, or `created_at` for orders never marked paid.
fn window_condition(window: &SalesWindow) -> Condition {
    let mut condition = Condition::all();
    if let Some(from) = window.from {
        let from: DateTimeWithTimeZone = from.into();
        condition = condition.add(
            Condition::any().add(OrderCol::PaidAt.gte(from)).add(
                Condition::all()
                    .add(OrderCol::PaidAt.is_null())
                    .add(OrderCol::CreatedAt.gte(from)),
            ),
        );
    }
    if let Some(to) = window.to {
        let to: DateTimeWithTimeZone = to.into();
        condition = condition.add(
            Condition::any().add(OrderCol::PaidAt.lt(to)).add(
                Condition::all()
                    .add(OrderCol::PaidAt.is_null())
                    .add(OrderCol::CreatedAt.lt(to)),
            ),
        );
    }
    condition
}

pub fn fold_by_customer(sales: &[Sale]) -> HashMap<Uuid, i64> {
    let mut totals = HashMap::new();
    for sale in sales {
        *totals.entry(sale.user_id).or_insert(0) += sale.total;
    }
    totals
}

/// Totals per calendar month, oldest first.
pub fn fold_by_month(sales: &[Sale]) -> Vec<MonthlySales> {
    let mut months: BTreeMap<(i32, u32), i64> = BTreeMap::new();
    for sale in sales {
        *months.entry((sale.at.year(), sale.at.month())).or_insert(0) += sale.total;
    }

    months
        .into_iter()
        .map(|((year, month), total)| MonthlySales {
            year,
            month,
            label: month_label(month).to_string(),
            total,
        })
        .collect()
}

pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_LABELS.get(idx as usize))
        .copied()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sale(user_id: Uuid, total: i64, y: i32, m: u32, d: u32) -> Sale {
        Sale {
            user_id,
            total,
            at: Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn months_are_keyed_by_year_and_sorted_chronologically() {
        let u = Uuid::new_v4();
        let sales = [
            sale(u, 100, 2026, 1, 5),
            sale(u, 300, 2025, 12, 24),
            sale(u, 50, 2026, 1, 20),
            sale(u, 700, 2025, 1, 2),
        ];

        let months = fold_by_month(&sales);
        let keys: Vec<(i32, u32, &str, i64)> = months
            .iter()
            .map(|m| (m.year, m.month, m.label.as_str(), m.total))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2025, 1, "Jan", 700),
                (2025, 12, "Dec", 300),
                (2026, 1, "Jan", 150),
            ]
        );
    }

    #[test]
    fn customer_totals_sum_to_grand_total() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let sales = [
            sale(a, 1_000, 2026, 3, 1),
            sale(b, 250, 2026, 3, 2),
            sale(a, 500, 2026, 4, 1),
        ];
        let totals = fold_by_customer(&sales);
        assert_eq!(totals[&a], 1_500);
        assert_eq!(totals[&b], 250);
        assert_eq!(
            totals.values().sum::<i64>(),
            sales.iter().map(|s| s.total).sum::<i64>()
        );
    }

    #[test]
    fn month_labels_cover_the_calendar() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(9), "Sep");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(month_label(0), "");
        assert_eq!(month_label(13), "");
    }
}
