//! Sales reporting over settled orders

use crate::core::error::{ComandaResult, ValidationError};
use crate::core::money::{round_currency, saturating_sum};
use crate::core::service::Store;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Window used when the caller gives no dates
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// How many products the ranking keeps
pub const TOP_PRODUCTS: usize = 10;

/// Inclusive date range, `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SalesQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub revenue: Decimal,
    pub orders: usize,
    pub average_ticket: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub summary: SalesSummary,
    pub daily: Vec<DailyRevenue>,
    pub top_products: Vec<TopProduct>,
}

impl SalesQuery {
    /// Fill in defaults relative to `today` and check ordering
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ValidationError> {
        let to = self.to.unwrap_or(today);
        let from = self
            .from
            .unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS - 1));
        if from > to {
            return Err(ValidationError::field("from", "from must not be after to"));
        }
        Ok((from, to))
    }
}

/// Revenue, ticket size and best sellers for `confirmado`, `preparando` and `listo` orders
pub async fn sales_report(store: &dyn Store, query: SalesQuery) -> ComandaResult<SalesReport> {
    let (from, to) = query.resolve(Utc::now().date_naive())?;
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = (to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();

    let orders: Vec<_> = store
        .orders_created_between(start, end)
        .await?
        .into_iter()
        .filter(|o| o.status.is_sale())
        .collect();

    let revenue = saturating_sum(orders.iter().map(|o| o.total));
    let average_ticket = if orders.is_empty() {
        Decimal::ZERO
    } else {
        round_currency(revenue / Decimal::from(orders.len()))
    };

    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut quantities: HashMap<i64, i64> = HashMap::new();
    for order in &orders {
        let day = daily.entry(order.created_at.date_naive()).or_default();
        *day = saturating_sum([*day, order.total]);
        for line in &order.lines {
            let quantity = quantities.entry(line.product_id).or_default();
            *quantity = quantity.saturating_add(line.quantity);
        }
    }

    let mut ranked: Vec<(i64, i64)> = quantities.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(TOP_PRODUCTS);

    let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
    let names: HashMap<i64, String> = store
        .products_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let top_products = ranked
        .into_iter()
        .map(|(product_id, quantity)| TopProduct {
            product_id,
            name: names
                .get(&product_id)
                .cloned()
                .unwrap_or_else(|| format!("#{product_id}")),
            quantity,
        })
        .collect();

    Ok(SalesReport {
        from,
        to,
        summary: SalesSummary {
            revenue,
            orders: orders.len(),
            average_ticket,
        },
        daily: daily
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect(),
        top_products,
    })
}
