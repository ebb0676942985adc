//! Derived order statistics.
//!
//! Every aggregate is a pure function of an order slice (and, for the date
//! windows, a reference date). Nothing is cached; views recompute on demand.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{NormalizedOrder, PLACEHOLDER};
use crate::timestamp::{falls_in_month, falls_on_day};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
}

pub fn count_by_status(orders: &[NormalizedOrder]) -> StatusCounts {
    orders.iter().fold(
        StatusCounts {
            total: orders.len(),
            ..StatusCounts::default()
        },
        |mut acc, o| {
            if o.order_status.is_completed() {
                acc.completed += 1;
            } else if o.order_status.is_cancelled() {
                acc.cancelled += 1;
            } else {
                acc.pending += 1;
            }
            acc
        },
    )
}

pub fn orders_on_day(orders: &[NormalizedOrder], day: NaiveDate) -> Vec<&NormalizedOrder> {
    orders
        .iter()
        .filter(|o| falls_on_day(&o.order_timestamp, day))
        .collect()
}

pub fn orders_in_month(orders: &[NormalizedOrder], day: NaiveDate) -> Vec<&NormalizedOrder> {
    orders
        .iter()
        .filter(|o| falls_in_month(&o.order_timestamp, day))
        .collect()
}

/// Sum of `total_price` over non-cancelled orders.
pub fn revenue<'a, I>(orders: I) -> f64
where
    I: IntoIterator<Item = &'a NormalizedOrder>,
{
    orders
        .into_iter()
        .filter(|o| !o.order_status.is_cancelled())
        .map(NormalizedOrder::price)
        .sum()
}

/// Revenue over non-cancelled orders divided by their count; zero when there
/// are none.
pub fn average_order_value(orders: &[NormalizedOrder]) -> f64 {
    let active = orders
        .iter()
        .filter(|o| !o.order_status.is_cancelled())
        .count();
    if active == 0 {
        return 0.0;
    }
    revenue(orders) / active as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePopularity {
    pub name: String,
    pub count: usize,
}

/// Most frequent service name across non-cancelled orders. Ties go to the
/// name seen first.
pub fn most_popular_service(orders: &[NormalizedOrder]) -> Option<ServicePopularity> {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for service in orders
        .iter()
        .filter(|o| !o.order_status.is_cancelled())
        .flat_map(|o| o.services.iter())
    {
        let name = service.name.as_str();
        if name.is_empty() {
            continue;
        }
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            first_seen.push(name);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for name in first_seen {
        let count = counts[name];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    best.map(|(name, count)| ServicePopularity {
        name: name.to_string(),
        count,
    })
}

/// Distinct customer names, ignoring blanks and the placeholder.
pub fn unique_customers<'a, I>(orders: I) -> usize
where
    I: IntoIterator<Item = &'a NormalizedOrder>,
{
    orders
        .into_iter()
        .map(|o| o.customer_name.trim())
        .filter(|name| !name.is_empty() && *name != PLACEHOLDER)
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Screen summaries
// ---------------------------------------------------------------------------

/// Figures shown on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub orders_today: usize,
    /// Across all dates.
    pub pending_orders: usize,
    pub completed_today: usize,
    /// From orders completed today.
    pub estimated_revenue_today: f64,
    pub active_customers_today: usize,
}

impl DashboardSummary {
    pub fn compute(orders: &[NormalizedOrder], today: NaiveDate) -> Self {
        let todays = orders_on_day(orders, today);
        let completed_today: Vec<&NormalizedOrder> = todays
            .iter()
            .copied()
            .filter(|o| o.order_status.is_completed())
            .collect();
        Self {
            orders_today: todays.len(),
            pending_orders: count_by_status(orders).pending,
            completed_today: completed_today.len(),
            estimated_revenue_today: revenue(completed_today.iter().copied()),
            active_customers_today: unique_customers(todays.iter().copied()),
        }
    }
}

/// Figures shown on the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub pending_orders: usize,
    pub cancelled_orders: usize,
    pub revenue_this_month: f64,
    pub total_revenue: f64,
    pub orders_this_month: usize,
    pub average_order_value: f64,
    pub most_popular_service: Option<ServicePopularity>,
    pub cancelled_this_month: usize,
}

impl StatisticsSummary {
    pub fn compute(orders: &[NormalizedOrder], today: NaiveDate) -> Self {
        let counts = count_by_status(orders);
        let this_month = orders_in_month(orders, today);
        Self {
            total_orders: counts.total,
            completed_orders: counts.completed,
            pending_orders: counts.pending,
            cancelled_orders: counts.cancelled,
            revenue_this_month: revenue(this_month.iter().copied()),
            total_revenue: revenue(orders),
            orders_this_month: this_month.len(),
            average_order_value: average_order_value(orders),
            most_popular_service: most_popular_service(orders),
            cancelled_this_month: this_month
                .iter()
                .filter(|o| o.order_status.is_cancelled())
                .count(),
        }
    }
}

/// Render a money figure the way the dashboard prints it.
pub fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderService, OrderStatus};

    fn order(id: u64, status: &str, price: &str, timestamp: &str) -> NormalizedOrder {
        NormalizedOrder {
            id,
            title: format!("Order {id}"),
            customer_name: format!("Customer {id}"),
            room_number: PLACEHOLDER.into(),
            pickup_method: PLACEHOLDER.into(),
            payment_confirmed: false,
            total_price: price.into(),
            special_instructions: PLACEHOLDER.into(),
            order_status: OrderStatus::from(status),
            order_timestamp: timestamp.into(),
            camp_name: PLACEHOLDER.into(),
            services: Vec::new(),
            pickup_slot: None,
        }
    }

    fn service(name: &str) -> OrderService {
        OrderService {
            id: 0,
            name: name.into(),
            slug: String::new(),
            price: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn revenue_excludes_cancelled() {
        let orders = vec![
            order(1, "completed", "10.50", "—"),
            order(2, "cancelled", "5.00", "—"),
        ];
        assert!((revenue(&orders) - 10.50).abs() < 1e-9);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_order_value(&[]), 0.0);
        let only_cancelled = vec![order(1, "cancelled", "9.00", "—")];
        assert_eq!(average_order_value(&only_cancelled), 0.0);
    }

    #[test]
    fn average_over_active_orders() {
        let orders = vec![
            order(1, "completed", "10.00", "—"),
            order(2, "pending", "20.00", "—"),
            order(3, "cancelled", "100.00", "—"),
        ];
        assert!((average_order_value(&orders) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn popularity_counts_repeats_within_an_order() {
        let mut o = order(1, "pending", "0", "—");
        o.services = vec![service("A"), service("A"), service("B")];
        let top = most_popular_service(&[o]).unwrap();
        assert_eq!(top.name, "A");
        assert_eq!(top.count, 2);
    }

    #[test]
    fn popularity_ties_go_to_first_seen_and_skip_cancelled() {
        let mut a = order(1, "completed", "0", "—");
        a.services = vec![service("B"), service("A")];
        let mut b = order(2, "cancelled", "0", "—");
        b.services = vec![service("A"), service("A")];
        let top = most_popular_service(&[a, b]).unwrap();
        assert_eq!(top.name, "B");
        assert_eq!(top.count, 1);
        assert_eq!(most_popular_service(&[]), None);
    }

    #[test]
    fn status_partition() {
        let orders = vec![
            order(1, "completed", "0", "—"),
            order(2, "cancelled", "0", "—"),
            order(3, "pending", "0", "—"),
            order(4, "on_hold", "0", "—"),
        ];
        let counts = count_by_status(&orders);
        assert_eq!(
            counts,
            StatusCounts {
                total: 4,
                pending: 2,
                completed: 1,
                cancelled: 1
            }
        );
    }

    #[test]
    fn unique_customers_ignore_placeholder() {
        let mut a = order(1, "pending", "0", "—");
        a.customer_name = "Ada".into();
        let mut b = order(2, "pending", "0", "—");
        b.customer_name = "Ada".into();
        let mut c = order(3, "pending", "0", "—");
        c.customer_name = PLACEHOLDER.into();
        assert_eq!(unique_customers(&[a, b, c]), 1);
    }

    #[test]
    fn dashboard_summary_for_a_day() {
        let today = day(2025, 9, 17);
        let mut orders = vec![
            order(1, "completed", "10.50", "17/09/2025, 9:00:00 am"),
            order(2, "completed", "4.50", "2025-09-17T13:00:00"),
            order(3, "pending", "7.00", "17/09/2025, 3:23:27 pm"),
            order(4, "pending", "7.00", "16/09/2025, 3:23:27 pm"),
            order(5, "cancelled", "7.00", "17/09/2025, 3:23:27 pm"),
        ];
        orders[1].customer_name = orders[0].customer_name.clone();

        let summary = DashboardSummary::compute(&orders, today);
        assert_eq!(summary.orders_today, 4);
        assert_eq!(summary.pending_orders, 2);
        assert_eq!(summary.completed_today, 2);
        assert!((summary.estimated_revenue_today - 15.0).abs() < 1e-9);
        assert_eq!(summary.active_customers_today, 3);
    }

    #[test]
    fn statistics_summary_for_a_month() {
        let today = day(2025, 9, 30);
        let mut first = order(1, "completed", "10.00", "01/09/2025, 9:00:00 am");
        first.services = vec![service("Wash")];
        let orders = vec![
            first,
            order(2, "cancelled", "5.00", "2025-09-10T10:00:00"),
            order(3, "pending", "20.00", "2025-08-10T10:00:00"),
            order(4, "cancelled", "3.00", "2025-08-11T10:00:00"),
        ];

        let stats = StatisticsSummary::compute(&orders, today);
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.completed_orders, 1);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.cancelled_orders, 2);
        assert_eq!(stats.orders_this_month, 2);
        assert_eq!(stats.cancelled_this_month, 1);
        assert!((stats.revenue_this_month - 10.0).abs() < 1e-9);
        assert!((stats.total_revenue - 30.0).abs() < 1e-9);
        assert!((stats.average_order_value - 15.0).abs() < 1e-9);
        assert_eq!(
            stats.most_popular_service,
            Some(ServicePopularity {
                name: "Wash".into(),
                count: 1
            })
        );
    }

    #[test]
    fn currency_format() {
        assert_eq!(format_currency(10.5), "$10.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }
}
