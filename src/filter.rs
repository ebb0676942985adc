//! Order list filtering for the orders screen.

use serde::{Deserialize, Serialize};

use crate::model::{parse_price, NormalizedOrder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    All,
    Completed,
    Pending,
    Cancelled,
}

impl ViewMode {
    pub fn matches(self, order: &NormalizedOrder) -> bool {
        match self {
            ViewMode::All => true,
            ViewMode::Completed => order.order_status.is_completed(),
            ViewMode::Pending => order.order_status.is_pending(),
            ViewMode::Cancelled => order.order_status.is_cancelled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFilter {
    Confirmed,
    Unconfirmed,
}

/// `None` fields do not filter. Price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    pub view_mode: ViewMode,
    pub customer_name: Option<String>,
    pub camp_name: Option<String>,
    pub room_number: Option<String>,
    pub service: Option<String>,
    pub payment: Option<PaymentFilter>,
    pub pickup_method: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl OrderFilter {
    pub fn matches(&self, order: &NormalizedOrder) -> bool {
        fn eq(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |w| w == actual)
        }

        let price = parse_price(&order.total_price);
        eq(&self.customer_name, &order.customer_name)
            && eq(&self.camp_name, &order.camp_name)
            && eq(&self.room_number, &order.room_number)
            && eq(&self.pickup_method, &order.pickup_method)
            && self.service.as_deref().map_or(true, |wanted| {
                order.services.iter().any(|s| s.name == wanted)
            })
            && self.payment.map_or(true, |p| {
                order.payment_confirmed == (p == PaymentFilter::Confirmed)
            })
            && self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
            && self.view_mode.matches(order)
    }

    pub fn apply<'a>(&self, orders: &'a [NormalizedOrder]) -> Vec<&'a NormalizedOrder> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }
}

/// Distinct values offered by the filter pickers, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderFacets {
    pub customer_names: Vec<String>,
    pub camp_names: Vec<String>,
    pub room_numbers: Vec<String>,
    pub services: Vec<String>,
    pub pickup_methods: Vec<String>,
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

impl OrderFacets {
    pub fn collect(orders: &[NormalizedOrder]) -> Self {
        let mut facets = Self::default();
        for order in orders {
            push_unique(&mut facets.customer_names, &order.customer_name);
            push_unique(&mut facets.camp_names, &order.camp_name);
            push_unique(&mut facets.room_numbers, &order.room_number);
            push_unique(&mut facets.pickup_methods, &order.pickup_method);
            for service in &order.services {
                push_unique(&mut facets.services, &service.name);
            }
        }
        facets
    }
}
