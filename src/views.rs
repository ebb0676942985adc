//! Per-screen order state.
//!
//! Each screen (dashboard overview, statistics, orders list) owns an
//! [`OrderView`] with its own copy of the order list and its own refresh
//! trigger. Views share nothing, so two open screens can be at different
//! staleness.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use tracing::{info, warn};

use crate::api::AdminBackend;
use crate::error::ApiResult;
use crate::filter::{OrderFacets, OrderFilter};
use crate::model::{NormalizedOrder, OrderStatus};
use crate::orders::{fetch_laundry_orders, update_status_optimistic, OrderBook};
use crate::stats::{DashboardSummary, StatisticsSummary};
use crate::timestamp::local_today;

pub struct OrderView {
    name: &'static str,
    backend: Arc<dyn AdminBackend>,
    book: OrderBook,
    last_updated: Option<DateTime<Local>>,
    last_error: Option<String>,
}

impl OrderView {
    pub fn new(name: &'static str, backend: Arc<dyn AdminBackend>) -> Self {
        Self {
            name,
            backend,
            book: OrderBook::default(),
            last_updated: None,
            last_error: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn orders(&self) -> &[NormalizedOrder] {
        self.book.orders()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// Message from the last failed refresh or status write, for inline
    /// display next to the view.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Refetch and rejoin everything. On failure the previous list is kept.
    pub async fn refresh(&mut self) -> ApiResult<usize> {
        match fetch_laundry_orders(self.backend.as_ref()).await {
            Ok(orders) => {
                let count = orders.len();
                self.book.replace(orders);
                self.last_updated = Some(Local::now());
                self.last_error = None;
                info!(view = self.name, orders = count, "view refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(view = self.name, error = %e, "view refresh failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Optimistically set an order's status; reverted if the backend rejects it.
    pub async fn toggle_status(&mut self, order_id: u64, status: OrderStatus) -> ApiResult<()> {
        let result =
            update_status_optimistic(self.backend.as_ref(), &mut self.book, order_id, status)
                .await;
        self.last_error = match &result {
            Ok(()) => None,
            Err(_) => Some("Failed to update order status. Please try again.".to_string()),
        };
        result
    }

    pub async fn cancel_order(&mut self, order_id: u64) -> ApiResult<()> {
        self.toggle_status(order_id, OrderStatus::Cancelled).await
    }

    pub fn dashboard(&self) -> DashboardSummary {
        self.dashboard_on(local_today())
    }

    pub fn dashboard_on(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary::compute(self.orders(), today)
    }

    pub fn statistics(&self) -> StatisticsSummary {
        self.statistics_on(local_today())
    }

    pub fn statistics_on(&self, today: NaiveDate) -> StatisticsSummary {
        StatisticsSummary::compute(self.orders(), today)
    }

    pub fn filtered(&self, filter: &OrderFilter) -> Vec<&NormalizedOrder> {
        filter.apply(self.orders())
    }

    pub fn facets(&self) -> OrderFacets {
        OrderFacets::collect(self.orders())
    }
}
