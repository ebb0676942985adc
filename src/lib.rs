//! Laundry Admin core
//!
//! Reads laundry orders and their lookup collections from the CMS REST API,
//! joins them into display-ready records and derives the dashboard and
//! statistics figures. The `laundry-admin` binary is a thin front end over
//! [`run`].

use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::json;
use tracing::info;

mod api;
mod auth;
mod camps;
mod catalog;
mod config;
mod diagnostics;
mod error;
mod filter;
mod model;
mod orders;
mod stats;
mod storage;
mod timestamp;
mod views;

#[cfg(test)]
mod testing;

pub use api::{AdminBackend, ApiClient, Collection};
pub use auth::{is_token_expired, login, logout, token_expiry, LoginResponse};
pub use camps::{create_camp, delete_camp, fetch_camps, update_camp, Camp};
pub use catalog::{
    create_payment_method, create_pickup_slot, delete_payment_method, delete_pickup_slot,
    delete_service_image, get_settings, list_services, provider_code, update_service_image,
    update_service_price, DailyAvailability, PaymentMethod, ServiceImage, ServicePrice,
    ServiceSummary, Settings, SlotTime,
};
pub use config::{normalize_site_url, AdminConfig};
pub use error::{ApiError, ApiResult};
pub use filter::{OrderFacets, OrderFilter, PaymentFilter, ViewMode};
pub use model::{
    IdRef, NormalizedOrder, OrderFields, OrderService, OrderStatus, PickupSlot, RawCamp,
    RawOrder, RawPickupSlot, RawService,
};
pub use orders::{
    fetch_laundry_orders, join_orders, normalize_order, update_status_optimistic, Lookups,
    OrderBook, StatusPatch,
};
pub use stats::{
    average_order_value, count_by_status, format_currency, most_popular_service,
    orders_in_month, orders_on_day, revenue, unique_customers, DashboardSummary,
    ServicePopularity, StatisticsSummary, StatusCounts,
};
pub use storage::{factory_reset, CredentialProvider, KeyringStore, StaticToken};
pub use timestamp::{falls_in_month, falls_on_day, parse_order_timestamp};
pub use views::OrderView;

const PASSWORD_ENV: &str = "LAUNDRY_ADMIN_PASSWORD";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A view's data with the view name, refresh instant and, when given, a
/// display-formatted revenue figure.
fn view_report<T: Serialize>(
    view: &OrderView,
    data: &T,
    revenue_total: Option<f64>,
) -> anyhow::Result<serde_json::Value> {
    let mut report = json!({
        "view": view.name(),
        "lastUpdated": view.last_updated().map(|t| t.to_rfc3339()),
        "data": serde_json::to_value(data)?,
    });
    if let Some(amount) = revenue_total {
        report["revenue"] = json!(format_currency(amount));
    }
    Ok(report)
}

fn print_view<T: Serialize>(
    view: &OrderView,
    data: &T,
    revenue_total: Option<f64>,
) -> anyhow::Result<()> {
    print_json(&view_report(view, data, revenue_total)?)
}

fn parse_view_mode(arg: Option<&str>) -> anyhow::Result<ViewMode> {
    Ok(match arg.unwrap_or("all") {
        "all" => ViewMode::All,
        "completed" => ViewMode::Completed,
        "pending" => ViewMode::Pending,
        "cancelled" => ViewMode::Cancelled,
        other => bail!("unknown view mode: {other}"),
    })
}

/// Entry point for the binary. `args` excludes the program name.
pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let _guard = diagnostics::init_logging();
    info!(
        "Starting Laundry Admin v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_SHA")
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(dispatch(args))
}

async fn dispatch(args: Vec<String>) -> anyhow::Result<()> {
    let config = AdminConfig::load();
    info!(site = %config.site_url, "configuration loaded");

    let store = KeyringStore;
    let client = ApiClient::new(config, Arc::new(store))?;
    let backend: Arc<dyn AdminBackend> = Arc::new(client.clone());

    let command = args.first().map(String::as_str).unwrap_or("dashboard");
    match command {
        "dashboard" => {
            let mut view = OrderView::new("dashboard", backend);
            view.refresh().await?;
            let summary = view.dashboard();
            print_view(&view, &summary, Some(summary.estimated_revenue_today))
        }
        "stats" => {
            let mut view = OrderView::new("statistics", backend);
            view.refresh().await?;
            let summary = view.statistics();
            print_view(&view, &summary, Some(summary.total_revenue))
        }
        "orders" => {
            let filter = OrderFilter {
                view_mode: parse_view_mode(args.get(1).map(String::as_str))?,
                ..Default::default()
            };
            let mut view = OrderView::new("orders", backend);
            view.refresh().await?;
            let orders = view.filtered(&filter);
            print_view(&view, &orders, Some(revenue(orders.iter().copied())))
        }
        "set-status" => {
            let (Some(id), Some(status)) = (args.get(1), args.get(2)) else {
                bail!("usage: set-status <order_id> <status>");
            };
            let order_id: u64 = id.parse().context("order id must be a number")?;
            let mut view = OrderView::new("orders", backend);
            view.refresh().await?;
            view.toggle_status(order_id, OrderStatus::from(status.as_str()))
                .await?;
            print_view(&view, &view.orders().iter().find(|o| o.id == order_id), None)
        }
        "settings" => print_json(&get_settings(backend.as_ref()).await?),
        "camps" => print_json(&fetch_camps(backend.as_ref()).await?),
        "login" => {
            let Some(username) = args.get(1) else {
                bail!("usage: login <username>");
            };
            let password = std::env::var(PASSWORD_ENV)
                .with_context(|| format!("{PASSWORD_ENV} is not set"))?;
            let response = login(&client, &store, username, &password).await?;
            print_json(&response.user_display_name)
        }
        "logout" => Ok(logout(&store)?),
        "reset" => Ok(factory_reset()?),
        "about" => print_json(&diagnostics::get_about_info()),
        other => bail!("unknown command: {other}"),
    }
}
