//! Order join and normalization.
//!
//! Fetches orders, services, pickup slots and camps concurrently, indexes the
//! three lookup collections by id and resolves each order's references into
//! embedded display objects. Only the orders request is allowed to fail the
//! whole pass; a failed lookup collection degrades to an empty index and the
//! affected references resolve to "unresolved".

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{AdminBackend, Collection};
use crate::error::ApiResult;
use crate::model::{
    NormalizedOrder, OrderService, OrderStatus, PickupSlot, RawCamp, RawOrder, RawPickupSlot,
    RawService, DEFAULT_TOTAL_PRICE, PLACEHOLDER, UNKNOWN_CAMP,
};

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a collection payload element by element. A payload that is not an
/// array yields an empty list; undecodable elements are skipped.
pub(crate) fn decode_records<T: DeserializeOwned>(
    payload: Value,
    collection: Collection,
) -> Vec<T> {
    let Value::Array(items) = payload else {
        warn!(
            collection = collection.as_str(),
            "fetched collection is not an array, treating as empty"
        );
        return Vec::new();
    };
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = collection.as_str(), error = %e, "skipping undecodable record");
                None
            }
        })
        .collect();
    debug!(
        collection = collection.as_str(),
        total,
        decoded = records.len(),
        "collection decoded"
    );
    records
}

/// Lookup collections degrade to empty on failure.
fn auxiliary<T: DeserializeOwned>(result: ApiResult<Value>, collection: Collection) -> Vec<T> {
    match result {
        Ok(payload) => decode_records(payload, collection),
        Err(e) => {
            warn!(
                collection = collection.as_str(),
                error = %e,
                "lookup collection unavailable, references will be unresolved"
            );
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// Id indices for one join pass.
#[derive(Debug, Default)]
pub struct Lookups {
    services: HashMap<u64, OrderService>,
    slots: HashMap<u64, PickupSlot>,
    camps: HashMap<u64, String>,
}

impl Lookups {
    pub fn build(services: &[RawService], slots: &[RawPickupSlot], camps: &[RawCamp]) -> Self {
        let services = services
            .iter()
            .map(|s| {
                (
                    s.id,
                    OrderService {
                        id: s.id,
                        name: s.title.clone().unwrap_or_default(),
                        slug: s.acf.slug.clone().unwrap_or_default(),
                        price: s.acf.price.clone().unwrap_or_default(),
                    },
                )
            })
            .collect();
        let slots = slots
            .iter()
            .map(|s| {
                (
                    s.id,
                    PickupSlot {
                        id: s.id,
                        title: s.title.clone().unwrap_or_default(),
                        time: s.acf.time.clone(),
                    },
                )
            })
            .collect();
        let camps = camps
            .iter()
            .map(|c| {
                (
                    c.id,
                    c.title.clone().unwrap_or_else(|| UNKNOWN_CAMP.to_string()),
                )
            })
            .collect();
        Self {
            services,
            slots,
            camps,
        }
    }

    pub fn service(&self, id: u64) -> Option<&OrderService> {
        self.services.get(&id)
    }

    pub fn slot(&self, id: u64) -> Option<&PickupSlot> {
        self.slots.get(&id)
    }

    pub fn camp_name(&self, id: u64) -> Option<&str> {
        self.camps.get(&id).map(String::as_str)
    }
}

fn or_placeholder(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn normalize_order(raw: &RawOrder, lookups: &Lookups) -> NormalizedOrder {
    let acf = &raw.acf;

    let services = acf
        .service_id
        .as_ref()
        .map(|r| r.ids())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| lookups.service(id).cloned())
        .collect();

    let camp_name = acf
        .camp
        .as_ref()
        .and_then(|r| r.first())
        .and_then(|id| lookups.camp_name(id))
        .map(str::to_string)
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let pickup_slot = acf.slot_id.and_then(|id| lookups.slot(id).cloned());

    NormalizedOrder {
        id: raw.id,
        title: raw.title.clone().unwrap_or_default(),
        customer_name: or_placeholder(&acf.customer_name),
        room_number: or_placeholder(&acf.room_number),
        pickup_method: or_placeholder(&acf.pickup_method),
        payment_confirmed: acf.payment_confirmed,
        total_price: acf
            .total_price
            .clone()
            .unwrap_or_else(|| DEFAULT_TOTAL_PRICE.to_string()),
        special_instructions: or_placeholder(&acf.special_instructions),
        order_status: acf
            .order_status
            .as_deref()
            .map(OrderStatus::from)
            .unwrap_or_default(),
        order_timestamp: or_placeholder(&acf.order_timestamp),
        camp_name,
        services,
        pickup_slot,
    }
}

/// Join raw orders against the lookup collections, preserving order sequence.
pub fn join_orders(
    orders: &[RawOrder],
    services: &[RawService],
    slots: &[RawPickupSlot],
    camps: &[RawCamp],
) -> Vec<NormalizedOrder> {
    let lookups = Lookups::build(services, slots, camps);
    orders
        .iter()
        .map(|raw| normalize_order(raw, &lookups))
        .collect()
}

/// Fetch all four collections concurrently and join them.
///
/// A failed orders request is returned as an error; an orders payload that is
/// not an array yields an empty list.
pub async fn fetch_laundry_orders<B>(backend: &B) -> ApiResult<Vec<NormalizedOrder>>
where
    B: AdminBackend + ?Sized,
{
    let (orders, services, slots, camps) = tokio::join!(
        backend.get_collection(Collection::Order),
        backend.get_collection(Collection::Service),
        backend.get_collection(Collection::PickupSlot),
        backend.get_collection(Collection::Camp),
    );

    let orders: Vec<RawOrder> = decode_records(orders?, Collection::Order);
    let services: Vec<RawService> = auxiliary(services, Collection::Service);
    let slots: Vec<RawPickupSlot> = auxiliary(slots, Collection::PickupSlot);
    let camps: Vec<RawCamp> = auxiliary(camps, Collection::Camp);

    let joined = join_orders(&orders, &services, &slots, &camps);
    info!(
        orders = joined.len(),
        services = services.len(),
        pickup_slots = slots.len(),
        camps = camps.len(),
        "laundry orders loaded"
    );
    Ok(joined)
}

// ---------------------------------------------------------------------------
// Local order list with optimistic status edits
// ---------------------------------------------------------------------------

/// A tentative status change applied locally before the backend confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPatch {
    pub order_id: u64,
    pub previous: OrderStatus,
    pub next: OrderStatus,
}

/// Client-held order list.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<NormalizedOrder>,
}

impl OrderBook {
    pub fn new(orders: Vec<NormalizedOrder>) -> Self {
        Self { orders }
    }

    pub fn orders(&self) -> &[NormalizedOrder] {
        &self.orders
    }

    pub fn replace(&mut self, orders: Vec<NormalizedOrder>) {
        self.orders = orders;
    }

    pub fn get(&self, order_id: u64) -> Option<&NormalizedOrder> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Set the status of one order. Returns the patch needed to undo it, or
    /// `None` when the order is not in the list.
    pub fn apply_status(&mut self, order_id: u64, status: OrderStatus) -> Option<StatusPatch> {
        let order = self.orders.iter_mut().find(|o| o.id == order_id)?;
        let previous = std::mem::replace(&mut order.order_status, status.clone());
        Some(StatusPatch {
            order_id,
            previous,
            next: status,
        })
    }

    /// Re-apply the pre-edit status recorded in `patch`.
    pub fn revert(&mut self, patch: &StatusPatch) -> bool {
        match self.orders.iter_mut().find(|o| o.id == patch.order_id) {
            Some(order) => {
                order.order_status = patch.previous.clone();
                true
            }
            None => false,
        }
    }
}

/// Apply `status` locally, write it to the backend and undo the local edit if
/// the write fails.
pub async fn update_status_optimistic<B>(
    backend: &B,
    book: &mut OrderBook,
    order_id: u64,
    status: OrderStatus,
) -> ApiResult<()>
where
    B: AdminBackend + ?Sized,
{
    let patch = book.apply_status(order_id, status.clone());
    if patch.is_none() {
        warn!(order_id, "status update for an order not in the local list");
    }

    match backend.update_order_status(order_id, status.as_str()).await {
        Ok(_) => {
            info!(order_id, status = %status, "order status updated");
            Ok(())
        }
        Err(e) => {
            if let Some(patch) = patch.as_ref() {
                book.revert(patch);
            }
            warn!(order_id, status = %status, error = %e, "order status update failed, reverted");
            Err(e)
        }
    }
}
