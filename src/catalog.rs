//! Control-panel catalog: service prices and images, pickup slots and
//! payment methods.

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{AdminBackend, Collection};
use crate::error::{ApiError, ApiResult};
use crate::model::{parse_price, RawPaymentMethod, RawPickupSlot, RawService};
use crate::orders::decode_records;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicePrice {
    pub id: u64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotTime {
    pub id: u64,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethod {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyAvailability {
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub prices: Vec<ServicePrice>,
    pub pickup_slots: Vec<SlotTime>,
    pub payment_methods: Vec<PaymentMethod>,
    /// Not backed by an endpoint; always available.
    pub daily_availability: DailyAvailability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: u64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceImage {
    pub id: u64,
    pub image: String,
}

/// Load the control panel. Services and slots are required; payment methods
/// degrade to an empty list.
pub async fn get_settings<B>(backend: &B) -> ApiResult<Settings>
where
    B: AdminBackend + ?Sized,
{
    let (services, slots, methods) = tokio::join!(
        backend.get_collection(Collection::Service),
        backend.get_collection(Collection::PickupSlot),
        backend.get_collection(Collection::PaymentMethod),
    );

    let services: Vec<RawService> = decode_records(services?, Collection::Service);
    let slots: Vec<RawPickupSlot> = decode_records(slots?, Collection::PickupSlot);
    let methods: Vec<RawPaymentMethod> = match methods {
        Ok(payload) => decode_records(payload, Collection::PaymentMethod),
        Err(e) => {
            warn!(error = %e, "could not fetch payment methods");
            Vec::new()
        }
    };

    Ok(Settings {
        prices: services
            .into_iter()
            .map(|s| ServicePrice {
                id: s.id,
                name: s.title.unwrap_or_default(),
                price: s.acf.price.as_deref().map(parse_price).unwrap_or(0.0),
            })
            .collect(),
        pickup_slots: slots
            .into_iter()
            .map(|s| SlotTime {
                id: s.id,
                time: s.acf.time,
            })
            .collect(),
        payment_methods: methods
            .into_iter()
            .map(|m| PaymentMethod {
                id: m.id,
                name: m.title.unwrap_or_default(),
            })
            .collect(),
        daily_availability: DailyAvailability { is_available: true },
    })
}

pub async fn list_services<B>(backend: &B) -> ApiResult<Vec<ServiceSummary>>
where
    B: AdminBackend + ?Sized,
{
    let payload = backend.get_collection(Collection::Service).await?;
    let services: Vec<RawService> = decode_records(payload, Collection::Service);
    Ok(services
        .into_iter()
        .map(|s| ServiceSummary {
            id: s.id,
            name: s.title.unwrap_or_default(),
            image: s.acf.image,
        })
        .collect())
}

/// Unparseable prices are written as zero.
pub async fn update_service_price<B>(backend: &B, service_id: u64, price: &str) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    let price = parse_price(price);
    let result = backend
        .request(
            Method::POST,
            &format!("service/{service_id}"),
            Some(json!({ "acf": { "price": price } })),
        )
        .await?;
    info!(service_id, price, "service price updated");
    Ok(result)
}

/// Upload an image and attach it to the service. The media id is tried
/// first; some field configurations only accept the URL.
pub async fn update_service_image<B>(
    backend: &B,
    service_id: u64,
    file_name: &str,
    bytes: Vec<u8>,
) -> ApiResult<ServiceImage>
where
    B: AdminBackend + ?Sized,
{
    let media = backend.upload_media(file_name, bytes).await?;
    let media_id = media.get("id").and_then(Value::as_u64);
    let source_url = media
        .get("source_url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidPayload("media upload returned no source_url".into()))?;

    let path = format!("service/{service_id}");
    let by_id = match media_id {
        Some(id) => {
            backend
                .request(Method::POST, &path, Some(json!({ "acf": { "image": id } })))
                .await
        }
        None => Err(ApiError::InvalidPayload("media upload returned no id".into())),
    };
    if let Err(e) = by_id {
        warn!(service_id, error = %e, "setting image by media id failed, retrying with URL");
        backend
            .request(
                Method::POST,
                &path,
                Some(json!({ "acf": { "image": source_url } })),
            )
            .await?;
    }

    info!(service_id, image = %source_url, "service image updated");
    Ok(ServiceImage {
        id: service_id,
        image: source_url,
    })
}

/// Clear the service image, trying `null` then the empty string.
pub async fn delete_service_image<B>(backend: &B, service_id: u64) -> ApiResult<()>
where
    B: AdminBackend + ?Sized,
{
    let path = format!("service/{service_id}");
    if let Err(e) = backend
        .request(Method::POST, &path, Some(json!({ "acf": { "image": null } })))
        .await
    {
        warn!(
            service_id,
            error = %e,
            "clearing image with null failed, retrying with empty string"
        );
        backend
            .request(Method::POST, &path, Some(json!({ "acf": { "image": "" } })))
            .await?;
    }
    info!(service_id, "service image removed");
    Ok(())
}

pub async fn create_pickup_slot<B>(backend: &B, time: &str) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    backend
        .request(
            Method::POST,
            Collection::PickupSlot.as_str(),
            Some(json!({
                "title": time,
                "status": "publish",
                "acf": { "time": time, "is_active": true },
            })),
        )
        .await
}

pub async fn delete_pickup_slot<B>(backend: &B, slot_id: u64) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    backend
        .request(
            Method::DELETE,
            &format!("pickup_slot/{slot_id}"),
            Some(json!({ "force": true })),
        )
        .await
}

/// `"Apple Pay!"` → `"apple_pay_"`
pub fn provider_code(name: &str) -> String {
    let mut code = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            code.push(c);
            in_run = false;
        } else if !in_run {
            code.push('_');
            in_run = true;
        }
    }
    code
}

pub async fn create_payment_method<B>(backend: &B, name: &str) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    backend
        .request(
            Method::POST,
            Collection::PaymentMethod.as_str(),
            Some(json!({
                "title": name,
                "status": "publish",
                "acf": { "provider_code": provider_code(name), "is_active": true },
            })),
        )
        .await
}

pub async fn delete_payment_method<B>(backend: &B, method_id: u64) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    backend
        .request(
            Method::DELETE,
            &format!("payment_method/{method_id}"),
            Some(json!({ "force": true })),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    fn seeded() -> FakeBackend {
        let backend = FakeBackend::new();
        backend
            .collection(
                Collection::Service,
                json!([
                    {
                        "id": 3,
                        "title": { "rendered": "Wash" },
                        "acf": { "price": "12.50", "image": "https://cdn/x.png" }
                    },
                    { "id": 4, "title": { "rendered": "Iron" }, "acf": { "price": "" } }
                ]),
            )
            .collection(
                Collection::PickupSlot,
                json!([{ "id": 20, "title": { "rendered": "8am" }, "acf": { "time": "08:00" } }]),
            )
            .collection(
                Collection::PaymentMethod,
                json!([{ "id": 30, "title": { "rendered": "Card" } }]),
            );
        backend
    }

    #[tokio::test]
    async fn settings_are_assembled() {
        let settings = get_settings(&seeded()).await.unwrap();
        assert_eq!(settings.prices.len(), 2);
        assert_eq!(settings.prices[0].price, 12.5);
        assert_eq!(settings.prices[1].price, 0.0);
        assert_eq!(settings.pickup_slots[0].time.as_deref(), Some("08:00"));
        assert_eq!(settings.payment_methods[0].name, "Card");
        assert!(settings.daily_availability.is_available);
    }

    #[tokio::test]
    async fn payment_methods_failure_degrades() {
        let backend = seeded();
        backend.fail_collection(Collection::PaymentMethod);
        let settings = get_settings(&backend).await.unwrap();
        assert!(settings.payment_methods.is_empty());
        assert_eq!(settings.prices.len(), 2);
    }

    #[tokio::test]
    async fn services_failure_propagates() {
        let backend = seeded();
        backend.fail_collection(Collection::Service);
        assert!(get_settings(&backend).await.is_err());
    }

    #[tokio::test]
    async fn list_services_includes_images() {
        let services = list_services(&seeded()).await.unwrap();
        assert_eq!(services[0].image.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(services[1].image, None);
    }

    #[tokio::test]
    async fn price_update_sends_number() {
        let backend = FakeBackend::new();
        backend.on(Method::POST, "service/3", json!({ "id": 3 }));
        update_service_price(&backend, 3, "abc").await.unwrap();
        update_service_price(&backend, 3, "14.25").await.unwrap();
        let calls = backend.calls();
        assert_eq!(calls[0].body, Some(json!({ "acf": { "price": 0.0 } })));
        assert_eq!(calls[1].body, Some(json!({ "acf": { "price": 14.25 } })));
    }

    #[tokio::test]
    async fn image_update_falls_back_to_url() {
        let backend = FakeBackend::new();
        backend
            .on(
                Method::POST,
                "media",
                json!({ "id": 55, "source_url": "https://cdn/shirt.jpg" }),
            )
            .fail(Method::POST, "service/3", 400, "Invalid image id");

        let err = update_service_image(&backend, 3, "shirt.jpg", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].body, Some(json!({ "acf": { "image": 55 } })));
        assert_eq!(
            calls[2].body,
            Some(json!({ "acf": { "image": "https://cdn/shirt.jpg" } }))
        );

        backend.on(Method::POST, "service/3", json!({ "id": 3 }));
        let image = update_service_image(&backend, 3, "shirt.jpg", vec![1])
            .await
            .unwrap();
        assert_eq!(image.image, "https://cdn/shirt.jpg");
    }

    #[tokio::test]
    async fn image_delete_retries_with_empty_string() {
        let backend = FakeBackend::new();
        backend.fail(Method::POST, "service/9", 400, "null rejected");
        assert!(delete_service_image(&backend, 9).await.is_err());
        let calls = backend.calls();
        assert_eq!(calls[0].body, Some(json!({ "acf": { "image": null } })));
        assert_eq!(calls[1].body, Some(json!({ "acf": { "image": "" } })));
    }

    #[tokio::test]
    async fn slot_and_method_writes() {
        let backend = FakeBackend::new();
        backend
            .on(Method::POST, "pickup_slot", json!({ "id": 21 }))
            .on(Method::DELETE, "pickup_slot/21", json!({ "deleted": true }))
            .on(Method::POST, "payment_method", json!({ "id": 31 }));

        create_pickup_slot(&backend, "09:30").await.unwrap();
        delete_pickup_slot(&backend, 21).await.unwrap();
        create_payment_method(&backend, "Apple Pay").await.unwrap();
        assert!(delete_payment_method(&backend, 31).await.is_err());

        let calls = backend.calls();
        assert_eq!(calls[0].body.as_ref().unwrap()["acf"]["time"], "09:30");
        assert_eq!(calls[1].body, Some(json!({ "force": true })));
        assert_eq!(
            calls[2].body.as_ref().unwrap()["acf"]["provider_code"],
            "apple_pay"
        );
    }

    #[test]
    fn provider_codes() {
        assert_eq!(provider_code("Apple Pay"), "apple_pay");
        assert_eq!(provider_code("Cash -- on pickup!"), "cash_on_pickup_");
        assert_eq!(provider_code("EFTPOS"), "eftpos");
    }
}
