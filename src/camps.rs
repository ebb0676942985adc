//! Camp management.

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{AdminBackend, Collection};
use crate::error::{ApiError, ApiResult};
use crate::model::RawCamp;
use crate::orders::decode_records;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camp {
    pub id: u64,
    pub name: String,
}

fn validated_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Invalid("Camp name cannot be empty".into()));
    }
    Ok(name)
}

pub async fn fetch_camps<B>(backend: &B) -> ApiResult<Vec<Camp>>
where
    B: AdminBackend + ?Sized,
{
    let payload = backend.get_collection(Collection::Camp).await?;
    let camps: Vec<RawCamp> = decode_records(payload, Collection::Camp);
    Ok(camps
        .into_iter()
        .map(|c| Camp {
            id: c.id,
            name: c.title.unwrap_or_default(),
        })
        .collect())
}

pub async fn create_camp<B>(backend: &B, name: &str) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    let name = validated_name(name)?;
    let created = backend
        .request(
            Method::POST,
            Collection::Camp.as_str(),
            Some(json!({ "title": name, "status": "publish" })),
        )
        .await?;
    info!(name, id = ?created.get("id"), "camp created");
    Ok(created)
}

pub async fn update_camp<B>(backend: &B, camp_id: u64, name: &str) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    let name = validated_name(name)?;
    let updated = backend
        .request(
            Method::POST,
            &format!("camp/{camp_id}"),
            Some(json!({ "title": name })),
        )
        .await?;
    info!(camp_id, name, "camp renamed");
    Ok(updated)
}

pub async fn delete_camp<B>(backend: &B, camp_id: u64) -> ApiResult<Value>
where
    B: AdminBackend + ?Sized,
{
    let deleted = backend
        .request(
            Method::DELETE,
            &format!("camp/{camp_id}"),
            Some(json!({ "force": true })),
        )
        .await?;
    info!(camp_id, "camp deleted");
    Ok(deleted)
}
