//! Contribution Lister: fetch the event export and enumerate contributions.
//!
//! A failure here aborts the run; all downstream grouping depends on a
//! complete contribution set.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use indicoharvest_shared::{EventInfo, HarvestError, Result};

use crate::http::IndicoClient;
use crate::value::{as_i64, date_field, str_field};

/// Minimal handle on one contribution from the listing, carrying the raw
/// detail payload the export delivers inline.
#[derive(Debug, Clone)]
pub struct ContributionStub {
    pub id: i64,
    pub friendly_id: String,
    pub title: String,
    pub payload: Value,
}

/// Result of the listing stage.
#[derive(Debug, Clone)]
pub struct EventListing {
    pub event: EventInfo,
    /// Deduplicated stubs in discovery order.
    pub stubs: Vec<ContributionStub>,
    /// Listing entries dropped for having no usable id.
    pub skipped: usize,
}

/// Fetch the event export and build the contribution listing.
///
/// Fails with [`HarvestError::Fetch`] when the endpoint is unreachable or
/// the payload has an unexpected shape.
pub async fn list_contributions(
    client: &IndicoClient,
    event_id: &str,
    cap: Option<usize>,
) -> Result<EventListing> {
    let url = client.export_url(event_id)?;
    info!(%url, "fetching event listing");

    let response = client.get_api(&url).await?;
    let payload: Value = response
        .json()
        .await
        .map_err(|e| HarvestError::Fetch(format!("{url}: invalid JSON body: {e}")))?;

    parse_listing(&payload, cap)
}

/// Parse an export payload into an [`EventListing`].
pub fn parse_listing(payload: &Value, cap: Option<usize>) -> Result<EventListing> {
    let count = payload.get("count").and_then(Value::as_u64).unwrap_or(0);
    let result = payload
        .get("results")
        .and_then(Value::as_array)
        .and_then(|r| r.first());

    let Some(event_payload) = result.filter(|_| count > 0) else {
        return Err(HarvestError::Fetch(
            "no event data found in export response".into(),
        ));
    };

    let event = parse_event_info(event_payload);

    let contributions = event_payload
        .get("contributions")
        .and_then(Value::as_array)
        .ok_or_else(|| HarvestError::Fetch("export payload has no contributions array".into()))?;

    let mut seen: HashSet<i64> = HashSet::new();
    let mut stubs: Vec<ContributionStub> = Vec::new();
    let mut skipped = 0usize;

    for entry in contributions {
        let Some(id) = entry.get("id").and_then(as_i64) else {
            warn!(entry = %entry, "listing entry has no usable id, skipping");
            skipped += 1;
            continue;
        };
        if !seen.insert(id) {
            warn!(id, "duplicate contribution id in listing, keeping first");
            continue;
        }
        stubs.push(ContributionStub {
            id,
            friendly_id: friendly_id_of(entry),
            title: str_field(entry, "title"),
            payload: entry.clone(),
        });
    }

    if let Some(cap) = cap {
        stubs.truncate(cap);
    }

    info!(
        event = %event.title,
        contributions = stubs.len(),
        skipped,
        "event listing parsed"
    );

    Ok(EventListing {
        event,
        stubs,
        skipped,
    })
}

fn friendly_id_of(entry: &Value) -> String {
    match entry.get("friendly_id") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_event_info(payload: &Value) -> EventInfo {
    EventInfo {
        id: payload
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
        title: str_field(payload, "title"),
        url: str_field(payload, "url"),
        start_date: date_field(payload, "startDate"),
        end_date: date_field(payload, "endDate"),
        location: str_field(payload, "location"),
    }
}
