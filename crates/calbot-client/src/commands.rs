//! One-shot subcommands. Each returns the text to print.

use calbot_protocol::{AvailabilityQuery, CreateEventRequest, EventDetailsQuery};
use serde::Serialize;

use crate::api::BackendClient;
use crate::error::{ClientError, ClientResult};
use crate::render;

fn to_json<T: Serialize>(value: &T) -> ClientResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

pub async fn availability(
    client: &BackendClient,
    range: &str,
    slot_minutes: Option<u32>,
    json: bool,
) -> ClientResult<String> {
    let mut query = AvailabilityQuery::new(range);
    query.slot_minutes = slot_minutes;
    let response = client.availability(&query).await?;
    if json {
        return to_json(&response);
    }
    Ok(render::slots(&response.slots))
}

pub async fn events(client: &BackendClient, query: EventDetailsQuery, json: bool) -> ClientResult<String> {
    let response = client.event_details(&query).await?;
    if json {
        return to_json(&response);
    }
    Ok(render::events(&response.events))
}

pub async fn book(client: &BackendClient, request: CreateEventRequest, json: bool) -> ClientResult<String> {
    request
        .validate()
        .map_err(|e| ClientError::usage(e.to_string()))?;
    let created = client.create_event(&request).await?;
    if json {
        return to_json(&created);
    }
    Ok(render::created(&created))
}

pub async fn ask(client: &BackendClient, prompt: &str, json: bool) -> ClientResult<String> {
    let reply = client.run(prompt).await?;
    if json {
        return to_json(&reply);
    }
    let mut text = reply.content;
    for (i, slot) in reply.slots.iter().enumerate() {
        text.push_str(&format!("\n  [{}] {}", i + 1, render::slot_label(slot)));
    }
    Ok(text)
}

pub async fn health(client: &BackendClient) -> ClientResult<String> {
    client.health().await
}
