//! Contribution Detail Fetcher: populate full records from stub payloads.
//!
//! The Indico export delivers full contribution detail inline with the
//! listing, so this stage is a tolerant parse: missing optional fields get
//! defaults, and a malformed payload fails only its own record.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use indicoharvest_shared::{
    AttachmentRecord, ContributionRecord, ContributionType, HarvestError, Person, Result,
    safe_filename, with_counter_suffix,
};

use crate::listing::ContributionStub;
use crate::value::{date_field, int_field, label_field, str_field, time_field};

/// Build a fully populated [`ContributionRecord`] from a listing stub.
///
/// Returns [`HarvestError::Parse`] only when the payload is unusable as a
/// whole; individual missing fields never fail the record.
pub fn parse_contribution(stub: &ContributionStub) -> Result<ContributionRecord> {
    let payload = &stub.payload;
    if !payload.is_object() {
        return Err(HarvestError::parse(format!(
            "contribution {}: payload is not an object",
            stub.id
        )));
    }

    let type_name = label_field(payload, "type").unwrap_or_default();
    let kind = ContributionType::classify(&type_name);

    let attachments = parse_attachments(payload, stub.id);

    let record = ContributionRecord {
        id: stub.id,
        friendly_id: stub.friendly_id.clone(),
        title: str_field(payload, "title"),
        type_name,
        kind,
        description: str_field(payload, "description"),
        start_date: date_field(payload, "startDate"),
        start_time: time_field(payload, "startDate"),
        end_date: date_field(payload, "endDate"),
        end_time: time_field(payload, "endDate"),
        duration_minutes: int_field(payload, "duration").unwrap_or(0).max(0) as u32,
        location: str_field(payload, "location"),
        room: str_field(payload, "room"),
        url: str_field(payload, "url"),
        session: label_field(payload, "session"),
        session_id: int_field(payload, "session_id"),
        track: label_field(payload, "track"),
        board_number: str_field(payload, "board_number"),
        code: str_field(payload, "code"),
        speakers: parse_persons(payload, "speakers"),
        primary_authors: parse_persons(payload, "primaryauthors"),
        coauthors: parse_persons(payload, "coauthors"),
        keywords: parse_keywords(payload),
        attachment_count: attachments.len(),
        attachments,
    };

    debug!(
        id = record.id,
        kind = %record.kind,
        attachments = record.attachment_count,
        "contribution parsed"
    );

    Ok(record)
}

fn parse_persons(payload: &Value, key: &str) -> Vec<Person> {
    let Some(entries) = payload.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| Person {
            name: str_field(entry, "fullName"),
            first_name: str_field(entry, "first_name"),
            last_name: str_field(entry, "last_name"),
            affiliation: str_field(entry, "affiliation"),
        })
        .collect()
}

fn parse_keywords(payload: &Value) -> Vec<String> {
    payload
        .get("keywords")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Enumerate attachments from `folders[].attachments[]`, sanitizing
/// filenames and resolving collisions within the contribution.
fn parse_attachments(payload: &Value, contribution_id: i64) -> Vec<AttachmentRecord> {
    let Some(folders) = payload.get("folders").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut attachments: Vec<AttachmentRecord> = Vec::new();
    for folder in folders {
        let Some(entries) = folder.get("attachments").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let title = str_field(entry, "title");
            let mut raw_name = str_field(entry, "filename");
            if raw_name.is_empty() {
                raw_name = title.clone();
            }
            if raw_name.is_empty() {
                raw_name = "attachment".into();
            }
            attachments.push(AttachmentRecord {
                contribution_id,
                title,
                filename: safe_filename(&raw_name),
                download_url: str_field(entry, "download_url"),
                content_type: str_field(entry, "content_type"),
                size: int_field(entry, "size").unwrap_or(0).max(0) as u64,
                modified: str_field(entry, "modified_dt"),
                is_protected: entry
                    .get("is_protected")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                outcome: Default::default(),
            });
        }
    }

    resolve_collisions(&mut attachments);
    attachments
}

/// Two attachments mapping to the same sanitized name get deterministic
/// counter suffixes in enumeration order.
fn resolve_collisions(attachments: &mut [AttachmentRecord]) {
    let mut used: HashSet<String> = HashSet::new();
    for attachment in attachments {
        if used.insert(attachment.filename.clone()) {
            continue;
        }
        let mut n = 1;
        loop {
            let candidate = with_counter_suffix(&attachment.filename, n);
            if used.insert(candidate.clone()) {
                attachment.filename = candidate;
                break;
            }
            n += 1;
        }
    }
}
