//! OTIO-style JSON document loading.
//!
//! The wire format is schema-tagged (`"OTIO_SCHEMA": "Clip.2"`), so the
//! loader walks `serde_json::Value` instead of deriving a single shape.
//! Any failure is a typed [`LoadError`] whose variant is the outcome code
//! and whose payload is the human-readable detail; a failed load never
//! produces a partial document.

use std::fs;
use std::path::Path;

use log::info;
use serde_json::Value;
use thiserror::Error;

use crate::composition::Composition;
use crate::item::{Effect, Item, ItemId, ItemKind, Marker};
use crate::time::{RationalTime, TimeRange};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("unexpected schema `{schema}`: {details}")]
    Schema { schema: String, details: String },
    #[error("missing field `{field}` in `{schema}`")]
    MissingField { schema: String, field: String },
}

pub fn from_json_file(path: impl AsRef<Path>) -> Result<Composition, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    let doc = from_json_str(&text)?;
    info!("loaded timeline \"{}\" from {}", doc.name(), path.as_ref().display());
    Ok(doc)
}

pub fn from_json_str(json: &str) -> Result<Composition, LoadError> {
    let value: Value = serde_json::from_str(json)?;
    parse_timeline(&value)
}

/// Schema family name, without the trailing version ("Clip.2" -> "Clip").
fn schema_family(value: &Value) -> &str {
    value
        .get("OTIO_SCHEMA")
        .and_then(Value::as_str)
        .map(|s| s.split('.').next().unwrap_or(s))
        .unwrap_or("")
}

fn name_of(value: &Value) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn missing(schema: &str, field: &str) -> LoadError {
    LoadError::MissingField {
        schema: schema.to_string(),
        field: field.to_string(),
    }
}

fn parse_time(value: &Value, schema: &str, field: &str) -> Result<RationalTime, LoadError> {
    let v = value
        .get("value")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(schema, field))?;
    let rate = value
        .get("rate")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(schema, field))?;
    Ok(RationalTime::new(v, rate))
}

fn parse_range(value: &Value, schema: &str, field: &str) -> Result<TimeRange, LoadError> {
    let start = value
        .get("start_time")
        .map(|t| parse_time(t, schema, field))
        .transpose()?
        .ok_or_else(|| missing(schema, field))?;
    let duration = value
        .get("duration")
        .map(|t| parse_time(t, schema, field))
        .transpose()?
        .ok_or_else(|| missing(schema, field))?;
    Ok(TimeRange::new(start, duration))
}

fn parse_timeline(value: &Value) -> Result<Composition, LoadError> {
    let family = schema_family(value);
    if family != "Timeline" {
        return Err(LoadError::Schema {
            schema: family.to_string(),
            details: "document root must be a Timeline".to_string(),
        });
    }

    let mut doc = Composition::new(name_of(value));
    if let Some(gst) = value.get("global_start_time").filter(|v| !v.is_null()) {
        doc.set_global_start_time(Some(parse_time(gst, "Timeline", "global_start_time")?));
    }

    let tracks = value.get("tracks").ok_or_else(|| missing("Timeline", "tracks"))?;
    if schema_family(tracks) != "Stack" {
        return Err(LoadError::Schema {
            schema: schema_family(tracks).to_string(),
            details: "timeline track container must be a Stack".to_string(),
        });
    }

    let root = doc.root();
    for child in tracks.get("children").and_then(Value::as_array).into_iter().flatten() {
        parse_child(&mut doc, root, child)?;
    }
    Ok(doc)
}

fn parse_child(doc: &mut Composition, parent: ItemId, value: &Value) -> Result<(), LoadError> {
    let family = schema_family(value).to_string();
    let mut item = match family.as_str() {
        "Clip" => {
            let media = value
                .get("media_reference")
                .and_then(|m| m.get("target_url"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let mut item = Item::new(name_of(value), ItemKind::Clip { media });
            item.source_range =
                Some(parse_range(value.get("source_range").ok_or_else(|| missing("Clip", "source_range"))?, "Clip", "source_range")?);
            item
        }
        "Gap" => {
            let mut item = Item::new(name_of(value), ItemKind::Gap);
            item.source_range =
                Some(parse_range(value.get("source_range").ok_or_else(|| missing("Gap", "source_range"))?, "Gap", "source_range")?);
            item
        }
        "Transition" => {
            let in_offset = parse_time(
                value.get("in_offset").ok_or_else(|| missing("Transition", "in_offset"))?,
                "Transition",
                "in_offset",
            )?;
            let out_offset = parse_time(
                value.get("out_offset").ok_or_else(|| missing("Transition", "out_offset"))?,
                "Transition",
                "out_offset",
            )?;
            Item::new(name_of(value), ItemKind::Transition { in_offset, out_offset })
        }
        "Track" => {
            let kind = value
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let mut item = Item::new(name_of(value), ItemKind::Track { kind });
            if let Some(sr) = value.get("source_range").filter(|v| !v.is_null()) {
                item.source_range = Some(parse_range(sr, "Track", "source_range")?);
            }
            item
        }
        "Stack" => {
            let mut item = Item::new(name_of(value), ItemKind::Stack);
            if let Some(sr) = value.get("source_range").filter(|v| !v.is_null()) {
                item.source_range = Some(parse_range(sr, "Stack", "source_range")?);
            }
            item
        }
        other => {
            return Err(LoadError::Schema {
                schema: other.to_string(),
                details: "unsupported timeline child".to_string(),
            });
        }
    };

    parse_effects(&mut item, value)?;
    parse_markers(&mut item, value)?;

    let id = doc.add_item(parent, item);
    for child in value.get("children").and_then(Value::as_array).into_iter().flatten() {
        parse_child(doc, id, child)?;
    }
    Ok(())
}

fn parse_effects(item: &mut Item, value: &Value) -> Result<(), LoadError> {
    for effect in value.get("effects").and_then(Value::as_array).into_iter().flatten() {
        match schema_family(effect) {
            "LinearTimeWarp" => {
                let time_scalar = effect
                    .get("time_scalar")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| missing("LinearTimeWarp", "time_scalar"))?;
                item.effects.push(Effect::LinearTimeWarp { time_scalar });
            }
            // Unknown effect schemas degrade to an inspectable name.
            other => item.effects.push(Effect::Other {
                effect_name: if other.is_empty() { name_of(effect) } else { other.to_string() },
            }),
        }
    }
    Ok(())
}

fn parse_markers(item: &mut Item, value: &Value) -> Result<(), LoadError> {
    for marker in value.get("markers").and_then(Value::as_array).into_iter().flatten() {
        let marked_range = parse_range(
            marker.get("marked_range").ok_or_else(|| missing("Marker", "marked_range"))?,
            "Marker",
            "marked_range",
        )?;
        item.markers.push(Marker {
            name: name_of(marker),
            color: marker
                .get("color")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            marked_range,
        });
    }
    Ok(())
}
