// 🗄️ Event Log - audit trail of every ingest decision
//
// Every change to the dataset is an event: a listing was added, a listing was
// republished, or an observed listing was skipped because it did not parse.
// Events are append-only and keyed by listing URL.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// EVENT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ListingAdded,
    ListingRepublished,
    ListingSkipped,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ListingAdded => "listing_added",
            EventType::ListingRepublished => "listing_republished",
            EventType::ListingSkipped => "listing_skipped",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "listing_added" => Some(EventType::ListingAdded),
            "listing_republished" => Some(EventType::ListingRepublished),
            "listing_skipped" => Some(EventType::ListingSkipped),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// One entry of the audit trail
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub listing_url: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(event_type: EventType, listing_url: &str, data: serde_json::Value, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            listing_url: listing_url.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            listing_url TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_listing ON events(listing_url)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the event log at `path` and make sure the schema exists
pub fn open_event_log(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open event log: {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

// ============================================================================
// READ / WRITE
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, listing_url, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type.as_str(),
            event.listing_url,
            data_json,
            event.actor,
        ],
    )
    .with_context(|| format!("Failed to insert event {}", event.event_id))?;

    Ok(())
}

/// Insert a batch of events in one transaction; returns how many were written
pub fn insert_events(conn: &mut Connection, events: &[Event]) -> Result<usize> {
    let tx = conn.transaction()?;
    for event in events {
        insert_event(&tx, event)?;
    }
    tx.commit()?;
    Ok(events.len())
}

/// Events for one listing, oldest first
pub fn get_events_for_listing(conn: &Connection, listing_url: &str) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, listing_url, data, actor
         FROM events
         WHERE listing_url = ?1
         ORDER BY timestamp ASC, id ASC",
    )?;

    let events = stmt
        .query_map(params![listing_url], |row| {
            let timestamp_str: String = row.get(1)?;
            let event_type_str: String = row.get(2)?;
            let data_json: String = row.get(4)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: EventType::from_name(&event_type_str)
                    .ok_or(rusqlite::Error::InvalidQuery)?,
                listing_url: row.get(3)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Number of logged events per type, in type order
pub fn count_events_by_type(conn: &Connection) -> Result<Vec<(EventType, i64)>> {
    let mut counts = Vec::new();
    for event_type in [
        EventType::ListingAdded,
        EventType::ListingRepublished,
        EventType::ListingSkipped,
    ] {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE event_type = ?1",
            params![event_type.as_str()],
            |row| row.get(0),
        )?;
        counts.push((event_type, count));
    }
    Ok(counts)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn memory_log() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_event_log() {
        let conn = memory_log();

        let event = Event::new(
            EventType::ListingAdded,
            "https://example.se/annons/1",
            serde_json::json!({"price_sek": 89900}),
            "test_actor",
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_listing(&conn, "https://example.se/annons/1").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0], event);
        assert_eq!(events[0].data["price_sek"], 89900);
    }

    #[test]
    fn test_events_are_per_listing_and_chronological() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let url = "https://example.se/annons/1";
        let mut added = Event::new(EventType::ListingAdded, url, serde_json::json!({}), "ingest");
        added.timestamp = added.timestamp - Duration::hours(1);
        let republished =
            Event::new(EventType::ListingRepublished, url, serde_json::json!({}), "ingest");
        let other = Event::new(
            EventType::ListingSkipped,
            "https://example.se/annons/2",
            serde_json::json!({"error": "bad date"}),
            "ingest",
        );

        // Inserted out of order on purpose
        let written = insert_events(&mut conn, &[republished.clone(), other, added.clone()]).unwrap();
        assert_eq!(written, 3);

        let events = get_events_for_listing(&conn, url).unwrap();
        let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::ListingAdded, EventType::ListingRepublished]);
    }

    #[test]
    fn test_unknown_listing_has_no_events() {
        let conn = memory_log();
        assert!(get_events_for_listing(&conn, "https://example.se/none").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_event_id_rejected() {
        let conn = memory_log();
        let event = Event::new(
            EventType::ListingAdded,
            "https://example.se/annons/1",
            serde_json::json!({}),
            "ingest",
        );

        insert_event(&conn, &event).unwrap();
        assert!(insert_event(&conn, &event).is_err());
    }

    #[test]
    fn test_count_events_by_type() {
        let conn = memory_log();
        for url in ["https://example.se/1", "https://example.se/2"] {
            let event = Event::new(EventType::ListingAdded, url, serde_json::json!({}), "ingest");
            insert_event(&conn, &event).unwrap();
        }
        let skipped = Event::new(
            EventType::ListingSkipped,
            "https://example.se/3",
            serde_json::json!({}),
            "ingest",
        );
        insert_event(&conn, &skipped).unwrap();

        let counts = count_events_by_type(&conn).unwrap();
        assert_eq!(
            counts,
            vec![
                (EventType::ListingAdded, 2),
                (EventType::ListingRepublished, 0),
                (EventType::ListingSkipped, 1),
            ]
        );
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::ListingRepublished.to_string(), "listing_republished");
        assert_eq!(EventType::from_name("listing_skipped"), Some(EventType::ListingSkipped));
        assert_eq!(EventType::from_name("transaction_added"), None);
    }
}
