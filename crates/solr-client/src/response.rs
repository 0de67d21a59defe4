//! Update response parsing.
//!
//! Two status forms are recognised:
//! - `<lst name="responseHeader"><int name="status">0</int>...`
//! - legacy `<result status="0"/>`
//!
//! Error messages come from `<str name="msg">` when the engine provides one.

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use crate::error::ResponseError;
use crate::transport::SolrResponse;

/// Outcome of an accepted update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub status: i64,
    /// Engine-side processing time in milliseconds
    pub qtime: Option<i64>,
}

/// Check an update response for success.
pub fn parse_update_response(response: &SolrResponse) -> Result<EngineStatus, ResponseError> {
    let parsed = scan(&response.body);

    if !response.is_success() {
        let message = parsed
            .as_ref()
            .ok()
            .and_then(|p| p.message.clone())
            .unwrap_or_else(|| snippet(&response.body));
        return Err(ResponseError::Http {
            status: response.status,
            message,
        });
    }

    let parsed = parsed.map_err(ResponseError::Malformed)?;
    let status = parsed.status.ok_or_else(|| {
        ResponseError::Malformed(format!("no status in response: {}", snippet(&response.body)))
    })?;

    if status != 0 {
        return Err(ResponseError::Rejected {
            status,
            message: parsed.message.unwrap_or_default(),
        });
    }

    Ok(EngineStatus {
        status,
        qtime: parsed.qtime,
    })
}

#[derive(Debug, Default)]
struct Scanned {
    status: Option<i64>,
    qtime: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Status,
    QTime,
    Message,
}

fn scan(body: &str) -> Result<Scanned, String> {
    let mut reader = XmlReader::from_str(body);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut scanned = Scanned::default();
    let mut slot: Option<Slot> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let tag = e.name().as_ref().to_vec();
                let mut name_attr = None;
                let mut status_attr = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name_attr = attr.unescape_value().ok().map(|v| v.into_owned()),
                        b"status" => status_attr = attr.unescape_value().ok().map(|v| v.into_owned()),
                        _ => {}
                    }
                }
                slot = match (tag.as_slice(), name_attr.as_deref()) {
                    (b"int", Some("status")) | (b"long", Some("status")) => Some(Slot::Status),
                    (b"int", Some("QTime")) | (b"long", Some("QTime")) => Some(Slot::QTime),
                    (b"str", Some("msg")) => Some(Slot::Message),
                    _ => None,
                };
                if tag.as_slice() == b"result" && scanned.status.is_none() {
                    scanned.status = status_attr.and_then(|s| s.trim().parse().ok());
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = slot {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    let text = text.trim();
                    match current {
                        Slot::Status if scanned.status.is_none() => {
                            scanned.status = text.parse().ok();
                        }
                        Slot::QTime if scanned.qtime.is_none() => {
                            scanned.qtime = text.parse().ok();
                        }
                        Slot::Message if scanned.message.is_none() => {
                            scanned.message = Some(text.to_string());
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => slot = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML error at byte {}: {}", reader.buffer_position(), e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(scanned)
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
