//! Esportazione iCalendar (RFC 5545) degli eventi

use chrono::{DateTime, Duration, Utc};

const PRODID: &str = "-//zigzag//events//EN";
const MAX_LINE_OCTETS: usize = 75;

/// Dati di un VEVENT, già risolti dai repository
#[derive(Debug, Clone)]
pub struct CalendarEntry {
    pub uid: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape dei caratteri speciali nei valori TEXT
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Spezza una content line in righe da al massimo 75 ottetti, senza
/// tagliare caratteri UTF-8; le continuazioni iniziano con uno spazio.
pub fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut octets = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if octets + width > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            // lo spazio iniziale conta nella nuova riga
            octets = 1;
        }
        folded.push(c);
        octets += width;
    }
    folded.push_str("\r\n");
    folded
}

pub fn render_calendar(name: &str, entries: &[CalendarEntry], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&fold_line("BEGIN:VCALENDAR"));
    out.push_str(&fold_line("VERSION:2.0"));
    out.push_str(&fold_line(&format!("PRODID:{PRODID}")));
    out.push_str(&fold_line("CALSCALE:GREGORIAN"));
    out.push_str(&fold_line("METHOD:PUBLISH"));
    out.push_str(&fold_line(&format!("X-WR-CALNAME:{}", escape_text(name))));

    for entry in entries {
        // senza fine esplicita l'evento dura un'ora
        let end = entry.end.unwrap_or(entry.start + Duration::hours(1));
        let mut lines = vec![
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}@zigzag", entry.uid),
            format!("DTSTAMP:{}", format_timestamp(&now)),
            format!("DTSTART:{}", format_timestamp(&entry.start)),
            format!("DTEND:{}", format_timestamp(&end)),
            format!("LAST-MODIFIED:{}", format_timestamp(&entry.updated_at)),
            format!("SUMMARY:{}", escape_text(&entry.title)),
        ];
        if let Some(description) = entry.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("DESCRIPTION:{}", escape_text(description)));
        }
        if let Some(location) = entry.location.as_deref().filter(|l| !l.is_empty()) {
            lines.push(format!("LOCATION:{}", escape_text(location)));
        }
        lines.push("END:VEVENT".to_string());

        for line in lines {
            out.push_str(&fold_line(&line));
        }
    }

    out.push_str(&fold_line("END:VCALENDAR"));
    out
}
