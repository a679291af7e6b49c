//! Profile entity - Disponibilità e preferenze dell'utente

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::FromRow;
use sqlx::types::Json;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: i32,
    pub timetable: Json<Value>,
    pub remote_days: Json<Value>,
    pub remote_days_count: i32,
    pub vacation_days_remaining: i32,
    pub vacation_start: Option<NaiveDate>,
    pub vacation_end: Option<NaiveDate>,
    pub looking_for: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Orario settimanale vuoto: ogni giorno con start/end a null
    pub fn default_timetable() -> Value {
        let days = WEEKDAYS
            .iter()
            .map(|day| (day.to_string(), json!({ "start": null, "end": null })))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(days)
    }

    /// Nessun giorno di lavoro da remoto
    pub fn default_remote_days() -> Value {
        let days = WEEKDAYS
            .iter()
            .map(|day| (day.to_string(), Value::Bool(false)))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(days)
    }

    /// Sostituisce valori vuoti con i default, come alla creazione
    pub fn normalize_schedule(value: Option<Value>, default: fn() -> Value) -> Value {
        match value {
            Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
            _ => default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timetable_covers_the_week() {
        let timetable = Profile::default_timetable();
        for day in WEEKDAYS {
            assert_eq!(timetable[day], json!({ "start": null, "end": null }));
        }
        assert_eq!(Profile::default_remote_days()["Sunday"], Value::Bool(false));
    }

    #[test]
    fn empty_schedule_falls_back_to_default() {
        assert_eq!(
            Profile::normalize_schedule(Some(json!({})), Profile::default_remote_days),
            Profile::default_remote_days()
        );
        let custom = json!({ "Monday": true });
        assert_eq!(
            Profile::normalize_schedule(Some(custom.clone()), Profile::default_remote_days),
            custom
        );
    }
}
