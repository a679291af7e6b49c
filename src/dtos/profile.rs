//! Profile DTOs

use crate::entities::Profile;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileDTO {
    pub user_id: i32,
    pub username: String,
    pub timetable: Value,
    pub remote_days: Value,
    pub remote_days_count: i32,
    pub vacation_days_remaining: i32,
    pub vacation_start: Option<NaiveDate>,
    pub vacation_end: Option<NaiveDate>,
    pub looking_for: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileDTO {
    pub fn from_profile(profile: Profile, username: String) -> Self {
        Self {
            user_id: profile.user_id,
            username,
            timetable: profile.timetable.0,
            remote_days: profile.remote_days.0,
            remote_days_count: profile.remote_days_count,
            vacation_days_remaining: profile.vacation_days_remaining,
            vacation_start: profile.vacation_start,
            vacation_end: profile.vacation_end,
            looking_for: profile.looking_for,
            updated_at: profile.updated_at,
        }
    }
}

/// DTO per aggiornare il profilo (solo i campi `Some(_)` vengono modificati)
#[derive(Serialize, Deserialize, Debug, Default, Validate)]
#[validate(schema(function = "validate_vacation", skip_on_field_errors = false))]
pub struct UpdateProfileDTO {
    pub timetable: Option<Value>,
    pub remote_days: Option<Value>,
    #[validate(range(min = 0, max = 7, message = "Remote days must be between 0 and 7"))]
    pub remote_days_count: Option<i32>,
    #[validate(range(min = 0, max = 366, message = "Vacation days must be between 0 and 366"))]
    pub vacation_days_remaining: Option<i32>,
    pub vacation_start: Option<NaiveDate>,
    pub vacation_end: Option<NaiveDate>,
    #[validate(length(max = 2000, message = "Text is too long"))]
    pub looking_for: Option<String>,
}

fn validate_vacation(dto: &UpdateProfileDTO) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (dto.vacation_start, dto.vacation_end) {
        if end < start {
            return Err(ValidationError::new("vacation_end_before_start"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacation_must_not_end_before_start() {
        let dto = UpdateProfileDTO {
            vacation_start: NaiveDate::from_ymd_opt(2025, 8, 10),
            vacation_end: NaiveDate::from_ymd_opt(2025, 8, 1),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn remote_days_count_is_bounded() {
        let dto = UpdateProfileDTO {
            remote_days_count: Some(8),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
        let dto = UpdateProfileDTO {
            remote_days_count: Some(2),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }
}
