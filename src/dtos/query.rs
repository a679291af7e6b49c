//! Query DTOs - Parametri in query string

use serde::{Deserialize, Serialize};

/// GET /users?search=...
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// GET /public-event/{id}?invite=...
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PublicEventQuery {
    #[serde(default)]
    pub invite: Option<String>,
}

/// GET /verify-invitation?token=...
#[derive(Serialize, Deserialize, Debug)]
pub struct VerifyInvitationQuery {
    pub token: String,
}

/// GET /circles/grey-events?circle_ids=1,2
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GreyEventsQuery {
    #[serde(default)]
    pub circle_ids: String,
}

impl GreyEventsQuery {
    /// Id separati da virgola; le voci vuote vengono ignorate
    pub fn ids(&self) -> Result<Vec<i32>, std::num::ParseIntError> {
        self.circle_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::parse)
            .collect()
    }
}

/// Le app calendario non possono impostare header, il JWT arriva in query
#[derive(Serialize, Deserialize, Debug)]
pub struct CalendarQuery {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grey_events_query_parses_comma_separated_ids() {
        let query = GreyEventsQuery {
            circle_ids: "3, 7,,12".to_string(),
        };
        assert_eq!(query.ids(), Ok(vec![3, 7, 12]));
        assert!(GreyEventsQuery::default().ids().unwrap().is_empty());
        assert!(
            GreyEventsQuery {
                circle_ids: "3,x".to_string()
            }
            .ids()
            .is_err()
        );
    }
}
