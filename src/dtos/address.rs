//! Address DTOs

use crate::entities::{Address, OwnedAddress};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddressDTO {
    pub id: i32,
    pub address_line: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<Address> for AddressDTO {
    fn from(value: Address) -> Self {
        Self {
            id: value.address_id,
            address_line: value.address_line,
            city: value.city,
            state: value.state,
            country: value.country,
            postal_code: value.postal_code,
            latitude: value.latitude,
            longitude: value.longitude,
            label: None,
        }
    }
}

impl From<OwnedAddress> for AddressDTO {
    fn from(value: OwnedAddress) -> Self {
        Self {
            label: value.label,
            ..AddressDTO::from(value.address)
        }
    }
}

/// DTO per creare un indirizzo (senza address_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateAddressDTO {
    #[validate(length(min = 1, max = 255, message = "Address line must be between 1 and 255 characters"))]
    pub address_line: String,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
    #[validate(length(max = 100))]
    pub label: Option<String>,
}

/// DTO per aggiornare un indirizzo (solo i campi `Some(_)` vengono modificati)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateAddressDTO {
    #[validate(length(min = 1, max = 255, message = "Address line must be between 1 and 255 characters"))]
    pub address_line: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub label: Option<String>,
}

impl UpdateAddressDTO {
    pub fn touches_address_row(&self) -> bool {
        self.address_line.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.country.is_some()
            || self.postal_code.is_some()
            || self.latitude.is_some()
            || self.longitude.is_some()
    }
}
