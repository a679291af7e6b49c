//! AddressRepository - Indirizzi e associazione utente-indirizzo

use super::{Delete, PoolType, Read, Update};
use crate::dtos::{CreateAddressDTO, UpdateAddressDTO};
use crate::entities::{Address, OwnedAddress};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite};

const ADDRESS_COLUMNS: &str = "a.address_id, a.address_line, a.city, a.state, a.country, \
     a.postal_code, a.latitude, a.longitude, a.created_at, a.updated_at";

pub struct AddressRepository {
    connection_pool: PoolType,
}

impl AddressRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    pub async fn list_for_user(&self, user_id: &i32) -> Result<Vec<OwnedAddress>, Error> {
        sqlx::query_as::<_, OwnedAddress>(&format!(
            r#"
            SELECT {ADDRESS_COLUMNS}, ua.label
            FROM addresses a
            JOIN user_addresses ua ON ua.address_id = a.address_id
            WHERE ua.user_id = ?
            ORDER BY a.address_id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Legge un indirizzo solo se appartiene all'utente
    pub async fn read_owned(
        &self,
        user_id: &i32,
        address_id: &i32,
    ) -> Result<Option<OwnedAddress>, Error> {
        sqlx::query_as::<_, OwnedAddress>(&format!(
            r#"
            SELECT {ADDRESS_COLUMNS}, ua.label
            FROM addresses a
            JOIN user_addresses ua ON ua.address_id = a.address_id
            WHERE ua.user_id = ? AND a.address_id = ?
            "#
        ))
        .bind(user_id)
        .bind(address_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Crea l'indirizzo e lo associa all'utente in un'unica transazione
    pub async fn create_for_user(
        &self,
        user_id: &i32,
        data: &CreateAddressDTO,
    ) -> Result<OwnedAddress, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO addresses
                (address_line, city, state, country, postal_code, latitude, longitude, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.address_line)
        .bind(&data.city)
        .bind(&data.state)
        .bind(&data.country)
        .bind(&data.postal_code)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let address_id = result.last_insert_rowid() as i32;

        sqlx::query("INSERT INTO user_addresses (user_id, address_id, label) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(address_id)
            .bind(&data.label)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OwnedAddress {
            address: Address {
                address_id,
                address_line: data.address_line.clone(),
                city: data.city.clone(),
                state: data.state.clone(),
                country: data.country.clone(),
                postal_code: data.postal_code.clone(),
                latitude: data.latitude,
                longitude: data.longitude,
                created_at: now,
                updated_at: now,
            },
            label: data.label.clone(),
        })
    }

    pub async fn update_label(
        &self,
        user_id: &i32,
        address_id: &i32,
        label: &str,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE user_addresses SET label = ? WHERE user_id = ? AND address_id = ?")
            .bind(label)
            .bind(user_id)
            .bind(address_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}

impl Read<Address, i32> for AddressRepository {
    async fn read(&self, id: &i32) -> Result<Option<Address>, Error> {
        sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses a WHERE a.address_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Address, UpdateAddressDTO, i32> for AddressRepository {
    async fn update(&self, id: &i32, data: &UpdateAddressDTO) -> Result<Address, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if !data.touches_address_row() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE addresses SET ");
        let mut separated = query_builder.separated(", ");
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        let text_fields = [
            ("address_line = ", &data.address_line),
            ("city = ", &data.city),
            ("state = ", &data.state),
            ("country = ", &data.country),
            ("postal_code = ", &data.postal_code),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                separated.push(column);
                separated.push_bind_unseparated(value.clone());
            }
        }
        if let Some(latitude) = data.latitude {
            separated.push("latitude = ");
            separated.push_bind_unseparated(latitude);
        }
        if let Some(longitude) = data.longitude {
            separated.push("longitude = ");
            separated.push_bind_unseparated(longitude);
        }

        query_builder.push(" WHERE address_id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for AddressRepository {
    /// Gli eventi che usavano l'indirizzo restano senza indirizzo (ON DELETE SET NULL)
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM addresses WHERE address_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
