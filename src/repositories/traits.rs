//! Common repository traits
//!
//! Generic interfaces for database operations

/// Trait for creating new entities in the database
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned by the database)
/// * `CreateDTO` - DTO for creation (without database-assigned ID)
pub trait Create<Entity, CreateDTO> {
    /// Creates a new entity and returns it as stored
    async fn create(&self, data: &CreateDTO) -> Result<Entity, sqlx::Error>;
}

/// Trait for reading a single entity by primary key
///
/// # Type Parameters
/// * `Entity` - Type of the entity to read
/// * `Id` - Type of the primary key (`i32` for users and circles, `String` for events)
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Trait for reading multiple entities by list of primary keys
pub trait ReadMany<Entity, Id> {
    /// Entities are returned in database order, which may not match the order
    /// of `ids`. Unknown ids are skipped.
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, sqlx::Error>;
}

/// Trait for updating existing entities
///
/// # Type Parameters
/// * `Entity` - Type of the updated entity
/// * `UpdateDTO` - DTO with optional fields for partial updates
/// * `Id` - Type of the primary key
pub trait Update<Entity, UpdateDTO, Id> {
    /// Only `Some(_)` fields of `data` are modified.
    /// Fails with `sqlx::Error::RowNotFound` when the entity does not exist.
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, sqlx::Error>;
}

/// Trait for deleting entities
pub trait Delete<Id> {
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}
