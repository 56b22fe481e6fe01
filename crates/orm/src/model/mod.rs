//! Model System - Active-record models over WordPress tables
//!
//! - `record`: attribute storage, dirty tracking and the relation cache
//! - `core_trait`: the Model trait, table metadata and relation declarations
//! - `crud_operations`: save and delete

pub mod core_trait;
pub mod crud_operations;
pub mod record;

pub use core_trait::{Entity, Model, RelationResolver, Schema};
pub use crud_operations::{delete_record, save_record, CrudOperations};
pub use record::{Lookup, Record, Related};

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}

impl AsMut<Record> for Record {
    fn as_mut(&mut self) -> &mut Record {
        self
    }
}
