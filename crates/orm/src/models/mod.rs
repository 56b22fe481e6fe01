//! WordPress models
//!
//! Typed wrappers over [`Record`](crate::model::Record) for the core tables.
//! Site-scoped tables get the site prefix; `users` and `usermeta` are shared
//! by the whole network.

/// Declares a model struct wrapping a record, with conversions and JSON
/// serialization
macro_rules! wp_model {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            record: $crate::model::Record,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn from_attributes<I, K, V>(attributes: I) -> Self
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<serde_json::Value>,
            {
                Self {
                    record: $crate::model::Record::from_attributes(attributes),
                }
            }

            fn str_attribute(&self, key: &str) -> Option<&str> {
                self.record.get_attribute(key).and_then(serde_json::Value::as_str)
            }

            fn int_attribute(&self, key: &str) -> Option<i64> {
                match self.record.get_attribute(key)? {
                    serde_json::Value::Number(n) => n.as_i64(),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                }
            }
        }

        impl From<$crate::model::Record> for $name {
            fn from(record: $crate::model::Record) -> Self {
                Self { record }
            }
        }

        impl From<$name> for $crate::model::Record {
            fn from(model: $name) -> Self {
                model.record
            }
        }

        impl AsRef<$crate::model::Record> for $name {
            fn as_ref(&self) -> &$crate::model::Record {
                &self.record
            }
        }

        impl AsMut<$crate::model::Record> for $name {
            fn as_mut(&mut self) -> &mut $crate::model::Record {
                &mut self.record
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.record.to_json(), serializer)
            }
        }
    };
}

mod comment;
mod meta;
mod post;
mod term;
mod user;

pub use comment::Comment;
pub use meta::{CommentMeta, HasMeta, MetaKind, MetaStore, OrmMetaStore, PostMeta, TermMeta, UserMeta};
pub use post::Post;
pub use term::{Term, TermTaxonomy};
pub use user::User;
