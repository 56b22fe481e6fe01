use super::meta::{HasMeta, MetaKind, UserMeta};
use super::{Comment, Post};
use crate::model::Model;
use crate::relationships::Relation;

wp_model! {
    /// A network-wide account from `users`
    User
}

impl User {
    pub fn id(&self) -> Option<i64> {
        self.int_attribute("ID")
    }

    pub fn login(&self) -> Option<&str> {
        self.str_attribute("user_login")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_attribute("user_email")
    }

    pub fn display_name(&self) -> Option<&str> {
        self.str_attribute("display_name")
    }
}

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn is_global_table() -> bool {
        true
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "posts" => Some(self.has_many::<Post>("post_author", None)),
            "comments" => Some(self.has_many::<Comment>("user_id", None)),
            "meta" => Some(self.has_many::<UserMeta>("user_id", None)),
            _ => None,
        }
    }
}

impl HasMeta for User {
    type Meta = UserMeta;
    const META_KIND: MetaKind = MetaKind::User;
}
