use super::meta::{HasMeta, MetaKind, PostMeta};
use super::{Comment, TermTaxonomy, User};
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::relationships::{QueryableRelation, Relation};

wp_model! {
    /// A row of `posts`: posts, pages, attachments and custom types
    Post
}

impl Post {
    pub fn id(&self) -> Option<i64> {
        self.int_attribute("ID")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_attribute("post_title")
    }

    pub fn status(&self) -> Option<&str> {
        self.str_attribute("post_status")
    }

    pub fn post_type(&self) -> Option<&str> {
        self.str_attribute("post_type")
    }

    pub fn author_id(&self) -> Option<i64> {
        self.int_attribute("post_author")
    }

    /// Terms of one taxonomy attached through `term_relationships`
    fn terms(&self, taxonomy: &str) -> Relation {
        self.belongs_to_many::<TermTaxonomy>("term_relationships", "object_id", "term_taxonomy_id")
            .where_eq("term_taxonomy.taxonomy", taxonomy)
    }
}

impl Model for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "author" => Some(self.belongs_to::<User>("post_author", None)),
            "comments" => Some(self.has_many::<Comment>("comment_post_ID", None)),
            "categories" => Some(self.terms("category")),
            "tags" => Some(self.terms("post_tag")),
            "meta" => Some(self.has_many::<PostMeta>("post_id", None)),
            "parent" => Some(self.belongs_to::<Post>("post_parent", None)),
            "children" => Some(self.has_many::<Post>("post_parent", None)),
            _ => None,
        }
    }
}

impl HasMeta for Post {
    type Meta = PostMeta;
    const META_KIND: MetaKind = MetaKind::Post;
}

impl QueryBuilder<Post> {
    pub fn published(self) -> Self {
        self.where_eq("post_status", "publish")
    }

    pub fn of_type(self, post_type: &str) -> Self {
        self.where_eq("post_type", post_type)
    }
}
