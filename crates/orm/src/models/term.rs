use super::meta::{HasMeta, MetaKind, TermMeta};
use super::Post;
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::relationships::Relation;

wp_model! {
    /// A row of `terms`: the name and slug shared by every taxonomy entry
    Term
}

wp_model! {
    /// A row of `term_taxonomy`, placing a term in a taxonomy
    TermTaxonomy
}

impl Term {
    pub fn id(&self) -> Option<i64> {
        self.int_attribute("term_id")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_attribute("name")
    }

    pub fn slug(&self) -> Option<&str> {
        self.str_attribute("slug")
    }
}

impl Model for Term {
    fn table_name() -> &'static str {
        "terms"
    }

    fn primary_key_name() -> &'static str {
        "term_id"
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "taxonomy" => Some(self.has_one::<TermTaxonomy>("term_id", None)),
            "meta" => Some(self.has_many::<TermMeta>("term_id", None)),
            _ => None,
        }
    }
}

impl HasMeta for Term {
    type Meta = TermMeta;
    const META_KIND: MetaKind = MetaKind::Term;
}

impl QueryBuilder<Term> {
    /// Terms that belong to `taxonomy`
    pub fn of_taxonomy(self, taxonomy: &str) -> Self {
        self.select("terms.*")
            .join("term_taxonomy", "terms.term_id", "term_taxonomy.term_id")
            .where_eq("term_taxonomy.taxonomy", taxonomy)
    }
}

impl TermTaxonomy {
    pub fn id(&self) -> Option<i64> {
        self.int_attribute("term_taxonomy_id")
    }

    pub fn taxonomy(&self) -> Option<&str> {
        self.str_attribute("taxonomy")
    }

    pub fn count(&self) -> Option<i64> {
        self.int_attribute("count")
    }
}

impl Model for TermTaxonomy {
    fn table_name() -> &'static str {
        "term_taxonomy"
    }

    fn primary_key_name() -> &'static str {
        "term_taxonomy_id"
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "term" => Some(self.belongs_to::<Term>("term_id", None)),
            // `parent` holds the parent's term id
            "parent" => Some(self.belongs_to::<TermTaxonomy>("parent", Some("term_id"))),
            "children" => Some(self.has_many::<TermTaxonomy>("parent", Some("term_id"))),
            "posts" => Some(self.belongs_to_many::<Post>(
                "term_relationships",
                "term_taxonomy_id",
                "object_id",
            )),
            _ => None,
        }
    }
}
