use super::meta::{CommentMeta, HasMeta, MetaKind};
use super::{Post, User};
use crate::model::Model;
use crate::query::QueryBuilder;
use crate::relationships::Relation;

wp_model! {
    /// A row of `comments`
    Comment
}

impl Comment {
    pub fn id(&self) -> Option<i64> {
        self.int_attribute("comment_ID")
    }

    pub fn post_id(&self) -> Option<i64> {
        self.int_attribute("comment_post_ID")
    }

    pub fn content(&self) -> Option<&str> {
        self.str_attribute("comment_content")
    }

    /// WordPress stores approval as the string `"1"`
    pub fn is_approved(&self) -> bool {
        self.str_attribute("comment_approved") == Some("1")
    }
}

impl Model for Comment {
    fn table_name() -> &'static str {
        "comments"
    }

    fn primary_key_name() -> &'static str {
        "comment_ID"
    }

    fn relation(&self, name: &str) -> Option<Relation> {
        match name {
            "post" => Some(self.belongs_to::<Post>("comment_post_ID", None)),
            "author" => Some(self.belongs_to::<User>("user_id", None)),
            "parent" => Some(self.belongs_to::<Comment>("comment_parent", None)),
            "children" => Some(self.has_many::<Comment>("comment_parent", None)),
            "meta" => Some(self.has_many::<CommentMeta>("comment_id", None)),
            _ => None,
        }
    }
}

impl HasMeta for Comment {
    type Meta = CommentMeta;
    const META_KIND: MetaKind = MetaKind::Comment;
}

impl QueryBuilder<Comment> {
    pub fn approved(self) -> Self {
        self.where_eq("comment_approved", "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::HasOneOrMany;
    use crate::testing::{row, test_manager, RecordingFactory};
    use serde_json::json;

    #[tokio::test]
    async fn test_belongs_to_leaves_unmatched_parents_empty() {
        let (db, factory) = test_manager(RecordingFactory::with_responder(|sql, _| {
            if sql.contains("FROM wp_comments") {
                vec![
                    row([("comment_ID", json!(1)), ("comment_post_ID", json!(9)), ("comment_approved", json!("1"))]),
                    row([("comment_ID", json!(2)), ("comment_post_ID", json!(404)), ("comment_approved", json!("1"))]),
                    row([("comment_ID", json!(3)), ("comment_post_ID", json!(null)), ("comment_approved", json!("1"))]),
                ]
            } else {
                vec![row([("ID", json!(9))])]
            }
        }));

        let comments = Comment::query(&db)
            .unwrap()
            .approved()
            .with("post")
            .get()
            .await
            .unwrap();

        let selects = factory.selects();
        assert_eq!(selects[0].sql, "SELECT * FROM wp_comments WHERE comment_approved = %s");
        assert_eq!(selects[1].sql, "SELECT * FROM wp_posts WHERE ID IN (%s, %s)");
        assert_eq!(selects[1].bindings, vec![json!(9), json!(404)]);

        let posts: Vec<Option<Post>> = comments.iter().map(|c| c.related_one("post")).collect();
        assert_eq!(posts[0].as_ref().and_then(Post::id), Some(9));
        assert!(posts[1].is_none());
        assert!(posts[2].is_none());
        assert!(comments.iter().all(Comment::is_approved));
    }

    #[tokio::test]
    async fn test_has_one_picks_first_match() {
        let (db, factory) = test_manager(RecordingFactory::with_responder(|sql, _| {
            if sql.contains("FROM wp_commentmeta") {
                vec![
                    row([("meta_id", json!(7)), ("comment_id", json!(1))]),
                    row([("meta_id", json!(8)), ("comment_id", json!(1))]),
                ]
            } else {
                vec![
                    row([("comment_ID", json!(1))]),
                    row([("comment_ID", json!(2))]),
                ]
            }
        }));

        let comments = Comment::query(&db).unwrap().get().await.unwrap();
        let mut records: Vec<_> = comments.into_iter().map(crate::model::Record::from).collect();
        let relation = Relation::HasOne(HasOneOrMany::new(
            CommentMeta::schema(),
            "comment_id",
            "comment_ID",
            None,
        ));

        let loader = crate::loading::RelationLoaderFactory::make(&relation);
        loader.load(&db, &mut records, "latest_meta", None).await.unwrap();

        assert_eq!(factory.selects().len(), 2);
        let one = records[0].get_relation("latest_meta").and_then(|r| r.as_one()).unwrap();
        assert_eq!(one.get_attribute("meta_id"), Some(&json!(7)));
        assert_eq!(records[1].get_relation("latest_meta"), Some(&crate::model::Related::One(None)));
    }

    #[test]
    fn test_accessors() {
        let comment = Comment::from_attributes([
            ("comment_ID", json!("12")),
            ("comment_post_ID", json!(3)),
            ("comment_content", json!("Nice")),
        ]);
        assert_eq!(comment.id(), Some(12));
        assert_eq!(comment.post_id(), Some(3));
        assert_eq!(comment.content(), Some("Nice"));
        assert!(!comment.is_approved());
    }
}
