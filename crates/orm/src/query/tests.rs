use serde_json::json;

use super::*;
use crate::backends::{count_placeholders, Row};
use crate::connection::ConnectionManager;
use crate::error::ModelError;
use crate::model::{Record, Schema};
use crate::testing::{row, test_manager, RecordingFactory};

fn manager() -> ConnectionManager {
    test_manager(RecordingFactory::new()).0
}

fn posts(db: &ConnectionManager) -> QueryBuilder<Record> {
    db.table("posts").unwrap()
}

fn assert_placeholders_match<M>(query: &QueryBuilder<M>) {
    assert_eq!(count_placeholders(&query.to_sql(), "%s"), query.get_bindings().len());
}

#[test]
fn test_where_and_or_where() {
    let db = manager();
    let query = posts(&db)
        .where_eq("post_type", "post")
        .where_gt("comment_count", 3)
        .or_where("post_status", "draft");

    assert_eq!(
        query.to_sql(),
        "SELECT * FROM wp_posts WHERE post_type = %s AND comment_count > %s OR post_status = %s"
    );
    assert_eq!(query.get_bindings(), vec![json!("post"), json!(3), json!("draft")]);
    assert_placeholders_match(&query);
}

#[test]
fn test_where_in_and_empty_lists() {
    let db = manager();
    let query = posts(&db).where_in("ID", [1, 2, 3]);
    assert_eq!(query.to_sql(), "SELECT * FROM wp_posts WHERE ID IN (%s, %s, %s)");
    assert_eq!(query.get_bindings(), vec![json!(1), json!(2), json!(3)]);

    let none = posts(&db).where_in("ID", Vec::<i64>::new());
    assert_eq!(none.to_sql(), "SELECT * FROM wp_posts WHERE 0 = 1");
    assert!(none.get_bindings().is_empty());

    let all = posts(&db).where_not_in("ID", Vec::<i64>::new());
    assert_eq!(all.to_sql(), "SELECT * FROM wp_posts WHERE 1 = 1");
}

#[test]
fn test_nested_groups() {
    let db = manager();
    let query = posts(&db)
        .where_eq("post_type", "post")
        .where_group(|q| q.where_eq("post_status", "publish").or_where("post_status", "private"));

    assert_eq!(
        query.to_sql(),
        "SELECT * FROM wp_posts WHERE post_type = %s AND (post_status = %s OR post_status = %s)"
    );
    assert_eq!(query.get_bindings(), vec![json!("post"), json!("publish"), json!("private")]);

    let unchanged = posts(&db).where_group(|q| q);
    assert_eq!(unchanged.to_sql(), "SELECT * FROM wp_posts");
}

#[test]
fn test_subquery_bindings_are_spliced_in_place() {
    let db = manager();
    let featured = db
        .table("postmeta")
        .unwrap()
        .select("post_id")
        .where_eq("meta_key", "_featured");
    let query = posts(&db)
        .where_eq("post_type", "post")
        .where_in_sub("ID", &featured)
        .where_eq("post_status", "publish");

    assert_eq!(
        query.to_sql(),
        "SELECT * FROM wp_posts WHERE post_type = %s AND ID IN (SELECT post_id FROM wp_postmeta WHERE meta_key = %s) AND post_status = %s"
    );
    assert_eq!(
        query.get_bindings(),
        vec![json!("post"), json!("_featured"), json!("publish")]
    );
    assert_placeholders_match(&query);
}

#[test]
fn test_from_subquery_binds_first() {
    let db = manager();
    let totals = db
        .table("comments")
        .unwrap()
        .select("comment_post_ID")
        .select_raw("COUNT(*) as total")
        .where_eq("comment_approved", "1")
        .group_by("comment_post_ID");
    let query = posts(&db).from_sub(&totals, "t").where_gt("t.total", 10);

    assert_eq!(
        query.to_sql(),
        "SELECT * FROM (SELECT comment_post_ID, COUNT(*) as total FROM wp_comments WHERE comment_approved = %s GROUP BY comment_post_ID) as t WHERE t.total > %s"
    );
    assert_eq!(query.get_bindings(), vec![json!("1"), json!(10)]);
}

#[test]
fn test_join_values_are_inlined() {
    let db = manager();
    let query = posts(&db)
        .select("posts.*, pm.meta_value")
        .left_join_with("postmeta AS pm", |j| {
            j.on("posts.ID", "pm.post_id").where_eq("pm.meta_key", "_thumbnail_id")
        })
        .where_eq("posts.post_status", "publish");

    assert_eq!(
        query.to_sql(),
        "SELECT wp_posts.*, pm.meta_value FROM wp_posts LEFT JOIN wp_postmeta AS pm ON wp_posts.ID = pm.post_id AND pm.meta_key = '_thumbnail_id' WHERE wp_posts.post_status = %s"
    );
    assert_eq!(query.get_bindings(), vec![json!("publish")]);
    assert_placeholders_match(&query);
}

#[test]
fn test_simple_join_prefixes_both_sides() {
    let db = manager();
    let query = db
        .table("terms")
        .unwrap()
        .select("terms.*")
        .join("term_taxonomy", "terms.term_id", "term_taxonomy.term_id")
        .where_eq("term_taxonomy.taxonomy", "category");

    assert_eq!(
        query.to_sql(),
        "SELECT wp_terms.* FROM wp_terms INNER JOIN wp_term_taxonomy ON wp_terms.term_id = wp_term_taxonomy.term_id WHERE wp_term_taxonomy.taxonomy = %s"
    );
}

#[test]
fn test_ordering_grouping_and_limits() {
    let db = manager();
    let query = posts(&db)
        .select("post_author")
        .group_by("post_author")
        .order_by("post_date", "desc")
        .order_by("ID", "asc")
        .limit(5)
        .offset(10);

    assert_eq!(
        query.to_sql(),
        "SELECT post_author FROM wp_posts GROUP BY post_author ORDER BY post_date DESC, ID ASC LIMIT 5 OFFSET 10"
    );
    assert_eq!(
        posts(&db).for_page(0, 20).to_sql(),
        "SELECT * FROM wp_posts LIMIT 20 OFFSET 0"
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let db = manager();
    let query = posts(&db)
        .where_in("ID", [4, 5])
        .where_null("post_parent")
        .latest("post_date");

    assert_eq!(query.to_sql(), query.to_sql());
    assert_eq!(query.get_bindings(), query.get_bindings());
}

#[test]
fn test_on_site_prefixes_every_clause() {
    let db = manager();
    let query = posts(&db)
        .select("posts.ID")
        .join("postmeta", "posts.ID", "postmeta.post_id")
        .where_eq("postmeta.meta_key", "_price");

    let site_two = query.clone().on_site(2).unwrap();
    assert_eq!(
        site_two.to_sql(),
        "SELECT wp_2_posts.ID FROM wp_2_posts INNER JOIN wp_2_postmeta ON wp_2_posts.ID = wp_2_postmeta.post_id WHERE wp_2_postmeta.meta_key = %s"
    );

    let site_three = site_two.on_site(3).unwrap();
    assert_eq!(site_three.table_name(), "wp_3_posts");
    assert_eq!(db.site_id(), Some(3));

    let main = posts(&db).on_site(1).unwrap();
    assert_eq!(main.table_name(), "wp_posts");
}

#[test]
fn test_global_ignores_the_site() {
    let db = manager();
    let users = db.table("users").unwrap().on_site(4).unwrap().global();
    assert_eq!(users.to_sql(), "SELECT * FROM wp_users");

    let untyped = QueryBuilder::<Record>::for_schema(&db, Schema::untyped("blogs", "blog_id")).unwrap();
    assert_eq!(untyped.global().table_name(), "wp_blogs");
}

#[test]
fn test_raw_and_prefixed_names_pass_through() {
    let db = manager();
    db.set_site_id(Some(2));

    let raw = db.table("@custom_log").unwrap().where_eq("@custom_log.level", "error");
    assert_eq!(raw.to_sql(), "SELECT * FROM custom_log WHERE custom_log.level = %s");

    let qualified = db.table("analytics.events").unwrap();
    assert_eq!(qualified.to_sql(), "SELECT * FROM analytics.events");

    let already = db.table("wp_2_posts").unwrap();
    assert_eq!(already.to_sql(), "SELECT * FROM wp_2_posts");
}

#[test]
fn test_to_raw_sql_escapes_literals() {
    let db = manager();
    let query = posts(&db)
        .where_eq("post_title", "it's")
        .where_eq("post_parent", 0)
        .where_in("post_status", ["publish", "future"]);

    assert_eq!(
        query.to_raw_sql().unwrap(),
        "SELECT * FROM wp_posts WHERE post_title = 'it\\'s' AND post_parent = 0 AND post_status IN ('publish', 'future')"
    );
}

#[test]
fn test_with_records_eager_loads() {
    let db = manager();
    let query = posts(&db).with("author").with_many(["comments", "comments.author"]);
    assert_eq!(query.eager_loads(), vec!["author", "comments", "comments.author"]);
}

#[test]
fn test_repeated_with_keeps_the_constraint() {
    let db = manager();
    let query = posts(&db)
        .with_constraint("comments", |q: QueryBuilder<Record>| q.where_eq("comment_approved", "1"))
        .with("comments");

    assert_eq!(query.eager_loads(), vec!["comments"]);
    assert!(query.eager[0].constraint.is_some());
}

#[tokio::test]
async fn test_count_wraps_grouped_queries() {
    let (db, factory) = test_manager(RecordingFactory::with_responder(|_, _| {
        vec![row([("count", json!("7"))])]
    }));

    let plain = posts(&db).where_eq("post_type", "post");
    assert_eq!(plain.count().await.unwrap(), 7);

    let grouped = posts(&db).select("post_author").group_by("post_author");
    assert_eq!(grouped.count().await.unwrap(), 7);
    grouped.count_with_wrap(false).await.unwrap();

    let selects = factory.selects();
    assert_eq!(
        selects[0].sql,
        "SELECT COUNT(*) as count FROM wp_posts WHERE post_type = %s"
    );
    assert_eq!(selects[0].bindings, vec![json!("post")]);
    assert_eq!(
        selects[1].sql,
        "SELECT COUNT(*) as count FROM (SELECT post_author FROM wp_posts GROUP BY post_author) as count_wrapper"
    );
    assert_eq!(
        selects[2].sql,
        "SELECT COUNT(*) as count FROM wp_posts GROUP BY post_author"
    );
}

fn post_rows(count: usize) -> Vec<Row> {
    (1..=count).map(|id| row([("ID", json!(id))])).collect()
}

#[tokio::test]
async fn test_paginate() {
    let (db, factory) = test_manager(RecordingFactory::with_responder(|sql, _| {
        if sql.starts_with("SELECT COUNT(*)") {
            vec![row([("count", json!(42))])]
        } else if sql.ends_with("OFFSET 30") {
            post_rows(12)
        } else {
            post_rows(15)
        }
    }));

    let query = posts(&db).where_eq("post_status", "publish");

    let first = query.paginate(15, 1).await.unwrap();
    assert_eq!(first.items.len(), 15);
    assert_eq!(first.total, 42);
    assert_eq!(first.current_page, 1);
    assert_eq!(first.last_page, 3);

    let last = query.paginate(15, 3).await.unwrap();
    assert_eq!(last.items.len(), 12);
    assert_eq!(last.current_page, 3);

    let clamped = query.paginate(15, -2).await.unwrap();
    assert_eq!(clamped.current_page, 1);

    let json = last.to_json();
    assert_eq!(json["total"], json!(42));
    assert_eq!(json["last_page"], json!(3));
    assert_eq!(json["data"].as_array().map(Vec::len), Some(12));

    let pages: Vec<String> = factory
        .selects()
        .into_iter()
        .map(|call| call.sql)
        .filter(|sql| !sql.starts_with("SELECT COUNT(*)"))
        .collect();
    assert_eq!(
        pages[1],
        "SELECT * FROM wp_posts WHERE post_status = %s LIMIT 15 OFFSET 30"
    );
}

#[tokio::test]
async fn test_paginate_rejects_zero_per_page() {
    let (db, factory) = test_manager(RecordingFactory::new());
    let err = posts(&db).paginate(0, 1).await.unwrap_err();
    assert!(matches!(err, ModelError::Query(_)));
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn test_paginate_rejects_offset_overflow() {
    let (db, factory) = test_manager(RecordingFactory::new());
    let err = posts(&db).paginate(15, i64::MAX).await.unwrap_err();
    assert!(matches!(err, ModelError::Query(_)));
    assert!(factory.calls().is_empty());

    assert_eq!(
        posts(&db).for_page(i64::MAX, 15).to_sql(),
        format!("SELECT * FROM wp_posts LIMIT 15 OFFSET {}", u64::MAX)
    );
}

#[tokio::test]
async fn test_first_find_and_pluck() {
    let (db, factory) = test_manager(RecordingFactory::with_responder(|sql, _| {
        if sql.starts_with("SELECT post_title") {
            vec![row([("post_title", json!("Hello"))]), row([("post_title", json!("World"))])]
        } else if sql.contains("ID = %s") {
            Vec::new()
        } else {
            post_rows(1)
        }
    }));

    let first = posts(&db).first().await.unwrap().unwrap();
    assert!(first.exists());
    assert_eq!(first.get_attribute("ID"), Some(&json!(1)));

    assert!(posts(&db).find(99).await.unwrap().is_none());
    let err = posts(&db).find_or_fail(99).await.unwrap_err();
    assert!(matches!(err, ModelError::NotFound(ref table) if table == "wp_posts"));

    let titles = posts(&db).pluck("post_title").await.unwrap();
    assert_eq!(titles, vec![json!("Hello"), json!("World")]);

    let selects = factory.selects();
    assert_eq!(selects[0].sql, "SELECT * FROM wp_posts LIMIT 1");
    assert_eq!(selects[1].sql, "SELECT * FROM wp_posts WHERE ID = %s LIMIT 1");
    assert_eq!(selects[1].bindings, vec![json!(99)]);
}

#[tokio::test]
async fn test_database_errors_surface() {
    let (db, _) = test_manager(RecordingFactory::failing("server has gone away"));
    let err = posts(&db).get().await.unwrap_err();
    assert!(matches!(err, ModelError::Database(ref message) if message == "server has gone away"));
}
