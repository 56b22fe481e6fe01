//! Example: per-site content report
//!
//! Prints the latest published posts of one site with their authors and
//! categories, plus the comment queue size. Connection settings come from a
//! JSON file in the shape accepted by `DatabaseConfig::from_json`.
//!
//! ```sh
//! RUST_LOG=wp_orm=debug cargo run --example site_report -- database.json 3
//! ```

use tracing_subscriber::EnvFilter;
use wp_orm::models::{Comment, Post, TermTaxonomy, User};
use wp_orm::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "database.json".to_string());
    let site: i64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    let config = DatabaseConfig::from_json(&std::fs::read_to_string(&config_path)?)?;
    let db = ConnectionManager::mysql(config).for_site(site);

    let page = Post::query(&db)?
        .published()
        .of_type("post")
        .with("author")
        .with("categories")
        .latest("post_date")
        .paginate(10, 1)
        .await?;

    println!("site {}: {} published posts", site, page.total);
    for post in &page.items {
        let author = post
            .related_one::<User>("author")
            .and_then(|user| user.display_name().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let categories = post
            .related_many::<TermTaxonomy>("categories")
            .map(|terms| terms.len())
            .unwrap_or_default();
        println!(
            "  #{:<6} {:<50} by {} ({} categories)",
            post.id().unwrap_or_default(),
            post.title().unwrap_or(""),
            author,
            categories
        );
    }

    let pending = Comment::query(&db)?.where_eq("comment_approved", "0").count().await?;
    println!("{} comments awaiting moderation", pending);

    Ok(())
}
