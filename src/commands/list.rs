//! List site content

use anyhow::Result;

use crate::content::PostCollection;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = PostCollection::load(site.metadata_path())?;
            println!("Posts ({}):", posts.len());
            for line in post_lines(&posts) {
                println!("  {}", line);
            }
        }
        "category" | "categories" => {
            let posts = PostCollection::load(site.metadata_path())?;
            let categories = posts.categories();
            println!("Categories ({}):", categories.len());
            for (name, count) in categories {
                println!("  {} ({})", name, count);
            }
        }
        "page" | "pages" => {
            println!("Pages ({}):", site.config.pages.len());
            for page in &site.config.pages {
                println!("  {} -> {}.md [{}]", page.path, page.content, page.section);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, category, page",
                content_type
            );
        }
    }

    Ok(())
}

/// One line per post, in declared order
fn post_lines(posts: &PostCollection) -> Vec<String> {
    posts
        .oldest_first()
        .iter()
        .map(|post| {
            format!(
                "{} - {} [{}]",
                post.date.format("%Y-%m-%d"),
                post.title,
                post.content_reference()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Post;
    use chrono::NaiveDate;

    #[test]
    fn test_post_lines() {
        let posts = PostCollection::from_posts(vec![Post::new(
            "Hello",
            "/blog/2021/0300/hello/",
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
        )])
        .unwrap();
        assert_eq!(post_lines(&posts), vec!["2021-03-04 - Hello [2021-0300-hello]"]);
    }

    #[test]
    fn test_unknown_type() {
        let dir = tempfile::TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(run(&site, "tags").is_err());
        assert!(run(&site, "pages").is_ok());
    }
}
