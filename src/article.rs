use std::collections::BTreeMap;

/// A wardrobe item as supplied by the surrounding registry. Immutable during
/// outfit composition; the engine only reads identity, name, and the
/// preferred image reference.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Article {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Primary raster reference (opaque to the engine; resolved by an
    /// [`ImageLoader`](crate::compose::ImageLoader)).
    pub image: String,
    /// Background-removed variant, preferred over `image` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_image: Option<String>,
}

impl Article {
    pub fn preferred_image(&self) -> &str {
        self.processed_image.as_deref().unwrap_or(&self.image)
    }
}

/// Read-only lookup of articles available to the draft. Stable iteration
/// order (keyed by id) so rendering and tests are deterministic.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ArticleRegistry {
    articles: BTreeMap<String, Article>,
}

impl ArticleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        Self {
            articles: articles
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
        }
    }

    pub fn insert(&mut self, article: Article) {
        self.articles.insert(article.id.clone(), article);
    }

    pub fn resolve(&self, id: &str) -> Option<&Article> {
        self.articles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.articles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            name: format!("name-{id}"),
            tags: vec![],
            image: format!("{id}.png"),
            processed_image: None,
        }
    }

    #[test]
    fn preferred_image_picks_processed_when_present() {
        let mut a = article("shirt-1");
        assert_eq!(a.preferred_image(), "shirt-1.png");

        a.processed_image = Some("shirt-1.nobg.png".to_string());
        assert_eq!(a.preferred_image(), "shirt-1.nobg.png");
    }

    #[test]
    fn resolve_unknown_is_none() {
        let reg = ArticleRegistry::from_articles([article("a"), article("b")]);
        assert!(reg.resolve("a").is_some());
        assert!(reg.resolve("missing").is_none());
        assert_eq!(reg.len(), 2);
    }
}
