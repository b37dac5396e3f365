//! Canonical categories and per-site category tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical search categories shared by every engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Movies,
    Tv,
    Music,
    Games,
    Software,
    Anime,
    Books,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Category::All,
        Category::Movies,
        Category::Tv,
        Category::Music,
        Category::Games,
        Category::Software,
        Category::Anime,
        Category::Books,
    ];

    /// The canonical key, e.g. `"movies"`.
    pub fn key(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Movies => "movies",
            Category::Tv => "tv",
            Category::Music => "music",
            Category::Games => "games",
            Category::Software => "software",
            Category::Anime => "anime",
            Category::Books => "books",
        }
    }

    /// Parses a key, degrading anything unrecognized to [`Category::All`].
    pub fn parse_lenient(key: &str) -> Category {
        key.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Fixed mapping from canonical categories to a site's own category tokens.
///
/// Categories missing from the table fall back to the site's `all` token.
#[derive(Debug, Clone, Copy)]
pub struct CategoryMap {
    all: &'static str,
    entries: &'static [(Category, &'static str)],
}

impl CategoryMap {
    /// Creates a table with the site's `all` token and its other entries.
    pub const fn new(all: &'static str, entries: &'static [(Category, &'static str)]) -> Self {
        Self { all, entries }
    }

    /// Returns the site token for a category.
    pub fn token(&self, category: Category) -> &'static str {
        self.lookup(category).unwrap_or(self.all)
    }

    /// Returns the site token only if the site supports the category.
    pub fn lookup(&self, category: Category) -> Option<&'static str> {
        if category == Category::All {
            return Some(self.all);
        }
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, token)| *token)
    }

    /// Returns true if the category resolves to the site's `all` token.
    pub fn is_all(&self, category: Category) -> bool {
        self.token(category) == self.all
    }

    /// Canonical categories the site understands, including `all`.
    pub fn supported(&self) -> Vec<Category> {
        std::iter::once(Category::All)
            .chain(self.entries.iter().map(|(c, _)| *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: CategoryMap = CategoryMap::new(
        "0",
        &[(Category::Music, "100"), (Category::Movies, "200")],
    );

    #[test]
    fn test_category_default() {
        assert_eq!(Category::default(), Category::All);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("movies".parse::<Category>().unwrap(), Category::Movies);
        assert_eq!(" TV ".parse::<Category>().unwrap(), Category::Tv);
        assert!("ebooks".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_parse_lenient() {
        assert_eq!(Category::parse_lenient("anime"), Category::Anime);
        assert_eq!(Category::parse_lenient("documentaries"), Category::All);
    }

    #[test]
    fn test_category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>().unwrap(), category);
            assert_eq!(category.to_string(), category.key());
        }
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&Category::Tv).unwrap(), "\"tv\"");
        let c: Category = serde_json::from_str("\"books\"").unwrap();
        assert_eq!(c, Category::Books);
    }

    #[test]
    fn test_map_token() {
        assert_eq!(MAP.token(Category::All), "0");
        assert_eq!(MAP.token(Category::Music), "100");
        assert_eq!(MAP.token(Category::Movies), "200");
    }

    #[test]
    fn test_map_unsupported_falls_back_to_all() {
        assert_eq!(MAP.token(Category::Anime), "0");
        assert_eq!(MAP.lookup(Category::Anime), None);
        assert!(MAP.is_all(Category::Books));
        assert!(!MAP.is_all(Category::Music));
    }

    #[test]
    fn test_map_supported() {
        assert_eq!(
            MAP.supported(),
            vec![Category::All, Category::Music, Category::Movies]
        );
    }
}
