//! Cache key namespace.
//!
//! Every cached concept owns one variant of [`CacheKey`] and therefore one
//! fixed prefix. Identifier segments are escaped so that a separator or glob
//! character inside an id can never make two keys collide or widen a
//! pattern deletion.

use std::borrow::Cow;
use std::fmt;

/// Separator between key segments.
pub const SEPARATOR: char = ':';

/// Pattern matching every cached search result and suggestion list.
pub const SEARCH_PATTERN: &str = "search:*";

const RESERVED_SEARCH_SEGMENT: &str = "suggestions";

/// A fully-typed cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey<'a> {
    UserProfile(&'a str),
    UserFavorites(&'a str),
    UserRecipes(&'a str),
    Recipe(&'a str),
    RecipeReviews(&'a str),
    PopularRecipes,
    RecentRecipes,
    Search {
        query: &'a str,
        filters_hash: &'a str,
    },
    SearchSuggestions(&'a str),
    RateLimit {
        identifier: &'a str,
        window_seconds: u64,
    },
    ApiRateLimit {
        user_id: &'a str,
        endpoint: &'a str,
    },
    AiRecipe(&'a str),
    Session(&'a str),
    Temp(&'a str),
    DailyActiveUsers(&'a str),
    RecipeViews(&'a str),
}

impl CacheKey<'_> {
    /// The fixed prefix owned by this variant.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheKey::UserProfile(_) => "user:profile",
            CacheKey::UserFavorites(_) => "user:favorites",
            CacheKey::UserRecipes(_) => "user:recipes",
            CacheKey::Recipe(_) => "recipe",
            CacheKey::RecipeReviews(_) => "recipe:reviews",
            CacheKey::PopularRecipes => "recipes:popular",
            CacheKey::RecentRecipes => "recipes:recent",
            CacheKey::Search { .. } => "search",
            CacheKey::SearchSuggestions(_) => "search:suggestions",
            CacheKey::RateLimit { .. } => "rate_limit",
            CacheKey::ApiRateLimit { .. } => "api:rate_limit",
            CacheKey::AiRecipe(_) => "ai:recipe",
            CacheKey::Session(_) => "session",
            CacheKey::Temp(_) => "temp",
            CacheKey::DailyActiveUsers(_) => "analytics:dau",
            CacheKey::RecipeViews(_) => "analytics:recipe_views",
        }
    }

    /// Render the key string.
    pub fn build(&self) -> String {
        let prefix = self.prefix();
        match *self {
            CacheKey::PopularRecipes | CacheKey::RecentRecipes => prefix.to_string(),
            CacheKey::UserProfile(id)
            | CacheKey::UserFavorites(id)
            | CacheKey::UserRecipes(id)
            | CacheKey::Recipe(id)
            | CacheKey::RecipeReviews(id)
            | CacheKey::SearchSuggestions(id)
            | CacheKey::AiRecipe(id)
            | CacheKey::Session(id)
            | CacheKey::Temp(id)
            | CacheKey::DailyActiveUsers(id)
            | CacheKey::RecipeViews(id) => format!("{prefix}{SEPARATOR}{}", escape_segment(id)),
            CacheKey::Search {
                query,
                filters_hash,
            } => {
                // `search:suggestions:<q>` shares the first two segments
                let query = if query == RESERVED_SEARCH_SEGMENT {
                    Cow::Borrowed("%73uggestions")
                } else {
                    escape_segment(query)
                };
                format!(
                    "{prefix}{SEPARATOR}{query}{SEPARATOR}{}",
                    escape_segment(filters_hash)
                )
            }
            CacheKey::RateLimit {
                identifier,
                window_seconds,
            } => format!(
                "{prefix}{SEPARATOR}{}{SEPARATOR}{window_seconds}",
                escape_segment(identifier)
            ),
            CacheKey::ApiRateLimit { user_id, endpoint } => format!(
                "{prefix}{SEPARATOR}{}{SEPARATOR}{}",
                escape_segment(user_id),
                escape_segment(endpoint)
            ),
        }
    }

    /// Glob matching this key and every key extending it.
    ///
    /// This is a plain prefix match: the pattern for id `u1` also matches
    /// keys built from `u10` or `u1x`.
    pub fn pattern(&self) -> String {
        format!("{}*", self.build())
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Percent-encode the characters that carry meaning inside a key or glob.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.chars().any(needs_escape) {
        return Cow::Borrowed(segment);
    }

    let mut escaped = String::with_capacity(segment.len() + 8);
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            '*' => escaped.push_str("%2A"),
            '?' => escaped.push_str("%3F"),
            '[' => escaped.push_str("%5B"),
            ']' => escaped.push_str("%5D"),
            '\\' => escaped.push_str("%5C"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn needs_escape(c: char) -> bool {
    matches!(c, '%' | ':' | '*' | '?' | '[' | ']' | '\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_formats() {
        assert_eq!(CacheKey::UserProfile("u1").build(), "user:profile:u1");
        assert_eq!(CacheKey::UserFavorites("u1").build(), "user:favorites:u1");
        assert_eq!(CacheKey::UserRecipes("u1").build(), "user:recipes:u1");
        assert_eq!(CacheKey::Recipe("r1").build(), "recipe:r1");
        assert_eq!(CacheKey::RecipeReviews("r1").build(), "recipe:reviews:r1");
        assert_eq!(CacheKey::PopularRecipes.build(), "recipes:popular");
        assert_eq!(CacheKey::RecentRecipes.build(), "recipes:recent");
        assert_eq!(
            CacheKey::Search {
                query: "pasta",
                filters_hash: "abc123"
            }
            .build(),
            "search:pasta:abc123"
        );
        assert_eq!(
            CacheKey::SearchSuggestions("pas").build(),
            "search:suggestions:pas"
        );
        assert_eq!(
            CacheKey::RateLimit {
                identifier: "ip-A",
                window_seconds: 60
            }
            .build(),
            "rate_limit:ip-A:60"
        );
        assert_eq!(
            CacheKey::ApiRateLimit {
                user_id: "u1",
                endpoint: "generate"
            }
            .build(),
            "api:rate_limit:u1:generate"
        );
        assert_eq!(CacheKey::AiRecipe("deadbeef").build(), "ai:recipe:deadbeef");
        assert_eq!(CacheKey::Session("s1").build(), "session:s1");
        assert_eq!(CacheKey::Temp("t").build(), "temp:t");
        assert_eq!(
            CacheKey::DailyActiveUsers("2024-01-01").build(),
            "analytics:dau:2024-01-01"
        );
        assert_eq!(
            CacheKey::RecipeViews("r1").build(),
            "analytics:recipe_views:r1"
        );
    }

    #[test]
    fn test_pattern_appends_glob() {
        assert_eq!(CacheKey::UserRecipes("u1").pattern(), "user:recipes:u1*");
    }

    #[test]
    fn test_separator_inside_identifier_is_escaped() {
        assert_eq!(CacheKey::Recipe("reviews:r1").build(), "recipe:reviews%3Ar1");
        assert_ne!(
            CacheKey::Recipe("reviews:r1").build(),
            CacheKey::RecipeReviews("r1").build()
        );
    }

    #[test]
    fn test_glob_characters_are_escaped() {
        assert_eq!(CacheKey::UserRecipes("*").pattern(), "user:recipes:%2A*");
        assert_eq!(escape_segment("100%"), "100%25");
    }

    #[test]
    fn test_search_query_cannot_shadow_suggestions() {
        let search = CacheKey::Search {
            query: "suggestions",
            filters_hash: "pasta",
        };
        assert_ne!(search.build(), CacheKey::SearchSuggestions("pasta").build());
    }

    #[test]
    fn test_display_matches_build() {
        let key = CacheKey::Session("abc");
        assert_eq!(key.to_string(), key.build());
    }

    fn all_variants<'a>(a: &'a str, b: &'a str, n: u64) -> Vec<(String, CacheKey<'a>)> {
        vec![
            ("profile".into(), CacheKey::UserProfile(a)),
            ("favorites".into(), CacheKey::UserFavorites(a)),
            ("user_recipes".into(), CacheKey::UserRecipes(a)),
            ("recipe".into(), CacheKey::Recipe(a)),
            ("reviews".into(), CacheKey::RecipeReviews(a)),
            ("popular".into(), CacheKey::PopularRecipes),
            ("recent".into(), CacheKey::RecentRecipes),
            (
                "search".into(),
                CacheKey::Search {
                    query: a,
                    filters_hash: b,
                },
            ),
            ("suggestions".into(), CacheKey::SearchSuggestions(a)),
            (
                "rate_limit".into(),
                CacheKey::RateLimit {
                    identifier: a,
                    window_seconds: n,
                },
            ),
            (
                "api_rate_limit".into(),
                CacheKey::ApiRateLimit {
                    user_id: a,
                    endpoint: b,
                },
            ),
            ("ai".into(), CacheKey::AiRecipe(a)),
            ("session".into(), CacheKey::Session(a)),
            ("temp".into(), CacheKey::Temp(a)),
            ("dau".into(), CacheKey::DailyActiveUsers(a)),
            ("views".into(), CacheKey::RecipeViews(a)),
        ]
    }

    proptest! {
        #[test]
        fn prop_distinct_inputs_never_collide(
            a1 in "[a-z0-9:%*_-]{1,12}",
            b1 in "[a-z0-9:%*_-]{1,12}",
            n1 in 1u64..100_000,
            a2 in "[a-z0-9:%*_-]{1,12}",
            b2 in "[a-z0-9:%*_-]{1,12}",
            n2 in 1u64..100_000,
        ) {
            let mut seen: HashMap<String, (String, Vec<String>)> = HashMap::new();
            for (a, b, n) in [(&a1, &b1, n1), (&a2, &b2, n2)] {
                for (tag, key) in all_variants(a, b, n) {
                    let inputs = match key {
                        CacheKey::PopularRecipes | CacheKey::RecentRecipes => vec![],
                        CacheKey::Search { .. } | CacheKey::ApiRateLimit { .. } => {
                            vec![a.clone(), b.clone()]
                        }
                        CacheKey::RateLimit { .. } => vec![a.clone(), n.to_string()],
                        _ => vec![a.clone()],
                    };
                    let rendered = key.build();
                    if let Some(previous) = seen.get(&rendered) {
                        prop_assert_eq!(previous, &(tag.clone(), inputs.clone()));
                    }
                    seen.insert(rendered, (tag, inputs));
                }
            }
        }
    }
}
