//! Pure scoring and ordering helpers used by the aggregator.
//!
//! Citation counts are normalized against the current batch only, so a
//! score is relative to the other results of the same request.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{RatingRecord, RawArticle, ScoredArticle};

pub const WEIGHT_SIMILARITY: f64 = 0.7;
pub const WEIGHT_CITATION: f64 = 0.3;

/// Min-max normalization into [0, 1]. An all-equal batch maps to 1.0 everywhere.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    values
        .iter()
        .map(|v| if max == min { 1.0 } else { (v - min) / (max - min) })
        .collect()
}

pub fn composite_score(similarity: f64, normalized_citation: f64) -> f64 {
    WEIGHT_SIMILARITY * similarity.clamp(0.0, 1.0) + WEIGHT_CITATION * normalized_citation
}

/// Attaches composite scores in input order.
///
/// Positions missing from `similarities` score 0 similarity.
pub fn score_articles(articles: Vec<RawArticle>, similarities: &[f64]) -> Vec<ScoredArticle> {
    let citations: Vec<f64> = articles.iter().map(|a| a.citation_count as f64).collect();
    let citations = normalize(&citations);

    articles
        .into_iter()
        .zip(citations)
        .enumerate()
        .map(|(idx, (article, citation))| {
            let similarity = similarities.get(idx).copied().unwrap_or(0.0);
            ScoredArticle {
                article,
                final_score: composite_score(similarity, citation),
                average_rating: 0.0,
            }
        })
        .collect()
}

/// Sets `average_rating` by URL; unmatched articles get 0.0.
pub fn merge_ratings(articles: &mut [ScoredArticle], ratings: &[RatingRecord]) {
    let by_url: HashMap<&str, f64> = ratings
        .iter()
        .map(|r| (r.url.as_str(), r.average_rating))
        .collect();

    for scored in articles.iter_mut() {
        scored.average_rating = by_url.get(scored.article.url.as_str()).copied().unwrap_or(0.0);
    }
}

/// Stable sort: rating descending, then composite score descending.
pub fn rank_order(articles: &mut [ScoredArticle]) {
    articles.sort_by(|a, b| {
        desc(a.average_rating, b.average_rating).then_with(|| desc(a.final_score, b.final_score))
    });
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn approx(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    fn article(url: &str, citations: u64) -> RawArticle {
        let mut a = RawArticle::new(Source::PubMed, url, url);
        a.citation_count = citations;
        a
    }

    fn scored(url: &str, rating: f64, score: f64) -> ScoredArticle {
        ScoredArticle {
            article: article(url, 0),
            final_score: score,
            average_rating: rating,
        }
    }

    #[test]
    fn test_normalize_edge_cases() {
        assert!(normalize(&[]).is_empty());
        assert_eq!(normalize(&[5.0]), vec![1.0]);
        assert_eq!(normalize(&[3.0, 3.0, 3.0]), vec![1.0, 1.0, 1.0]);
        assert!(approx(&normalize(&[1.0, 2.0, 3.0]), &[0.0, 0.5, 1.0]));
    }

    #[test]
    fn test_normalize_is_relative_to_batch() {
        assert!(approx(&normalize(&[10.0, 50.0, 30.0]), &[0.0, 1.0, 0.5]));
        assert!(approx(&normalize(&[1000.0, 5000.0, 3000.0]), &[0.0, 1.0, 0.5]));
    }

    #[test]
    fn test_score_articles_composite_formula() {
        let articles = vec![article("a1", 10), article("a2", 50), article("b1", 30)];
        let scored = score_articles(articles, &[0.9, 0.2, 0.6]);
        let scores: Vec<f64> = scored.iter().map(|s| s.final_score).collect();
        assert!(approx(&scores, &[0.63, 0.44, 0.57]));
        assert!(scored.iter().all(|s| s.average_rating == 0.0));
    }

    #[test]
    fn test_score_articles_short_similarity_vector() {
        let scored = score_articles(vec![article("a", 1), article("b", 1)], &[1.0]);
        assert!((scored[0].final_score - 1.0).abs() < 1e-9);
        assert!((scored[1].final_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_composite_score_stays_in_unit_interval() {
        assert_eq!(composite_score(-0.4, 0.0), 0.0);
        assert!((composite_score(1.7, 1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_ratings_by_url() {
        let mut articles = vec![scored("u1", 9.0, 0.1), scored("u2", 9.0, 0.1)];
        let ratings = vec![RatingRecord { url: "u2".into(), average_rating: 4.5 }];
        merge_ratings(&mut articles, &ratings);
        assert_eq!(articles[0].average_rating, 0.0);
        assert_eq!(articles[1].average_rating, 4.5);
    }

    #[test]
    fn test_rank_order_rating_before_score() {
        let mut articles = vec![scored("a", 0.0, 0.9), scored("b", 3.0, 0.1), scored("c", 3.0, 0.5)];
        rank_order(&mut articles);
        let urls: Vec<&str> = articles.iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_rank_order_is_stable_for_equal_keys() {
        let mut articles = vec![
            scored("first", 1.0, 0.5),
            scored("top", 2.0, 0.0),
            scored("second", 1.0, 0.5),
            scored("third", 1.0, 0.5),
        ];
        rank_order(&mut articles);
        let urls: Vec<&str> = articles.iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(urls, vec!["top", "first", "second", "third"]);
    }
}
