use crate::catalog::{Genre, Movie};
use crate::overlay::RatingOverlay;
use chrono::NaiveDate;

/// Colour band of a community rating badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Red,
    Orange,
    Yellow,
    Green,
}

impl BadgeColor {
    pub fn for_rating(value: f64) -> Self {
        if value < 3.0 {
            Self::Red
        } else if value < 5.0 {
            Self::Orange
        } else if value < 7.0 {
            Self::Yellow
        } else {
            Self::Green
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingBadge {
    pub text: String,
    pub color: BadgeColor,
}

/// Everything a card needs, with genres and the guest rating resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub movie_id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub genre_names: Vec<String>,
    pub formatted_date: Option<String>,
    pub rating_badge: Option<RatingBadge>,
    pub user_rating: f64,
}

/// Names of the genres the movie belongs to, in genre table order.
pub fn genre_names(movie: &Movie, genres: &[Genre]) -> Vec<String> {
    genres
        .iter()
        .filter(|g| movie.genre_ids.contains(&g.id))
        .map(|g| g.name.clone())
        .collect()
}

/// `2021-03-05` -> `March 5, 2021`; `None` for anything unparsable.
pub fn format_release_date(date: Option<&str>) -> Option<String> {
    let date = NaiveDate::parse_from_str(date?.trim(), "%Y-%m-%d").ok()?;
    Some(date.format("%B %-d, %Y").to_string())
}

pub fn rating_badge(vote_average: Option<f64>) -> Option<RatingBadge> {
    let value = vote_average.filter(|v| *v != 0.0 && !v.is_nan())?;
    Some(RatingBadge {
        text: format!("{:.1}", value),
        color: BadgeColor::for_rating(value),
    })
}

pub fn poster_url(base: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path.filter(|p| !p.is_empty())?;
    Some(format!("{}{}", base.trim_end_matches('/'), path))
}

pub fn project(
    movie: &Movie,
    genres: &[Genre],
    overlay: &RatingOverlay,
    poster_base: &str,
) -> DisplayRecord {
    DisplayRecord {
        movie_id: movie.id,
        title: movie.title.clone(),
        overview: movie.overview.clone(),
        poster_url: poster_url(poster_base, movie.poster_path.as_deref()),
        genre_names: genre_names(movie, genres),
        formatted_date: format_release_date(movie.release_date.as_deref()),
        rating_badge: rating_badge(movie.vote_average),
        user_rating: overlay.rating_for(movie.id),
    }
}

pub fn project_list<'a>(
    movies: impl IntoIterator<Item = &'a Movie>,
    genres: &[Genre],
    overlay: &RatingOverlay,
    poster_base: &str,
) -> Vec<DisplayRecord> {
    movies
        .into_iter()
        .map(|m| project(m, genres, overlay, poster_base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RatedMovie, RatedPage};
    use proptest::prelude::*;

    fn genre(id: i64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    fn movie(id: i64, genre_ids: Vec<i64>) -> Movie {
        Movie {
            id,
            title: "Batman".to_string(),
            overview: "Bats.".to_string(),
            poster_path: Some("/bat.jpg".to_string()),
            release_date: Some("1989-06-23".to_string()),
            genre_ids,
            vote_average: Some(7.34),
        }
    }

    #[test]
    fn test_genres_follow_table_order() {
        let table = vec![genre(28, "Action"), genre(14, "Fantasy"), genre(80, "Crime")];
        let m = movie(1, vec![80, 28, 999]);
        assert_eq!(genre_names(&m, &table), vec!["Action", "Crime"]);
    }

    #[test]
    fn test_release_date_formatting() {
        assert_eq!(
            format_release_date(Some("2021-03-05")).as_deref(),
            Some("March 5, 2021")
        );
        assert_eq!(format_release_date(Some("")), None);
        assert_eq!(format_release_date(Some("soon")), None);
        assert_eq!(format_release_date(None), None);
    }

    #[test]
    fn test_badge_only_for_truthy_vote() {
        assert_eq!(rating_badge(None), None);
        assert_eq!(rating_badge(Some(0.0)), None);
        let badge = rating_badge(Some(7.34)).unwrap();
        assert_eq!(badge.text, "7.3");
        assert_eq!(badge.color, BadgeColor::Green);
        assert_eq!(rating_badge(Some(2.0)).unwrap().color, BadgeColor::Red);
        assert_eq!(rating_badge(Some(4.0)).unwrap().color, BadgeColor::Orange);
        assert_eq!(rating_badge(Some(6.9)).unwrap().color, BadgeColor::Yellow);
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url("https://img/w500/", Some("/a.jpg")).as_deref(),
            Some("https://img/w500/a.jpg")
        );
        assert_eq!(poster_url("https://img", None), None);
    }

    #[test]
    fn test_project_uses_overlay_rating() {
        let mut overlay = RatingOverlay::default();
        let m = movie(5, vec![]);
        assert_eq!(project(&m, &[], &overlay, "x").user_rating, 0.0);

        overlay.apply(RatedPage {
            page: 1,
            results: vec![RatedMovie {
                movie: m.clone(),
                rating: 7.0,
            }],
            total_results: 1,
        });
        let record = project(&m, &[], &overlay, "https://img");
        assert_eq!(record.user_rating, 7.0);
        assert_eq!(record.poster_url.as_deref(), Some("https://img/bat.jpg"));
        assert_eq!(record.formatted_date.as_deref(), Some("June 23, 1989"));
    }

    proptest! {
        #[test]
        fn prop_genre_tags_are_subset_in_table_order(
            table_ids in proptest::collection::btree_set(0i64..50, 0..15),
            movie_ids in proptest::collection::vec(0i64..60, 0..10),
        ) {
            let table: Vec<Genre> = table_ids
                .iter()
                .rev()
                .map(|id| genre(*id, &format!("g{}", id)))
                .collect();
            let m = movie(1, movie_ids.clone());
            let names = genre_names(&m, &table);

            let expected: Vec<String> = table
                .iter()
                .filter(|g| movie_ids.contains(&g.id))
                .map(|g| g.name.clone())
                .collect();
            prop_assert_eq!(&names, &expected);
            for name in &names {
                let id: i64 = name[1..].parse().unwrap();
                prop_assert!(movie_ids.contains(&id));
            }
        }
    }
}
