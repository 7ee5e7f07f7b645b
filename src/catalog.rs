use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, LikeExpr},
};
use tracing::debug;

use crate::{
    entities::{actor, carousel, clip, movie, movie_actor},
    error::{AppError, AppResult},
    models::{ActorWork, CarouselItem, CastMember, MovieDetail, MovieWithActors},
};

const SHORT_LIST_LIMIT: u64 = 10;
const SEARCH_LIMIT: usize = 50;
const TOP_WORKS: usize = 5;

/// Read-only queries over movies, cast, clips and the carousel.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<MovieWithActors>> {
        let movies = movie::Entity::find()
            .order_by_desc(movie::Column::Score)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        let links = movie_actor::Entity::find()
            .find_also_related(actor::Entity)
            .order_by_asc(movie_actor::Column::MovieId)
            .order_by_asc(movie_actor::Column::ActorId)
            .all(&self.db)
            .await?;

        let mut names: HashMap<i32, Vec<String>> = HashMap::new();
        for (link, actor) in links {
            let Some(actor) = actor else { continue };
            let entry = names.entry(link.movie_id).or_default();
            if !entry.contains(&actor.name) {
                entry.push(actor.name);
            }
        }

        Ok(movies
            .into_iter()
            .map(|movie| {
                let actors = names.remove(&movie.id).unwrap_or_default();
                MovieWithActors { movie, actors }
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<MovieDetail> {
        let Some(movie) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::not_found("电影不存在"));
        };

        let actors: Vec<actor::Model> = movie_actor::Entity::find()
            .filter(movie_actor::Column::MovieId.eq(id))
            .find_also_related(actor::Entity)
            .order_by_asc(movie_actor::Column::ActorId)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(_, actor)| actor)
            .collect();

        let actor_ids: Vec<i32> = actors.iter().map(|a| a.id).collect();
        let mut works = self.top_works(&actor_ids).await?;

        let cast = actors
            .into_iter()
            .map(|actor| {
                let works = works.remove(&actor.id).unwrap_or_default();
                CastMember { actor, works }
            })
            .collect();

        Ok(MovieDetail { movie, cast })
    }

    /// Highest-scored works for every actor in `actor_ids`, fetched with one
    /// query and capped per actor.
    async fn top_works(&self, actor_ids: &[i32]) -> AppResult<HashMap<i32, Vec<ActorWork>>> {
        if actor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = movie_actor::Entity::find()
            .filter(movie_actor::Column::ActorId.is_in(actor_ids.iter().copied()))
            .find_also_related(movie::Entity)
            .order_by_desc(movie::Column::Score)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        let mut works: HashMap<i32, Vec<ActorWork>> = HashMap::new();
        for (link, movie) in rows {
            let Some(movie) = movie else { continue };
            works.entry(link.actor_id).or_default().push(movie.into());
        }
        for list in works.values_mut() {
            sort_by_score(list);
            list.truncate(TOP_WORKS);
        }

        debug!(actors = actor_ids.len(), "loaded cast works");
        Ok(works)
    }

    pub async fn search(&self, raw_keyword: &str) -> AppResult<Vec<movie::Model>> {
        let keyword = normalize_keyword(raw_keyword);
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        debug!(keyword = %keyword, "searching movies");

        let pattern = like_pattern(&keyword);
        let contains = |column: movie::Column| {
            Expr::col((movie::Entity, column)).like(LikeExpr::new(pattern.as_str()).escape('\\'))
        };

        let matches = movie::Entity::find()
            .filter(
                Condition::any()
                    .add(contains(movie::Column::Title))
                    .add(contains(movie::Column::Director))
                    .add(contains(movie::Column::Kind))
                    .add(contains(movie::Column::Description)),
            )
            .all(&self.db)
            .await?;

        let results = rank_matches(matches, &keyword);
        debug!(keyword = %keyword, results = results.len(), "search finished");
        Ok(results)
    }

    pub async fn hot_list(&self) -> AppResult<Vec<movie::Model>> {
        Ok(movie::Entity::find()
            .order_by_desc(movie::Column::Score)
            .order_by_asc(movie::Column::Id)
            .limit(SHORT_LIST_LIMIT)
            .all(&self.db)
            .await?)
    }

    pub async fn new_list(&self) -> AppResult<Vec<movie::Model>> {
        Ok(movie::Entity::find()
            .order_by_desc(movie::Column::ReleaseTime)
            .order_by_asc(movie::Column::Id)
            .limit(SHORT_LIST_LIMIT)
            .all(&self.db)
            .await?)
    }

    pub async fn clips_for(&self, movie_id: i32) -> AppResult<Vec<clip::Model>> {
        Ok(clip::Entity::find()
            .filter(clip::Column::MovieId.eq(movie_id))
            .order_by_asc(clip::Column::SortOrder)
            .order_by_asc(clip::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn carousel(&self) -> AppResult<Vec<CarouselItem>> {
        let rows = carousel::Entity::find()
            .filter(carousel::Column::IsActive.eq(true))
            .find_also_related(movie::Entity)
            .order_by_asc(carousel::Column::SortOrder)
            .order_by_asc(carousel::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(slide, movie)| {
                let movie = movie?;
                Some(CarouselItem {
                    id: slide.id,
                    movie_id: slide.movie_id,
                    sort_order: slide.sort_order,
                    is_active: slide.is_active,
                    title: movie.title,
                    cover: movie.cover,
                })
            })
            .collect())
    }
}

/// Trims the keyword and undoes an extra layer of percent-encoding; a value
/// that does not decode is used as-is.
pub fn normalize_keyword(raw: &str) -> String {
    let decoded =
        urlencoding::decode(raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.to_string());
    decoded.trim().to_string()
}

/// `%keyword%` with the LIKE wildcards in `keyword` escaped by `\`.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Lower rank sorts first: title, director, type, then description-only.
/// `None` when no field contains the keyword.
pub fn match_rank(movie: &movie::Model, keyword: &str) -> Option<u8> {
    let needle = keyword.to_lowercase();
    let hit = |field: &str| field.to_lowercase().contains(&needle);
    if hit(&movie.title) {
        Some(1)
    } else if hit(&movie.director) {
        Some(2)
    } else if hit(&movie.kind) {
        Some(3)
    } else if hit(&movie.description) {
        Some(4)
    } else {
        None
    }
}

fn rank_matches(matches: Vec<movie::Model>, keyword: &str) -> Vec<movie::Model> {
    let mut ranked: Vec<(u8, movie::Model)> = matches
        .into_iter()
        .filter_map(|m| match_rank(&m, keyword).map(|rank| (rank, m)))
        .collect();
    ranked.sort_by(|(ra, a), (rb, b)| {
        ra.cmp(rb).then_with(|| b.score.total_cmp(&a.score)).then_with(|| a.id.cmp(&b.id))
    });
    ranked.into_iter().take(SEARCH_LIMIT).map(|(_, m)| m).collect()
}

fn sort_by_score(works: &mut [ActorWork]) {
    works.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
