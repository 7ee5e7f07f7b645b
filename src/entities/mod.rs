pub mod actor;
pub mod carousel;
pub mod clip;
pub mod comment;
pub mod favorite;
pub mod movie;
pub mod movie_actor;
pub mod user;
