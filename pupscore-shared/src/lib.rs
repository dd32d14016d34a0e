pub mod api;
pub mod domain;
pub mod gamification;
pub mod path;
