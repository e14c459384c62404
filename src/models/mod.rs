pub mod annonces;
pub mod categories;
pub mod dto;
pub mod favoris;
pub mod images;
pub mod users;
