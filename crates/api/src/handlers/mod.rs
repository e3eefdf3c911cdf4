pub mod elements;
pub mod projects;
pub mod sweep;
pub mod uploads;
pub mod videos;
