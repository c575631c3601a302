pub mod api;
pub mod calendar;
pub mod events;
pub mod export;
