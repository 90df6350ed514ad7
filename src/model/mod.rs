pub mod api;
pub mod cache;
pub mod catalog;
pub mod events;
pub mod menu;
pub mod participant;
pub mod recommendation;
pub mod session;
pub mod store;
