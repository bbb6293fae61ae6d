pub mod game;
pub mod store;
pub mod web;

pub use game::*;
pub use store::*;
