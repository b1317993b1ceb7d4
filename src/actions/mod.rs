//! Eco action records and the local action list

mod list;
mod model;

pub use list::ActionList;
pub use model::{newest_first, ActionQuery, EcoAction, NewEcoAction};
