pub mod categories;
pub mod net_worth;
pub mod setup;
pub mod ui;
