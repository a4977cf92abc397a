pub mod prelude;

pub mod categories;
pub mod reputation_entries;
pub mod sessions;
pub mod users;
