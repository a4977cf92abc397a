pub use super::categories::Entity as Categories;
pub use super::reputation_entries::Entity as ReputationEntries;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
