pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService};
pub use account_service_impl::SeaOrmAccountService;

pub mod category_service;
pub mod category_service_impl;
pub use category_service::{CategoryError, CategoryInput, CategoryService};
pub use category_service_impl::SeaOrmCategoryService;

pub mod reputation_service;
pub mod reputation_service_impl;
pub use reputation_service::{
    GiveReputation, ReputationError, ReputationHistory, ReputationService,
};
pub use reputation_service_impl::SeaOrmReputationService;
