pub mod auth_service;
pub mod catalog_service;
pub mod link_service;
pub mod recipe_service;
pub mod shopping_list;
pub mod user_service;
