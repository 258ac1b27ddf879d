pub mod codec;
pub mod converter;
pub mod entity;

pub use entity::Entity;
pub use jsoncol_api_derive::Entity;
pub mod error;
pub mod factory;
pub mod mapping;
pub mod schema;
pub mod value;
