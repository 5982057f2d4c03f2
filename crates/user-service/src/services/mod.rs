pub mod entity_transformer;
pub mod events;
pub mod registration_service;
pub mod token_cache;
pub mod user_service;
pub mod validation;

pub use entity_transformer::EntityTransformer;
pub use events::UserEventBus;
pub use token_cache::{ResolveError, TokenResolutionCache};
