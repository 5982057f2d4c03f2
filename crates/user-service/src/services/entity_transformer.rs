//! Shapes stored records into their external view.

use crate::crypto::TokenCodec;
use crate::errors::UserError;
use crate::models::{User, UserView};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EntityTransformer {
    codec: Arc<TokenCodec>,
}

impl EntityTransformer {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Build the external view of `user`.
    ///
    /// The view is assembled from id, username and email only. With
    /// `attach_token`, `existing_token` is passed through when given,
    /// otherwise a fresh token is minted.
    pub fn transform(
        &self,
        user: &User,
        attach_token: bool,
        existing_token: Option<&str>,
    ) -> Result<UserView, UserError> {
        let token = match (attach_token, existing_token) {
            (false, _) => None,
            (true, Some(token)) => Some(token.to_string()),
            (true, None) => Some(self.codec.issue(&user.summary())?),
        };

        Ok(UserView {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            token,
        })
    }
}
