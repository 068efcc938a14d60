//! Authentication context definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use serde::Deserialize;
use service::domain::user;
use uuid::Uuid;

use crate::{define_error, AsError as _, Error, Service};

/// Authenticated user session, decoded from the `Authorization: Bearer`
/// [JWT] of the request.
///
/// Token issuance is out of scope of this application, so any token signed
/// with the shared secret is accepted.
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Copy, Debug)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    ///
    /// [`User`]: service::domain::User
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

/// [JWT] claims of a [`Session`].
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Copy, Debug, Deserialize)]
struct Claims {
    /// ID of the user the token was issued for.
    sub: Uuid,

    /// Expiration timestamp of the token, in seconds.
    exp: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                Error::internal(&"missing `Service` extension")
            })?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        let claims = jsonwebtoken::decode::<Claims>(
            bearer.token(),
            &service.config().jwt_decoding_key,
            &jsonwebtoken::Validation::default(),
        )
        .map_err(|_| Error::from(AuthError::InvalidToken))?
        .claims;

        let expires_at = DateTime::from_unix_timestamp(claims.exp)
            .ok_or_else(|| Error::from(AuthError::InvalidToken))?;

        Ok(Self {
            user_id: claims.sub.into(),
            expires_at,
        })
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid authentication token"]
        InvalidToken,
    }
}
