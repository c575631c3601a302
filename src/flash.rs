use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::planner::Notice;

const NOTICE_KEY: &str = "notice";

/// The notice left by the previous request, if any. Reading it clears it.
pub struct Flash(pub Option<Notice>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(Flash(None));
        };

        let notice: Option<Notice> = session.remove(NOTICE_KEY).await.ok().flatten();

        Ok(Flash(notice))
    }
}

pub async fn push(session: &Session, notice: Notice) -> Result<(), tower_sessions::session::Error> {
    session.insert(NOTICE_KEY, notice).await
}
