use crate::error::AppError;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use slotlog_core::ClientKey;
use std::net::SocketAddr;

/// Proxy header carrying the originating address
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// The caller's [`ClientKey`]
///
/// Taken from the first `X-Forwarded-For` entry, falling back to the peer
/// address when the router is served with connect info. Rejects with 400
/// when neither is available.
#[derive(Debug, Clone)]
pub struct ClientAddress(pub ClientKey);

#[async_trait]
impl<S> FromRequestParts<S> for ClientAddress
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let key = ClientKey::derive(forwarded, peer.as_deref())?;
        Ok(Self(key))
    }
}
