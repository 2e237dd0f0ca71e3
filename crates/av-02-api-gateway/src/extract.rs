//! Request extractors for the token and source IP of a call.

use crate::middleware::ClientIp;
use av_01_asset_store::Token;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr};

/// Token from `Authorization: Bearer <token>`.
///
/// A missing or unreadable header yields an empty token, which the gateway
/// treats as unauthorized like any other invalid token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Token);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(bearer_token(&parts.headers)))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Token {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return Token::default();
    };
    let value = value.trim();
    let token = value.strip_prefix("Bearer").unwrap_or(value);
    Token::new(token.trim())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Without the client IP layer only loopback can be assumed.
        Ok(parts
            .extensions
            .get::<ClientIp>()
            .copied()
            .unwrap_or(ClientIp(IpAddr::V4(Ipv4Addr::LOCALHOST))))
    }
}
