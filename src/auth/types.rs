use serde::{Deserialize, Serialize};

/// Which credential a JWT represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims carried by both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub user_id: i64,
    pub username: String,
    pub token_type: TokenType,
    pub jti: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Request payload for creating an account
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request payload for obtaining a token pair
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request payload for exchanging a refresh token
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Response for account creation
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
}

/// Response for the obtain-token endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Response for the refresh endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenResponse {
    pub access: String,
}
