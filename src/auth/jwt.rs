use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error, ErrorKind},
};
use uuid::Uuid;

use crate::{model::user::User, models::Claims};

fn now() -> usize {
    usize::try_from(Utc::now().timestamp()).unwrap_or_default()
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    let exp = now()
        .checked_add(ttl)
        .ok_or_else(|| Error::from(ErrorKind::InvalidToken))?;
    let claims = Claims {
        user_id: user.id,
        sub: user.username.clone(),
        role: user.role_id,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
