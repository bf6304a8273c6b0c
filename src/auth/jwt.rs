use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes an HS256 token and checks its signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Like [`verify_token`] but refuses refresh tokens.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = verify_token(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err("Refresh tokens cannot be used for API access".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) const SECRET: &str = "test-secret";

    pub(crate) fn token(role: u8, employee_id: Option<u64>, token_type: TokenType, ttl: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            user_id: 1,
            sub: "jane".into(),
            role,
            exp: (now + ttl) as usize,
            jti: "jti-1".into(),
            token_type,
            employee_id,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_access_token() {
        let claims = verify_access_token(&token(2, Some(7), TokenType::Access, 900), SECRET).unwrap();
        assert_eq!(claims.role, 2);
        assert_eq!(claims.employee_id, Some(7));
    }

    #[test]
    fn rejects_refresh_token() {
        let refresh = token(2, Some(7), TokenType::Refresh, 900);
        assert!(verify_token(&refresh, SECRET).is_ok());
        assert!(verify_access_token(&refresh, SECRET).is_err());
    }

    #[test]
    fn rejects_wrong_secret_and_expired() {
        assert!(verify_token(&token(1, None, TokenType::Access, 900), "other").is_err());
        // past the default 60s leeway
        assert!(verify_token(&token(1, None, TokenType::Access, -3600), SECRET).is_err());
    }
}
