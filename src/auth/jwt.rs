use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;

/// Claim set embedded in every issued token. The whole session state lives
/// here; there is no server-side session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Symmetric signing/verification keys plus the configured token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_secs: config.expires_in_secs,
        }
    }

    pub fn sign(&self, sub: i64, email: &str, name: Option<&str>) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl_secs);
        let claims = Claims {
            sub,
            email: email.to_string(),
            name: name.map(str::to_string),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = sub, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(ttl_secs: i64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            expires_in_secs: ttl_secs,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys(300);
        let token = keys.sign(42, "a@b.com", Some("Alice")).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_expired_token() {
        // past the default 60s validation leeway
        let keys = make_keys(-120);
        let token = keys.sign(1, "a@b.com", None).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let good = make_keys(300);
        let bad = JwtKeys::new(&JwtConfig {
            secret: "other-secret".into(),
            expires_in_secs: 300,
        });
        let token = good.sign(1, "a@b.com", None).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys(300);
        let mut token = keys.sign(1, "a@b.com", None).expect("sign");
        token.push('x');
        assert!(keys.verify(&token).is_err());
        assert!(keys.verify("not-a-jwt").is_err());
    }
}
