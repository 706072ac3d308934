use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::NaiveDateTime;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::errors::AppError;

pub const SESSION_TTL_HOURS: i64 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Issues and verifies the signed admin credential. Behind a trait so the
/// signing mechanism and secret source can change without touching call
/// sites; revocation is stateless — logout just tells the caller to drop
/// the token, and an expired token requires a fresh login.
pub trait SessionManager: Send + Sync {
    fn issue(
        &self,
        username: &str,
        password: &str,
        now: NaiveDateTime,
    ) -> Result<IssuedToken, AppError>;

    fn verify(&self, token: &str, now: NaiveDateTime) -> Result<Claims, AppError>;
}

/// Token format: base64url(claims json) "." base64url(hmac-sha1 over the
/// encoded claims).
pub struct HmacSessions {
    secret: String,
    username: String,
    password: String,
}

impl HmacSessions {
    pub fn new(secret: String, username: String, password: String) -> Self {
        Self {
            secret,
            username,
            password,
        }
    }

    fn mac(&self) -> Result<Hmac<Sha1>, AppError> {
        Hmac::<Sha1>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid session secret")))
    }
}

impl SessionManager for HmacSessions {
    fn issue(
        &self,
        username: &str,
        password: &str,
        now: NaiveDateTime,
    ) -> Result<IssuedToken, AppError> {
        // Check both fields unconditionally so the failure never says
        // which one was wrong.
        let user_ok = username == self.username;
        let pass_ok = password == self.password;
        if !user_ok || !pass_ok {
            return Err(AppError::InvalidCredentials);
        }

        let iat = now.and_utc().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            role: "admin".to_string(),
            iat,
            exp: iat + SESSION_TTL_HOURS * 3600,
        };

        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("claims encoding: {e}")))?,
        );
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at: claims.exp,
        })
    }

    fn verify(&self, token: &str, now: NaiveDateTime) -> Result<Claims, AppError> {
        let (payload, signature) = token.split_once('.').ok_or(AppError::InvalidToken)?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| AppError::InvalidToken)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AppError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| AppError::InvalidToken)?;

        if now.and_utc().timestamp() >= claims.exp {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn sessions() -> HmacSessions {
        HmacSessions::new(
            "test-secret".to_string(),
            "admin".to_string(),
            "hunter2".to_string(),
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let s = sessions();
        let now = dt("2025-07-01 09:00");
        let issued = s.issue("admin", "hunter2", now).unwrap();

        let claims = s.verify(&issued.token, now).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_HOURS * 3600);
    }

    #[test]
    fn test_wrong_password() {
        let s = sessions();
        let err = s.issue("admin", "letmein", dt("2025-07-01 09:00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn test_wrong_username_same_error() {
        let s = sessions();
        let err = s.issue("root", "hunter2", dt("2025-07-01 09:00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn test_expired_after_ttl() {
        let s = sessions();
        let now = dt("2025-07-01 09:00");
        let issued = s.issue("admin", "hunter2", now).unwrap();

        let just_before = now + Duration::hours(SESSION_TTL_HOURS) - Duration::seconds(1);
        assert!(s.verify(&issued.token, just_before).is_ok());

        let at_expiry = now + Duration::hours(SESSION_TTL_HOURS);
        assert!(matches!(
            s.verify(&issued.token, at_expiry).unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let s = sessions();
        let now = dt("2025-07-01 09:00");
        let issued = s.issue("admin", "hunter2", now).unwrap();

        let (_, signature) = issued.token.split_once('.').unwrap();
        let forged_claims = Claims {
            sub: "intruder".to_string(),
            role: "admin".to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert!(matches!(
            s.verify(&forged, now).unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let s = sessions();
        let now = dt("2025-07-01 09:00");
        for junk in ["", "abc", "a.b.c", "not-base64.!!!"] {
            assert!(matches!(
                s.verify(junk, now).unwrap_err(),
                AppError::InvalidToken
            ));
        }
    }

    #[test]
    fn test_signed_by_other_secret_rejected() {
        let a = sessions();
        let b = HmacSessions::new(
            "other-secret".to_string(),
            "admin".to_string(),
            "hunter2".to_string(),
        );
        let now = dt("2025-07-01 09:00");
        let issued = b.issue("admin", "hunter2", now).unwrap();
        assert!(matches!(
            a.verify(&issued.token, now).unwrap_err(),
            AppError::InvalidToken
        ));
    }
}
