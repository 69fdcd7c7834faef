//! Platform access tokens for the browser-style voice SDK

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Content type the platform expects in the JWT header
const TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

/// Voice capabilities granted to a client
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceGrant {
    /// Voice-markup application dialled for outgoing calls
    pub outgoing_application_sid: String,
    pub incoming_allow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    pub jti: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceClaims,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceClaims {
    pub incoming: IncomingClaims,
    pub outgoing: OutgoingClaims,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomingClaims {
    pub allow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingClaims {
    pub application_sid: String,
}

/// Signs access tokens with an API key pair
pub struct AccessTokenIssuer {
    account_sid: String,
    api_key: String,
    encoding_key: EncodingKey,
    header: Header,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(account_sid: String, api_key: String, api_secret: String, ttl: Duration) -> Self {
        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(TOKEN_CONTENT_TYPE.to_string());

        Self {
            account_sid,
            api_key,
            encoding_key: EncodingKey::from_secret(api_secret.as_bytes()),
            header,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn claims(&self, identity: &str, grant: &VoiceGrant, now: DateTime<Utc>) -> AccessTokenClaims {
        let iat = now.timestamp();
        AccessTokenClaims {
            jti: format!("{}-{}", self.api_key, iat),
            iss: self.api_key.clone(),
            sub: self.account_sid.clone(),
            iat,
            exp: iat + self.ttl.as_secs() as i64,
            grants: Grants {
                identity: identity.to_string(),
                voice: VoiceClaims {
                    incoming: IncomingClaims {
                        allow: grant.incoming_allow,
                    },
                    outgoing: OutgoingClaims {
                        application_sid: grant.outgoing_application_sid.clone(),
                    },
                },
            },
        }
    }

    pub fn mint(
        &self,
        identity: &str,
        grant: &VoiceGrant,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&self.header, &self.claims(identity, grant, now), &self.encoding_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    fn issuer() -> AccessTokenIssuer {
        AccessTokenIssuer::new(
            "AC123".to_string(),
            "SK456".to_string(),
            "secret".to_string(),
            Duration::from_secs(3600),
        )
    }

    fn grant() -> VoiceGrant {
        VoiceGrant {
            outgoing_application_sid: "AP789".to_string(),
            incoming_allow: true,
        }
    }

    #[test]
    fn minted_token_verifies_with_the_api_secret() {
        let now = Utc::now();
        let token = issuer().mint("user_1", &grant(), now).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.cty.as_deref(), Some("twilio-fpa;v=1"));

        let data = decode::<AccessTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        let claims = data.claims;
        assert_eq!(claims.iss, "SK456");
        assert_eq!(claims.sub, "AC123");
        assert_eq!(claims.jti, format!("SK456-{}", now.timestamp()));
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.grants.identity, "user_1");
        assert_eq!(claims.grants.voice.outgoing.application_sid, "AP789");
        assert!(claims.grants.voice.incoming.allow);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issuer().mint("user_1", &grant(), Utc::now()).unwrap();
        let result = decode::<AccessTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }

    #[test]
    fn grants_serialize_in_platform_shape() {
        let claims = issuer().claims("user_1", &grant(), Utc::now());
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["grants"]["voice"]["outgoing"]["application_sid"], "AP789");
        assert_eq!(json["grants"]["voice"]["incoming"]["allow"], true);
        assert_eq!(json["grants"]["identity"], "user_1");
    }
}
