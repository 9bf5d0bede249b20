use crate::constants::*;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub geocode_cache_ttl: u64,
    pub static_dir: Option<String>,
    pub geocoding: GeocodingConfig,
    pub fares: FarePolicy,
    pub auth: AuthConfig,
}

/// Pricing and travel-time coefficients for computed fares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarePolicy {
    /// Flat component charged on every journey
    pub base_fare: f64,
    /// Charged per kilometer of the shortest path
    pub per_km_rate: f64,
    /// Used to turn distance into an estimated travel time
    pub average_speed_kmh: f64,
}

impl Default for FarePolicy {
    fn default() -> Self {
        Self {
            base_fare: DEFAULT_BASE_FARE,
            per_km_rate: DEFAULT_PER_KM_RATE,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl FarePolicy {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let policy = Self {
            base_fare: env::var("BASE_FARE")
                .unwrap_or_else(|_| defaults.base_fare.to_string())
                .parse()
                .map_err(|_| "Invalid BASE_FARE")?,

            per_km_rate: env::var("PER_KM_RATE")
                .unwrap_or_else(|_| defaults.per_km_rate.to_string())
                .parse()
                .map_err(|_| "Invalid PER_KM_RATE")?,

            average_speed_kmh: env::var("AVERAGE_SPEED_KMH")
                .unwrap_or_else(|_| defaults.average_speed_kmh.to_string())
                .parse()
                .map_err(|_| "Invalid AVERAGE_SPEED_KMH")?,
        };

        policy.validate()?;
        Ok(policy)
    }

    /// Rejects NaN and infinite coefficients along with out-of-range ones.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = |x: f64| x.is_finite() && x >= 0.0;
        if !non_negative(self.base_fare) || !non_negative(self.per_km_rate) {
            return Err("BASE_FARE and PER_KM_RATE must be finite and not negative".to_string());
        }
        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err("AVERAGE_SPEED_KMH must be a finite positive number".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub nominatim_base_url: String,
    pub google_api_key: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nominatim_base_url: DEFAULT_NOMINATIM_BASE_URL.to_string(),
            google_api_key: None,
        }
    }
}

impl GeocodingConfig {
    pub fn from_env() -> Result<Self, String> {
        let enabled = env::var("GEOCODING_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| "Invalid GEOCODING_ENABLED (use true or false)")?;

        Ok(Self {
            enabled,
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_BASE_URL.to_string()),
            google_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
        })
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    /// bcrypt hash of the admin password
    pub admin_password_hash: String,
    pub jwt_secret: String,
    pub token_ttl_seconds: u64,
}

// Keep secrets out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_password_hash", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, String> {
        let admin_password_hash = match env::var("ADMIN_PASSWORD_HASH") {
            Ok(hash) if !hash.trim().is_empty() => hash.trim().to_string(),
            _ => {
                let password = env::var("ADMIN_PASSWORD")
                    .map_err(|_| "ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be set")?;
                if password.trim().is_empty() {
                    return Err("ADMIN_PASSWORD must not be empty".to_string());
                }
                tracing::warn!(
                    "ADMIN_PASSWORD is set in plaintext; prefer ADMIN_PASSWORD_HASH (bcrypt)"
                );
                bcrypt::hash(password.trim(), bcrypt::DEFAULT_COST)
                    .map_err(|e| format!("Failed to hash ADMIN_PASSWORD: {}", e))?
            }
        };

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set")?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            ));
        }

        let token_ttl_seconds = env::var("ADMIN_TOKEN_TTL")
            .unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN_TTL_SECONDS.to_string())
            .parse()
            .map_err(|_| "Invalid ADMIN_TOKEN_TTL")?;

        Ok(Self {
            admin_password_hash,
            jwt_secret,
            token_ttl_seconds,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            database_url: env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL").ok(),
            geocode_cache_ttl: env::var("GEOCODE_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_GEOCODE_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid GEOCODE_CACHE_TTL")?,
            static_dir: env::var("STATIC_DIR").ok().filter(|d| !d.is_empty()),
            geocoding: GeocodingConfig::from_env()?,
            fares: FarePolicy::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_policy_defaults_match_constants() {
        let policy = FarePolicy::default();
        assert_eq!(policy.base_fare, 10.0);
        assert_eq!(policy.per_km_rate, 0.5);
        assert_eq!(policy.average_speed_kmh, 60.0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn fare_policy_rejects_non_finite_values() {
        // "NaN" and "inf" both parse as f64
        let nan: f64 = "NaN".parse().unwrap();
        let inf: f64 = "inf".parse().unwrap();
        let defaults = FarePolicy::default();

        for policy in [
            FarePolicy { base_fare: nan, ..defaults },
            FarePolicy { per_km_rate: nan, ..defaults },
            FarePolicy { per_km_rate: inf, ..defaults },
            FarePolicy { average_speed_kmh: nan, ..defaults },
            FarePolicy { average_speed_kmh: inf, ..defaults },
            FarePolicy { base_fare: -1.0, ..defaults },
            FarePolicy { average_speed_kmh: 0.0, ..defaults },
        ] {
            assert!(policy.validate().is_err(), "{:?}", policy);
        }
    }

    #[test]
    fn auth_config_debug_redacts_secrets() {
        let auth = AuthConfig {
            admin_password_hash: "$2b$04$abcdef".to_string(),
            jwt_secret: "super-secret-value-that-is-long-enough".to_string(),
            token_ttl_seconds: 60,
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("$2b$"));
        assert!(rendered.contains("60"));
    }
}
