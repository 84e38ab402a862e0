/// Password hashing and verification using Argon2id
///
/// Used for both user passwords and refresh-token hashes:
/// - Algorithm: Argon2id (memory-hard, resistant to GPU attacks)
/// - Default cost: 64 MB memory, 3 iterations, 4 lanes (tunable via `PasswordConfig`)
/// - Salt: 16 bytes random, embedded in the PHC string
/// - Comparison: delegated to the argon2 verifier
///
/// Hashing is CPU-bound; async callers go through `hash_blocking` /
/// `verify_blocking`, which run on tokio's blocking pool.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use quill_core::PasswordSettings;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Password hashing configuration
///
/// Increasing memory or iterations improves brute-force resistance but slows
/// down every login, registration and token refresh.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&PasswordSettings::default())
    }
}

impl From<&PasswordSettings> for PasswordConfig {
    fn from(settings: &PasswordSettings) -> Self {
        Self {
            memory_cost: settings.memory_cost_kib,
            time_cost: settings.time_cost,
            parallelism: settings.parallelism,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext secret with the given configuration
///
/// Returns a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
/// which carries everything `verify_password` needs.
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext secret against a stored hash
///
/// * `Ok(true)` - matches
/// * `Ok(false)` - does not match
/// * `Err(PasswordError)` - the stored hash is malformed or the verifier failed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Cost parameters are read from the PHC string
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// `hash_password_with_config` on the blocking thread pool
pub async fn hash_blocking(
    password: String,
    config: PasswordConfig,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
        .await
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
}

/// `verify_password` on the blocking thread pool
pub async fn verify_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerificationFailed(e.to_string()))?
}
