use std::fmt;
use std::str::FromStr;

use crate::argon2id::Argon2idHasher;
use crate::bcrypt::BcryptHasher;
use crate::error::HasherError;
use crate::options::HasherOptions;
use crate::policy::VerificationOutcome;
use crate::scrypt::ScryptHasher;

/// The password hashing families this crate can produce and verify.
///
/// The set is closed: adding a family means extending this enum and
/// [`CredentialHasher`], not registering types at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Memory-hard Argon2id (PHC string format)
    Argon2id,
    /// bcrypt (modular-crypt string format)
    Bcrypt,
    /// scrypt (packed binary token format)
    Scrypt,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Argon2id => "argon2id",
            Algorithm::Bcrypt => "bcrypt",
            Algorithm::Scrypt => "scrypt",
        })
    }
}

impl FromStr for Algorithm {
    type Err = HasherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2id" => Ok(Algorithm::Argon2id),
            "bcrypt" => Ok(Algorithm::Bcrypt),
            "scrypt" => Ok(Algorithm::Scrypt),
            _ => Err(HasherError::InvalidConfiguration(format!(
                "unknown algorithm family: {s}"
            ))),
        }
    }
}

/// The capability interface every hashing family implements.
///
/// `user` is an opaque caller-side identifier. It is validated to be
/// non-empty but never mixed into the digest; two users hashing the same
/// password differ only by salt.
pub trait PasswordHasher {
    /// Hashes a plaintext password into a self-describing encoded string.
    ///
    /// The string embeds the family tag (or packed version marker), cost
    /// parameters, a fresh random salt, and the digest, so it can later be
    /// verified without any external parameter storage.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidArgument`] when `user` or `password` is empty;
    /// [`HasherError::Primitive`] when the underlying primitive fails.
    fn hash_password(&self, user: &str, password: &str) -> Result<String, HasherError>;

    /// Verifies a candidate password against a stored encoded hash.
    ///
    /// The digest is recomputed with the salt and parameters embedded in
    /// `stored`, never with the live configuration, so hashes issued under
    /// older parameters keep verifying after an upgrade. The live
    /// configuration only decides whether a matching hash is flagged as
    /// [`VerificationOutcome::SuccessRehashNeeded`].
    ///
    /// A stored hash that cannot be decoded is an expected operational
    /// condition and yields [`VerificationOutcome::Failed`], not an error.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidArgument`] when any argument is empty.
    fn verify_password(
        &self,
        user: &str,
        stored: &str,
        candidate: &str,
    ) -> Result<VerificationOutcome, HasherError>;

    /// Returns true when `stored` is undecodable by this family or was
    /// produced with weaker parameters than currently configured.
    fn needs_rehash(&self, stored: &str) -> bool;
}

/// A closed union over the three hashing families, dispatching the
/// [`PasswordHasher`] contract to the selected one.
///
/// ```
/// use passguard::{
///     Algorithm, CredentialHasher, HasherOptions, PasswordHasher, Strength, VerificationOutcome,
/// };
///
/// let options = HasherOptions::new(Strength::Custom)
///     .with_mem_limit(16 * 1024 * 1024)
///     .with_ops_limit(1)
///     .with_work_factor(4);
/// let hasher = CredentialHasher::new(Algorithm::Argon2id, &options).unwrap();
///
/// let stored = hasher.hash_password("alice", "hunter2").unwrap();
/// assert_eq!(
///     hasher.verify_password("alice", &stored, "hunter2").unwrap(),
///     VerificationOutcome::Success,
/// );
/// ```
pub enum CredentialHasher {
    /// Argon2id-backed hasher
    Argon2id(Argon2idHasher),
    /// bcrypt-backed hasher
    Bcrypt(BcryptHasher),
    /// scrypt-backed hasher
    Scrypt(ScryptHasher),
}

impl CredentialHasher {
    /// Builds the hasher for `algorithm`, validating `options` eagerly.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidConfiguration`] when the options carry
    /// out-of-range cost parameters for the selected family.
    pub fn new(algorithm: Algorithm, options: &HasherOptions) -> Result<Self, HasherError> {
        Ok(match algorithm {
            Algorithm::Argon2id => CredentialHasher::Argon2id(Argon2idHasher::new(options)?),
            Algorithm::Bcrypt => CredentialHasher::Bcrypt(BcryptHasher::new(options)?),
            Algorithm::Scrypt => CredentialHasher::Scrypt(ScryptHasher::new(options)?),
        })
    }

    /// The family this hasher dispatches to.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            CredentialHasher::Argon2id(_) => Algorithm::Argon2id,
            CredentialHasher::Bcrypt(_) => Algorithm::Bcrypt,
            CredentialHasher::Scrypt(_) => Algorithm::Scrypt,
        }
    }
}

impl PasswordHasher for CredentialHasher {
    fn hash_password(&self, user: &str, password: &str) -> Result<String, HasherError> {
        match self {
            CredentialHasher::Argon2id(h) => h.hash_password(user, password),
            CredentialHasher::Bcrypt(h) => h.hash_password(user, password),
            CredentialHasher::Scrypt(h) => h.hash_password(user, password),
        }
    }

    fn verify_password(
        &self,
        user: &str,
        stored: &str,
        candidate: &str,
    ) -> Result<VerificationOutcome, HasherError> {
        match self {
            CredentialHasher::Argon2id(h) => h.verify_password(user, stored, candidate),
            CredentialHasher::Bcrypt(h) => h.verify_password(user, stored, candidate),
            CredentialHasher::Scrypt(h) => h.verify_password(user, stored, candidate),
        }
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        match self {
            CredentialHasher::Argon2id(h) => h.needs_rehash(stored),
            CredentialHasher::Bcrypt(h) => h.needs_rehash(stored),
            CredentialHasher::Scrypt(h) => h.needs_rehash(stored),
        }
    }
}

pub(crate) fn require_nonempty(value: &str, what: &'static str) -> Result<(), HasherError> {
    if value.is_empty() {
        return Err(HasherError::InvalidArgument(what));
    }
    Ok(())
}

// Bitwise comparison over the entire length of both digests to prevent
// timing attacks; equality must not return early on the first mismatch.
pub(crate) fn digests_match(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() || left.is_empty() {
        return false;
    }

    let mut diff = 0u8;
    for (l, r) in left.iter().zip(right.iter()) {
        diff |= l ^ r;
    }

    diff == 0
}
