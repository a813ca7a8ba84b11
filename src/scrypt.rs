use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD_NO_PAD as b64_stdnopad;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::HasherError;
use crate::hasher::{digests_match, require_nonempty, PasswordHasher};
use crate::options::HasherOptions;
use crate::policy::{self, VerificationOutcome};

const VERSION_TAG: u8 = 1;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const BLOCK_SIZE: u32 = 8;
const PARALLELISM: u32 = 1;

// [version:1][log_n:1][r:4 BE][p:4 BE][salt:16][digest:..]
const HEADER_LEN: usize = 1 + 1 + 4 + 4 + SALT_LEN;

/// A decoded scrypt hash: the cost parameters, salt, and digest recovered
/// from the packed binary token format.
///
/// Unlike the other families this format is not a `$`-delimited string: the
/// version tag, parameters, salt, and digest are concatenated into one
/// binary layout and base64-encoded as a single token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScryptHash {
    pub(crate) log_n: u8,
    pub(crate) r: u32,
    pub(crate) p: u32,
    pub(crate) salt: [u8; SALT_LEN],
    pub(crate) digest: Vec<u8>,
}

impl ScryptHash {
    /// The log2(N) work factor embedded in the hash.
    pub fn log_n(&self) -> u8 {
        self.log_n
    }
}

impl fmt::Display for ScryptHash {
    /// Packs the version tag, parameters, salt, and digest into the binary
    /// layout and emits it as a single unpadded base64 token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut packed = Vec::with_capacity(HEADER_LEN + self.digest.len());
        packed.push(VERSION_TAG);
        packed.push(self.log_n);
        packed.extend_from_slice(&self.r.to_be_bytes());
        packed.extend_from_slice(&self.p.to_be_bytes());
        packed.extend_from_slice(&self.salt);
        packed.extend_from_slice(&self.digest);

        f.write_str(&b64_stdnopad.encode(packed))
    }
}

impl FromStr for ScryptHash {
    type Err = HasherError;

    /// Unpacks a base64 token back into parameters, salt, and digest. Pure
    /// parsing; no primitive is invoked.
    ///
    /// A token whose leading version byte is unrecognized is
    /// [`HasherError::UnsupportedRevision`]; everything else that does not
    /// fit the layout is [`HasherError::MalformedHash`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let packed = b64_stdnopad
            .decode(s)
            .map_err(|_| HasherError::MalformedHash("not a base64 token"))?;
        if packed.len() <= HEADER_LEN {
            return Err(HasherError::MalformedHash("token is too short"));
        }
        if packed[0] != VERSION_TAG {
            return Err(HasherError::UnsupportedRevision(format!(
                "scrypt layout version {}",
                packed[0]
            )));
        }

        let log_n = packed[1];
        let r = u32::from_be_bytes([packed[2], packed[3], packed[4], packed[5]]);
        let p = u32::from_be_bytes([packed[6], packed[7], packed[8], packed[9]]);
        let salt: [u8; SALT_LEN] = packed[10..HEADER_LEN]
            .try_into()
            .map_err(|_| HasherError::MalformedHash("salt has the wrong length"))?;
        let digest = packed[HEADER_LEN..].to_vec();

        Ok(Self {
            log_n,
            r,
            p,
            salt,
            digest,
        })
    }
}

fn compute_digest(
    log_n: u8,
    r: u32,
    p: u32,
    password: &[u8],
    salt: &[u8],
    digest_len: usize,
) -> Result<Vec<u8>, HasherError> {
    let params = ::scrypt::Params::new(log_n, r, p, digest_len)
        .map_err(|e| HasherError::Primitive(e.to_string()))?;
    let mut digest = vec![0u8; digest_len];
    ::scrypt::scrypt(password, salt, &params, &mut digest)
        .map_err(|e| HasherError::Primitive(e.to_string()))?;
    Ok(digest)
}

/// Hashes and verifies passwords with scrypt.
pub struct ScryptHasher {
    log_n: u8,
}

impl ScryptHasher {
    /// Builds a hasher from `options`, resolving the strength tier to a
    /// log2(N) work factor and proving the primitive accepts it.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidConfiguration`] when the resolved work factor
    /// is out of range.
    pub fn new(options: &HasherOptions) -> Result<Self, HasherError> {
        let log_n = options.scrypt_log_n()?;
        ::scrypt::Params::new(log_n, BLOCK_SIZE, PARALLELISM, DIGEST_LEN)
            .map_err(|e| HasherError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { log_n })
    }
}

impl PasswordHasher for ScryptHasher {
    fn hash_password(&self, user: &str, password: &str) -> Result<String, HasherError> {
        require_nonempty(user, "user")?;
        require_nonempty(password, "password")?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = compute_digest(
            self.log_n,
            BLOCK_SIZE,
            PARALLELISM,
            password.as_bytes(),
            &salt,
            DIGEST_LEN,
        )?;

        Ok(ScryptHash {
            log_n: self.log_n,
            r: BLOCK_SIZE,
            p: PARALLELISM,
            salt,
            digest,
        }
        .to_string())
    }

    fn verify_password(
        &self,
        user: &str,
        stored: &str,
        candidate: &str,
    ) -> Result<VerificationOutcome, HasherError> {
        require_nonempty(user, "user")?;
        require_nonempty(stored, "stored hash")?;
        require_nonempty(candidate, "password")?;

        let decoded = match ScryptHash::from_str(stored) {
            Ok(decoded) => decoded,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };

        // Recompute with the parameters embedded in the stored token so
        // hashes issued under an older work factor keep verifying.
        let recomputed = match compute_digest(
            decoded.log_n,
            decoded.r,
            decoded.p,
            candidate.as_bytes(),
            &decoded.salt,
            decoded.digest.len(),
        ) {
            Ok(digest) => digest,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };

        if !digests_match(&recomputed, &decoded.digest) {
            return Ok(VerificationOutcome::Failed);
        }

        if policy::scrypt_needs_rehash(self.log_n, decoded.log_n) {
            Ok(VerificationOutcome::SuccessRehashNeeded)
        } else {
            Ok(VerificationOutcome::Success)
        }
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        match ScryptHash::from_str(stored) {
            Ok(decoded) => policy::scrypt_needs_rehash(self.log_n, decoded.log_n),
            Err(_) => true,
        }
    }
}
