use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::HasherError;
use crate::hasher::{digests_match, require_nonempty, PasswordHasher};
use crate::options::{HasherOptions, SaltRevision};
use crate::policy::{self, VerificationOutcome};

const SALT_LEN: usize = 16;
// bcrypt's digest is truncated to 23 bytes by every mainstream
// implementation; 16 salt bytes encode to 22 characters and 23 digest bytes
// to 31 in the bcrypt alphabet.
const SALT_B64_LEN: usize = 22;
const DIGEST_B64_LEN: usize = 31;

// The 22-character salt carries 132 bits for 128 bits of salt, so the
// decoder must tolerate non-zero trailing bits.
const B64_BCRYPT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// A decoded bcrypt hash: the revision tag, cost, salt, and digest recovered
/// from a modular-crypt-formatted hash string.
///
/// A hash string looks something like this:
///
/// _$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW_
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BcryptHash {
    pub(crate) revision: SaltRevision,
    pub(crate) cost: u8,
    pub(crate) salt: [u8; SALT_LEN],
    pub(crate) digest: Vec<u8>,
}

impl BcryptHash {
    /// The revision tag embedded in the hash.
    pub fn revision(&self) -> SaltRevision {
        self.revision
    }

    /// The work factor embedded in the hash.
    pub fn cost(&self) -> u8 {
        self.cost
    }
}

impl fmt::Display for BcryptHash {
    /// Encodes the revision, cost, salt, and digest into the modular-crypt
    /// format: `$<rev>$<cost>$<22-char salt><31-char digest>`, with the cost
    /// zero-padded to two digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}${:02}${}{}",
            self.revision.tag(),
            self.cost,
            B64_BCRYPT.encode(self.salt),
            B64_BCRYPT.encode(&self.digest),
        )
    }
}

impl FromStr for BcryptHash {
    type Err = HasherError;

    /// Decodes a modular-crypt-formatted bcrypt hash string back into its
    /// parts. Pure parsing; no primitive is invoked.
    ///
    /// A `$2<x>$` tag outside the known revision set is
    /// [`HasherError::UnsupportedRevision`]; anything not shaped like a
    /// bcrypt hash is [`HasherError::MalformedHash`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('$')
            .ok_or(HasherError::MalformedHash("must begin with a $2 revision tag"))?;
        let mut segments = rest.split('$');

        let tag = segments
            .next()
            .ok_or(HasherError::MalformedHash("must begin with a $2 revision tag"))?;
        if !tag.starts_with('2') {
            return Err(HasherError::MalformedHash("not a bcrypt hash"));
        }
        let revision = SaltRevision::from_tag(tag)
            .ok_or_else(|| HasherError::UnsupportedRevision(format!("bcrypt revision {tag}")))?;

        let cost_segment = segments
            .next()
            .ok_or(HasherError::MalformedHash("missing cost segment"))?;
        if cost_segment.len() != 2 || !cost_segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HasherError::MalformedHash("cost must be two digits"));
        }
        let cost: u8 = cost_segment
            .parse()
            .map_err(|_| HasherError::MalformedHash("invalid cost"))?;
        if !(4..=31).contains(&cost) {
            return Err(HasherError::MalformedHash("cost out of range"));
        }

        let body = segments
            .next()
            .ok_or(HasherError::MalformedHash("missing salt and digest"))?;
        if segments.next().is_some() {
            return Err(HasherError::MalformedHash("trailing segments after digest"));
        }
        // Length is checked in bytes, so reject non-ASCII input before
        // slicing at fixed offsets.
        if !body.is_ascii() || body.len() != SALT_B64_LEN + DIGEST_B64_LEN {
            return Err(HasherError::MalformedHash("salt and digest have the wrong length"));
        }

        let salt: [u8; SALT_LEN] = B64_BCRYPT
            .decode(&body[..SALT_B64_LEN])
            .map_err(|_| HasherError::MalformedHash("invalid character in salt"))?
            .try_into()
            .map_err(|_| HasherError::MalformedHash("salt has the wrong length"))?;
        let digest = B64_BCRYPT
            .decode(&body[SALT_B64_LEN..])
            .map_err(|_| HasherError::MalformedHash("invalid character in digest"))?;

        Ok(Self {
            revision,
            cost,
            salt,
            digest,
        })
    }
}

// The revision tag is a format marker only; the digest computation is the
// same for every tag this crate emits.
fn compute_digest(password: &str, cost: u8, salt: [u8; SALT_LEN]) -> Result<Vec<u8>, HasherError> {
    let parts = ::bcrypt::hash_with_salt(password, u32::from(cost), salt)
        .map_err(|e| HasherError::Primitive(e.to_string()))?;
    let encoded = parts.format_for_version(::bcrypt::Version::TwoB);
    let digest_b64 = &encoded[encoded.len() - DIGEST_B64_LEN..];
    B64_BCRYPT
        .decode(digest_b64)
        .map_err(|e| HasherError::Primitive(e.to_string()))
}

/// Hashes and verifies passwords with bcrypt.
pub struct BcryptHasher {
    cost: u8,
    revision: SaltRevision,
}

impl BcryptHasher {
    /// Builds a hasher from `options`, resolving the strength tier to a
    /// work factor and taking the configured salt revision for new hashes.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidConfiguration`] when the resolved work factor
    /// is out of range.
    pub fn new(options: &HasherOptions) -> Result<Self, HasherError> {
        Ok(Self {
            cost: options.bcrypt_cost()?,
            revision: options.salt_revision(),
        })
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, user: &str, password: &str) -> Result<String, HasherError> {
        require_nonempty(user, "user")?;
        require_nonempty(password, "password")?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = compute_digest(password, self.cost, salt)?;

        Ok(BcryptHash {
            revision: self.revision,
            cost: self.cost,
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

        let decoded = match BcryptHash::from_str(stored) {
            Ok(decoded) => decoded,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };

        // Recompute with the cost and salt embedded in the stored hash so
        // hashes issued under an older work factor keep verifying.
        let recomputed = match compute_digest(candidate, decoded.cost, decoded.salt) {
            Ok(digest) => digest,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };

        if !digests_match(&recomputed, &decoded.digest) {
            return Ok(VerificationOutcome::Failed);
        }

        if policy::bcrypt_needs_rehash(self.cost, self.revision, decoded.cost, decoded.revision) {
            Ok(VerificationOutcome::SuccessRehashNeeded)
        } else {
            Ok(VerificationOutcome::Success)
        }
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        match BcryptHash::from_str(stored) {
            Ok(decoded) => {
                policy::bcrypt_needs_rehash(self.cost, self.revision, decoded.cost, decoded.revision)
            }
            Err(_) => true,
        }
    }
}
