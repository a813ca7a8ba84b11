use std::fmt;
use std::str::FromStr;

use argon2::{Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD as b64_stdnopad;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::HasherError;
use crate::hasher::{digests_match, require_nonempty, PasswordHasher};
use crate::options::HasherOptions;
use crate::policy::{self, VerificationOutcome};

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
// Fixed lane count; memory is the knob worth turning for this family.
const PARALLELISM: u32 = 1;

/// A decoded Argon2id hash: the version, cost parameters, salt, and digest
/// recovered from a PHC-formatted hash string.
///
/// A hash string looks something like this:
///
/// _$argon2id$v=19$m=65536,t=2,p=1$AQIDBAUGBwg$ypJ3pKxN4aWGkwMv0TOb08OIzwrfK1SZWy64vyTLKo8_
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argon2Hash {
    pub(crate) version: u32,
    pub(crate) mem_cost_kib: u32,
    pub(crate) iterations: u32,
    pub(crate) parallelism: u32,
    pub(crate) salt: Vec<u8>,
    pub(crate) digest: Vec<u8>,
}

impl Argon2Hash {
    /// The memory cost, in KiB, embedded in the hash.
    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    /// The pass count embedded in the hash.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl fmt::Display for Argon2Hash {
    /// Encodes the parameters, salt, and digest into the PHC string format
    /// shared by most Argon2 implementations. Pure formatting; the salt and
    /// digest are emitted as unpadded standard base64.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "$argon2id$v={}$m={},t={},p={}${}${}",
            self.version,
            self.mem_cost_kib,
            self.iterations,
            self.parallelism,
            b64_stdnopad.encode(&self.salt),
            b64_stdnopad.encode(&self.digest),
        )
    }
}

impl FromStr for Argon2Hash {
    type Err = HasherError;

    /// Decodes a PHC-formatted Argon2id hash string back into its parts.
    ///
    /// Pure parsing; no primitive is invoked. The `m`, `t`, and `p`
    /// parameters are accepted in any order, but each must appear exactly
    /// once. Version tags other than 19 (and the legacy 16) are rejected as
    /// [`HasherError::UnsupportedRevision`]; every structural mismatch is
    /// [`HasherError::MalformedHash`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('$')
            .ok_or(HasherError::MalformedHash("must begin with $argon2id"))?;
        let mut segments = rest.split('$');

        if segments.next() != Some("argon2id") {
            return Err(HasherError::MalformedHash("must begin with $argon2id"));
        }

        let version: u32 = segments
            .next()
            .and_then(|seg| seg.strip_prefix("v="))
            .ok_or(HasherError::MalformedHash("missing algorithm version"))?
            .parse()
            .map_err(|_| HasherError::MalformedHash("invalid version"))?;
        if Version::try_from(version).is_err() {
            return Err(HasherError::UnsupportedRevision(format!(
                "argon2 version {version}"
            )));
        }

        let params = segments
            .next()
            .ok_or(HasherError::MalformedHash("missing cost parameters"))?;
        let (mut m, mut t, mut p) = (None, None, None);
        for pair in params.split(',') {
            let (key, value) = pair
                .split_once('=')
                .ok_or(HasherError::MalformedHash("cost parameter is not key=value"))?;
            let slot = match key {
                "m" => &mut m,
                "t" => &mut t,
                "p" => &mut p,
                _ => return Err(HasherError::MalformedHash("unrecognized cost parameter")),
            };
            if slot.is_some() {
                return Err(HasherError::MalformedHash("duplicate cost parameter"));
            }
            *slot = Some(
                value
                    .parse::<u32>()
                    .map_err(|_| HasherError::MalformedHash("invalid cost parameter value"))?,
            );
        }
        let mem_cost_kib = m.ok_or(HasherError::MalformedHash("missing 'm' parameter"))?;
        let iterations = t.ok_or(HasherError::MalformedHash("missing 't' parameter"))?;
        let parallelism = p.ok_or(HasherError::MalformedHash("missing 'p' parameter"))?;

        let b64_salt = segments
            .next()
            .ok_or(HasherError::MalformedHash("missing salt"))?;
        let b64_digest = segments
            .next()
            .ok_or(HasherError::MalformedHash("missing digest after salt"))?;
        if segments.next().is_some() {
            return Err(HasherError::MalformedHash("trailing segments after digest"));
        }
        if b64_salt.is_empty() || b64_digest.is_empty() {
            return Err(HasherError::MalformedHash("empty salt or digest"));
        }

        let salt = b64_stdnopad
            .decode(b64_salt)
            .map_err(|_| HasherError::MalformedHash("invalid character in base64-encoded salt"))?;
        let digest = b64_stdnopad
            .decode(b64_digest)
            .map_err(|_| HasherError::MalformedHash("invalid character in base64-encoded digest"))?;

        Ok(Self {
            version,
            mem_cost_kib,
            iterations,
            parallelism,
            salt,
            digest,
        })
    }
}

/// Hashes and verifies passwords with Argon2id.
///
/// Construction validates the supplied options eagerly; hashing itself can
/// only fail on arguments or a primitive malfunction, never on
/// configuration.
pub struct Argon2idHasher {
    mem_cost_kib: u32,
    iterations: u32,
}

impl Argon2idHasher {
    /// Builds a hasher from `options`, resolving the strength tier to
    /// concrete memory and pass limits and proving the primitive accepts
    /// them.
    ///
    /// # Errors
    ///
    /// [`HasherError::InvalidConfiguration`] when the resolved limits are
    /// out of range.
    pub fn new(options: &HasherOptions) -> Result<Self, HasherError> {
        let (mem_cost_kib, iterations) = options.argon2_cost()?;
        Params::new(mem_cost_kib, iterations, PARALLELISM, Some(DIGEST_LEN))
            .map_err(|e| HasherError::InvalidConfiguration(e.to_string()))?;
        Ok(Self {
            mem_cost_kib,
            iterations,
        })
    }
}

fn compute_digest(
    version: Version,
    mem_cost_kib: u32,
    iterations: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    digest_len: usize,
) -> Result<Vec<u8>, argon2::Error> {
    let params = Params::new(mem_cost_kib, iterations, parallelism, Some(digest_len))?;
    let ctx = Argon2::new(argon2::Algorithm::Argon2id, version, params);
    let mut digest = vec![0u8; digest_len];
    ctx.hash_password_into(password, salt, &mut digest)?;
    Ok(digest)
}

impl PasswordHasher for Argon2idHasher {
    fn hash_password(&self, user: &str, password: &str) -> Result<String, HasherError> {
        require_nonempty(user, "user")?;
        require_nonempty(password, "password")?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = compute_digest(
            Version::V0x13,
            self.mem_cost_kib,
            self.iterations,
            PARALLELISM,
            password.as_bytes(),
            &salt,
            DIGEST_LEN,
        )
        .map_err(|e| HasherError::Primitive(e.to_string()))?;

        Ok(Argon2Hash {
            version: Version::V0x13 as u32,
            mem_cost_kib: self.mem_cost_kib,
            iterations: self.iterations,
            parallelism: PARALLELISM,
            salt: salt.to_vec(),
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

        // A corrupted or foreign-format stored hash is an operational
        // condition, indistinguishable from a wrong password to the caller.
        let decoded = match Argon2Hash::from_str(stored) {
            Ok(decoded) => decoded,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };
        let version = match Version::try_from(decoded.version) {
            Ok(version) => version,
            Err(_) => return Ok(VerificationOutcome::Failed),
        };

        // The digest must be recomputed with the parameters embedded in the
        // stored hash, not the live configuration, or hashes issued before a
        // configuration change would stop verifying.
        let recomputed = match compute_digest(
            version,
            decoded.mem_cost_kib,
            decoded.iterations,
            decoded.parallelism,
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

        if policy::argon2_needs_rehash(
            self.mem_cost_kib,
            self.iterations,
            decoded.mem_cost_kib,
            decoded.iterations,
        ) {
            Ok(VerificationOutcome::SuccessRehashNeeded)
        } else {
            Ok(VerificationOutcome::Success)
        }
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        match Argon2Hash::from_str(stored) {
            Ok(decoded) => policy::argon2_needs_rehash(
                self.mem_cost_kib,
                self.iterations,
                decoded.mem_cost_kib,
                decoded.iterations,
            ),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_parts_into_hash_string() {
        let hash = Argon2Hash {
            version: 19,
            mem_cost_kib: 128,
            iterations: 3,
            parallelism: 2,
            salt: vec![1, 2, 3, 4, 5, 6, 7, 8],
            digest: b64_stdnopad
                .decode("ypJ3pKxN4aWGkwMv0TOb08OIzwrfK1SZWy64vyTLKo8")
                .unwrap(),
        };

        assert_eq!(
            hash.to_string(),
            "$argon2id$v=19$m=128,t=3,p=2$AQIDBAUGBwg$ypJ3pKxN4aWGkwMv0TOb08OIzwrfK1SZWy64vyTLKo8"
        );
    }

    #[test]
    fn test_hash_from_str_accepts_permuted_parameters() {
        for s in [
            "$argon2id$v=19$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            "$argon2id$v=19$t=3,m=128,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            "$argon2id$v=19$p=2,m=128,t=3$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            "$argon2id$v=19$t=3,p=2,m=128$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
        ] {
            let hash = Argon2Hash::from_str(s).unwrap();

            assert_eq!(hash.version, 19);
            assert_eq!(hash.mem_cost_kib, 128);
            assert_eq!(hash.iterations, 3);
            assert_eq!(hash.parallelism, 2);
            assert_eq!(hash.salt, b64_stdnopad.decode("AQIDBAUGBwg").unwrap());
            assert_eq!(
                hash.digest,
                b64_stdnopad
                    .decode("7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc")
                    .unwrap()
            );
        }
    }

    #[test]
    fn test_invalid_hash_from_str() {
        for s in [
            // Trailing comma in the parameter list.
            "$argon2id$v=19$m=128,t=3,p=2,$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Duplicate parameter.
            "$argon2id$v=19$t=3,m=128,p=2,m=128$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing separator between parameters.
            "$argon2id$v=19$p=2m=128,t=3$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing version segment.
            "$argon2id$t=3,p=2,m=128$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Other argon2 variants are a different family, not a revision.
            "$argon2$v=19$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            "$argon2i$v=19$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing '$' before the salt.
            "$argon2id$v=19$m=128,t=3,p=2AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // No leading '$'.
            "argon2id$v=19$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Parameter without '='.
            "$argon2id$v=19$m=128,t3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing digest segment.
            "$argon2id$v=19$m=128,t=3,p=2$AQIDBAUGBwg7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Trailing '$'.
            "$argon2id$v=19$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc$",
            // Empty salt and digest.
            "$argon2id$v=19$m=128,t=3,p=2$$",
            // Missing 't' parameter.
            "$argon2id$v=19$m=128,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing 'm' parameter.
            "$argon2id$v=19$t=2,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Missing 'p' parameter.
            "$argon2id$v=19$t=2,m=128$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
            // Not remotely a hash.
            "",
            "not-a-valid-hash",
        ] {
            assert!(
                matches!(Argon2Hash::from_str(s), Err(HasherError::MalformedHash(_))),
                "accepted: {s}"
            );
        }
    }

    #[test]
    fn test_unsupported_version_from_str() {
        let err = Argon2Hash::from_str(
            "$argon2id$v=18$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
        )
        .unwrap_err();
        assert!(matches!(err, HasherError::UnsupportedRevision(_)));

        // The legacy 0x10 version still decodes.
        let hash = Argon2Hash::from_str(
            "$argon2id$v=16$m=128,t=3,p=2$AQIDBAUGBwg$7OU7S/azjYpnXXySR52cFWeisxk1VVjNeXqtQ8ZM/Oc",
        )
        .unwrap();
        assert_eq!(hash.version, 16);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let hash = Argon2Hash {
            version: 19,
            mem_cost_kib: 65536,
            iterations: 2,
            parallelism: 1,
            salt: (0u8..16).collect(),
            digest: (100u8..132).collect(),
        };

        assert_eq!(Argon2Hash::from_str(&hash.to_string()).unwrap(), hash);
    }
}
