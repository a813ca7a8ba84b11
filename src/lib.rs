#![deny(missing_docs)]

//! A library for hashing and verifying user-credential passwords without
//! binding callers to a single algorithm. Passwords are hashed into
//! self-describing encoded strings that embed the algorithm family, cost
//! parameters, salt, and digest, so a stored hash can be verified later
//! without any external parameter storage — even after the configured
//! parameters have changed.
//!
//! Three families are supported behind one capability interface:
//! [Argon2id](https://en.wikipedia.org/wiki/Argon2) (memory-hard, the
//! recommended default), [bcrypt](https://en.wikipedia.org/wiki/Bcrypt), and
//! [scrypt](https://en.wikipedia.org/wiki/Scrypt). The underlying primitives
//! come from the `argon2`, `bcrypt`, and `scrypt` crates; this crate
//! provides the parameter profiles, the encoded-hash codecs, and the
//! verification policy around them.
//!
//! Verification distinguishes three outcomes: a wrong password (or an
//! undecodable stored hash) fails, a match under up-to-date parameters
//! succeeds, and a match against a hash produced with weaker-than-current
//! parameters succeeds while signaling that the caller should re-hash and
//! re-store the password. This keeps old credentials verifiable across
//! configuration upgrades while migrating them forward on login.
//!
//! # Examples
//!
//! Hash a password with a strength tier, then verify it:
//!
//! ```rust
//! use passguard::{
//!     Algorithm, CredentialHasher, HasherOptions, PasswordHasher, Strength, VerificationOutcome,
//! };
//!
//! let options = HasherOptions::new(Strength::Interactive);
//! let hasher = CredentialHasher::new(Algorithm::Argon2id, &options).unwrap();
//!
//! let stored = hasher.hash_password("alice", "correct horse battery staple").unwrap();
//! assert!(stored.starts_with("$argon2id$"));
//!
//! let outcome = hasher
//!     .verify_password("alice", &stored, "correct horse battery staple")
//!     .unwrap();
//! assert_eq!(outcome, VerificationOutcome::Success);
//! ```
//!
//! Supply explicit cost parameters instead of a tier:
//!
//! ```rust
//! use passguard::{
//!     Algorithm, CredentialHasher, HasherOptions, PasswordHasher, Strength, VerificationOutcome,
//! };
//!
//! let options = HasherOptions::new(Strength::Custom)
//!     .with_mem_limit(32 * 1024 * 1024)
//!     .with_ops_limit(2);
//! let hasher = CredentialHasher::new(Algorithm::Argon2id, &options).unwrap();
//!
//! let stored = hasher.hash_password("alice", "hunter2").unwrap();
//! assert_eq!(
//!     hasher.verify_password("alice", &stored, "wrong").unwrap(),
//!     VerificationOutcome::Failed,
//! );
//! ```
//!
//! Detect hashes that should be regenerated after raising the configured
//! strength:
//!
//! ```rust
//! use passguard::{
//!     Algorithm, CredentialHasher, HasherOptions, PasswordHasher, Strength, VerificationOutcome,
//! };
//!
//! let weak = HasherOptions::new(Strength::Custom)
//!     .with_work_factor(4);
//! let stored = CredentialHasher::new(Algorithm::Bcrypt, &weak)
//!     .unwrap()
//!     .hash_password("alice", "hunter2")
//!     .unwrap();
//!
//! let strong = HasherOptions::new(Strength::Custom).with_work_factor(6);
//! let hasher = CredentialHasher::new(Algorithm::Bcrypt, &strong).unwrap();
//!
//! // The old hash still verifies, but the caller is told to re-hash.
//! assert_eq!(
//!     hasher.verify_password("alice", &stored, "hunter2").unwrap(),
//!     VerificationOutcome::SuccessRehashNeeded,
//! );
//! assert!(hasher.needs_rehash(&stored));
//! ```
//!
//! Hashing and verification are synchronous and deliberately expensive;
//! callers needing bounded latency should wrap calls in their own timeout
//! or move them off latency-sensitive threads.

mod argon2id;
mod bcrypt;
mod error;
mod hasher;
mod options;
mod policy;
mod scrypt;

pub use crate::argon2id::{Argon2Hash, Argon2idHasher};
pub use crate::bcrypt::{BcryptHash, BcryptHasher};
pub use crate::error::HasherError;
pub use crate::hasher::{Algorithm, CredentialHasher, PasswordHasher};
pub use crate::options::{HasherOptions, SaltRevision, Strength};
pub use crate::policy::VerificationOutcome;
pub use crate::scrypt::{ScryptHash, ScryptHasher};
