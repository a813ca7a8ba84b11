use std::fmt;

use crate::error::HasherError;

// libsodium argon2id13 presets, in bytes and passes.
const ARGON2_MEM_INTERACTIVE: u64 = 67_108_864;
const ARGON2_MEM_MODERATE: u64 = 268_435_456;
const ARGON2_MEM_SENSITIVE: u64 = 1_073_741_824;
const ARGON2_OPS_INTERACTIVE: u64 = 2;
const ARGON2_OPS_MODERATE: u64 = 3;
const ARGON2_OPS_SENSITIVE: u64 = 4;

const BCRYPT_COST_INTERACTIVE: u8 = 10;
const BCRYPT_COST_MODERATE: u8 = 12;
const BCRYPT_COST_SENSITIVE: u8 = 14;

const SCRYPT_LOG_N_INTERACTIVE: u8 = 14;
const SCRYPT_LOG_N_MODERATE: u8 = 16;
const SCRYPT_LOG_N_SENSITIVE: u8 = 18;

// The bcrypt primitive rejects work factors below 4, so the floor here is 4
// rather than the 3 the scrypt family accepts.
const BCRYPT_COST_MIN: u8 = 4;
const BCRYPT_COST_MAX: u8 = 31;
const SCRYPT_LOG_N_MIN: u8 = 3;
const SCRYPT_LOG_N_MAX: u8 = 31;

/// Named cost presets, ordered by increasing expense.
///
/// `Interactive` targets online logins, `Moderate` and `Sensitive` trade
/// latency for resistance to offline cracking. `Custom` bypasses the preset
/// lookup entirely; the numeric fields the target family consumes must then
/// be supplied explicitly on [`HasherOptions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strength {
    /// Suitable for interactive logins (cheapest preset)
    Interactive,
    /// Middle ground between login latency and cracking resistance
    Moderate,
    /// For credentials guarding high-value targets (most expensive preset)
    Sensitive,
    /// Explicitly supplied numeric parameters; no preset lookup
    Custom,
}

/// bcrypt format revision tags affecting the leading marker of an encoded
/// hash (`$2$`, `$2a$`, `$2b$`, `$2x$`, `$2y$`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaltRevision {
    /// Original `$2$` format
    Revision2,
    /// `$2a$`
    Revision2A,
    /// `$2b$` (the modern OpenBSD tag, default)
    Revision2B,
    /// `$2x$`
    Revision2X,
    /// `$2y$`
    Revision2Y,
}

impl SaltRevision {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            SaltRevision::Revision2 => "2",
            SaltRevision::Revision2A => "2a",
            SaltRevision::Revision2B => "2b",
            SaltRevision::Revision2X => "2x",
            SaltRevision::Revision2Y => "2y",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "2" => Some(SaltRevision::Revision2),
            "2a" => Some(SaltRevision::Revision2A),
            "2b" => Some(SaltRevision::Revision2B),
            "2x" => Some(SaltRevision::Revision2X),
            "2y" => Some(SaltRevision::Revision2Y),
            _ => None,
        }
    }
}

impl fmt::Display for SaltRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An immutable configuration value shared by every hasher built from it.
///
/// Construct one from a [`Strength`] tier and optionally override individual
/// fields; unset fields resolve to the tier's preset when a hasher is
/// constructed. The value is `Copy` and never mutated after construction, so
/// it can be freely shared across concurrent hash and verify calls.
///
/// Out-of-range parameters are rejected with
/// [`HasherError::InvalidConfiguration`] when a hasher is constructed from
/// the options, not when a password is hashed.
///
/// ```
/// use passguard::{HasherOptions, SaltRevision, Strength};
///
/// let options = HasherOptions::new(Strength::Moderate)
///     .with_salt_revision(SaltRevision::Revision2Y);
/// assert_eq!(options.strength(), Strength::Moderate);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct HasherOptions {
    strength: Strength,
    mem_limit_bytes: Option<u64>,
    ops_limit: Option<u64>,
    work_factor: Option<u8>,
    salt_revision: SaltRevision,
}

impl Default for HasherOptions {
    /// Interactive-tier presets with the `2b` bcrypt revision.
    fn default() -> Self {
        Self::new(Strength::Interactive)
    }
}

impl HasherOptions {
    /// Creates options for the given strength tier with no overrides.
    pub fn new(strength: Strength) -> Self {
        Self {
            strength,
            mem_limit_bytes: None,
            ops_limit: None,
            work_factor: None,
            salt_revision: SaltRevision::Revision2B,
        }
    }

    /// Overrides the Argon2 memory limit, in bytes.
    #[must_use]
    pub fn with_mem_limit(mut self, bytes: u64) -> Self {
        self.mem_limit_bytes = Some(bytes);
        self
    }

    /// Overrides the Argon2 pass count.
    #[must_use]
    pub fn with_ops_limit(mut self, ops: u64) -> Self {
        self.ops_limit = Some(ops);
        self
    }

    /// Overrides the bcrypt cost / scrypt log2(N) work factor.
    #[must_use]
    pub fn with_work_factor(mut self, work_factor: u8) -> Self {
        self.work_factor = Some(work_factor);
        self
    }

    /// Selects the bcrypt format revision for newly produced hashes.
    #[must_use]
    pub fn with_salt_revision(mut self, revision: SaltRevision) -> Self {
        self.salt_revision = revision;
        self
    }

    /// The strength tier these options were built from.
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// The bcrypt format revision for newly produced hashes.
    pub fn salt_revision(&self) -> SaltRevision {
        self.salt_revision
    }

    /// Resolves `(memory KiB, passes)` for Argon2id, falling back to the
    /// tier presets for unset fields.
    pub(crate) fn argon2_cost(&self) -> Result<(u32, u32), HasherError> {
        let preset = match self.strength {
            Strength::Interactive => Some((ARGON2_MEM_INTERACTIVE, ARGON2_OPS_INTERACTIVE)),
            Strength::Moderate => Some((ARGON2_MEM_MODERATE, ARGON2_OPS_MODERATE)),
            Strength::Sensitive => Some((ARGON2_MEM_SENSITIVE, ARGON2_OPS_SENSITIVE)),
            Strength::Custom => None,
        };

        let mem_bytes = self
            .mem_limit_bytes
            .or(preset.map(|(mem, _)| mem))
            .ok_or_else(|| {
                HasherError::InvalidConfiguration(
                    "custom strength requires an explicit memory limit".into(),
                )
            })?;
        let ops = self.ops_limit.or(preset.map(|(_, ops)| ops)).ok_or_else(|| {
            HasherError::InvalidConfiguration(
                "custom strength requires an explicit ops limit".into(),
            )
        })?;

        if mem_bytes == 0 || ops == 0 {
            return Err(HasherError::InvalidConfiguration(
                "memory and ops limits must be positive".into(),
            ));
        }

        let mem_kib = mem_bytes / 1024;
        if mem_kib < 8 {
            return Err(HasherError::InvalidConfiguration(format!(
                "memory limit of {mem_bytes} bytes is below the 8 KiB minimum"
            )));
        }
        let mem_kib = u32::try_from(mem_kib).map_err(|_| {
            HasherError::InvalidConfiguration(format!(
                "memory limit of {mem_bytes} bytes does not fit in 32-bit KiB"
            ))
        })?;
        let ops = u32::try_from(ops).map_err(|_| {
            HasherError::InvalidConfiguration(format!("ops limit of {ops} is too large"))
        })?;

        Ok((mem_kib, ops))
    }

    /// Resolves the bcrypt work factor, falling back to the tier preset.
    pub(crate) fn bcrypt_cost(&self) -> Result<u8, HasherError> {
        let cost = self
            .work_factor
            .or(match self.strength {
                Strength::Interactive => Some(BCRYPT_COST_INTERACTIVE),
                Strength::Moderate => Some(BCRYPT_COST_MODERATE),
                Strength::Sensitive => Some(BCRYPT_COST_SENSITIVE),
                Strength::Custom => None,
            })
            .ok_or_else(|| {
                HasherError::InvalidConfiguration(
                    "custom strength requires an explicit work factor".into(),
                )
            })?;

        if !(BCRYPT_COST_MIN..=BCRYPT_COST_MAX).contains(&cost) {
            return Err(HasherError::InvalidConfiguration(format!(
                "bcrypt work factor {cost} is outside {BCRYPT_COST_MIN}..={BCRYPT_COST_MAX}"
            )));
        }
        Ok(cost)
    }

    /// Resolves the scrypt log2(N) work factor, falling back to the tier
    /// preset.
    pub(crate) fn scrypt_log_n(&self) -> Result<u8, HasherError> {
        let log_n = self
            .work_factor
            .or(match self.strength {
                Strength::Interactive => Some(SCRYPT_LOG_N_INTERACTIVE),
                Strength::Moderate => Some(SCRYPT_LOG_N_MODERATE),
                Strength::Sensitive => Some(SCRYPT_LOG_N_SENSITIVE),
                Strength::Custom => None,
            })
            .ok_or_else(|| {
                HasherError::InvalidConfiguration(
                    "custom strength requires an explicit work factor".into(),
                )
            })?;

        if !(SCRYPT_LOG_N_MIN..=SCRYPT_LOG_N_MAX).contains(&log_n) {
            return Err(HasherError::InvalidConfiguration(format!(
                "scrypt work factor {log_n} is outside {SCRYPT_LOG_N_MIN}..={SCRYPT_LOG_N_MAX}"
            )));
        }
        Ok(log_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_presets_resolve() {
        let (mem, ops) = HasherOptions::new(Strength::Interactive).argon2_cost().unwrap();
        assert_eq!(mem, 65536);
        assert_eq!(ops, 2);

        let (mem, ops) = HasherOptions::new(Strength::Sensitive).argon2_cost().unwrap();
        assert_eq!(mem, 1_048_576);
        assert_eq!(ops, 4);

        assert_eq!(HasherOptions::new(Strength::Interactive).bcrypt_cost().unwrap(), 10);
        assert_eq!(HasherOptions::new(Strength::Moderate).bcrypt_cost().unwrap(), 12);
        assert_eq!(HasherOptions::new(Strength::Sensitive).scrypt_log_n().unwrap(), 18);
    }

    #[test]
    fn test_overrides_take_precedence_over_presets() {
        let options = HasherOptions::new(Strength::Interactive)
            .with_mem_limit(16 * 1024 * 1024)
            .with_work_factor(6);

        let (mem, ops) = options.argon2_cost().unwrap();
        assert_eq!(mem, 16 * 1024);
        // The unset ops limit still comes from the tier preset.
        assert_eq!(ops, 2);
        assert_eq!(options.bcrypt_cost().unwrap(), 6);
        assert_eq!(options.scrypt_log_n().unwrap(), 6);
    }

    #[test]
    fn test_custom_strength_requires_explicit_fields() {
        let options = HasherOptions::new(Strength::Custom);
        assert!(matches!(
            options.argon2_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            options.bcrypt_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            options.scrypt_log_n(),
            Err(HasherError::InvalidConfiguration(_))
        ));

        // Memory alone is not enough for Argon2.
        let options = HasherOptions::new(Strength::Custom).with_mem_limit(32 * 1024 * 1024);
        assert!(matches!(
            options.argon2_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));

        let options = HasherOptions::new(Strength::Custom)
            .with_mem_limit(32 * 1024 * 1024)
            .with_ops_limit(3)
            .with_work_factor(8);
        assert_eq!(options.argon2_cost().unwrap(), (32 * 1024, 3));
        assert_eq!(options.bcrypt_cost().unwrap(), 8);
    }

    #[test]
    fn test_out_of_range_parameters_are_rejected() {
        let zero_mem = HasherOptions::new(Strength::Custom)
            .with_mem_limit(0)
            .with_ops_limit(3);
        assert!(matches!(
            zero_mem.argon2_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));

        let tiny_mem = HasherOptions::new(Strength::Custom)
            .with_mem_limit(4096)
            .with_ops_limit(3);
        assert!(matches!(
            tiny_mem.argon2_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));

        let zero_ops = HasherOptions::new(Strength::Custom)
            .with_mem_limit(32 * 1024 * 1024)
            .with_ops_limit(0);
        assert!(matches!(
            zero_ops.argon2_cost(),
            Err(HasherError::InvalidConfiguration(_))
        ));

        for cost in [0u8, 3, 32, 99] {
            let options = HasherOptions::new(Strength::Interactive).with_work_factor(cost);
            assert!(matches!(
                options.bcrypt_cost(),
                Err(HasherError::InvalidConfiguration(_))
            ));
        }

        for log_n in [0u8, 2, 32, 99] {
            let options = HasherOptions::new(Strength::Interactive).with_work_factor(log_n);
            assert!(matches!(
                options.scrypt_log_n(),
                Err(HasherError::InvalidConfiguration(_))
            ));
        }

        // 3 is valid for scrypt but below the bcrypt primitive's floor.
        let options = HasherOptions::new(Strength::Interactive).with_work_factor(3);
        assert_eq!(options.scrypt_log_n().unwrap(), 3);
        assert!(options.bcrypt_cost().is_err());
    }

    #[test]
    fn test_salt_revision_tags_round_trip() {
        for revision in [
            SaltRevision::Revision2,
            SaltRevision::Revision2A,
            SaltRevision::Revision2B,
            SaltRevision::Revision2X,
            SaltRevision::Revision2Y,
        ] {
            assert_eq!(SaltRevision::from_tag(revision.tag()), Some(revision));
        }
        assert_eq!(SaltRevision::from_tag("2c"), None);
        assert_eq!(SaltRevision::from_tag(""), None);
    }

    #[test]
    fn test_default_options() {
        let options = HasherOptions::default();
        assert_eq!(options.strength(), Strength::Interactive);
        assert_eq!(options.salt_revision(), SaltRevision::Revision2B);
    }
}
