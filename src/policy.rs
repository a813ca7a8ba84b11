use crate::options::SaltRevision;

/// The result of verifying a candidate password against a stored hash.
///
/// Created fresh per verify call and never persisted. A caller acting on
/// [`VerificationOutcome::SuccessRehashNeeded`] should re-hash the password
/// under the current configuration and replace the stored string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The candidate did not match, or the stored hash could not be decoded
    Failed,
    /// The candidate matched and the stored parameters are at least as
    /// strong as the current configuration
    Success,
    /// The candidate matched but the stored hash was produced with weaker
    /// parameters than currently configured
    SuccessRehashNeeded,
}

// Each comparison below is strictly greater-than on the cost dimensions a
// family exposes. Raising the configured cost eventually flags every
// previously-issued hash; lowering it never flags anything.

pub(crate) fn argon2_needs_rehash(
    current_mem_kib: u32,
    current_ops: u32,
    stored_mem_kib: u32,
    stored_ops: u32,
) -> bool {
    current_mem_kib > stored_mem_kib || current_ops > stored_ops
}

// The revision tag is a format marker, not a cost, so any mismatch with the
// configured tag flags the hash for regeneration.
pub(crate) fn bcrypt_needs_rehash(
    current_cost: u8,
    current_revision: SaltRevision,
    stored_cost: u8,
    stored_revision: SaltRevision,
) -> bool {
    current_cost > stored_cost || current_revision != stored_revision
}

pub(crate) fn scrypt_needs_rehash(current_log_n: u8, stored_log_n: u8) -> bool {
    current_log_n > stored_log_n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argon2_policy_is_monotonic() {
        // Equal parameters never flag.
        assert!(!argon2_needs_rehash(65536, 2, 65536, 2));
        // Raising either dimension flags.
        assert!(argon2_needs_rehash(131072, 2, 65536, 2));
        assert!(argon2_needs_rehash(65536, 3, 65536, 2));
        // Lowering never flags.
        assert!(!argon2_needs_rehash(32768, 2, 65536, 2));
        assert!(!argon2_needs_rehash(65536, 1, 65536, 2));
        // A raise on one dimension flags even when the other was lowered.
        assert!(argon2_needs_rehash(131072, 1, 65536, 2));
    }

    #[test]
    fn test_bcrypt_policy_compares_cost_and_revision() {
        let rev = SaltRevision::Revision2B;
        assert!(!bcrypt_needs_rehash(12, rev, 12, rev));
        assert!(bcrypt_needs_rehash(14, rev, 12, rev));
        assert!(!bcrypt_needs_rehash(10, rev, 12, rev));
        // Revision mismatch flags regardless of cost.
        assert!(bcrypt_needs_rehash(12, SaltRevision::Revision2Y, 12, rev));
        assert!(bcrypt_needs_rehash(10, SaltRevision::Revision2A, 12, rev));
    }

    #[test]
    fn test_scrypt_policy_compares_work_factor() {
        assert!(!scrypt_needs_rehash(14, 14));
        assert!(scrypt_needs_rehash(16, 14));
        assert!(!scrypt_needs_rehash(12, 14));
    }
}
