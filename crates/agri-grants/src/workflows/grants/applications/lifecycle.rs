use super::domain::{ApplicationId, ApplicationStatus};

/// Whether status overwrites are restricted to forward moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may be overwritten with any other.
    #[default]
    Permissive,
    /// Pending moves anywhere, Processing only forward, decisions are final.
    Enforced,
}

impl TransitionPolicy {
    pub fn allows(self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        use ApplicationStatus::*;

        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Enforced => match from {
                Pending => true,
                Processing => matches!(to, Processing | Approved | Rejected),
                Approved | Rejected => from == to,
            },
        }
    }

    pub fn check(
        self,
        application_id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<(), TransitionRejected> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(TransitionRejected {
                application_id,
                from,
                to,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("application {application_id} cannot move from {from} to {to}")]
pub struct TransitionRejected {
    pub application_id: ApplicationId,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    const ALL: [ApplicationStatus; 4] = [Pending, Processing, Approved, Rejected];

    #[test]
    fn permissive_policy_allows_every_overwrite() {
        for from in ALL {
            for to in ALL {
                assert!(TransitionPolicy::Permissive.allows(from, to));
            }
        }
    }

    #[test]
    fn enforced_policy_only_moves_forward() {
        let policy = TransitionPolicy::Enforced;
        for to in ALL {
            assert!(policy.allows(Pending, to));
        }
        assert!(policy.allows(Processing, Approved));
        assert!(policy.allows(Processing, Rejected));
        assert!(!policy.allows(Processing, Pending));
        assert!(policy.allows(Approved, Approved));
        assert!(!policy.allows(Approved, Rejected));
        assert!(!policy.allows(Rejected, Processing));
    }

    #[test]
    fn rejection_names_both_states() {
        let err = TransitionPolicy::Enforced
            .check(ApplicationId(4), Approved, Pending)
            .expect_err("decisions are final");
        assert_eq!(
            err.to_string(),
            "application 4 cannot move from approved to pending"
        );
    }
}
