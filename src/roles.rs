//! Batch role mutation: grant or revoke one role across an entire guild
//! membership, self-paced, with per-member outcome tallies.
//!
//! The driver is generic over a [`RoleMutator`] so the skip/fail accounting
//! can be exercised without a Discord connection; the plugin supplies the
//! real HTTP-backed mutator.

use serenity::all::UserId;
use std::time::Duration;

/// Pause after every attempted mutation.
pub const MUTATION_PAUSE: Duration = Duration::from_millis(350);

/// Additional pause after a transient service error.
pub const TRANSIENT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Grant,
    Revoke,
}

impl RoleAction {
    pub fn verb(&self) -> &'static str {
        match self {
            RoleAction::Grant => "added",
            RoleAction::Revoke => "removed",
        }
    }
}

pub enum MutateError {
    /// The platform refused the mutation for this member.
    PermissionDenied,
    /// A transient service failure; worth backing off before continuing.
    Transient,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The slice of a guild member the batch driver needs.
pub struct MemberView {
    pub user_id: UserId,
    pub is_bot: bool,
    pub has_role: bool,
    pub top_role_position: u16,
}

/// Fixed-delay step pacing for the batch loop.
pub struct Pacer {
    pause: Duration,
    backoff: Duration,
}

impl Pacer {
    pub fn new(pause: Duration, backoff: Duration) -> Self {
        Self { pause, backoff }
    }

    pub async fn pause(&self) {
        tokio::time::sleep(self.pause).await;
    }

    pub async fn backoff(&self) {
        tokio::time::sleep(self.backoff).await;
    }
}

#[serenity::async_trait]
pub trait RoleMutator: Sync {
    async fn apply(&self, user_id: UserId) -> Result<(), MutateError>;
}

/// Apply `action` to every member in order.
///
/// Per member: bots are passed over without touching the tally, members
/// already in the desired state or outranking the agent are counted as
/// skipped, everything else is attempted.  Failures increment `failed` and
/// never abort the batch; mutations already applied are not rolled back.
pub async fn run_batch<M: RoleMutator>(
    members: &[MemberView],
    action: RoleAction,
    agent_top_position: u16,
    pacer: &Pacer,
    mutator: &M,
) -> BatchTally {
    let mut tally = BatchTally::default();

    for member in members {
        if member.is_bot {
            continue;
        }

        let already_in_state = match action {
            RoleAction::Grant => member.has_role,
            RoleAction::Revoke => !member.has_role,
        };
        if already_in_state {
            tally.skipped += 1;
            continue;
        }

        // The platform would reject this anyway; catching it here keeps the
        // counters meaningful and saves the round trip.
        if member.top_role_position >= agent_top_position {
            tally.skipped += 1;
            continue;
        }

        match mutator.apply(member.user_id).await {
            Ok(()) => tally.changed += 1,
            Err(MutateError::PermissionDenied) => tally.failed += 1,
            Err(MutateError::Transient) => {
                tally.failed += 1;
                pacer.backoff().await;
            }
        }

        pacer.pause().await;
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedMutator {
        denials: Vec<UserId>,
        outages: Vec<UserId>,
    }

    impl ScriptedMutator {
        fn permissive() -> Self {
            Self::default()
        }

        fn denying(user_id: UserId) -> Self {
            Self {
                denials: vec![user_id],
                ..Self::default()
            }
        }
    }

    #[serenity::async_trait]
    impl RoleMutator for ScriptedMutator {
        async fn apply(&self, user_id: UserId) -> Result<(), MutateError> {
            if self.denials.contains(&user_id) {
                return Err(MutateError::PermissionDenied);
            }
            if self.outages.contains(&user_id) {
                return Err(MutateError::Transient);
            }
            Ok(())
        }
    }

    fn unthrottled_pacer() -> Pacer {
        Pacer::new(Duration::ZERO, Duration::ZERO)
    }

    fn member(id: u64, is_bot: bool, has_role: bool, top: u16) -> MemberView {
        MemberView {
            user_id: UserId::new(id),
            is_bot,
            has_role,
            top_role_position: top,
        }
    }

    // Agent's top role sits at position 10 in all scenarios.
    const AGENT_TOP: u16 = 10;

    fn five_member_guild() -> Vec<MemberView> {
        vec![
            member(1, true, false, 0),   // bot, not counted
            member(2, false, true, 1),   // already has the role
            member(3, false, false, 15), // outranks the agent
            member(4, false, false, 1),  // eligible
            member(5, false, false, 0),  // eligible
        ]
    }

    #[tokio::test]
    async fn grant_tally_counts_eligible_and_skipped() {
        let tally = run_batch(
            &five_member_guild(),
            RoleAction::Grant,
            AGENT_TOP,
            &unthrottled_pacer(),
            &ScriptedMutator::permissive(),
        )
        .await;

        assert_eq!(
            tally,
            BatchTally {
                changed: 2,
                skipped: 2,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn permission_denial_shifts_one_change_to_failed() {
        let tally = run_batch(
            &five_member_guild(),
            RoleAction::Grant,
            AGENT_TOP,
            &unthrottled_pacer(),
            &ScriptedMutator::denying(UserId::new(4)),
        )
        .await;

        assert_eq!(
            tally,
            BatchTally {
                changed: 1,
                skipped: 2,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn transient_error_fails_but_batch_continues() {
        let mut mutator = ScriptedMutator::permissive();
        mutator.outages.push(UserId::new(4));

        let tally = run_batch(
            &five_member_guild(),
            RoleAction::Grant,
            AGENT_TOP,
            &unthrottled_pacer(),
            &mutator,
        )
        .await;

        assert_eq!(
            tally,
            BatchTally {
                changed: 1,
                skipped: 2,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn revoke_skips_members_without_the_role() {
        let members = vec![
            member(2, false, true, 1),  // has it, eligible for revoke
            member(4, false, false, 1), // nothing to revoke
        ];

        let tally = run_batch(
            &members,
            RoleAction::Revoke,
            AGENT_TOP,
            &unthrottled_pacer(),
            &ScriptedMutator::permissive(),
        )
        .await;

        assert_eq!(
            tally,
            BatchTally {
                changed: 1,
                skipped: 1,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn equal_rank_counts_as_outranking() {
        let members = vec![member(6, false, false, AGENT_TOP)];

        let tally = run_batch(
            &members,
            RoleAction::Grant,
            AGENT_TOP,
            &unthrottled_pacer(),
            &ScriptedMutator::permissive(),
        )
        .await;

        assert_eq!(
            tally,
            BatchTally {
                changed: 0,
                skipped: 1,
                failed: 0,
            }
        );
    }
}
