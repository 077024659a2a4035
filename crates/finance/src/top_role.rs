//! Planning the "richest member" role hand-over.

use guildbank_core::MemberId;

/// Role edits needed so that only the current leader holds the top-account role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub revoke: Vec<MemberId>,
    pub grant: Option<MemberId>,
}

impl RoleChanges {
    pub fn is_empty(&self) -> bool {
        self.revoke.is_empty() && self.grant.is_none()
    }
}

/// Compare who holds the role now with who leads the leaderboard.
///
/// With no leader (empty economy) every holder loses the role.
pub fn plan_top_role(current_holders: &[MemberId], leader: Option<MemberId>) -> RoleChanges {
    let mut revoke: Vec<MemberId> = current_holders
        .iter()
        .copied()
        .filter(|m| Some(*m) != leader)
        .collect();
    revoke.sort();
    revoke.dedup();

    let grant = leader.filter(|l| !current_holders.contains(l));

    RoleChanges { revoke, grant }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: u64) -> MemberId {
        MemberId::new(id)
    }

    #[test]
    fn hands_role_over_to_new_leader() {
        let changes = plan_top_role(&[m(1)], Some(m(2)));
        assert_eq!(changes.revoke, vec![m(1)]);
        assert_eq!(changes.grant, Some(m(2)));
    }

    #[test]
    fn nothing_to_do_when_leader_already_holds_it() {
        assert!(plan_top_role(&[m(2)], Some(m(2))).is_empty());
    }

    #[test]
    fn strips_extra_holders() {
        let changes = plan_top_role(&[m(5), m(2), m(3)], Some(m(2)));
        assert_eq!(changes.revoke, vec![m(3), m(5)]);
        assert_eq!(changes.grant, None);
    }

    #[test]
    fn empty_economy_revokes_everyone() {
        let changes = plan_top_role(&[m(4)], None);
        assert_eq!(changes.revoke, vec![m(4)]);
        assert_eq!(changes.grant, None);
    }
}
