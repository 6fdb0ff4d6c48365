use super::{commit_all, TickStats};
use crate::agent::Agent;

/// Every agent steps straight onto its desired cell. Agents may pile up.
pub fn tick(agents: &mut [Agent]) -> TickStats {
    for agent in agents.iter_mut() {
        agent.compute_next_desired_position();
    }
    commit_all(agents)
}
