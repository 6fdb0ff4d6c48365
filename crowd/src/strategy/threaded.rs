use super::{sequential, TickStats};
use crate::agent::Agent;
use std::thread;

/// Same as the sequential tick, with the agents cut into `workers` contiguous
/// slices of (nearly) equal length, each handled by its own scoped thread.
/// Slices are disjoint so the workers share nothing.
pub fn tick(agents: &mut [Agent], workers: usize) -> TickStats {
    let workers = workers.max(1);
    let total = agents.len();
    thread::scope(|s| {
        let mut rest = agents;
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let start = worker * total / workers;
            let end = (worker + 1) * total / workers;
            let (slice, tail) = std::mem::take(&mut rest).split_at_mut(end - start);
            rest = tail;
            handles.push(s.spawn(move || sequential::tick(slice)));
        }
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .fold(TickStats::default(), |acc, stats| acc + stats)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::Waypoint;

    #[test]
    fn uneven_split_touches_every_agent() {
        let target = Waypoint::shared(50.0, 0.0, 1.0);
        let mut agents: Vec<Agent> = (0..7)
            .map(|i| Agent::new(0, i).with_waypoints([target.clone()]))
            .collect();
        let stats = tick(&mut agents, 3);
        assert_eq!(stats.moved, 7);
        assert!(agents.iter().all(|a| a.x() == 1));
    }
}
