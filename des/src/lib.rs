use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub mod parallel;

/// Simulated time. Non-finite values are never scheduled.
pub type Time = f64;

struct Event<T> {
    t: Time,
    // insertion order, breaks ties between events sharing a timestamp
    seq: usize,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the earliest (then oldest) event pops first
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct Response<T, S> {
    pub events: Vec<(Time, T)>,
    pub agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn event(t: Time, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, data)],
            agents: Vec::new(),
        }
    }

    pub fn events(events: Vec<(Time, T)>) -> Response<T, S> {
        Response {
            events,
            agents: Vec::new(),
        }
    }

    pub fn agents(agents: Vec<Box<dyn Agent<T, S>>>) -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents,
        }
    }
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A participant in the simulation.
///
/// Every delivered event is offered to every agent, in the order the agents
/// were registered. Events returned in a [`Response`] are queued in the order
/// they are returned, agent by agent.
pub trait Agent<T, S> {
    fn act(&mut self, _current_t: Time, _data: &T) -> Response<T, S> {
        Response::new()
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: Time,
    next_seq: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(Time, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            current_t: 0.0,
            next_seq: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.schedule(t, data);
        }
        event_loop
    }

    pub fn current_t(&self) -> Time {
        self.current_t
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue an event. Events in the past are dropped.
    pub fn schedule(&mut self, t: Time, data: T) {
        if !t.is_finite() || t < self.current_t {
            log::warn!(
                "dropping event scheduled at {} (clock is at {})",
                t,
                self.current_t
            );
            return;
        }
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    fn broadcast(&mut self) {
        if let Some(event) = self.queue.pop() {
            self.current_t = event.t;
            let mut new_agents = Vec::<Box<dyn Agent<T, S>>>::new();
            let mut new_events = Vec::<(Time, T)>::new();
            for agent in &mut self.agents {
                let response = agent.act(self.current_t, &event.data);
                new_events.extend(response.events);
                new_agents.extend(response.agents);
            }
            for (t, data) in new_events {
                self.schedule(t, data);
            }
            self.agents.extend(new_agents);
        }
    }

    /// Deliver events until the horizon `until`.
    ///
    /// Events already due at the clock when the run starts are always
    /// delivered, including those they schedule for the same instant. Any
    /// other event is delivered only if it is strictly earlier than `until`.
    /// The clock finishes at `until`.
    pub fn run(&mut self, until: Time) {
        let start_t = self.current_t;
        while let Some(next) = self.queue.peek() {
            if next.t >= until && next.t > start_t {
                break;
            }
            self.broadcast();
        }
        if until > self.current_t {
            self.current_t = until;
        }
        log::debug!("stopped at t={} with {} events pending", self.current_t, self.pending());
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Seen(Vec<(Time, u8)>);

    struct Recorder {
        seen: Vec<(Time, u8)>,
    }

    impl Agent<u8, Seen> for Recorder {
        fn act(&mut self, current_t: Time, data: &u8) -> Response<u8, Seen> {
            self.seen.push((current_t, *data));
            Response::new()
        }

        fn stats(&self) -> Seen {
            Seen(self.seen.clone())
        }
    }

    fn recorder() -> Box<dyn Agent<u8, Seen>> {
        Box::new(Recorder { seen: Vec::new() })
    }

    #[test]
    fn min_queue() {
        let mut queue = BinaryHeap::<Event<u8>>::new();
        queue.push(Event { t: 2.0, seq: 0, data: 2 });
        queue.push(Event { t: 1.0, seq: 1, data: 1 });
        assert_eq!(queue.peek().map(|e| e.data), Some(1));
    }

    #[test]
    fn equal_times_pop_in_insertion_order() {
        let mut event_loop = EventLoop::new(
            vec![(1.0, 1), (1.0, 2), (0.5, 0), (1.0, 3)],
            vec![recorder()],
        );
        event_loop.run(10.0);
        assert_eq!(
            event_loop.stats(),
            vec![Seen(vec![(0.5, 0), (1.0, 1), (1.0, 2), (1.0, 3)])]
        );
    }

    #[test]
    fn horizon_is_exclusive() {
        let mut event_loop = EventLoop::new(vec![(1.0, 1), (2.0, 2), (3.0, 3)], vec![recorder()]);
        event_loop.run(2.0);
        assert_eq!(event_loop.stats(), vec![Seen(vec![(1.0, 1)])]);
        assert_eq!(event_loop.current_t(), 2.0);
        assert_eq!(event_loop.pending(), 2);
    }

    #[test]
    fn events_due_at_start_fire_even_with_zero_horizon() {
        let mut event_loop = EventLoop::new(vec![(0.0, 1), (1.0, 2)], vec![recorder()]);
        event_loop.run(0.0);
        assert_eq!(event_loop.stats(), vec![Seen(vec![(0.0, 1)])]);
        assert_eq!(event_loop.current_t(), 0.0);
    }

    #[test]
    fn past_events_are_dropped() {
        let mut event_loop = EventLoop::new(vec![(5.0, 1)], vec![recorder()]);
        event_loop.run(10.0);
        event_loop.schedule(3.0, 2);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn responses_keep_agent_order() {
        struct Echo {
            offset: Time,
            tag: u8,
        }
        impl Agent<u8, Seen> for Echo {
            fn act(&mut self, current_t: Time, data: &u8) -> Response<u8, Seen> {
                if *data == 0 {
                    Response::event(current_t + self.offset, self.tag)
                } else {
                    Response::new()
                }
            }
            fn stats(&self) -> Seen {
                Seen(Vec::new())
            }
        }

        let agents: Vec<Box<dyn Agent<u8, Seen>>> = vec![
            recorder(),
            Box::new(Echo { offset: 4.0, tag: 7 }),
            Box::new(Echo { offset: 4.0, tag: 9 }),
        ];
        let mut event_loop = EventLoop::new(vec![(0.0, 0)], agents);
        event_loop.run(100.0);
        assert_eq!(
            event_loop.stats()[0],
            Seen(vec![(0.0, 0), (4.0, 7), (4.0, 9)])
        );
    }

    #[test]
    fn new_agent() {
        struct Spawner {}
        impl Agent<u8, Seen> for Spawner {
            fn act(&mut self, _current_t: Time, _data: &u8) -> Response<u8, Seen> {
                Response::agents(vec![Box::new(Spawner {})])
            }
            fn stats(&self) -> Seen {
                Seen(Vec::new())
            }
        }

        let agents: Vec<Box<dyn Agent<u8, Seen>>> = vec![Box::new(Spawner {})];
        let mut event_loop = EventLoop::new(vec![(1.0, 1), (2.0, 2)], agents);
        event_loop.run(10.0);

        // First event: 1 new agent
        // Second event: 2 new agents
        assert_eq!(event_loop.stats().len(), 4)
    }
}
