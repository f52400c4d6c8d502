use des::{Agent, Response, Time};

use crate::{ArrivalStats, Event, Stats};

/// Emits an arrival at t=0 and then every `interarrival_time`, never past the horizon.
pub struct ArrivalGenerator {
    interarrival_time: Time,
    horizon: Time,
    generated: usize,
    next_arrival: Option<Time>,
}

impl ArrivalGenerator {
    pub fn new(interarrival_time: Time, horizon: Time) -> Self {
        ArrivalGenerator {
            interarrival_time,
            horizon,
            generated: 0,
            next_arrival: Some(0.0),
        }
    }

    /// The arrival that seeds the event loop
    pub fn first_arrival() -> (Time, Event) {
        (0.0, Event::Arrival { customer_id: 1 })
    }
}

impl Agent<Event, Stats> for ArrivalGenerator {
    fn act(&mut self, current_t: Time, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Arrival { customer_id } => {
                self.generated += 1;
                let next_t = current_t + self.interarrival_time;
                if next_t > self.horizon {
                    log::debug!("[{}] arrivals stop, next would be at {}", current_t, next_t);
                    self.next_arrival = None;
                    return Response::new();
                }
                self.next_arrival = Some(next_t);
                Response::event(
                    next_t,
                    Event::Arrival {
                        customer_id: customer_id + 1,
                    },
                )
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Arrivals(ArrivalStats {
            generated: self.generated,
            next_arrival: self.next_arrival,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_next_arrival_with_next_id() {
        let mut generator = ArrivalGenerator::new(3.0, 10.0);
        let resp = generator.act(0.0, &Event::Arrival { customer_id: 1 });
        assert_eq!(resp.events, vec![(3.0, Event::Arrival { customer_id: 2 })]);
    }

    #[test]
    fn stops_when_next_arrival_would_pass_the_horizon() {
        let mut generator = ArrivalGenerator::new(3.0, 10.0);
        let resp = generator.act(9.0, &Event::Arrival { customer_id: 4 });
        assert!(resp.events.is_empty());
        assert_eq!(
            generator.stats(),
            Stats::Arrivals(ArrivalStats {
                generated: 1,
                next_arrival: None
            })
        );
    }

    #[test]
    fn arrival_exactly_at_the_horizon_is_still_scheduled() {
        let mut generator = ArrivalGenerator::new(5.0, 10.0);
        let resp = generator.act(5.0, &Event::Arrival { customer_id: 2 });
        assert_eq!(resp.events, vec![(10.0, Event::Arrival { customer_id: 3 })]);
    }

    #[test]
    fn ignores_completions() {
        let mut generator = ArrivalGenerator::new(1.0, 10.0);
        let resp = generator.act(
            2.0,
            &Event::ServiceDone {
                customer_id: 1,
                server: 0,
            },
        );
        assert!(resp.events.is_empty());
    }
}
