use crate::{SimTime, Simulation};

/// Simulation execution trait.
pub trait Execute {
    /// Executes the simulation until some stopping condition is reached.
    /// The condition is implementation-specific.
    fn execute(self, sim: &mut Simulation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCondition {
    Time(SimTime),
    NoEvents,
    Steps(usize),
}

/// Executor is used for simple execution of an entire simulation.
///
/// See the crate level documentation for examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    end_condition: EndCondition,
}

impl Executor {
    /// Simulation will end only once no events remain in the queue.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            end_condition: EndCondition::NoEvents,
        }
    }

    /// Simulation will process every event due at or before the given time.
    /// It may terminate early if no events are available.
    #[must_use]
    pub fn timed(time: SimTime) -> Self {
        Self {
            end_condition: EndCondition::Time(time),
        }
    }

    /// Simulation will execute exactly this many steps, unless it runs out of events.
    #[must_use]
    pub fn steps(steps: usize) -> Self {
        Self {
            end_condition: EndCondition::Steps(steps),
        }
    }
}

impl Execute for Executor {
    fn execute(self, sim: &mut Simulation) {
        match self.end_condition {
            EndCondition::Time(time) => execute_until(sim, time),
            EndCondition::NoEvents => execute_until_empty(sim),
            EndCondition::Steps(steps) => execute_steps(sim, steps),
        }
    }
}

fn execute_until_empty(sim: &mut Simulation) {
    while sim.step() {}
}

fn execute_until(sim: &mut Simulation, time: SimTime) {
    while sim.scheduler().peek().is_some_and(|e| e.time() <= time) {
        sim.step();
    }
}

fn execute_steps(sim: &mut Simulation, steps: usize) {
    for _ in 0..steps {
        if !sim.step() {
            break;
        }
    }
}
