//! Core discrete event simulation engine.
//!
//! This crate provides the building blocks for virtual-time simulation:
//! time management, event scheduling, and a component-based architecture.
//!
//! # Architecture Overview
//!
//! The engine is built around two main types:
//!
//! - [`Simulation`]: owns the scheduler and the components. Use this to add
//!   components, schedule events, and run the simulation.
//!
//! - [`Scheduler`]: the heartbeat. A priority queue of pending timed
//!   resumptions keyed on `(due time, registration order)` plus the single
//!   authoritative clock. Components receive `&mut Scheduler` while processing
//!   an event and use it to schedule their own future resumptions.
//!
//! # Concurrency model
//!
//! Everything runs on one logical thread of control. A "task" that suspends
//! for a timed wait is expressed as a scheduled event; among events due at the
//! identical instant, resumption follows scheduling-registration order (FIFO).
//! No real parallelism exists, so no data race is possible by construction.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use loadsim_core::{Simulation, SimTime, Executor};
//!
//! let mut simulation = Simulation::default();
//! let key = simulation.add_component(my_component);
//! simulation.schedule(SimTime::from_millis(100), key, MyEvent::Tick);
//! simulation.execute(Executor::timed(SimTime::from_secs(60)));
//! ```
//!
//! # Time Model
//!
//! All timing uses [`SimTime`], which represents simulation time (not
//! wall-clock time). This ensures deterministic, reproducible behavior across
//! runs with the same seed.

pub mod dists;
pub mod error;
pub mod execute;
pub mod logging;
pub mod scheduler;
pub mod time;
pub mod types;

use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace, warn};

pub use dists::Sampler;
pub use error::SimError;
pub use execute::{Execute, Executor};
pub use logging::{init_simulation_logging, init_simulation_logging_with_level};
pub use scheduler::{ClockRef, EventEntry, Scheduler};
pub use time::SimTime;
pub use types::EventId;

use uuid::Uuid;

/// Typed handle to a registered component.
#[derive(Debug)]
pub struct Key<T> {
    id: Uuid,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Key<T> {
    pub fn new_with_id(id: Uuid) -> Self {
        Self {
            id,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get the UUID of this key
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Key<T> {}

/// Type-erased event dispatch, implemented for every [`Component`].
pub trait ProcessEventEntry: Any {
    fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler);
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A unit of simulated state that reacts to typed events.
///
/// A component receives its own key (for scheduling follow-up events to
/// itself), the event, and mutable access to the scheduler.
pub trait Component: ProcessEventEntry {
    type Event: 'static;

    fn process_event(
        &mut self,
        self_id: Key<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
    );
}

impl<E, C> ProcessEventEntry for C
where
    E: std::fmt::Debug + 'static,
    C: Component<Event = E> + 'static,
{
    fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler) {
        let typed_entry = entry
            .downcast::<E>()
            .expect("Failed to downcast event entry.");
        self.process_event(typed_entry.component_key, typed_entry.event, scheduler);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Container holding type-erased components.
#[derive(Default)]
pub struct Components {
    components: HashMap<Uuid, Box<dyn ProcessEventEntry>>,
}

impl Components {
    /// Process the event on the component addressed by the event entry.
    ///
    /// Events for components that have been removed are silently dropped.
    pub fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler) {
        if let Some(component) = self.components.get_mut(&entry.component) {
            component.process_event_entry(entry, scheduler);
        }
    }

    /// Registers a new component and returns its key.
    #[must_use]
    pub fn register<E: std::fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        component: C,
    ) -> Key<E> {
        let id = Uuid::now_v7();
        self.components.insert(id, Box::new(component));
        Key::new_with_id(id)
    }

    /// Removes a component, returning it if the key matched its concrete type.
    pub fn remove<E: 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<C> {
        self.components.remove(&key.id).and_then(|boxed_trait| {
            boxed_trait.into_any().downcast::<C>().ok().map(|c| *c)
        })
    }

    /// Get mutable access to a component
    pub fn get_component_mut<E: 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<&mut C> {
        self.components
            .get_mut(&key.id)
            .and_then(|boxed_trait| boxed_trait.as_any_mut().downcast_mut::<C>())
    }
}

/// Simulation struct that puts the scheduler and the components together.
///
/// See the [crate-level documentation](index.html) for more information.
#[derive(Default)]
pub struct Simulation {
    scheduler: Scheduler,
    /// Component container.
    pub components: Components,
}

impl Simulation {
    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    /// Performs one step of the simulation. Returns `true` if there was an
    /// event available to process, and `false` otherwise, which signifies that
    /// the simulation has quiesced.
    pub fn step(&mut self) -> bool {
        self.scheduler.pop().is_some_and(|event| {
            trace!(event_time = %event.time(), "Processing simulation step");
            self.components
                .process_event_entry(event, &mut self.scheduler);
            true
        })
    }

    /// Runs the simulation.
    ///
    /// The stopping condition depends on the executor used. See [`Execute`]
    /// and [`Executor`] for details.
    #[instrument(skip(self, executor), fields(initial_time = %self.time()))]
    pub fn execute<E: Execute>(&mut self, executor: E) {
        info!("Starting simulation execution");
        executor.execute(self);
        info!(final_time = %self.time(), "Simulation execution completed");
    }

    /// Adds a new component.
    #[must_use]
    #[instrument(skip(self, component), fields(component_type = std::any::type_name::<C>()))]
    pub fn add_component<E: std::fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        component: C,
    ) -> Key<E> {
        let key = self.components.register(component);
        debug!(component_id = ?key.id(), "Added component to simulation");
        key
    }

    /// Remove a component: usually at the end of the simulation to peek at the state
    #[must_use]
    #[instrument(skip(self), fields(component_id = ?key.id()))]
    pub fn remove_component<E: std::fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<C> {
        let result = self.components.remove(key);
        if result.is_some() {
            debug!("Removed component from simulation");
        } else {
            warn!("Attempted to remove non-existent component");
        }
        result
    }

    /// Get mutable access to a component
    pub fn get_component_mut<E: std::fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<&mut C> {
        self.components.get_component_mut(key)
    }

    /// Schedules `event` for `component` at `self.time() + delay`.
    pub fn schedule<E: std::fmt::Debug + 'static>(
        &mut self,
        delay: SimTime,
        component: Key<E>,
        event: E,
    ) {
        self.scheduler.schedule(delay, component, event);
    }

    /// Returns the time of the next scheduled event, or None if no events are pending.
    pub fn peek_next_event_time(&self) -> Option<SimTime> {
        self.scheduler.peek().map(|e| e.time())
    }

    /// Returns a ClockRef for reading the simulation time.
    pub fn clock(&self) -> ClockRef {
        self.scheduler.clock()
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.peek().is_some()
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
