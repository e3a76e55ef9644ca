use std::any::Any;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

use crate::types::EventId;
use crate::{Key, SimTime};

/// Entry stored in the scheduler: the event value, the key of the component it
/// is addressed to, and the virtual time at which it is due.
///
/// Besides living in the scheduler's priority queue, entries are simply handed
/// to [`crate::Components`], which unpacks them and dispatches to the right
/// component.
#[derive(Debug)]
pub struct EventEntry {
    event_id: EventId,
    time: SimTime,
    pub(crate) component: Uuid,
    inner: Box<dyn Any>,
}

impl EventEntry {
    pub(crate) fn new<E: fmt::Debug + 'static>(
        id: EventId,
        time: SimTime,
        component: Key<E>,
        event: E,
    ) -> Self {
        EventEntry {
            event_id: id,
            time,
            component: component.id(),
            inner: Box::new(event),
        }
    }

    /// Virtual time at which this entry is due.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Tries to downcast the entry to one holding an event of type `E`.
    #[must_use]
    pub(crate) fn downcast<E: fmt::Debug + 'static>(&self) -> Option<EventEntryTyped<'_, E>> {
        self.inner.downcast_ref::<E>().map(|event| EventEntryTyped {
            id: self.event_id,
            time: self.time,
            component_key: Key::new_with_id(self.component),
            event,
        })
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.event_id == other.event_id
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap. Entries due at the
        // same instant are resumed in scheduling-registration order (the
        // event id is the tie-break), which keeps queue-admission order
        // reproducible across runs.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.event_id.cmp(&self.event_id))
    }
}

#[derive(Debug)]
pub struct EventEntryTyped<'e, E: fmt::Debug> {
    pub id: EventId,
    pub time: SimTime,
    pub component_key: Key<E>,
    pub event: &'e E,
}

type Clock = Rc<Cell<SimTime>>;

/// Read-only access to the simulation clock.
///
/// The clock itself is owned by the scheduler; other parties can hold a
/// `ClockRef` to observe the current virtual time.
///
/// # Example
///
/// ```
/// # use loadsim_core::Scheduler;
/// let scheduler = Scheduler::default();
/// let clock_ref = scheduler.clock();
/// assert_eq!(clock_ref.time(), scheduler.time());
/// ```
pub struct ClockRef {
    clock: Clock,
}

impl ClockRef {
    /// Return the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }
}

/// Scheduler keeps the current virtual time and the pending timed resumptions.
///
/// The clock is monotonically non-decreasing: it only moves when [`Scheduler::pop`]
/// removes the earliest-due entry and advances the clock to that entry's time.
pub struct Scheduler {
    next_event_id: u64,
    events: BinaryHeap<EventEntry>,
    clock: Clock,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            next_event_id: 0,
            events: BinaryHeap::default(),
            clock: Rc::new(Cell::new(SimTime::default())),
        }
    }
}

impl Scheduler {
    /// Schedules `event` to be executed for `component` at `self.time() + delay`.
    pub fn schedule<E: fmt::Debug + 'static>(
        &mut self,
        delay: SimTime,
        component: Key<E>,
        event: E,
    ) {
        self.next_event_id += 1;
        let time = self.time() + delay;
        let entry = EventEntry::new(EventId(self.next_event_id), time, component, event);
        self.events.push(entry);
    }

    /// Schedules `event` to be executed for `component` at the current time.
    pub fn schedule_now<E: fmt::Debug + 'static>(&mut self, component: Key<E>, event: E) {
        self.schedule(SimTime::zero(), component, event);
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }

    /// Returns a structure with immutable access to the simulation time.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Returns a reference to the next scheduled event, or `None` if none are left.
    pub fn peek(&self) -> Option<&EventEntry> {
        self.events.peek()
    }

    /// Removes and returns the next scheduled event, advancing the clock to its
    /// due time, or `None` if none are left.
    pub fn pop(&mut self) -> Option<EventEntry> {
        self.events.pop().inspect(|event| {
            self.clock.replace(event.time());
        })
    }

    /// Number of pending entries.
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Eq, PartialEq)]
    struct EventA;
    #[derive(Debug, Clone, Eq, PartialEq)]
    struct EventB;

    #[test]
    fn test_clock_ref() {
        let time = SimTime::from_secs(1);
        let clock = Clock::new(Cell::new(time));
        let clock_ref = ClockRef { clock };
        assert_eq!(clock_ref.time(), time);
    }

    #[test]
    fn test_event_entry_downcast() {
        let entry = EventEntry::new(
            EventId(0),
            SimTime::from_secs(1),
            Key::<String>::new_with_id(Uuid::now_v7()),
            String::from("inner"),
        );
        assert!(entry.downcast::<String>().is_some());
        assert!(entry.downcast::<i32>().is_none());
    }

    #[test]
    fn test_event_entry_ordering_by_time() {
        let key = Key::<EventA>::new_with_id(Uuid::now_v7());
        let early = EventEntry::new(EventId(2), SimTime::from_secs(1), key, EventA);
        let late = EventEntry::new(EventId(1), SimTime::from_secs(2), key, EventA);
        // Reversed ordering: the earlier entry is "greater" so the heap pops it first.
        assert_eq!(early.cmp(&late), Ordering::Greater);
    }

    #[test]
    fn test_event_entry_fifo_tie_break() {
        let key = Key::<EventA>::new_with_id(Uuid::now_v7());
        let first = EventEntry::new(EventId(1), SimTime::from_secs(1), key, EventA);
        let second = EventEntry::new(EventId(2), SimTime::from_secs(1), key, EventA);
        // Same due time: lower event id (registered first) pops first.
        assert_eq!(first.cmp(&second), Ordering::Greater);
    }

    #[test]
    fn test_scheduler_pop_order_and_clock() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.time(), SimTime::zero());
        assert!(scheduler.events.is_empty());

        let component_a = Key::<EventA>::new_with_id(Uuid::now_v7());
        let component_b = Key::<EventB>::new_with_id(Uuid::now_v7());

        scheduler.schedule(SimTime::from_secs(1), component_a, EventA);
        scheduler.schedule_now(component_b, EventB);
        scheduler.schedule(SimTime::from_secs(2), component_b, EventB);

        assert_eq!(scheduler.time(), SimTime::zero());
        assert_eq!(scheduler.pending(), 3);

        let entry = scheduler.pop().unwrap();
        let entry = entry.downcast::<EventB>().unwrap();
        assert_eq!(entry.time, SimTime::zero());
        assert_eq!(entry.component_key.id(), component_b.id());
        assert_eq!(entry.event, &EventB);
        assert_eq!(scheduler.time(), SimTime::zero());

        let entry = scheduler.pop().unwrap();
        let entry = entry.downcast::<EventA>().unwrap();
        assert_eq!(entry.time, SimTime::from_secs(1));
        assert_eq!(scheduler.time(), SimTime::from_secs(1));

        let entry = scheduler.pop().unwrap();
        let entry = entry.downcast::<EventB>().unwrap();
        assert_eq!(entry.time, SimTime::from_secs(2));
        assert_eq!(scheduler.time(), SimTime::from_secs(2));

        assert!(scheduler.pop().is_none());
    }

    #[test]
    fn test_same_time_events_pop_in_registration_order() {
        let mut scheduler = Scheduler::default();
        let key = Key::<u32>::new_with_id(Uuid::now_v7());

        for i in 0..100u32 {
            scheduler.schedule_now(key, i);
        }

        let mut popped = Vec::new();
        while let Some(entry) = scheduler.pop() {
            popped.push(*entry.downcast::<u32>().unwrap().event);
        }
        let expected: Vec<u32> = (0..100).collect();
        assert_eq!(popped, expected);
    }
}
