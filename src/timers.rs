use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Repeat
{
    Once,
    Every(Duration),
    EveryFrame,
}

#[derive(Clone, Copy, Debug)]
struct Entry
{
    id: TimerId,
    scope: ScopeId,
    due: Duration,
    repeat: Repeat,
}

/// Single-threaded schedule of one-shot, interval, and per-frame timers.
///
/// Nothing fires on its own: a scope polls with [`TimerScope::next_due`] and
/// delivers each timer before polling again, so a cancellation made while
/// handling one timer is honored before the next one is looked at.
#[derive(Default)]
pub struct TimerQueue
{
    next_timer: u64,
    next_scope: u64,
    entries: Vec<Entry>,
    /// Scopes dropped while the queue was borrowed; purged on next mutation.
    retired: Rc<RefCell<Vec<ScopeId>>>,
}

impl TimerQueue
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>>
    {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Opens a scope whose timers are all cancelled when it drops.
    pub fn open_scope(queue: &Rc<RefCell<Self>>) -> TimerScope
    {
        let scope = {
            let mut inner = queue.borrow_mut();
            inner.next_scope += 1;
            ScopeId(inner.next_scope)
        };
        let retired = Rc::clone(&queue.borrow().retired);
        TimerScope {
            queue: Rc::clone(queue),
            scope,
            retired,
        }
    }

    fn reap(&mut self)
    {
        let retired: Vec<ScopeId> = self.retired.borrow_mut().drain(..).collect();
        if !retired.is_empty() {
            self.entries.retain(|entry| !retired.contains(&entry.scope));
        }
    }

    fn is_retired(&self, scope: ScopeId) -> bool
    {
        self.retired.borrow().contains(&scope)
    }

    fn insert(&mut self, scope: ScopeId, due: Duration, repeat: Repeat) -> TimerId
    {
        self.reap();
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.entries.push(Entry {
            id,
            scope,
            due,
            repeat,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool
    {
        self.reap();
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn cancel_scope(&mut self, scope: ScopeId) -> usize
    {
        self.reap();
        let before = self.entries.len();
        self.entries.retain(|entry| entry.scope != scope);
        before - self.entries.len()
    }

    /// Pops the earliest wall timer of `scope` due at or before `now`, along
    /// with the time it was due.
    ///
    /// Ties go to the timer registered first. Intervals are re-armed one
    /// period after their previous due time, so a long gap yields every
    /// missed fire in order.
    pub fn next_due(&mut self, scope: ScopeId, now: Duration) -> Option<(TimerId, Duration)>
    {
        self.reap();
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.scope == scope)
            .filter(|(_, entry)| entry.repeat != Repeat::EveryFrame && entry.due <= now)
            .min_by_key(|(_, entry)| (entry.due, entry.id.0))
            .map(|(index, _)| index)?;

        let entry = self.entries[index];
        match entry.repeat {
            Repeat::Every(period) => self.entries[index].due = entry.due + period,
            _ => {
                self.entries.remove(index);
            }
        }
        Some((entry.id, entry.due))
    }

    /// Per-frame subscribers of `scope`, in registration order.
    pub fn frame_timers(&self, scope: ScopeId) -> Vec<TimerId>
    {
        self.entries
            .iter()
            .filter(|entry| entry.scope == scope && entry.repeat == Repeat::EveryFrame)
            .filter(|entry| !self.is_retired(entry.scope))
            .map(|entry| entry.id)
            .collect()
    }

    pub fn is_live(&self, id: TimerId) -> bool
    {
        self.entries
            .iter()
            .any(|entry| entry.id == id && !self.is_retired(entry.scope))
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .iter()
            .filter(|entry| !self.is_retired(entry.scope))
            .count()
    }
}

/// Owner handle for a group of timers.
pub struct TimerScope
{
    queue: Rc<RefCell<TimerQueue>>,
    scope: ScopeId,
    retired: Rc<RefCell<Vec<ScopeId>>>,
}

impl TimerScope
{
    pub fn once(&self, now: Duration, delay: Duration) -> TimerId
    {
        self.queue
            .borrow_mut()
            .insert(self.scope, now + delay, Repeat::Once)
    }

    pub fn every(&self, now: Duration, period: Duration) -> TimerId
    {
        self.queue
            .borrow_mut()
            .insert(self.scope, now + period, Repeat::Every(period))
    }

    pub fn every_frame(&self) -> TimerId
    {
        self.queue
            .borrow_mut()
            .insert(self.scope, Duration::ZERO, Repeat::EveryFrame)
    }

    pub fn cancel(&self, id: TimerId)
    {
        self.queue.borrow_mut().cancel(id);
    }

    pub fn cancel_all(&self) -> usize
    {
        self.queue.borrow_mut().cancel_scope(self.scope)
    }

    pub fn is_live(&self, id: TimerId) -> bool
    {
        self.queue.borrow().is_live(id)
    }

    pub fn next_due(&self, now: Duration) -> Option<(TimerId, Duration)>
    {
        self.queue.borrow_mut().next_due(self.scope, now)
    }

    pub fn frame_timers(&self) -> Vec<TimerId>
    {
        self.queue.borrow().frame_timers(self.scope)
    }
}

impl Drop for TimerScope
{
    fn drop(&mut self)
    {
        // The queue may already be borrowed if the scope drops mid-poll.
        match self.queue.try_borrow_mut() {
            Ok(mut queue) => {
                queue.cancel_scope(self.scope);
            }
            Err(_) => {
                tracing::warn!(scope = ?self.scope, "timer queue busy, deferring scope cancel");
                self.retired.borrow_mut().push(self.scope);
            }
        }
    }
}
