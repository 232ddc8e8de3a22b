//! FIFO work queue whose drain operation is bounded by an explicit iteration limit.
//!
//! Entries that cannot be processed are not dropped. They are moved to the back of the queue with
//! their attempt counter incremented. Once an entry has failed `max_retries` times, draining the
//! queue fails with [StalledEntry] before any entry is touched, which surfaces the stuck entry to the
//! operator instead of looping over it forever.

use crate::domain::BlockTimeHeight;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use std::collections::VecDeque;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct QueueEntry<T> {
    item: T,
    ticket: u64,
    enqueued_at: BlockTimeHeight,
    attempts: u32,
}

impl<T> QueueEntry<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    /// handle returned when the entry was enqueued
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn enqueued_at(&self) -> BlockTimeHeight {
        self.enqueued_at
    }

    /// number of times the entry was requeued
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// what to do with the entry at the front of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// entry was processed and is removed from the queue
    Consumed,
    /// entry could not be processed and is moved to the back of the queue
    Requeue,
    /// entry is left at the front of the queue and the run stops
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueRun {
    pub consumed: u32,
    pub requeued: u32,
    pub halted: bool,
}

impl QueueRun {
    pub fn iterations(&self) -> u32 {
        self.consumed + self.requeued
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalledEntry {
    pub ticket: u64,
    pub attempts: u32,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct BoundedQueue<T> {
    entries: VecDeque<QueueEntry<T>>,
    ticket_sequence: u64,
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            ticket_sequence: 0,
        }
    }
}

impl<T> BoundedQueue<T> {
    /// appends the item to the back of the queue and returns its ticket
    pub fn enqueue(&mut self, item: T, enqueued_at: BlockTimeHeight) -> u64 {
        self.ticket_sequence += 1;
        self.entries.push_back(QueueEntry {
            item,
            ticket: self.ticket_sequence,
            enqueued_at,
            attempts: 0,
        });
        self.ticket_sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn front(&self) -> Option<&QueueEntry<T>> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry<T>> {
        self.entries.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.item)
    }

    /// Visits the entries in FIFO order, letting `keep` update each item in place.
    ///
    /// Entries for which `keep` returns false are removed. Tickets and attempts of the retained
    /// entries are unchanged.
    pub fn retain_mut<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.entries.retain_mut(|entry| keep(&mut entry.item));
    }

    /// Checks the entries that the next `max_iterations` run would visit.
    ///
    /// Fails on the first entry that has already been requeued `max_retries` times.
    pub fn check_window(&self, max_iterations: u32, max_retries: u32) -> Result<(), StalledEntry> {
        match self
            .entries
            .iter()
            .take(max_iterations as usize)
            .find(|entry| entry.attempts >= max_retries)
        {
            Some(entry) => Err(StalledEntry {
                ticket: entry.ticket,
                attempts: entry.attempts,
            }),
            None => Ok(()),
        }
    }

    /// Pops at most `max_iterations` entries from the front and applies `action` to each.
    ///
    /// The number of iterations is also capped at the queue length at the time of the call, so a
    /// requeued entry is never visited twice within the same run.
    pub fn process_up_to<F>(
        &mut self,
        max_iterations: u32,
        max_retries: u32,
        mut action: F,
    ) -> Result<QueueRun, StalledEntry>
    where
        F: FnMut(&T) -> Disposition,
    {
        self.check_window(max_iterations, max_retries)?;
        let iterations = (max_iterations as usize).min(self.entries.len());
        let mut run = QueueRun::default();
        for _ in 0..iterations {
            let mut entry = match self.entries.pop_front() {
                Some(entry) => entry,
                None => break,
            };
            match action(&entry.item) {
                Disposition::Consumed => run.consumed += 1,
                Disposition::Requeue => {
                    entry.attempts += 1;
                    self.entries.push_back(entry);
                    run.requeued += 1;
                }
                Disposition::Halt => {
                    self.entries.push_front(entry);
                    run.halted = true;
                    break;
                }
            }
        }
        Ok(run)
    }
}
