use std::collections::VecDeque;

use crate::{error::LinkError, models::ResultItem};

/// One unit on its way to the consumer.
#[derive(Debug)]
pub(crate) enum Delivery {
    Item(ResultItem),
    /// Completion sentinel. Always the last unit of a stream.
    End,
    /// Terminal engine failure, delivered after every item accepted before it.
    Error(LinkError),
}

impl Delivery {
    pub(crate) fn is_end(&self) -> bool {
        matches!(self, Delivery::End)
    }
}

/// FIFO of units that arrived while the stream had no demand.
///
/// Unbounded: flow control comes from the stream withholding `resume`
/// until this queue has been drained into the delivery buffer.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    units: VecDeque<Delivery>,
    total_enqueued: u64,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_back(&mut self, unit: Delivery) {
        self.total_enqueued += 1;
        self.units.push_back(unit);
    }

    pub(crate) fn pop_front(&mut self) -> Option<Delivery> {
        self.units.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of units ever parked here, including drained and discarded ones.
    pub(crate) fn total_enqueued(&self) -> u64 {
        self.total_enqueued
    }

    /// `true` if the only thing left is the completion sentinel (or nothing).
    pub(crate) fn holds_only_end(&self) -> bool {
        self.units.iter().all(Delivery::is_end)
    }

    /// Drop every parked unit, returning how many were discarded.
    pub(crate) fn clear(&mut self) -> usize {
        let discarded = self.units.len();
        self.units.clear();
        discarded
    }
}
