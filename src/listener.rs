use instant::{Duration, Instant};
use log::{log_enabled, trace, Level};

use crate::grid::Grid;
use crate::SlotId;

/// Observes the search as it assigns and unassigns slots. Callbacks run synchronously inside the
/// main loop, in registration order, and only get shared access to the grid.
pub trait SolverListener {
    fn on_assignment(&mut self, _grid: &Grid, _slot_id: SlotId, _word: &str) {}

    fn on_unassignment(&mut self, _grid: &Grid, _slot_id: SlotId, _word: &str) {}
}

impl<T: SolverListener + ?Sized> SolverListener for &mut T {
    fn on_assignment(&mut self, grid: &Grid, slot_id: SlotId, word: &str) {
        (**self).on_assignment(grid, slot_id, word);
    }

    fn on_unassignment(&mut self, grid: &Grid, slot_id: SlotId, word: &str) {
        (**self).on_unassignment(grid, slot_id, word);
    }
}

/// Coarse progress reporting for callers. The percentage is the share of slots currently filled,
/// so it goes down when the search backtracks.
pub trait ProgressListener {
    fn on_initialisation_start(&mut self) {}

    fn on_initialisation_end(&mut self) {}

    fn on_progress(&mut self, _percentage: u8) {}
}

/// A progress listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressListener;

impl ProgressListener for NullProgressListener {}

/// Forwards grid changes to a progress listener as filled percentages, at most once per interval.
pub struct ProgressNotifier<'a> {
    listener: &'a mut dyn ProgressListener,
    interval: Duration,
    last_notification: Instant,
}

impl<'a> ProgressNotifier<'a> {
    pub fn new(listener: &'a mut dyn ProgressListener, interval: Duration) -> ProgressNotifier<'a> {
        ProgressNotifier {
            listener,
            interval,
            last_notification: Instant::now(),
        }
    }

    /// Notify the listener if the interval has elapsed since the last notification.
    pub fn on_change(&mut self, grid: &Grid) {
        if self.last_notification.elapsed() >= self.interval {
            self.notify(grid);
        }
    }

    /// Notify the listener unconditionally.
    pub fn notify(&mut self, grid: &Grid) {
        self.listener.on_progress(percentage(grid));
        self.last_notification = Instant::now();
    }
}

/// Share of the grid's slots that are filled, a grid without slots being complete.
pub fn percentage(grid: &Grid) -> u8 {
    let total = grid.slot_count();
    if total == 0 {
        return 100;
    }
    (grid.filled_slot_count() * 100 / total) as u8
}

/// Traces the whole grid after every change.
#[derive(Debug, Default)]
pub struct FineProgressPrinter;

impl SolverListener for FineProgressPrinter {
    fn on_assignment(&mut self, grid: &Grid, slot_id: SlotId, word: &str) {
        if log_enabled!(Level::Trace) {
            trace!("Assigned {} to slot {}:\n{}", word, slot_id, grid.render());
        }
    }

    fn on_unassignment(&mut self, grid: &Grid, slot_id: SlotId, word: &str) {
        if log_enabled!(Level::Trace) {
            trace!("Unassigned {} from slot {}:\n{}", word, slot_id, grid.render());
        }
    }
}
