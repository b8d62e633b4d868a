use std::collections::HashMap;

use crate::data::{DaySchedule, FacultyId, PlacedEntry, Section, SectionId, Weekday};

pub type Cell = Vec<PlacedEntry>;

/// Occupancy of every section, day and period for one run.
///
/// Period indices are 0-based throughout this module.
#[derive(Debug, Clone)]
pub struct Grid {
    periods_per_day: usize,
    section_index: HashMap<SectionId, usize>,
    // [section][day * periods_per_day + period_index]
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(sections: &[Section], periods_per_day: u32) -> Self {
        let periods_per_day = periods_per_day as usize;
        let section_index = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let cells = sections
            .iter()
            .map(|_| vec![Cell::new(); Weekday::ALL.len() * periods_per_day])
            .collect();
        Self {
            periods_per_day,
            section_index,
            cells,
        }
    }

    fn offset(&self, day: Weekday, period_index: usize) -> Option<usize> {
        (period_index < self.periods_per_day)
            .then(|| day.index() * self.periods_per_day + period_index)
    }

    fn day_range(&self, day: Weekday) -> std::ops::Range<usize> {
        let start = day.index() * self.periods_per_day;
        start..start + self.periods_per_day
    }

    pub fn cell(&self, section_id: &str, day: Weekday, period_index: usize) -> Option<&Cell> {
        let section = *self.section_index.get(section_id)?;
        let offset = self.offset(day, period_index)?;
        self.cells[section].get(offset)
    }

    /// True only for an existing cell with no entries.
    pub fn is_free(&self, section_id: &str, day: Weekday, period_index: usize) -> bool {
        self.cell(section_id, day, period_index)
            .is_some_and(|cell| cell.is_empty())
    }

    /// All cells of one section's day, in period order.
    pub fn day(&self, section_id: &str, day: Weekday) -> &[Cell] {
        match self.section_index.get(section_id) {
            Some(&section) => &self.cells[section][self.day_range(day)],
            None => &[],
        }
    }

    /// Entries that start a placement on the given day (continuations excluded).
    pub fn starts_on_day<'a>(
        &'a self,
        section_id: &str,
        day: Weekday,
    ) -> impl Iterator<Item = &'a PlacedEntry> + 'a {
        self.day(section_id, day)
            .iter()
            .flatten()
            .filter(|entry| !entry.is_continuation)
    }

    /// Appends an entry to a cell. Returns false if the cell does not exist.
    pub fn push(
        &mut self,
        section_id: &str,
        day: Weekday,
        period_index: usize,
        entry: PlacedEntry,
    ) -> bool {
        let Some(&section) = self.section_index.get(section_id) else {
            return false;
        };
        let Some(offset) = self.offset(day, period_index) else {
            return false;
        };
        self.cells[section][offset].push(entry);
        true
    }

    pub fn placed_count(&self, section_id: &str) -> usize {
        Weekday::ALL
            .iter()
            .map(|day| self.starts_on_day(section_id, *day).count())
            .sum()
    }

    pub fn schedule(&self, section_id: &str) -> Vec<DaySchedule> {
        Weekday::ALL
            .iter()
            .map(|day| DaySchedule {
                day: *day,
                periods: self.day(section_id, *day).to_vec(),
            })
            .collect()
    }
}

/// Which periods each faculty member already teaches. Cells are never cleared.
#[derive(Debug, Clone, Default)]
pub struct FacultyBusy {
    periods_per_day: usize,
    busy: HashMap<FacultyId, Vec<bool>>,
}

impl FacultyBusy {
    pub fn new(periods_per_day: u32) -> Self {
        Self {
            periods_per_day: periods_per_day as usize,
            busy: HashMap::new(),
        }
    }

    pub fn is_busy(&self, faculty_id: &str, day: Weekday, period_index: usize) -> bool {
        if period_index >= self.periods_per_day {
            return false;
        }
        self.busy
            .get(faculty_id)
            .is_some_and(|slots| slots[day.index() * self.periods_per_day + period_index])
    }

    pub fn mark(&mut self, faculty_id: &str, day: Weekday, period_index: usize) {
        if period_index >= self.periods_per_day {
            return;
        }
        let len = Weekday::ALL.len() * self.periods_per_day;
        let slots = self
            .busy
            .entry(faculty_id.to_string())
            .or_insert_with(|| vec![false; len]);
        slots[day.index() * self.periods_per_day + period_index] = true;
    }
}
