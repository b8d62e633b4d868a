use itertools::iproduct;
use log::{debug, info, trace};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use crate::data::{
    Availability, Config, GenerationInput, GenerationOutput, SectionTimetable, Slot, SubjectType,
    UnassignedCourse, Weekday,
};
use crate::error::ConfigError;
use crate::expander::{CourseInstance, expand};
use crate::grid::{FacultyBusy, Grid};
use crate::report;

/// Generates timetables for every section of the input.
///
/// Placement is greedy and first-fit: labs sharing an explicit slot are
/// co-placed first, then the remaining instances are placed one by one in
/// priority order without backtracking. An input that admits a complete
/// timetable can still come back with unassigned instances.
pub fn generate(input: &GenerationInput) -> Result<GenerationOutput, ConfigError> {
    let start_time = Instant::now();
    input.config.validate()?;

    let expansion = expand(input);
    info!(
        "Generating timetables for {} sections from {} course instances ({} assignments skipped)...",
        input.sections.len(),
        expansion.instances.len(),
        expansion.skipped.len()
    );

    let mut timetabler = Timetabler::new(input);
    timetabler.run(expansion.instances);

    let timetables: Vec<SectionTimetable> = input
        .sections
        .iter()
        .map(|section| SectionTimetable {
            section_id: section.id.clone(),
            section_name: section.name.clone(),
            in_charge: section.in_charge.clone(),
            days: timetabler.grid.schedule(&section.id),
            unassigned: timetabler.unassigned.remove(&section.id).unwrap_or_default(),
        })
        .collect();

    let placed: usize = input
        .sections
        .iter()
        .map(|section| timetabler.grid.placed_count(&section.id))
        .sum();
    let unassigned: usize = timetables.iter().map(|t| t.unassigned.len()).sum();
    info!(
        "Generation finished in {:.2?}: {} instance(s) placed, {} unassigned.",
        start_time.elapsed(),
        placed,
        unassigned
    );

    Ok(GenerationOutput {
        period_times: input.config.period_times(),
        summaries: report::summarize(input, &timetables),
        timetables,
        skipped: expansion.skipped,
    })
}

/// Why a candidate slot was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    OutsideDay,
    Lunch,
    Unavailable,
    Occupied,
    FacultyBusy,
    DailyCap,
    Adjacent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::OutsideDay => "runs past the end of the day",
            Rejection::Lunch => "covers the lunch break",
            Rejection::Unavailable => "faculty unavailable",
            Rejection::Occupied => "section already has a class",
            Rejection::FacultyBusy => "faculty already teaching",
            Rejection::DailyCap => "daily cap reached",
            Rejection::Adjacent => "same subject in the previous period",
        };
        f.write_str(text)
    }
}

/// Owns the mutable state of a single run.
struct Timetabler<'a> {
    config: &'a Config,
    availability: HashMap<&'a str, &'a Availability>,
    grid: Grid,
    busy: FacultyBusy,
    unassigned: HashMap<String, Vec<UnassignedCourse>>,
}

impl<'a> Timetabler<'a> {
    fn new(input: &'a GenerationInput) -> Self {
        Self {
            config: &input.config,
            availability: input
                .faculty
                .iter()
                .map(|f| (f.id.as_str(), &f.availability))
                .collect(),
            grid: Grid::new(&input.sections, input.config.periods_per_day),
            busy: FacultyBusy::new(input.config.periods_per_day),
            unassigned: HashMap::new(),
        }
    }

    fn run(&mut self, instances: Vec<CourseInstance>) {
        let remainder = self.place_lab_pairs(instances);
        for instance in prioritize(remainder) {
            self.place(&instance);
        }
    }

    fn mark_unassigned(&mut self, instance: &CourseInstance) {
        debug!(
            "No slot for {} ({}) instance {} in section {}.",
            instance.subject_name, instance.faculty_name, instance.instance_index, instance.section_id
        );
        self.unassigned
            .entry(instance.section_id.clone())
            .or_default()
            .push(instance.unassigned());
    }

    /// Pairs labs of one section that share an explicit slot and commits each
    /// pair jointly. Returns the instances that were not paired, in input order.
    fn place_lab_pairs(&mut self, instances: Vec<CourseInstance>) -> Vec<CourseInstance> {
        let pairs = find_lab_pairs(&instances);
        if pairs.is_empty() {
            return instances;
        }

        let mut paired = vec![false; instances.len()];
        for &(i, j) in &pairs {
            paired[i] = true;
            paired[j] = true;
            self.place_pair(&instances[i], &instances[j]);
        }

        instances
            .into_iter()
            .zip(paired)
            .filter_map(|(instance, paired)| (!paired).then_some(instance))
            .collect()
    }

    // All or nothing: an infeasible pair is never placed independently.
    fn place_pair(&mut self, first: &CourseInstance, second: &CourseInstance) {
        let Some(slot) = first.preference else {
            return;
        };
        let duration = first.total_duration.max(second.total_duration);
        let faculty = [first.faculty_id.as_str(), second.faculty_id.as_str()];

        match self.check_span(&first.section_id, &faculty, slot.day, slot.period, duration) {
            Ok(()) => {
                debug!(
                    "Paired {} and {} in section {} at {}.",
                    first.subject_name, second.subject_name, first.section_id, slot
                );
                self.commit(first, slot.day, slot.period, duration);
                self.commit(second, slot.day, slot.period, duration);
            }
            Err(rejection) => {
                debug!(
                    "Pairing {} and {} in section {} at {} failed: {}.",
                    first.subject_name, second.subject_name, first.section_id, slot, rejection
                );
                self.mark_unassigned(first);
                self.mark_unassigned(second);
            }
        }
    }

    /// Tries the preferred slot, then every slot in scan order.
    fn place(&mut self, instance: &CourseInstance) {
        if let Some(slot) = instance.preference {
            if self.can_place(instance, slot.day, slot.period) {
                debug!(
                    "Placed {} for section {} at preferred {}.",
                    instance.subject_name, instance.section_id, slot
                );
                self.commit(instance, slot.day, slot.period, instance.total_duration);
                return;
            }
        }

        let mut days = Weekday::ALL.to_vec();
        let mut periods: Vec<u32> = (1..=self.config.periods_per_day).collect();
        if instance.subject_type == SubjectType::Activity {
            days.reverse();
            periods.reverse();
        }

        let found = iproduct!(days, periods)
            .find(|&(day, period)| self.can_place(instance, day, period));
        match found {
            Some((day, period)) => {
                debug!(
                    "Placed {} for section {} at {}.",
                    instance.subject_name,
                    instance.section_id,
                    Slot::new(day, period)
                );
                self.commit(instance, day, period, instance.total_duration);
            }
            None => self.mark_unassigned(instance),
        }
    }

    fn can_place(&self, instance: &CourseInstance, day: Weekday, period: u32) -> bool {
        match self.check(instance, day, period) {
            Ok(()) => true,
            Err(rejection) => {
                trace!(
                    "{} for section {} rejected at {}: {}.",
                    instance.subject_name,
                    instance.section_id,
                    Slot::new(day, period),
                    rejection
                );
                false
            }
        }
    }

    fn check(&self, instance: &CourseInstance, day: Weekday, period: u32) -> Result<(), Rejection> {
        let section_id = instance.section_id.as_str();
        self.check_span(
            section_id,
            &[instance.faculty_id.as_str()],
            day,
            period,
            instance.total_duration,
        )?;

        let starts = self.grid.starts_on_day(section_id, day);
        let within_cap = match instance.subject_type {
            SubjectType::Lab => {
                starts.filter(|e| e.subject_type == SubjectType::Lab).count()
                    < self.config.max_labs_per_day as usize
            }
            SubjectType::Activity => {
                starts.filter(|e| e.subject_type == SubjectType::Activity).count()
                    < self.config.max_activities_per_day as usize
            }
            SubjectType::Subject => {
                starts.filter(|e| e.subject_name == instance.subject_name).count()
                    < self.config.max_subjects_per_day as usize
            }
        };
        if !within_cap {
            return Err(Rejection::DailyCap);
        }

        if instance.total_duration == 1 && period >= 2 {
            let previous = self.grid.cell(section_id, day, period as usize - 2);
            if previous.is_some_and(|cell| {
                cell.iter().any(|e| e.subject_name == instance.subject_name)
            }) {
                return Err(Rejection::Adjacent);
            }
        }

        Ok(())
    }

    /// Checks that every period of the span is a free, non-lunch slot of the
    /// section and that every listed faculty member is available and idle there.
    fn check_span(
        &self,
        section_id: &str,
        faculty: &[&str],
        day: Weekday,
        period: u32,
        duration: u32,
    ) -> Result<(), Rejection> {
        if period == 0 {
            return Err(Rejection::OutsideDay);
        }
        for offset in 0..duration {
            let current = period + offset;
            if current > self.config.periods_per_day {
                return Err(Rejection::OutsideDay);
            }
            if self.config.is_lunch(current) {
                return Err(Rejection::Lunch);
            }
            let index = current as usize - 1;
            for faculty_id in faculty {
                let available = self
                    .availability
                    .get(faculty_id)
                    .is_some_and(|a| a.is_available(day, index));
                if !available {
                    return Err(Rejection::Unavailable);
                }
            }
            if !self.grid.is_free(section_id, day, index) {
                return Err(Rejection::Occupied);
            }
            if faculty.iter().any(|f| self.busy.is_busy(f, day, index)) {
                return Err(Rejection::FacultyBusy);
            }
        }
        Ok(())
    }

    /// Writes the instance into every covered cell and marks its faculty busy.
    /// Callers check the whole span first.
    fn commit(&mut self, instance: &CourseInstance, day: Weekday, period: u32, duration: u32) {
        for offset in 0..duration {
            let index = (period + offset) as usize - 1;
            self.grid
                .push(&instance.section_id, day, index, instance.entry(offset > 0));
            self.busy.mark(&instance.faculty_id, day, index);
        }
    }
}

/// Finds disjoint pairs of labs in the same section with identical explicit
/// preferences. First found wins, in input order.
fn find_lab_pairs(instances: &[CourseInstance]) -> Vec<(usize, usize)> {
    let labs: Vec<usize> = instances
        .iter()
        .enumerate()
        .filter(|(_, instance)| instance.is_lab())
        .map(|(i, _)| i)
        .collect();

    let mut paired = vec![false; instances.len()];
    let mut pairs = Vec::new();
    for (n, &i) in labs.iter().enumerate() {
        for &j in &labs[n + 1..] {
            if paired[i] || paired[j] {
                continue;
            }
            let (first, second) = (&instances[i], &instances[j]);
            if first.section_id == second.section_id
                && first.preference.is_some()
                && first.preference == second.preference
            {
                paired[i] = true;
                paired[j] = true;
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Explicit preferences first, then longer durations; stable otherwise.
fn prioritize(mut instances: Vec<CourseInstance>) -> Vec<CourseInstance> {
    instances.sort_by_key(|i| (i.preference.is_none(), Reverse(i.total_duration)));
    instances
}
