use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ConfigError;
use crate::report::SectionSummary;

// Type aliases for clarity
pub type FacultyId = String;
pub type SubjectId = String;
pub type SectionId = String;
pub type AssignmentId = String;

/// First period of the clock, in minutes after midnight (07:00).
const CLOCK_ORIGIN_MINUTES: u64 = 7 * 60;
const MINUTES_PER_DAY: u64 = 24 * 60;

/// The six teaching days of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Subject,
    Lab,
    Activity,
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubjectType::Subject => "subject",
            SubjectType::Lab => "lab",
            SubjectType::Activity => "activity",
        };
        f.write_str(name)
    }
}

/// Something a faculty member can teach.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
}

/// Per-day availability vectors; `true` means the period may be taught.
///
/// A day missing from the map, or a period beyond the end of its vector,
/// counts as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Availability(pub BTreeMap<Weekday, Vec<bool>>);

impl Availability {
    /// Available for every period of every day.
    pub fn always(periods_per_day: u32) -> Self {
        Self(
            Weekday::ALL
                .iter()
                .map(|day| (*day, vec![true; periods_per_day as usize]))
                .collect(),
        )
    }

    /// Available for no period at all.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_available(&self, day: Weekday, period_index: usize) -> bool {
        self.0
            .get(&day)
            .and_then(|periods| periods.get(period_index))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, day: Weekday, period_index: usize, available: bool) {
        let periods = self.0.entry(day).or_default();
        if periods.len() <= period_index {
            periods.resize(period_index + 1, false);
        }
        periods[period_index] = available;
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub availability: Availability,
}

impl Faculty {
    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }
}

/// A class section. The in-charge faculty is carried through to the output only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub in_charge: Option<FacultyId>,
}

/// A (day, period) coordinate. `period` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Slot {
    pub day: Weekday,
    pub period: u32,
}

impl Slot {
    pub fn new(day: Weekday, period: u32) -> Self {
        Self { day, period }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} period {}", self.day, self.period)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Preference {
    #[default]
    Any,
    Explicit { day: Weekday, period: u32 },
}

impl Preference {
    pub fn explicit(day: Weekday, period: u32) -> Self {
        Preference::Explicit { day, period }
    }

    pub fn slot(&self) -> Option<Slot> {
        match *self {
            Preference::Any => None,
            Preference::Explicit { day, period } => Some(Slot { day, period }),
        }
    }
}

fn default_periods() -> u32 {
    1
}

/// One subject taught by one faculty member in one section.
///
/// `hours` applies to subjects and activities, `instances` and `periods` to labs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub faculty_id: FacultyId,
    pub subject_id: SubjectId,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub instances: u32,
    #[serde(default = "default_periods")]
    pub periods: u32,
    #[serde(default)]
    pub preferences: Vec<Preference>,
}

fn default_periods_per_day() -> u32 {
    8
}

fn default_lunch_break_at() -> u32 {
    4
}

fn default_start_time() -> u32 {
    4
}

fn default_period_duration() -> u32 {
    45
}

fn unlimited() -> u32 {
    u32::MAX
}

/// Per-run configuration. Caps that are left out never reject a slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_periods_per_day")]
    pub periods_per_day: u32,
    /// 0 disables lunch; otherwise the 1-based period after which lunch falls.
    #[serde(default = "default_lunch_break_at")]
    pub lunch_break_at: u32,
    #[serde(default = "unlimited")]
    pub max_subjects_per_day: u32,
    #[serde(default = "unlimited")]
    pub max_labs_per_day: u32,
    #[serde(default = "unlimited")]
    pub max_activities_per_day: u32,
    /// Quarter hours after 07:00 at which the first period starts.
    #[serde(default = "default_start_time")]
    pub start_time: u32,
    /// Minutes per period.
    #[serde(default = "default_period_duration")]
    pub period_duration: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            periods_per_day: default_periods_per_day(),
            lunch_break_at: default_lunch_break_at(),
            max_subjects_per_day: unlimited(),
            max_labs_per_day: unlimited(),
            max_activities_per_day: unlimited(),
            start_time: default_start_time(),
            period_duration: default_period_duration(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods_per_day == 0 {
            return Err(ConfigError::NoPeriods);
        }
        if self.lunch_break_at > self.periods_per_day {
            return Err(ConfigError::LunchOutOfRange {
                lunch_break_at: self.lunch_break_at,
                periods_per_day: self.periods_per_day,
            });
        }
        if self.period_duration == 0 {
            return Err(ConfigError::ZeroPeriodDuration);
        }
        let end = self.first_period_minutes()
            + self.periods_per_day as u64 * self.period_duration as u64;
        if end > MINUTES_PER_DAY {
            return Err(ConfigError::PastMidnight { end_minutes: end });
        }
        Ok(())
    }

    /// 1-based index of the lunch period, if any.
    pub fn lunch_period(&self) -> Option<u32> {
        (self.lunch_break_at > 0).then(|| self.lunch_break_at.saturating_add(1))
    }

    pub fn is_lunch(&self, period: u32) -> bool {
        self.lunch_period() == Some(period)
    }

    // u64 so that no u32 start time or duration can overflow the clock.
    fn first_period_minutes(&self) -> u64 {
        CLOCK_ORIGIN_MINUTES + self.start_time as u64 * 15
    }

    /// Clock labels for every period, e.g. `"8:00 AM - 8:45 AM"`.
    pub fn period_times(&self) -> Vec<String> {
        let mut start = self.first_period_minutes();
        (0..self.periods_per_day)
            .map(|_| {
                let end = start + self.period_duration as u64;
                let label = format!("{} - {}", format_minutes(start), format_minutes(end));
                start = end;
                label
            })
            .collect()
    }
}

fn format_minutes(minutes: u64) -> String {
    let hour = (minutes / 60) % 24;
    let minute = minutes % 60;
    let display_hour = if hour % 12 == 0 { 12 } else { hour % 12 };
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    format!("{display_hour}:{minute:02} {meridiem}")
}

/// The complete input for one generation run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInput {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub faculty: Vec<Faculty>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Section id to the assignments of that section, in authoring order.
    #[serde(default)]
    pub assignments: HashMap<SectionId, Vec<Assignment>>,
}

/// One occupant of a grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedEntry {
    pub assignment_id: AssignmentId,
    pub instance_index: u32,
    pub subject_name: String,
    pub faculty_name: String,
    pub subject_type: SubjectType,
    pub total_duration: u32,
    pub is_continuation: bool,
}

/// A course instance that found no feasible slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedCourse {
    pub assignment_id: AssignmentId,
    pub instance_index: u32,
    pub subject_name: String,
    pub faculty_name: String,
    pub subject_type: SubjectType,
    pub total_duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day: Weekday,
    /// One cell per period; each cell holds zero, one or two entries.
    pub periods: Vec<Vec<PlacedEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTimetable {
    pub section_id: SectionId,
    pub section_name: String,
    pub in_charge: Option<FacultyId>,
    pub days: Vec<DaySchedule>,
    pub unassigned: Vec<UnassignedCourse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    UnknownSection,
    UnknownFaculty,
    UnknownSubject,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::UnknownSection => "section does not exist",
            SkipReason::UnknownFaculty => "faculty does not exist",
            SkipReason::UnknownSubject => "subject is not taught by the faculty",
        };
        f.write_str(text)
    }
}

/// An assignment dropped during expansion because a reference did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAssignment {
    pub section_id: SectionId,
    pub assignment_id: AssignmentId,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "assignment {} in section {} skipped: {}",
            self.assignment_id, self.section_id, self.reason
        )
    }
}

/// The final output of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub period_times: Vec<String>,
    pub timetables: Vec<SectionTimetable>,
    pub skipped: Vec<SkippedAssignment>,
    pub summaries: Vec<SectionSummary>,
}

impl GenerationOutput {
    pub fn timetable(&self, section_id: &str) -> Option<&SectionTimetable> {
        self.timetables.iter().find(|t| t.section_id == section_id)
    }
}
