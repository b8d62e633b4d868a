//! Per-section summaries: who teaches what, the weekly load behind each
//! assignment, and a tally of instances that could not be placed.

use serde::Serialize;
use std::collections::HashMap;

use crate::data::{
    Faculty, GenerationInput, Section, SectionId, SectionTimetable, SubjectType, UnassignedCourse,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRoster {
    pub faculty_name: String,
    /// Distinct subject names, in assignment order.
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLoad {
    pub subject_name: String,
    pub faculty_name: String,
    pub subject_type: SubjectType,
    /// Sessions per week: hours for subjects and activities, instances for labs.
    pub sessions: u32,
    /// Periods per session; 1 unless a lab.
    pub periods_per_session: u32,
}

impl SubjectLoad {
    pub fn periods_per_week(&self) -> u32 {
        self.sessions.saturating_mul(self.periods_per_session)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedTally {
    /// `"<subject> (<faculty>)"`
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub section_id: SectionId,
    pub section_name: String,
    pub faculty: Vec<FacultyRoster>,
    /// Subjects first, then labs, then activities.
    pub load: Vec<SubjectLoad>,
    /// Periods the section asks for in a week, across all of `load`.
    pub weekly_periods: u32,
    pub unassigned: Vec<UnassignedTally>,
}

/// Summarises every section of the input. Unassigned tallies come from the
/// matching timetable, if one is given.
pub fn summarize(input: &GenerationInput, timetables: &[SectionTimetable]) -> Vec<SectionSummary> {
    let faculty_map: HashMap<&str, &Faculty> =
        input.faculty.iter().map(|f| (f.id.as_str(), f)).collect();

    input
        .sections
        .iter()
        .map(|section| {
            let unassigned = timetables
                .iter()
                .find(|t| t.section_id == section.id)
                .map(|t| t.unassigned.as_slice())
                .unwrap_or_default();
            summarize_section(input, section, &faculty_map, unassigned)
        })
        .collect()
}

fn summarize_section(
    input: &GenerationInput,
    section: &Section,
    faculty_map: &HashMap<&str, &Faculty>,
    unassigned: &[UnassignedCourse],
) -> SectionSummary {
    let mut faculty: Vec<FacultyRoster> = Vec::new();
    let mut load = Vec::new();

    // Unresolved assignments are left out, as they are during expansion.
    let resolved = input
        .assignments
        .get(&section.id)
        .into_iter()
        .flatten()
        .filter_map(|a| {
            let fac = *faculty_map.get(a.faculty_id.as_str())?;
            let subject = fac.subject(&a.subject_id)?;
            Some((a, fac, subject))
        });

    for (assignment, fac, subject) in resolved {
        match faculty.iter_mut().find(|r| r.faculty_name == fac.name) {
            Some(roster) if !roster.subjects.contains(&subject.name) => {
                roster.subjects.push(subject.name.clone())
            }
            Some(_) => {}
            None => faculty.push(FacultyRoster {
                faculty_name: fac.name.clone(),
                subjects: vec![subject.name.clone()],
            }),
        }

        let (sessions, periods_per_session) = match subject.kind {
            SubjectType::Lab => (assignment.instances, assignment.periods.max(1)),
            SubjectType::Subject | SubjectType::Activity => (assignment.hours, 1),
        };
        load.push(SubjectLoad {
            subject_name: subject.name.clone(),
            faculty_name: fac.name.clone(),
            subject_type: subject.kind,
            sessions,
            periods_per_session,
        });
    }
    load.sort_by_key(|l| match l.subject_type {
        SubjectType::Subject => 0,
        SubjectType::Lab => 1,
        SubjectType::Activity => 2,
    });

    let weekly_periods = load
        .iter()
        .fold(0u32, |total, l| total.saturating_add(l.periods_per_week()));

    SectionSummary {
        section_id: section.id.clone(),
        section_name: section.name.clone(),
        faculty,
        weekly_periods,
        load,
        unassigned: tally(unassigned),
    }
}

fn tally(unassigned: &[UnassignedCourse]) -> Vec<UnassignedTally> {
    let mut tallies: Vec<UnassignedTally> = Vec::new();
    for course in unassigned {
        let label = format!("{} ({})", course.subject_name, course.faculty_name);
        match tallies.iter_mut().find(|t| t.label == label) {
            Some(existing) => existing.count += 1,
            None => tallies.push(UnassignedTally { label, count: 1 }),
        }
    }
    tallies
}
