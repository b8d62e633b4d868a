use itertools::Itertools;
use log::{trace, warn};
use std::collections::{HashMap, HashSet};

use crate::data::{
    Assignment, AssignmentId, Faculty, FacultyId, GenerationInput, PlacedEntry, SectionId,
    SkipReason, SkippedAssignment, Slot, SubjectType, UnassignedCourse,
};

/// One atomic schedulable unit: an hour of a subject or activity, or one lab session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseInstance {
    pub section_id: SectionId,
    pub assignment_id: AssignmentId,
    pub faculty_id: FacultyId,
    pub faculty_name: String,
    pub subject_name: String,
    pub subject_type: SubjectType,
    pub instance_index: u32,
    /// Periods consumed; always at least 1.
    pub total_duration: u32,
    pub preference: Option<Slot>,
}

impl CourseInstance {
    pub fn is_lab(&self) -> bool {
        self.subject_type == SubjectType::Lab
    }

    pub fn entry(&self, is_continuation: bool) -> PlacedEntry {
        PlacedEntry {
            assignment_id: self.assignment_id.clone(),
            instance_index: self.instance_index,
            subject_name: self.subject_name.clone(),
            faculty_name: self.faculty_name.clone(),
            subject_type: self.subject_type,
            total_duration: self.total_duration,
            is_continuation,
        }
    }

    pub fn unassigned(&self) -> UnassignedCourse {
        UnassignedCourse {
            assignment_id: self.assignment_id.clone(),
            instance_index: self.instance_index,
            subject_name: self.subject_name.clone(),
            faculty_name: self.faculty_name.clone(),
            subject_type: self.subject_type,
            total_duration: self.total_duration,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub instances: Vec<CourseInstance>,
    pub skipped: Vec<SkippedAssignment>,
}

/// Expands every assignment into course instances.
///
/// Sections are visited in input order and assignments in authoring order.
/// Assignments whose section, faculty or subject does not resolve emit no
/// instance and are listed in `skipped` instead.
pub fn expand(input: &GenerationInput) -> Expansion {
    let faculty_map: HashMap<&str, &Faculty> =
        input.faculty.iter().map(|f| (f.id.as_str(), f)).collect();
    let mut expansion = Expansion::default();

    for section in &input.sections {
        let Some(assignments) = input.assignments.get(&section.id) else {
            continue;
        };
        for assignment in assignments {
            match resolve(assignment, &faculty_map) {
                Ok((faculty, subject_name, subject_type)) => {
                    expand_assignment(
                        &section.id,
                        assignment,
                        faculty,
                        subject_name,
                        subject_type,
                        &mut expansion.instances,
                    );
                }
                Err(reason) => expansion.skip(&section.id, &assignment.id, reason),
            }
        }
    }

    let known: HashSet<&str> = input.sections.iter().map(|s| s.id.as_str()).collect();
    for (section_id, assignments) in input
        .assignments
        .iter()
        .filter(|(id, _)| !known.contains(id.as_str()))
        .sorted_by(|a, b| a.0.cmp(b.0))
    {
        for assignment in assignments {
            expansion.skip(section_id, &assignment.id, SkipReason::UnknownSection);
        }
    }

    expansion
}

impl Expansion {
    fn skip(&mut self, section_id: &str, assignment_id: &str, reason: SkipReason) {
        let skipped = SkippedAssignment {
            section_id: section_id.to_string(),
            assignment_id: assignment_id.to_string(),
            reason,
        };
        warn!("{skipped}");
        self.skipped.push(skipped);
    }

    pub fn count_for_section(&self, section_id: &str) -> usize {
        self.instances
            .iter()
            .filter(|i| i.section_id == section_id)
            .count()
    }
}

fn resolve<'a>(
    assignment: &'a Assignment,
    faculty_map: &HashMap<&str, &'a Faculty>,
) -> Result<(&'a Faculty, &'a str, SubjectType), SkipReason> {
    let faculty = faculty_map
        .get(assignment.faculty_id.as_str())
        .copied()
        .ok_or(SkipReason::UnknownFaculty)?;
    let subject = faculty
        .subject(&assignment.subject_id)
        .ok_or(SkipReason::UnknownSubject)?;
    Ok((faculty, subject.name.as_str(), subject.kind))
}

fn expand_assignment(
    section_id: &str,
    assignment: &Assignment,
    faculty: &Faculty,
    subject_name: &str,
    subject_type: SubjectType,
    out: &mut Vec<CourseInstance>,
) {
    let (count, duration) = match subject_type {
        SubjectType::Lab => (assignment.instances, assignment.periods.max(1)),
        SubjectType::Subject | SubjectType::Activity => (assignment.hours, 1),
    };
    trace!(
        "Expanding {} ({}) for section {} into {} instance(s) of {} period(s).",
        subject_name, faculty.name, section_id, count, duration
    );

    for instance_index in 0..count {
        let preference = assignment
            .preferences
            .get(instance_index as usize)
            .and_then(|p| p.slot());
        out.push(CourseInstance {
            section_id: section_id.to_string(),
            assignment_id: assignment.id.clone(),
            faculty_id: faculty.id.clone(),
            faculty_name: faculty.name.clone(),
            subject_name: subject_name.to_string(),
            subject_type,
            instance_index,
            total_duration: duration,
            preference,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Availability, Preference, Section, Subject, Weekday};

    fn faculty() -> Faculty {
        Faculty {
            id: "f1".into(),
            name: "Dr. Rao".into(),
            subjects: vec![
                Subject { id: "math".into(), name: "Maths".into(), kind: SubjectType::Subject },
                Subject { id: "chem-lab".into(), name: "Chemistry Lab".into(), kind: SubjectType::Lab },
            ],
            availability: Availability::always(6),
        }
    }

    fn assignment(id: &str, subject_id: &str) -> Assignment {
        Assignment {
            id: id.into(),
            faculty_id: "f1".into(),
            subject_id: subject_id.into(),
            hours: 0,
            instances: 0,
            periods: 1,
            preferences: Vec::new(),
        }
    }

    fn input(assignments: Vec<Assignment>) -> GenerationInput {
        GenerationInput {
            faculty: vec![faculty()],
            sections: vec![Section { id: "s1".into(), name: "CSE-A".into(), in_charge: None }],
            assignments: [("s1".to_string(), assignments)].into_iter().collect(),
            ..GenerationInput::default()
        }
    }

    #[test]
    fn subjects_expand_per_hour() {
        let mut maths = assignment("a1", "math");
        maths.hours = 3;
        maths.periods = 4;
        let expansion = expand(&input(vec![maths]));

        assert_eq!(expansion.instances.len(), 3);
        assert!(expansion.instances.iter().all(|i| i.total_duration == 1));
        let indices: Vec<u32> = expansion.instances.iter().map(|i| i.instance_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(expansion.skipped.is_empty());
    }

    #[test]
    fn labs_expand_per_instance_with_duration() {
        let mut lab = assignment("a1", "chem-lab");
        lab.instances = 2;
        lab.periods = 3;
        lab.hours = 9;
        let expansion = expand(&input(vec![lab]));

        assert_eq!(expansion.instances.len(), 2);
        assert!(expansion.instances.iter().all(|i| i.total_duration == 3 && i.is_lab()));
    }

    #[test]
    fn zero_period_lab_takes_one_period() {
        let mut lab = assignment("a1", "chem-lab");
        lab.instances = 1;
        lab.periods = 0;
        let expansion = expand(&input(vec![lab]));
        assert_eq!(expansion.instances[0].total_duration, 1);
    }

    #[test]
    fn preferences_apply_by_instance_index() {
        let mut maths = assignment("a1", "math");
        maths.hours = 3;
        maths.preferences = vec![Preference::Any, Preference::explicit(Weekday::Friday, 2)];
        let expansion = expand(&input(vec![maths]));

        let prefs: Vec<Option<Slot>> = expansion.instances.iter().map(|i| i.preference).collect();
        assert_eq!(prefs, vec![None, Some(Slot::new(Weekday::Friday, 2)), None]);
    }

    #[test]
    fn unresolved_references_are_skipped() {
        let mut missing_subject = assignment("a1", "physics");
        missing_subject.hours = 2;
        let mut missing_faculty = assignment("a2", "math");
        missing_faculty.faculty_id = "ghost".into();
        missing_faculty.hours = 2;

        let mut input = input(vec![missing_subject, missing_faculty]);
        let mut orphan = assignment("a3", "math");
        orphan.hours = 1;
        input.assignments.insert("gone".into(), vec![orphan]);

        let expansion = expand(&input);
        assert!(expansion.instances.is_empty());
        let reasons: Vec<SkipReason> = expansion.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![SkipReason::UnknownSubject, SkipReason::UnknownFaculty, SkipReason::UnknownSection]
        );
    }
}
