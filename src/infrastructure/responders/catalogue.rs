//! Canned answers used when the course assistant API can't be reached.

use crate::domain::models::ChatType;

pub struct ImportantDate {
    pub event: &'static str,
    pub date: &'static str,
}

pub struct GradingPolicy {
    pub assignments: u8,
    pub midterm: u8,
    pub final_exam: u8,
    pub participation: u8,
    pub final_project: u8,
}

pub struct SyllabusInfo {
    pub course_name: &'static str,
    pub instructor: &'static str,
    pub email: &'static str,
    pub office_hours: &'static str,
    pub important_dates: &'static [ImportantDate],
    pub grading_policy: GradingPolicy,
    pub policies: &'static [&'static str],
}

pub static SYLLABUS: SyllabusInfo = SyllabusInfo {
    course_name: "WPC300 - Problem Solving and Actionable Analytics",
    instructor: "Professor Smith",
    email: "professor.smith@asu.edu",
    office_hours: "Tuesday & Thursday 2:00-4:00 PM",
    important_dates: &[
        ImportantDate {
            event: "Module 1 Assignment Due",
            date: "January 31, 2026",
        },
        ImportantDate {
            event: "Module 2 Assignment Due",
            date: "February 14, 2026",
        },
        ImportantDate {
            event: "Midterm Exam",
            date: "February 28, 2026",
        },
        ImportantDate {
            event: "Module 3 Assignment Due",
            date: "March 14, 2026",
        },
        ImportantDate {
            event: "Module 4 Assignment Due",
            date: "March 28, 2026",
        },
        ImportantDate {
            event: "Spring Break",
            date: "March 15-22, 2026",
        },
        ImportantDate {
            event: "Module 5 Assignment Due",
            date: "April 11, 2026",
        },
        ImportantDate {
            event: "Final Project Due",
            date: "April 25, 2026",
        },
        ImportantDate {
            event: "Final Exam",
            date: "May 5, 2026",
        },
    ],
    grading_policy: GradingPolicy {
        assignments: 40,
        midterm: 20,
        final_exam: 25,
        participation: 10,
        final_project: 5,
    },
    policies: &[
        "All assignments are due by the dates listed in Canvas",
        "Late submissions receive 10% penalty per day",
        "Academic integrity violations result in automatic failure",
        "Attendance is mandatory for in-person sessions",
    ],
};

impl SyllabusInfo {
    fn date_of(&self, event: &str) -> &'static str {
        return self
            .important_dates
            .iter()
            .find(|date| {
                return date.event.contains(event);
            })
            .map(|date| {
                return date.date;
            })
            .unwrap_or("TBA");
    }

    fn bulleted_policies(&self) -> String {
        return self
            .policies
            .iter()
            .map(|policy| {
                return format!("• {policy}");
            })
            .collect::<Vec<String>>()
            .join("\n");
    }
}

fn contains_any(question: &str, keywords: &[&str]) -> bool {
    return keywords.iter().any(|keyword| {
        return question.contains(keyword);
    });
}

fn unified_answer(question: &str) -> String {
    let info = &SYLLABUS;
    let gp = &info.grading_policy;

    if contains_any(question, &["midterm", "exam", "final"]) {
        return format!(
            "Here are the exam dates:

• Midterm Exam: {midterm}
  - Covers Modules 1-3 ({midterm_pct}% of grade)

• Final Exam: {final_exam}
  - Comprehensive ({final_pct}% of grade)

Make sure to review all module materials and practice problems!",
            midterm = info.date_of("Midterm"),
            midterm_pct = gp.midterm,
            final_exam = info.date_of("Final Exam"),
            final_pct = gp.final_exam,
        );
    }

    if contains_any(question, &["grading", "grade", "breakdown"]) {
        return format!(
            "Grading Policy for WPC300:

• Assignments: {}%
• Midterm Exam: {}%
• Final Exam: {}%
• Participation: {}%
• Final Project: {}%

Tip: Stay on top of assignments - they're the largest portion of your grade!",
            gp.assignments, gp.midterm, gp.final_exam, gp.participation, gp.final_project
        );
    }

    if contains_any(question, &["office hours", "professor", "instructor"]) {
        return format!(
            "Instructor Information:

{}
{}
Office Hours: {}

Don't hesitate to reach out during office hours if you need help!",
            info.instructor, info.email, info.office_hours
        );
    }

    if contains_any(question, &["late", "policy", "deadline"]) {
        return format!(
            "Course Policies:

{}

Late submissions receive a 10% penalty per day.",
            info.bulleted_policies()
        );
    }

    if contains_any(question, &["bulletproof", "problem-solving", "problem solving"]) {
        return "The Bulletproof Problem-Solving approach is a seven-step framework:

1. Define the Problem - Clearly articulate what you're trying to solve
2. Disaggregate Issues - Break down into smaller components
3. Prioritize - Focus on high-impact issues (80/20 rule)
4. Build Workplan - Create structured plan with timelines
5. Conduct Analysis - Gather data and test hypotheses
6. Synthesize Findings - Draw conclusions
7. Communicate Results - Present clearly to drive action

This framework is covered in Module 1. Would you like me to elaborate on any step?"
            .to_string();
    }

    if question.contains("vlookup") {
        return "VLOOKUP Syntax:
=VLOOKUP(lookup_value, table_array, col_index_num, [range_lookup])

Example:
=VLOOKUP(\"ProductX\", A1:B100, 2, FALSE)

Key Tips:
• Use FALSE for exact matches (most common)
• Lookup column must be the leftmost column
• Consider INDEX-MATCH for more flexibility

This is covered in Module 2: Data Collection & Preparation."
            .to_string();
    }

    if question.contains("pivot") {
        return "Pivot Tables are powerful tools for summarizing data:

Key Steps:
1. Select your data range
2. Insert > PivotTable
3. Drag fields to Rows, Columns, Values areas
4. Use Filters to focus on specific data

Common Uses:
• Summarize sales by region/product
• Calculate averages, counts, sums
• Compare time periods

This is covered in Module 3: Descriptive Analytics."
            .to_string();
    }

    return "Based on the WPC300 course materials, I can help with:

• Course concepts and problem-solving frameworks
• Excel functions and data analysis
• Syllabus, deadlines, and grading policies
• Exam preparation

What specific topic would you like me to explain?"
        .to_string();
}

fn syllabus_answer(question: &str) -> String {
    let info = &SYLLABUS;
    let gp = &info.grading_policy;

    if contains_any(question, &["midterm", "exam"]) {
        return format!(
            "Here are the exam dates:

Midterm Exam: {}
Final Exam: {}

The midterm covers Modules 1-3 ({}% of grade).
The final is comprehensive ({}% of grade).",
            info.date_of("Midterm"),
            info.date_of("Final Exam"),
            gp.midterm,
            gp.final_exam
        );
    }

    if contains_any(question, &["grading", "grade", "breakdown"]) {
        return format!(
            "Grading Policy:
• Assignments: {}%
• Midterm Exam: {}%
• Final Exam: {}%
• Participation: {}%
• Final Project: {}%

Stay on top of assignments - they're the largest portion!",
            gp.assignments, gp.midterm, gp.final_exam, gp.participation, gp.final_project
        );
    }

    if contains_any(question, &["office hours", "professor"]) {
        return format!(
            "Instructor Information:
{}
{}
Office Hours: {}",
            info.instructor, info.email, info.office_hours
        );
    }

    if contains_any(question, &["late", "policy"]) {
        return format!(
            "Course Policies:
{}

Late submissions: 10% penalty per day",
            info.bulleted_policies()
        );
    }

    return format!(
        "For {}, you can ask about:
• Exam dates and grading
• Assignment deadlines
• Office hours
• Course policies

What would you like to know?",
        info.course_name
    );
}

/// Keyword matching is case-insensitive and the first matching topic wins.
pub fn answer(chat_type: ChatType, question: &str) -> String {
    let question = question.to_lowercase();
    match chat_type {
        ChatType::Unified => return unified_answer(&question),
        ChatType::Syllabus => return syllabus_answer(&question),
    }
}
