/// A question of exactly 80 ASCII characters.
pub fn long_question_fixture() -> &'static str {
    return "Can you walk me through every step of the Bulletproof problem solving framework?";
}

/// A streamed answer body as the course assistant API would send it.
pub fn streamed_answer_fixture() -> &'static str {
    return r#"
Grading Policy for WPC300:

• Assignments: 40%
• Midterm Exam: 20%
• Final Exam: 25%
• Participation: 10%
• Final Project: 5%
"#
    .trim();
}
