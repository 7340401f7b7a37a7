// src/exam/mod.rs

//! Exam-taking core: data repair, scoring and the timed session.

pub mod countdown;
pub mod normalize;
pub mod scoring;
pub mod session;
pub mod submission;
