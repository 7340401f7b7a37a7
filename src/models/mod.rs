// src/models/mod.rs

pub mod admin;
pub mod answer;
pub mod exam_record;
pub mod localized;
pub mod question;
pub mod session;
