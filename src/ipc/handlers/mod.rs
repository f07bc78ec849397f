pub mod classes;
pub mod core;
pub mod curriculum;
pub mod grading;
pub mod rooms_teachers;
pub mod subjects;
