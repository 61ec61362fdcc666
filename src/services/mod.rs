pub mod age_calculator;
pub mod date_extractor;
pub mod name_search;
pub mod report_writer;

pub use age_calculator::{calculate_age, AgeCalculator, ADULT_AGE};
pub use date_extractor::{extract_date_of_birth, DateExtractor, Plausibility};
pub use name_search::search_names;
pub use report_writer::ReportWriter;
