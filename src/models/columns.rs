// src/models/columns.rs

//! Canonical column names shared by the engine and its collaborators.

pub const SOURCE_ID: &str = "SourceID";
pub const NAME: &str = "Name";
pub const ADDRESS: &str = "Address";
pub const STATE: &str = "State";
pub const ZIP: &str = "Zip";
pub const CITY: &str = "City";
pub const EMAILS: &str = "Emails";
pub const DOCTORS: &str = "Doctors";
pub const SOURCE: &str = "Source";

pub const MATCHED_ENTITY_ID: &str = "MatchedEntityID";

pub const MATCHED_NAME: &str = "MatchedName";
pub const MATCHED_EMAILS: &str = "MatchedEmails";
pub const MATCHED_ADDRESS: &str = "MatchedAddress";
pub const MATCHED_DOCTORS: &str = "MatchedDoctors";
pub const TOTAL_SCORE: &str = "TotalScore";
pub const MATCHED_PRACTICE_NAME: &str = "MatchedPracticeName";

pub const FILE_NAME: &str = "FileName";
pub const UPLOADED_DATE: &str = "UploadedDate";

/// Columns appended to every source row by the result assembler, in output order.
pub const RESULT_COLUMNS: [&str; 7] = [
    MATCHED_NAME,
    MATCHED_EMAILS,
    MATCHED_ADDRESS,
    MATCHED_DOCTORS,
    TOTAL_SCORE,
    MATCHED_ENTITY_ID,
    MATCHED_PRACTICE_NAME,
];
