//! Pre-network input checks.
//!
//! Validation failures are surfaced as inline notifications and never issue a
//! network call; messages are user-facing text.

/// Analyze refuses resumes shorter than this many words.
pub const MIN_RESUME_WORDS: usize = 20;
/// JDs shorter than this are rejected as too thin to score against.
pub const MIN_JD_WORDS: usize = 10;
/// The rewrite endpoint's own floor, mirrored client-side.
pub const MIN_REWRITE_CHARS: usize = 5;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn validate_resume_text(text: &str) -> Result<(), String> {
    let words = word_count(text);
    if words == 0 {
        return Err("Paste or load your resume text first".to_string());
    }
    if words < MIN_RESUME_WORDS {
        return Err(format!(
            "Resume text is too short ({words} words, need at least {MIN_RESUME_WORDS})"
        ));
    }
    Ok(())
}

pub fn validate_jd_text(text: &str) -> Result<(), String> {
    let words = word_count(text);
    if words == 0 {
        return Err("Paste or load the job description first".to_string());
    }
    if words < MIN_JD_WORDS {
        return Err(format!(
            "Job description is too short ({words} words, need at least {MIN_JD_WORDS})"
        ));
    }
    Ok(())
}

pub fn validate_rewrite_text(text: &str) -> Result<(), String> {
    if text.trim().len() < MIN_REWRITE_CHARS {
        return Err("Select a bullet with some text to rewrite".to_string());
    }
    Ok(())
}
