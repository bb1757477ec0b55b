use regex::Regex;
use unic_langid::LanguageIdentifier;

/// Validate a language code as a BCP 47 identifier. The code names the
/// `<code>.lproj` directory, so it is checked as written.
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    match lang.parse::<LanguageIdentifier>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!(
            "Invalid language code format: {}. Expected valid BCP 47 language identifier",
            lang
        )),
    }
}

/// The routine name is matched against identifier tokens, so anything else
/// would never match.
pub fn validate_routine_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(format!("Invalid routine name: {name:?}. Expected an identifier"));
    }
    Ok(())
}

/// Compile the optional exclude pattern.
pub fn compile_exclude(pattern: Option<&str>) -> Result<Option<Regex>, String> {
    pattern
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| format!("Invalid exclude pattern: {}", e))
        })
        .transpose()
}
