use anyhow::Result;
use regex::Regex;

/// Runs of ASCII digits; anything else in the OCR text is noise.
const NUMBER_PATTERN: &str = r"\d+";

/// Returns every digit run in `text`, left to right.
pub fn find_numbers(text: &str) -> Result<Vec<String>> {
    let number_regex = Regex::new(NUMBER_PATTERN)?;
    Ok(number_regex
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Extracts both operands from a region showing "a ? b".
///
/// Returns None unless exactly two numbers were recognized.
pub fn extract_pair(text: &str) -> Result<Option<(String, String)>> {
    let numbers = find_numbers(text)?;
    if numbers.len() != 2 {
        crate::log(&format!(
            "Expected 2 numbers, found {}: {:?}",
            numbers.len(),
            numbers
        ));
        return Ok(None);
    }

    let mut numbers = numbers.into_iter();
    Ok(numbers.next().zip(numbers.next()))
}

/// Extracts a single operand from a region showing one number.
///
/// Takes the first number found; extra fragments are logged and ignored.
pub fn extract_single(text: &str) -> Result<Option<String>> {
    let numbers = find_numbers(text)?;
    if numbers.len() > 1 {
        crate::log(&format!(
            "Region has {} numbers, using the first: {:?}",
            numbers.len(),
            numbers
        ));
    }
    Ok(numbers.into_iter().next())
}
