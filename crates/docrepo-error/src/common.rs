// Common error utilities and helper functions
// Shorthands for the errors the client raises most often

use crate::ClientError;

/// Create a "not found" remote error for the given target
pub fn not_found_error(target: impl Into<String>) -> ClientError {
    ClientError::remote(404, format!("Not found: {}", target.into()))
}

/// Create a decoding error for an entity type nothing can decode
pub fn unknown_entity_type_error(entity_type: &str) -> ClientError {
    ClientError::decoding(format!(
        "No marshaller registered for entity type '{}'",
        entity_type
    ))
}

/// Create a decoding error for a result of the wrong shape
pub fn unexpected_result_error(expected: &str, actual: &str) -> ClientError {
    ClientError::decoding(format!("Expected {} result, got {}", expected, actual))
}

/// Create an encoding error for an input type nothing can encode
pub fn unregistered_input_error(type_name: &str) -> ClientError {
    ClientError::encoding(format!("No marshaller registered for input type {}", type_name))
}
