//! Validated transformation submission.

use crate::error::{DomainError, DomainResult};

/// Age used when the caller does not provide one.
pub const DEFAULT_TARGET_AGE: u32 = 30;

/// Upper bound accepted for a target age.
pub const MAX_TARGET_AGE: u32 = 120;

/// A request to transform one image into a portrait of an adult in a profession.
///
/// Construction validates the input once, at the boundary; everything downstream
/// assumes non-empty image bytes and a sensible age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    image: Vec<u8>,
    profession: String,
    target_age: u32,
}

impl Submission {
    pub fn new(
        image: Vec<u8>,
        profession: impl Into<String>,
        target_age: u32,
    ) -> DomainResult<Self> {
        if image.is_empty() {
            return Err(DomainError::validation("image must not be empty"));
        }

        let profession = profession.into();
        if profession.trim().is_empty() {
            return Err(DomainError::validation("profession must not be empty"));
        }

        if target_age == 0 || target_age > MAX_TARGET_AGE {
            return Err(DomainError::validation(format!(
                "age must be between 1 and {MAX_TARGET_AGE}"
            )));
        }

        Ok(Self {
            image,
            profession,
            target_age,
        })
    }

    /// Same as [`Submission::new`] with the default target age.
    pub fn with_default_age(image: Vec<u8>, profession: impl Into<String>) -> DomainResult<Self> {
        Self::new(image, profession, DEFAULT_TARGET_AGE)
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn profession(&self) -> &str {
        &self.profession
    }

    pub fn target_age(&self) -> u32 {
        self.target_age
    }

    /// Split into owned parts (image, profession, age).
    pub fn into_parts(self) -> (Vec<u8>, String, u32) {
        (self.image, self.profession, self.target_age)
    }
}
