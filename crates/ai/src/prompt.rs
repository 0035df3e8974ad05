//! Profession prompt catalog.

/// Prompt used when the profession is not in the catalog.
pub const GENERIC_PROMPT: &str = "professional adult, office setting, mature appearance";

const STYLE_SUFFIX: &str = "realistic face, high quality, detailed";

const PROFESSIONS: &[(&str, &str)] = &[
    (
        "doctor",
        "professional doctor in white coat, medical setting, mature face, confident expression",
    ),
    (
        "engineer",
        "engineer wearing safety helmet, technical background, focused expression, professional attire",
    ),
    (
        "teacher",
        "teacher in classroom, holding books, warm smile, professional educator",
    ),
    (
        "astronaut",
        "astronaut in space suit, space background, heroic pose",
    ),
    (
        "scientist",
        "scientist in lab coat, laboratory setting, holding test tube, intelligent look",
    ),
    (
        "artist",
        "artist in studio, holding paintbrush, creative expression, artistic background",
    ),
    (
        "pilot",
        "airline pilot in uniform, cockpit background, confident and professional",
    ),
    (
        "firefighter",
        "firefighter in full gear, fire station background, heroic and strong",
    ),
    (
        "chef",
        "professional chef in kitchen, culinary setting, holding cooking utensils",
    ),
    (
        "athlete",
        "professional athlete in sportswear, stadium background, athletic build",
    ),
];

/// Static lookup from profession label to prompt template.
///
/// Labels are matched case-insensitively after trimming. Unknown labels fall
/// back to [`GENERIC_PROMPT`] rather than failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptCatalog;

impl PromptCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Known profession labels, in display order.
    pub fn professions(&self) -> Vec<&'static str> {
        PROFESSIONS.iter().map(|(name, _)| *name).collect()
    }

    /// Template for a profession, if it is known.
    pub fn template(&self, profession: &str) -> Option<&'static str> {
        let key = profession.trim().to_lowercase();
        PROFESSIONS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, template)| *template)
    }

    /// Full prompt: profession template (or the generic one), the age qualifier
    /// and the style suffix.
    pub fn prompt_for(&self, profession: &str, target_age: u32) -> String {
        let template = self.template(profession).unwrap_or(GENERIC_PROMPT);
        format!("{template}, age {target_age}, {STYLE_SUFFIX}")
    }
}
