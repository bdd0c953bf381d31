/// Substrings of a user message that warrant generating an image.
const VISUAL_TRIGGERS: &[&str] = &[
    "show", "look", "picture", "photo", "image", "imagine", "see", "how does",
    "what does", "can i see", "share", "where", "place", "location",
    "environment",
];

const LOCATION_WORDS: &[&str] = &["where", "place", "location", "environment"];

const APPEARANCE_WORDS: &[&str] = &["look like", "appearance", "wearing"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Decide whether a turn warrants image generation. Triggering is based on
/// the user's intent alone; the model response is accepted for signature
/// stability but not consulted.
pub fn should_generate_image(user_message: &str, _model_response: &str) -> bool {
    let message = user_message.to_lowercase();

    let has_trigger = contains_any(&message, VISUAL_TRIGGERS);
    let location_related = contains_any(&message, LOCATION_WORDS);
    let appearance_related = contains_any(&message, APPEARANCE_WORDS);

    has_trigger || location_related || appearance_related
}
