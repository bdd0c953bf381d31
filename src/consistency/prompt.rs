use super::store::ContextSnapshot;

/// Words that mean the prompt is about the character itself.
const SELF_REFERENCES: &[&str] = &["you", "your", "yourself", "person"];

const QUALITY_SUFFIX: &str = "High quality, detailed, professional.";

/// Render the resolved context plus the raw prompt into the final prompt
/// string sent to the image backend.
pub fn build_prompt(raw_prompt: &str, context: &ContextSnapshot) -> String {
    let prompt_lower = raw_prompt.to_lowercase();
    let mut elements: Vec<String> = Vec::new();

    // Character appearance, if the prompt refers to the character.
    if SELF_REFERENCES.iter().any(|word| prompt_lower.contains(word)) {
        for (trait_name, value) in &context.character_traits {
            elements.push(format!("{}: {}", trait_name, value));
        }
    }

    // Features of every location the prompt mentions by name.
    for (location_name, features) in &context.locations {
        if prompt_lower.contains(&location_name.to_lowercase()) {
            for (feature, value) in features {
                elements.push(format!("{}: {}", feature, value));
            }
        }
    }

    let consistent_elements = elements
        .into_iter()
        .filter(|element| !element.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if consistent_elements.is_empty() {
        format!("{}. {}", raw_prompt, QUALITY_SUFFIX)
    } else {
        format!("{}. {}. {}", raw_prompt, consistent_elements, QUALITY_SUFFIX)
    }
}
