//! Deterministic prompt rendering for the three pipeline calls.
//!
//! Template bodies are loaded from `.txt` files at compile time using
//! the `include_str!` macro, making them easy to edit without dealing
//! with Rust string syntax. Identical inputs always render identical
//! prompt text: nothing time- or id-dependent is ever embedded, which
//! keeps prompts cacheable and tests reproducible.

use crate::model::{Meal, Profile};
use crate::schema::SchemaId;

const EXTRACTION_TEMPLATE: &str = include_str!("extraction.txt");
const EVALUATION_TEMPLATE: &str = include_str!("evaluation.txt");
const COMBINED_TEMPLATE: &str = include_str!("combined.txt");

/// A rendered prompt together with the schema the model must answer
/// with.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub schema: SchemaId,
}

/// Prompt for the extraction stage: menu lines in, meal facts out.
///
/// Section headings are excluded by instruction and example, not by a
/// denylist; the classification itself is the model's job.
pub fn extraction_prompt(lines: &[String]) -> Prompt {
    Prompt {
        text: format!("{}\nMenu text:\n{}\n", EXTRACTION_TEMPLATE, lines.join("\n")),
        schema: SchemaId::MealList,
    }
}

/// Prompt for the dietary evaluation stage: flips `eligible` only,
/// everything else must come back unchanged.
pub fn evaluation_prompt(meals: &[Meal], profile: &Profile) -> Prompt {
    Prompt {
        text: format!(
            "{}\n{}\nMeals:\n{}",
            EVALUATION_TEMPLATE,
            render_profile(profile),
            render_meals(meals)
        ),
        schema: SchemaId::MealList,
    }
}

/// Single-call alternative that evaluates and re-orders in one prompt.
/// The orchestrator still applies its own deterministic sort on top.
pub fn combined_sort_prompt(meals: &[Meal], profile: &Profile) -> Prompt {
    Prompt {
        text: format!(
            "{}\n{}\nMenu:\n{}",
            COMBINED_TEMPLATE,
            render_profile(profile),
            render_meals(meals)
        ),
        schema: SchemaId::MealList,
    }
}

fn render_profile(profile: &Profile) -> String {
    format!(
        "User profile:\n- Diet: {}\n- Allergies: {}\n",
        profile.diet,
        if profile.allergies.is_empty() {
            "none".to_string()
        } else {
            profile.allergies.join(", ")
        }
    )
}

/// One line per meal, carrying every fact the model has to echo back.
fn render_meals(meals: &[Meal]) -> String {
    let mut out = String::new();
    for meal in meals {
        let price = meal
            .price
            .map(|p| format!("{}", p))
            .unwrap_or_else(|| "none".to_string());
        out.push_str(&format!(
            "- {} (price: {}): {}\n",
            meal.name,
            price,
            meal.ingredients.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Diet;

    fn sample_meals() -> Vec<Meal> {
        vec![
            Meal {
                name: "Carbonara".to_string(),
                ingredients: vec!["eggs".to_string(), "pancetta".to_string()],
                price: Some(12.0),
                eligible: true,
            },
            Meal {
                name: "Tiramisu".to_string(),
                ingredients: vec!["mascarpone".to_string()],
                price: None,
                eligible: true,
            },
        ]
    }

    #[test]
    fn test_extraction_prompt_contains_lines_and_rules() {
        let lines = vec!["Primi Piatti".to_string(), "Carbonara - €12".to_string()];
        let prompt = extraction_prompt(&lines);

        assert_eq!(prompt.schema, SchemaId::MealList);
        assert!(prompt.text.contains("Carbonara - €12"));
        // The heading-ignore instruction is the load-bearing part
        assert!(prompt.text.contains("IGNORE menu section headers"));
        assert!(prompt.text.contains("\"Primi Piatti\""));
        assert!(prompt.text.contains("\"Starters\""));
    }

    #[test]
    fn test_evaluation_prompt_carries_profile_and_facts() {
        let profile = Profile::new(Diet::Vegan, vec!["eggs".to_string()]);
        let prompt = evaluation_prompt(&sample_meals(), &profile);

        assert!(prompt.text.contains("Diet: Vegan"));
        assert!(prompt.text.contains("Allergies: eggs"));
        assert!(prompt.text.contains("- Carbonara (price: 12): eggs, pancetta"));
        assert!(prompt.text.contains("- Tiramisu (price: none): mascarpone"));
        assert!(prompt.text.contains("Do not change name, ingredients, or price"));
    }

    #[test]
    fn test_combined_prompt_asks_for_reorder() {
        let profile = Profile::default();
        let prompt = combined_sort_prompt(&sample_meals(), &profile);

        assert!(prompt.text.contains("re-order"));
        assert!(prompt.text.contains("Allergies: none"));
        assert_eq!(prompt.schema, SchemaId::MealList);
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let lines = vec!["Carbonara - €12".to_string(), "Tiramisu - €6".to_string()];
        assert_eq!(extraction_prompt(&lines), extraction_prompt(&lines));

        let profile = Profile::new(Diet::Pescatarian, vec!["nuts".to_string()]);
        assert_eq!(
            evaluation_prompt(&sample_meals(), &profile),
            evaluation_prompt(&sample_meals(), &profile)
        );
        assert_eq!(
            combined_sort_prompt(&sample_meals(), &profile),
            combined_sort_prompt(&sample_meals(), &profile)
        );
    }

    #[test]
    fn test_templates_are_embedded() {
        assert!(EXTRACTION_TEMPLATE.contains("menu analysis assistant"));
        assert!(EVALUATION_TEMPLATE.contains("dietary assistant"));
        assert!(COMBINED_TEMPLATE.contains("dietary assistant"));
    }
}
