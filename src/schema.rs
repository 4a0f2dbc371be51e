use crate::model::Meal;
use log::debug;
use serde_json::Value;

/// Identifier of the structured value a prompt asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaId {
    /// `{"meals": [{"name", "ingredients", "price", "eligible"}]}`
    MealList,
}

impl SchemaId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaId::MealList => "meal_list",
        }
    }
}

/// Normalizes a generative model's structured output into well-formed
/// meal records.
///
/// Malformed input downgrades records, it never aborts: a record
/// without a usable name is dropped, bad field values are coerced to
/// their defaults. The caller can rely on every returned `Meal`
/// holding a non-empty name, a concrete ingredient list and a
/// non-negative price when one is present.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Extract well-formed meals from a value claiming to conform to
    /// `SchemaId::MealList`.
    ///
    /// Accepts both the `{"meals": [...]}` wrapper and a bare array,
    /// since models produce either. Duplicate names collapse into one
    /// meal: the last-seen record wins, at the position the name first
    /// appeared.
    pub fn validate_meals(value: &Value) -> Vec<Meal> {
        let records = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => value["meals"].as_array().map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        };

        let mut meals: Vec<Meal> = Vec::new();
        for record in records {
            let Some(meal) = Self::validate_meal(record) else {
                debug!("Dropping malformed meal record: {}", record);
                continue;
            };

            match meals.iter_mut().find(|m| m.name == meal.name) {
                Some(existing) => *existing = meal,
                None => meals.push(meal),
            }
        }
        meals
    }

    fn validate_meal(record: &Value) -> Option<Meal> {
        let name = record["name"].as_str()?.trim();
        if name.is_empty() {
            return None;
        }

        let ingredients = match &record["ingredients"] {
            Value::Array(items) => items
                .iter()
                .filter_map(|i| i.as_str())
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
            // A lone string is still usable as a one-entry list
            Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        };

        Some(Meal {
            name: name.to_string(),
            ingredients,
            price: Self::coerce_price(&record["price"]),
            eligible: record["eligible"].as_bool().unwrap_or(true),
        })
    }

    /// Prices must be non-negative numbers; anything else maps to
    /// "unpriced" rather than poisoning the record.
    fn coerce_price(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64().filter(|p| *p >= 0.0),
            // Models occasionally echo the menu's "€12.50" literally
            Value::String(s) => s
                .trim()
                .trim_start_matches(['€', '$', '£'])
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|p| *p >= 0.0),
            _ => None,
        }
    }
}
