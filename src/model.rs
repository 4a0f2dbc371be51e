use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single dish extracted from a scanned menu.
///
/// `name` is the semantic identity of the meal: two records with the
/// same name within one run describe the same dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// The name of the dish.
    pub name: String,
    /// Ingredients or description details for this meal. Never null,
    /// may be empty when the menu lists nothing.
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Price as a plain number, without currency. Absent means the
    /// menu showed no price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Whether the active dietary profile allows this meal. Defaults
    /// to true until an evaluation stage overrides it.
    #[serde(default = "default_eligible")]
    pub eligible: bool,
}

fn default_eligible() -> bool {
    true
}

impl Meal {
    pub fn new(name: impl Into<String>, ingredients: Vec<String>) -> Self {
        Meal {
            name: name.into(),
            ingredients,
            price: None,
            eligible: true,
        }
    }
}

/// Root of the structured value the generative model is asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuAnalysis {
    /// A list of all distinct meals found in the text.
    pub meals: Vec<Meal>,
}

/// Fixed diet vocabulary shared with the persisted settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Diet {
    #[default]
    None,
    Vegetarian,
    Vegan,
    Pescatarian,
    Keto,
    Paleo,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    #[serde(rename = "Dairy-Free")]
    DairyFree,
}

impl Diet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::None => "None",
            Diet::Vegetarian => "Vegetarian",
            Diet::Vegan => "Vegan",
            Diet::Pescatarian => "Pescatarian",
            Diet::Keto => "Keto",
            Diet::Paleo => "Paleo",
            Diet::GlutenFree => "Gluten-Free",
            Diet::DairyFree => "Dairy-Free",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Diet::None),
            "vegetarian" => Ok(Diet::Vegetarian),
            "vegan" => Ok(Diet::Vegan),
            "pescatarian" => Ok(Diet::Pescatarian),
            "keto" => Ok(Diet::Keto),
            "paleo" => Ok(Diet::Paleo),
            "gluten-free" | "gluten free" => Ok(Diet::GlutenFree),
            "dairy-free" | "dairy free" => Ok(Diet::DairyFree),
            other => Err(format!("Unknown diet: {}", other)),
        }
    }
}

/// A diner's dietary constraints. Read-only to the pipeline during a
/// run: the orchestrator copies the profile at submission time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub diet: Diet,
    /// Free-text allergy strings, e.g. "eggs", "peanuts".
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl Profile {
    pub fn new(diet: Diet, allergies: Vec<String>) -> Self {
        Profile { diet, allergies }
    }
}

/// A language tag as the translation collaborator understands it,
/// e.g. "it" or "en".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangTag(String);

impl LangTag {
    pub fn new(tag: impl Into<String>) -> Self {
        LangTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LangTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LangTag {
    fn from(tag: &str) -> Self {
        LangTag(tag.to_string())
    }
}

/// The persisted user record: language pair plus optional dietary
/// profile. Last write wins, no history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub source_language: LangTag,
    pub target_language: LangTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_language: LangTag::new("it"),
            target_language: LangTag::new("en"),
            profile: None,
        }
    }
}
