//! Typed view of a plan object
//!
//! Plans are stored as free-form JSON because model output varies. This view
//! picks out the `day_N` entries for rendering and tolerates the usual
//! variations: a slot given as a bare string, `food` given as a single string,
//! missing fields. Keys that are not `day_N` are ignored.

use serde_json::{Map, Value};
use std::fmt;

/// One time-of-day slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub main: String,
    pub alternatives: Vec<String>,
}

/// One day of the itinerary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPlan {
    /// 1-based day number taken from the `day_N` key
    pub day: u32,
    pub morning: Option<Slot>,
    pub afternoon: Option<Slot>,
    pub evening: Option<Slot>,
    pub food: Vec<String>,
    pub tips: Option<String>,
}

/// Days of a plan in day-number order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Itinerary {
    pub days: Vec<DayPlan>,
    /// Top-level `error` key, present on a failed generation
    pub error: Option<String>,
}

impl Itinerary {
    pub fn from_plan(plan: &Map<String, Value>) -> Self {
        let mut days: Vec<DayPlan> = plan
            .iter()
            .filter_map(|(key, value)| {
                let day = key.strip_prefix("day_")?.parse::<u32>().ok()?;
                value.as_object().map(|entry| day_plan(day, entry))
            })
            .collect();
        days.sort_by_key(|d| d.day);

        Self {
            days,
            error: plan.get("error").and_then(text),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn day_plan(day: u32, entry: &Map<String, Value>) -> DayPlan {
    DayPlan {
        day,
        morning: entry.get("morning").and_then(slot),
        afternoon: entry.get("afternoon").and_then(slot),
        evening: entry.get("evening").and_then(slot),
        food: entry.get("food").map(strings).unwrap_or_default(),
        tips: entry.get("tips").and_then(text),
    }
}

fn slot(value: &Value) -> Option<Slot> {
    match value {
        Value::String(main) => Some(Slot {
            main: main.clone(),
            alternatives: Vec::new(),
        }),
        Value::Object(fields) => Some(Slot {
            main: fields.get("main").and_then(text).unwrap_or_default(),
            alternatives: fields.get("alternatives").map(strings).unwrap_or_default(),
        }),
        _ => None,
    }
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.main)?;
        if !self.alternatives.is_empty() {
            write!(f, " (or: {})", self.alternatives.join("; "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "Generation failed: {}", error)?;
        }
        for day in &self.days {
            writeln!(f, "Day {}", day.day)?;
            for (label, slot) in [
                ("Morning", &day.morning),
                ("Afternoon", &day.afternoon),
                ("Evening", &day.evening),
            ] {
                if let Some(slot) = slot {
                    writeln!(f, "  {:<10} {}", label, slot)?;
                }
            }
            if !day.food.is_empty() {
                writeln!(f, "  {:<10} {}", "Food", day.food.join(", "))?;
            }
            if let Some(tips) = &day.tips {
                writeln!(f, "  {:<10} {}", "Tips", tips)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_days_ordered_numerically() {
        let itinerary = Itinerary::from_plan(&plan(json!({
            "day_10": {"tips": "ten"},
            "day_2": {"tips": "two"},
            "day_1": {"tips": "one"},
            "summary": "ignored",
            "day_x": {"tips": "ignored"}
        })));

        let order: Vec<u32> = itinerary.days.iter().map(|d| d.day).collect();
        assert_eq!(order, vec![1, 2, 10]);
        assert!(!itinerary.is_error());
    }

    #[test]
    fn test_full_day_entry() {
        let itinerary = Itinerary::from_plan(&plan(json!({
            "day_1": {
                "morning": {"main": "Fushimi Inari", "alternatives": ["Tofuku-ji", "Nanzen-ji"]},
                "afternoon": "Tea ceremony",
                "food": ["Nishiki Market", "Pontocho"],
                "tips": "Start early"
            }
        })));

        let day = &itinerary.days[0];
        assert_eq!(
            day.morning,
            Some(Slot {
                main: "Fushimi Inari".to_string(),
                alternatives: vec!["Tofuku-ji".to_string(), "Nanzen-ji".to_string()],
            })
        );
        assert_eq!(day.afternoon.as_ref().map(|s| s.main.as_str()), Some("Tea ceremony"));
        assert_eq!(day.evening, None);
        assert_eq!(day.food, vec!["Nishiki Market", "Pontocho"]);
        assert_eq!(day.tips.as_deref(), Some("Start early"));
    }

    #[test]
    fn test_food_as_single_string() {
        let itinerary = Itinerary::from_plan(&plan(json!({"day_1": {"food": "Street food"}})));
        assert_eq!(itinerary.days[0].food, vec!["Street food"]);
    }

    #[test]
    fn test_error_key_and_render() {
        let itinerary = Itinerary::from_plan(&plan(json!({
            "error": "API error 500: boom",
            "day_1": {"morning": {"main": "Error occurred while generating trip plan", "alternatives": ["Please try again later"]}}
        })));

        assert!(itinerary.is_error());
        let rendered = itinerary.to_string();
        assert!(rendered.starts_with("Generation failed: API error 500: boom\n"));
        assert!(rendered.contains("Day 1\n"));
        assert!(rendered.contains("(or: Please try again later)"));
    }
}
