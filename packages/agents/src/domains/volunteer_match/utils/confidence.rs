//! Pure functions for volunteer/request match scoring
//!
//! Confidence = skill * 0.5 + location * 0.3 + availability * 0.2, capped at 1.

/// Skill categories and the request keywords that signal them, in extraction order.
pub const SKILL_KEYWORDS: [(&str, &[&str]); 8] = [
    ("tutoring", &["tutor", "teach", "education", "homework", "math", "english"]),
    ("transportation", &["ride", "transport", "drive", "pickup", "delivery"]),
    ("manual_labor", &["move", "lift", "construction", "repair", "fix"]),
    ("cooking", &["cook", "meal", "food", "kitchen"]),
    ("cleaning", &["clean", "organize", "tidy"]),
    ("technology", &["computer", "tech", "software", "website", "app"]),
    ("language", &["translate", "language", "spanish", "french"]),
    ("childcare", &["babysit", "childcare", "kids", "children"]),
];

pub const GENERAL_MATCH_TYPE: &str = "general";

const SKILL_WEIGHT: f64 = 0.5;
const LOCATION_WEIGHT: f64 = 0.3;
const AVAILABILITY_WEIGHT: f64 = 0.2;

/// Location score when the request has a location and the volunteer travels
pub const NEARBY_LOCATION_SCORE: f64 = 0.8;
pub const UNKNOWN_LOCATION_SCORE: f64 = 0.5;

/// Availability is not tracked yet; every volunteer scores the same.
pub const DEFAULT_AVAILABILITY_SCORE: f64 = 0.7;

/// Skill categories mentioned in a request's title or description.
pub fn extract_skills(title: &str, description: &str) -> Vec<&'static str> {
    let text = format!("{} {}", title, description).to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(skill, _)| *skill)
        .collect()
}

/// Request skills the volunteer has, in request order.
pub fn skill_overlap(request_skills: &[&str], volunteer_skills: &[String]) -> Vec<String> {
    request_skills
        .iter()
        .filter(|skill| {
            volunteer_skills
                .iter()
                .any(|v| v.trim().eq_ignore_ascii_case(skill))
        })
        .map(|skill| skill.to_string())
        .collect()
}

/// Share of request skills the volunteer covers. 0 when either side has none.
pub fn skill_score(request_skills: &[&str], volunteer_skills: &[String]) -> f64 {
    if request_skills.is_empty() || volunteer_skills.is_empty() {
        return 0.0;
    }
    skill_overlap(request_skills, volunteer_skills).len() as f64 / request_skills.len() as f64
}

pub fn location_match(request_location: Option<&str>, radius_meters: f64) -> bool {
    request_location.is_some_and(|l| !l.trim().is_empty()) && radius_meters != 0.0
}

pub fn location_score(request_location: Option<&str>, radius_meters: f64) -> f64 {
    if location_match(request_location, radius_meters) {
        NEARBY_LOCATION_SCORE
    } else {
        UNKNOWN_LOCATION_SCORE
    }
}

pub fn match_confidence(skill: f64, location: f64, availability: f64) -> f64 {
    let total = skill * SKILL_WEIGHT + location * LOCATION_WEIGHT + availability * AVAILABILITY_WEIGHT;
    total.min(1.0)
}

/// First extracted skill, or "general".
pub fn match_type(request_skills: &[&str]) -> String {
    request_skills
        .first()
        .copied()
        .unwrap_or(GENERAL_MATCH_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_skills_in_table_order() {
        let found = extract_skills("Need a ride to the kitchen", "and some homework help");
        assert_eq!(found, vec!["tutoring", "transportation", "cooking"]);
    }

    #[test]
    fn test_extract_skills_is_case_insensitive() {
        assert_eq!(extract_skills("BABYSIT needed", ""), vec!["childcare"]);
        assert!(extract_skills("Hello", "world").is_empty());
    }

    #[test]
    fn test_skill_score_fraction_of_request_skills() {
        let request = ["tutoring", "cooking"];
        assert_eq!(skill_score(&request, &skills(&["tutoring", "cooking"])), 1.0);
        assert_eq!(skill_score(&request, &skills(&["cooking", "driving"])), 0.5);
        assert_eq!(skill_score(&request, &[]), 0.0);
        assert_eq!(skill_score(&[], &skills(&["cooking"])), 0.0);
    }

    #[test]
    fn test_location_score() {
        assert_eq!(location_score(Some("Downtown"), 5000.0), NEARBY_LOCATION_SCORE);
        assert_eq!(location_score(Some("Downtown"), 0.0), UNKNOWN_LOCATION_SCORE);
        assert_eq!(location_score(Some("  "), 5000.0), UNKNOWN_LOCATION_SCORE);
        assert_eq!(location_score(None, 5000.0), UNKNOWN_LOCATION_SCORE);
    }

    #[test]
    fn test_full_skill_match_with_location() {
        let confidence = match_confidence(1.0, NEARBY_LOCATION_SCORE, DEFAULT_AVAILABILITY_SCORE);
        assert!((confidence - 0.88).abs() < 1e-9);
    }

    #[test]
    fn test_full_skill_match_without_location() {
        let confidence = match_confidence(1.0, UNKNOWN_LOCATION_SCORE, DEFAULT_AVAILABILITY_SCORE);
        assert!((confidence - 0.79).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_capped() {
        assert_eq!(match_confidence(2.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_match_type() {
        assert_eq!(match_type(&["cooking", "cleaning"]), "cooking");
        assert_eq!(match_type(&[]), "general");
    }
}
