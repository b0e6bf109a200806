//! Recommendation rules
//!
//! A static table maps each `(indicator, level)` pair to its recommendation
//! entries. General entries keyed on the wellbeing score come after the
//! indicator entries.

use crate::config::AnalysisConfig;
use crate::types::{
    Indicator, IndicatorLevel, Insights, Priority, Recommendation, RecommendationCategory,
};
use std::collections::BTreeMap;

use crate::types::IndicatorLevel::{High, Low, Moderate};
use crate::types::RecommendationCategory::*;

/// One table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationRule {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub title: &'static str,
    pub description: &'static str,
    pub action_items: &'static [&'static str],
}

impl RecommendationRule {
    fn to_recommendation(self) -> Recommendation {
        Recommendation {
            category: self.category,
            title: self.title.to_string(),
            description: self.description.to_string(),
            priority: self.priority,
            action_items: self.action_items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const ANXIETY_HIGH: &[RecommendationRule] = &[
    RecommendationRule {
        category: StressManagement,
        priority: Priority::High,
        title: "Practice daily stress reduction",
        description: "Gameplay showed frequent hesitation and stress. Short daily relaxation practice can help lower tension.",
        action_items: &[
            "Try 5 minutes of slow breathing each morning",
            "Notice and name worries when they come up",
            "Take short breaks during demanding tasks",
        ],
    },
    RecommendationRule {
        category: ProfessionalSupport,
        priority: Priority::High,
        title: "Talk with someone you trust",
        description: "Anxiety indicators were high across sessions. A counselor or trusted adult can help you work through what is causing them.",
        action_items: &[
            "Share how you have been feeling with a parent, teacher or counselor",
            "Ask about speaking with a school counselor or therapist",
        ],
    },
];

const ANXIETY_MODERATE: &[RecommendationRule] = &[RecommendationRule {
    category: StressManagement,
    priority: Priority::Medium,
    title: "Build a calming routine",
    description: "Some anxiety indicators appeared during play. A regular calming routine can keep them from building up.",
    action_items: &[
        "Set aside a few minutes each day for a relaxing activity",
        "Practice a grounding exercise when you feel tense",
    ],
}];

const DEPRESSION_HIGH: &[RecommendationRule] = &[
    RecommendationRule {
        category: ProfessionalSupport,
        priority: Priority::High,
        title: "Reach out for support",
        description: "Patterns associated with low mood were strong. Talking to a professional is a good next step.",
        action_items: &[
            "Tell a trusted adult how you have been feeling",
            "Contact a school counselor or doctor",
        ],
    },
    RecommendationRule {
        category: MoodSupport,
        priority: Priority::High,
        title: "Plan enjoyable activities",
        description: "Scheduling small things you enjoy can lift mood and energy over time.",
        action_items: &[
            "Pick one enjoyable activity for each day this week",
            "Spend some time outdoors every day",
        ],
    },
    RecommendationRule {
        category: SocialConnection,
        priority: Priority::Medium,
        title: "Stay connected with others",
        description: "Time with friends and family supports mood.",
        action_items: &["Message or call a friend", "Join a group activity you like"],
    },
];

const DEPRESSION_MODERATE: &[RecommendationRule] = &[
    RecommendationRule {
        category: MoodSupport,
        priority: Priority::Medium,
        title: "Keep up activities you enjoy",
        description: "Some low-mood indicators were present. Regular enjoyable activities help keep them in check.",
        action_items: &[
            "Make time for a hobby this week",
            "Write down one good thing that happened each day",
        ],
    },
    RecommendationRule {
        category: SocialConnection,
        priority: Priority::Low,
        title: "Spend time with friends",
        description: "Social time is linked with better mood.",
        action_items: &["Plan an activity with a friend"],
    },
];

const ATTENTION_HIGH: &[RecommendationRule] = &[
    RecommendationRule {
        category: AttentionTraining,
        priority: Priority::High,
        title: "Train sustained focus",
        description: "Responses showed frequent lapses and variable timing. Structured focus practice can help.",
        action_items: &[
            "Work in short focused blocks with breaks in between",
            "Remove distractions such as notifications while working",
            "Try a short mindfulness exercise before tasks",
        ],
    },
    RecommendationRule {
        category: Lifestyle,
        priority: Priority::Medium,
        title: "Review sleep and screen habits",
        description: "Sleep and screen time strongly affect attention.",
        action_items: &[
            "Keep a consistent bedtime",
            "Avoid screens for an hour before sleep",
        ],
    },
];

const ATTENTION_MODERATE: &[RecommendationRule] = &[RecommendationRule {
    category: AttentionTraining,
    priority: Priority::Medium,
    title: "Try short focus exercises",
    description: "Some attention variability was observed. Brief daily exercises can improve consistency.",
    action_items: &["Play a focus game for 10 minutes a day", "Break big tasks into small steps"],
}];

const LOW_WELLBEING: &[RecommendationRule] = &[RecommendationRule {
    category: Monitoring,
    priority: Priority::Medium,
    title: "Keep tracking how you feel",
    description: "Continue monitoring and consider professional consultation if patterns persist.",
    action_items: &[
        "Keep playing regularly so trends can be tracked",
        "Review your next report with someone you trust",
    ],
}];

const WELLNESS: &[RecommendationRule] = &[RecommendationRule {
    category: Wellness,
    priority: Priority::Low,
    title: "Maintain healthy habits",
    description: "Regular sleep, movement and time with others support overall wellbeing.",
    action_items: &[
        "Aim for 8-10 hours of sleep",
        "Get some physical activity each day",
    ],
}];

/// Table entries for one indicator at one level
pub fn rules_for(indicator: Indicator, level: IndicatorLevel) -> &'static [RecommendationRule] {
    match (indicator, level) {
        (Indicator::Anxiety, High) => ANXIETY_HIGH,
        (Indicator::Anxiety, Moderate) => ANXIETY_MODERATE,
        (Indicator::Depression, High) => DEPRESSION_HIGH,
        (Indicator::Depression, Moderate) => DEPRESSION_MODERATE,
        (Indicator::Attention, High) => ATTENTION_HIGH,
        (Indicator::Attention, Moderate) => ATTENTION_MODERATE,
        (_, Low) => &[],
    }
}

/// General entries for a wellbeing score
pub fn general_rules(wellbeing: f64, config: &AnalysisConfig) -> Vec<RecommendationRule> {
    let mut rules = Vec::new();
    if wellbeing < config.low_wellbeing_threshold {
        rules.extend_from_slice(LOW_WELLBEING);
    }
    rules.extend_from_slice(WELLNESS);
    rules
}

/// Merge triggered rules into the final ordered list
///
/// Rules are deduplicated by category (higher priority wins, then the earlier
/// indicator), ordered by priority then indicator weight order with general
/// entries last, and truncated to `config.max_recommendations`.
pub fn recommend(insights: &Insights, wellbeing: f64, config: &AnalysisConfig) -> Vec<Recommendation> {
    // (rank, position) orders indicator entries before general ones
    let mut triggered: Vec<(usize, usize, RecommendationRule)> = Vec::new();
    for (rank, (indicator, result)) in insights.iter().enumerate() {
        if result.degraded {
            continue;
        }
        for (pos, rule) in rules_for(indicator, result.level).iter().enumerate() {
            triggered.push((rank, pos, *rule));
        }
    }
    let general_rank = Indicator::ALL.len();
    for (pos, rule) in general_rules(wellbeing, config).into_iter().enumerate() {
        triggered.push((general_rank, pos, rule));
    }

    let mut by_category: BTreeMap<RecommendationCategory, (usize, usize, RecommendationRule)> =
        BTreeMap::new();
    for entry in triggered {
        let keep_new = match by_category.get(&entry.2.category) {
            Some(existing) => {
                entry.2.priority > existing.2.priority
                    || (entry.2.priority == existing.2.priority
                        && (entry.0, entry.1) < (existing.0, existing.1))
            }
            None => true,
        };
        if keep_new {
            by_category.insert(entry.2.category, entry);
        }
    }

    let mut merged: Vec<(usize, usize, RecommendationRule)> = by_category.into_values().collect();
    merged.sort_by(|a, b| {
        b.2.priority
            .cmp(&a.2.priority)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });
    merged.truncate(config.max_recommendations);
    merged.into_iter().map(|(_, _, rule)| rule.to_recommendation()).collect()
}
