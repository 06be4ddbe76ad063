use serde::Serialize;

/// One fixed organizational-readiness dimension with its ordered question list.
#[derive(Debug, Clone, Serialize)]
pub struct TopicArea {
    pub id: &'static str,
    pub title: &'static str,
    pub questions: &'static [&'static str],
}

/// Sentinel area id a fresh session starts in, before any topic area is active.
pub const INTRODUCTION: &str = "introduction";

/// The four assessment areas, in the order they are presented.
pub static ASSESSMENT_AREAS: &[TopicArea] = &[
    TopicArea {
        id: "data_readiness",
        title: "Data Infrastructure & Quality",
        questions: &[
            "How would you rate the quality and organization of your company's data?",
            "Do you have established data governance policies?",
            "How is sensitive data currently handled in your organization?",
        ],
    },
    TopicArea {
        id: "technical_capability",
        title: "Technical Infrastructure",
        questions: &[
            "What computing resources do you currently have available?",
            "Does your team have experience with AI/ML technologies?",
            "How integrated are your current technical systems?",
        ],
    },
    TopicArea {
        id: "business_alignment",
        title: "Business Strategy & Use Cases",
        questions: &[
            "What are your primary objectives for implementing GenAI?",
            "Have you identified specific use cases for GenAI?",
            "How does GenAI align with your current business strategy?",
        ],
    },
    TopicArea {
        id: "change_readiness",
        title: "Organizational Change Readiness",
        questions: &[
            "How would you describe your organization's culture towards technological change?",
            "What training programs do you have in place?",
            "How do you plan to manage the transition to AI-enhanced workflows?",
        ],
    },
];

pub fn find_area(id: &str) -> Option<&'static TopicArea> {
    ASSESSMENT_AREAS.iter().find(|area| area.id == id)
}

pub fn is_known_area(id: &str) -> bool {
    find_area(id).is_some()
}

/// The area the assessment opens with.
pub fn first_area() -> &'static TopicArea {
    &ASSESSMENT_AREAS[0]
}
