// src/ingest/providers/fixtures.rs
//! Built-in sample articles served when no live feed is configured or the
//! live feed fails, so the pipeline and the site stay usable offline.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::RawItem;

struct Sample {
    title: &'static str,
    content: &'static str,
    url: &'static str,
    image_url: &'static str,
    hours_ago: i64,
    source_id: &'static str,
    source_name: &'static str,
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "GPT-5 Prototype Shows Remarkable Reasoning Abilities, Claims OpenAI Researcher",
        content: "OpenAI's latest language model prototype demonstrates unprecedented reasoning \
capabilities and contextual understanding according to internal testing. The model reportedly \
shows significant improvements in mathematical reasoning, code generation, and logical analysis \
compared to previous versions.\n\nIn programming tasks, the prototype demonstrates sophisticated \
understanding of codebases and architectural patterns, and can suggest optimizations that \
professional developers might miss.\n\nResearchers emphasize that the journey from prototype to \
production involves extensive evaluation, fine-tuning, and the development of appropriate use \
guidelines. The AI research community is buzzing with excitement about the possibilities.",
        url: "https://example.com/gpt5-prototype",
        image_url: "https://images.unsplash.com/photo-1620712943543-bcc4688e7485",
        hours_ago: 2,
        source_id: "ai-insider",
        source_name: "AI Insider",
    },
    Sample {
        title: "Microsoft Unveils AI-Powered Developer Copilot Pro with Advanced Code Generation",
        content: "Microsoft's new Developer Copilot Pro offers enhanced code generation \
capabilities and supports over 50 programming languages with improved context awareness. The \
tool integrates with popular IDEs and helps explain complex code structures, suggest \
optimizations, and refactor existing codebases.\n\nEarly adopters report that the software \
understands project-wide conventions rather than single files, which reduces review churn for \
large teams.\n\nPricing follows a per-developer subscription, with an enterprise tier adding \
private model hosting and audit logging.",
        url: "https://example.com/microsoft-copilot-pro",
        image_url: "https://images.unsplash.com/photo-1515879218367-8466d910aaa4",
        hours_ago: 4,
        source_id: "techcrunch",
        source_name: "TechCrunch",
    },
    Sample {
        title: "iPhone 16 Design Leaked: What to Expect from Apple's Next Generation Smartphone",
        content: "Leaked schematics reveal a radical design overhaul featuring a unique camera \
layout and new display technology not seen in previous models. The documents suggest Apple is \
making its most significant design change since the iPhone X.\n\nThe device reportedly moves to \
a vertical camera stack to support spatial video, alongside a dedicated capture button on the \
frame.\n\nAnalysts expect the new phone to ship with a faster processor tuned for on-device \
machine learning features.",
        url: "https://example.com/iphone-16-leaks",
        image_url: "https://images.unsplash.com/photo-1600267175161-cfaa711b4a81",
        hours_ago: 6,
        source_id: "the-verge",
        source_name: "The Verge",
    },
    Sample {
        title: "Breakthrough in Quantum Computing Could Lead to More Stable Qubits",
        content: "Researchers have developed a new method to maintain quantum coherence for \
longer periods, potentially accelerating the path to practical quantum applications.\n\nThe \
technique shields each qubit from environmental noise while preserving entanglement across the \
processor, extending coherence times by an order of magnitude in laboratory tests.\n\nThe team \
cautions that error correction at scale remains the central challenge, but says the result \
narrows the gap between experimental machines and useful quantum computers.",
        url: "https://example.com/quantum-computing-breakthrough",
        image_url: "https://images.unsplash.com/photo-1551739440-5dd934d3a94a",
        hours_ago: 12,
        source_id: "wired",
        source_name: "Wired",
    },
    Sample {
        title: "New Zero-Day Vulnerability Affecting Multiple Operating Systems Found by Security Researchers",
        content: "A critical vulnerability has been discovered that could allow attackers to \
execute arbitrary code remotely; patches are being developed urgently.\n\nThe flaw sits in a \
widely shared networking library, which means desktop, server and embedded systems are all \
exposed. Security teams are advised to restrict inbound traffic until updates land.\n\nThe \
researchers who reported the issue followed coordinated disclosure and say they have seen no \
evidence of the hack being exploited in the wild.",
        url: "https://example.com/zero-day-vulnerability",
        image_url: "https://images.unsplash.com/photo-1526666923127-b2970f64b422",
        hours_ago: 18,
        source_id: "ars-technica",
        source_name: "Ars Technica",
    },
];

/// Sample items with publish times relative to `now`, newest first.
pub fn fixture_items(now: DateTime<Utc>) -> Vec<RawItem> {
    SAMPLES
        .iter()
        .map(|s| RawItem {
            title: s.title.to_string(),
            content: s.content.to_string(),
            url: s.url.to_string(),
            image_url: Some(s.image_url.to_string()),
            published_at: now - Duration::hours(s.hours_ago),
            source_id: s.source_id.to_string(),
            source_name: s.source_name.to_string(),
        })
        .collect()
}
