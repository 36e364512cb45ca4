use serde_json::{json, Map, Value};

use super::model::{sections, SiteConfig};

/// The built-in document: written on first sign-in and shown whenever no
/// configuration has been loaded.
pub fn default_site_config() -> SiteConfig {
    SiteConfig {
        sections: default_sections(),
        ..Default::default()
    }
}

fn default_sections() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        sections::HERO.to_string(),
        json!({
            "title": "Rhythm, Passion and Excellence",
            "subtitle": "Over 25 years building powerful, dynamic grooves. Turning music into an experience from behind the kit.",
            "buttonText": "Get in Touch",
            "image": "assets/performance.jpg"
        }),
    );
    map.insert(
        sections::STATS.to_string(),
        json!([
            { "number": "25+", "label": "Years on the Road" },
            { "number": "15+", "label": "Bands" },
            { "number": "100%", "label": "Dedication" }
        ]),
    );
    map.insert(
        sections::ABOUT.to_string(),
        json!({
            "subtitle": "My Story",
            "title": "Much More Than Noise",
            "text": "I sat behind a drum kit at nine years old and never stopped.\n\nThe choice of cymbals and shells defines the personality of every performance, so I work with gear that delivers rich tone and balanced projection.",
            "image": "assets/about-drums.jpg"
        }),
    );
    map.insert(
        sections::CONTACT.to_string(),
        json!({
            "whatsapp": "5511999999999",
            "email": "contact@example.com",
            "instagram": "@example"
        }),
    );
    map.insert(
        sections::VIDEOS.to_string(),
        json!([
            { "id": "video1", "url": "assets/video.mp4", "title": "Live Performance", "type": "local" }
        ]),
    );
    map.insert(
        sections::PRICING.to_string(),
        json!([
            { "id": 1, "title": "Corporate Show", "price": "On request", "features": ["2h set", "Own equipment", "Custom setlist"] },
            { "id": 2, "title": "Weddings", "price": "On request", "features": ["Ceremony and party", "Full band or trio", "Planning meeting"] },
            { "id": 3, "title": "Private Lessons", "price": "$30/h", "features": ["Technique and reading", "Studio sessions", "Material included"] }
        ]),
    );
    map.insert(
        sections::THEME.to_string(),
        json!({ "primaryColor": "#ff5500" }),
    );
    map
}
