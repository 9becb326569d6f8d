//! Persona catalog.
//!
//! Each persona bundles a rewrite prompt description with the synthesis voice
//! that reads the result and the credential slot that voice is billed to.
//! The table is compiled in and never mutated.

use crate::error::{Result, ToneTwistError};

/// A named speaking-style profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaProfile {
    /// Lookup key (e.g., "pirate")
    pub key: &'static str,
    /// Display name
    pub label: &'static str,
    /// Short description for listings
    pub description: &'static str,
    /// Emoji avatar for listings
    pub avatar: &'static str,
    /// Natural-language style description embedded in the rewrite prompt
    pub prompt_description: &'static str,
    /// Synthesis voice identifier
    pub voice_id: &'static str,
    /// Synthesis credential slot (1-based)
    pub credential_slot: u8,
}

/// All known personas.
pub const PERSONAS: &[PersonaProfile] = &[
    PersonaProfile {
        key: "pirate",
        label: "Captain Sea-Scoundrel",
        description: "A jovial sea dog with a gristly Cornwall accent, extended vowels and long ARR's!",
        avatar: "🏴‍☠️",
        prompt_description: "A mischievous pirate captain with a hoarse, rugged voice, full of swagger and swashbuckling tales. Use plenty of 'Arrr!' and nautical terms. This voice should evoke the spirit of braving the high seas and discovering hidden treasures.",
        voice_id: "PPzYpIqttlTYA83688JI",
        credential_slot: 1,
    },
    PersonaProfile {
        key: "seductive",
        label: "The Alluring Villain",
        description: "A seductive and dangerous voice, dripping with the allure of a captivating villain. Perfect for anime or game characters.",
        avatar: "💋",
        prompt_description: "A seductive and dangerous female voice, dripping with allure and mystery. Ideal for anime-style villains or characters that exude confidence and danger. The tone should be bold, dramatic, and captivating.",
        voice_id: "eVItLK1UvXctxuaRV2Oq",
        credential_slot: 1,
    },
    PersonaProfile {
        key: "heroic",
        label: "Heroic Adventurer",
        description: "A charismatic male voice oozing with confidence and determined charm.",
        avatar: "🎬",
        prompt_description: "A charismatic and determined voice, perfect for a classic anime protagonist. Full of passion and confidence, this voice should feel like it's leading an epic adventure or a fierce battle. Think strong, energetic, and heroic.",
        voice_id: "zYcjlYFOd3taleS0gkk3",
        credential_slot: 1,
    },
    PersonaProfile {
        key: "african",
        label: "The Vibrant Storyteller",
        description: "An energetic African voice, full of rhythm and excitement, perfect for vibrant storytelling.",
        avatar: "🌍",
        prompt_description: "A lively, energetic voice with an African accent, full of rhythm and excitement. Perfect for creating a vibrant atmosphere, this voice will bring energy and enthusiasm to any scene, ideal for storytelling or high-energy narratives.",
        voice_id: "NVp9wQor3NDIWcxYoZiW",
        credential_slot: 2,
    },
    PersonaProfile {
        key: "british",
        label: "Lady of the Isles",
        description: "A warm, natural British voice, perfect for relaxed conversations or friendly narration.",
        avatar: "💂‍♀️",
        prompt_description: "A charming British voice, elegant and warm, perfect for casual storytelling or friendly narration. The tone should be natural, engaging, and pleasant, with a touch of class.",
        voice_id: "exsUS4vynmxd379XN4yO",
        credential_slot: 2,
    },
    PersonaProfile {
        key: "cowboy",
        label: "Dusty Trail Rider",
        description: "A deep, rugged voice with weathered warmth, perfect for tales filled with character.",
        avatar: "🤠",
        prompt_description: "A deep, raspy baritone voice, shaped by life on the frontier. This rugged cowboy tone should evoke resilience and adventure, perfect for stories about hardship, freedom, and the spirit of the Wild West.",
        voice_id: "LNV6ahDtkAOqwn1X3R7a",
        credential_slot: 2,
    },
    PersonaProfile {
        key: "russian",
        label: "The Silent Operative",
        description: "A cool, calculating voice with a distinct Slavic depth, ideal for espionage thrillers.",
        avatar: "🕵️‍♂️",
        prompt_description: "A cool, calculating Russian spy with a deep, authoritative voice. Perfect for espionage, high-stakes situations, or covert operations. This voice should bring an air of mystery and calculated precision.",
        voice_id: "XjdmlV0OFXfXE6Mg2Sb7",
        credential_slot: 3,
    },
    PersonaProfile {
        key: "robot",
        label: "Cyborg Assistant",
        description: "A clear, articulate female AI voice with a futuristic, slightly robotic tone.",
        avatar: "🤖",
        prompt_description: "A futuristic, robotic female voice, calm and precise. Ideal for AI assistants or sci-fi narration, this voice should be articulate and composed, evoking the precision and calm of an advanced digital entity from the future.",
        voice_id: "ZD29qZCdYhhdqzBLRKNH",
        credential_slot: 3,
    },
    PersonaProfile {
        key: "indian",
        label: "The News Anchor",
        description: "A serious, clear, and authoritative Indian English voice, ideal for professional reporting.",
        avatar: "📺",
        prompt_description: "A refined Indian English voice, delivering each line with clarity, authority, and a professional tone. This voice is perfect for news reports, documentaries, or serious, informative content.",
        voice_id: "fnVy7xrReCoUNJxjQsd6",
        credential_slot: 3,
    },
];

/// Look up a persona by key.
pub fn get_persona(key: &str) -> Option<&'static PersonaProfile> {
    PERSONAS.iter().find(|p| p.key == key)
}

/// Look up a persona by key, rejecting unknown keys as a request error.
pub fn require_persona(key: &str) -> Result<&'static PersonaProfile> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ToneTwistError::validation(
            "Missing or invalid style in request body.",
        ));
    }
    get_persona(key).ok_or_else(|| ToneTwistError::validation("Invalid enhancement style selected."))
}

/// List all personas.
pub fn list_personas() -> &'static [PersonaProfile] {
    PERSONAS
}
