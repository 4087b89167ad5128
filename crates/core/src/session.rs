//! Conversation identity.
//!
//! A `SessionId` is generated once when a client is constructed and is then
//! embedded in every outbound envelope so the backend can correlate turns with
//! one logical conversation.

use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;
use std::fmt;

/// Number of dictionary words joined into a generated identifier.
pub const WORDS_PER_ID: usize = 4;

/// Length of the random byte string used when no words can be drawn.
pub const FALLBACK_BYTES: usize = 16;

const SEPARATOR: &str = "-";

/// Dictionary the identifier words are drawn from.
const WORDS: &[&str] = &[
    "acres", "adult", "advice", "afraid", "agree", "ahead", "alike", "alive", "amber", "ample",
    "angle", "apple", "april", "arrow", "aside", "atlas", "attic", "avoid", "awake", "badge",
    "baker", "basin", "beach", "berry", "birch", "blade", "blank", "bloom", "board", "bonus",
    "brave", "bread", "brick", "bride", "brook", "brush", "cabin", "camel", "candy", "canoe",
    "cargo", "cedar", "chain", "chalk", "charm", "chess", "chief", "cider", "cliff", "clock",
    "cloud", "coast", "comet", "coral", "couch", "crane", "creek", "crisp", "crown", "daisy",
    "dance", "delta", "depth", "diary", "dozen", "draft", "dream", "drift", "eagle", "early",
    "earth", "elbow", "ember", "empty", "equal", "fable", "faith", "feast", "fence", "ferry",
    "field", "flame", "fleet", "flint", "flock", "flute", "focus", "forge", "frost", "fruit",
    "gamma", "giant", "glass", "globe", "grain", "grape", "grass", "gravy", "green", "grove",
    "guard", "guide", "habit", "harbor", "hatch", "haven", "hazel", "heart", "hedge", "honey",
    "horse", "hotel", "house", "ivory", "jelly", "jewel", "judge", "juice", "kayak", "knife",
    "label", "ladder", "lemon", "level", "light", "lilac", "linen", "lodge", "lucky", "lunar",
    "magic", "maple", "marsh", "medal", "melon", "metal", "mint", "model", "money", "month",
    "moose", "motor", "mouse", "music", "noble", "north", "novel", "oasis", "ocean", "olive",
    "orbit", "otter", "owner", "paint", "panel", "paper", "party", "pasta", "peach", "pearl",
    "pedal", "penny", "piano", "pilot", "pixel", "plain", "plant", "plaza", "plume", "polar",
    "pound", "prism", "proud", "quail", "quiet", "quilt", "radar", "radio", "rapid", "raven",
    "razor", "relay", "ridge", "river", "robin", "rocky", "round", "royal", "ruler", "salad",
    "sauce", "scale", "scout", "shade", "shell", "shore", "silk", "skate", "slate", "smile",
    "solar", "spark", "spice", "spoon", "spring", "stone", "storm", "sugar", "swift", "table",
    "thorn", "tiger", "toast", "topaz", "torch", "tower", "trail", "tulip", "union", "urban",
    "valley", "vapor", "velvet", "vivid", "voice", "wagon", "whale", "wheat", "wind", "wood",
    "yacht", "yield", "young", "zebra", "zesty",
];

/// An opaque, human-readable conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing identifier, e.g. one restored by the host application.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier from the thread-local entropy source.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generates an identifier from `rng`: four dictionary words joined by `-`,
    /// or a hex-encoded random byte string if no words can be drawn.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_words(rng, WORDS, WORDS_PER_ID).unwrap_or_else(|| Self::random_hex(rng))
    }

    /// Joins `count` words drawn from `words`. Returns `None` when nothing can be drawn.
    pub fn from_words<R: Rng + ?Sized>(rng: &mut R, words: &[&str], count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let drawn = (0..count)
            .map(|_| words.choose(rng).copied())
            .collect::<Option<Vec<_>>>()?;
        Some(Self(drawn.join(SEPARATOR)))
    }

    /// A fixed-length random byte string, hex encoded.
    pub fn random_hex<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; FALLBACK_BYTES];
        rng.fill(&mut bytes[..]);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
