//! Static reference data: seeds, soils, nutrient mixes, threats and acts of god.
//!
//! Everything here is read-only. Seed and soil drain multipliers compose
//! multiplicatively with the base drain rate from [`crate::config::GrowConfig`].

use std::str::FromStr;

use marrow_common::GrowError;
use serde::{Deserialize, Serialize};

use crate::rng::{shuffle, GrowRng};

/// Water and nutrient drain multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrainProfile {
    /// Water drain multiplier.
    pub water: f64,
    /// Nutrient drain multiplier.
    pub nutrients: f64,
}

impl DrainProfile {
    const fn new(water: f64, nutrients: f64) -> Self {
        Self { water, nutrients }
    }
}

// ===== Seeds =====

/// Seed strains a grower can plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    /// Balanced, classic strain.
    CryptCookies,
    /// Potent, nutrient-hungry.
    SkeleSkittlez,
    /// Resilient, easy to grow.
    HellhoundHaze,
    /// Drains fast.
    Rotjaw,
    /// Slow drain, the best grower.
    MarrowMint,
    /// Unpredictable, mid stats.
    BoneBlossom,
}

impl SeedKind {
    /// Every seed kind, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::CryptCookies,
        Self::SkeleSkittlez,
        Self::HellhoundHaze,
        Self::Rotjaw,
        Self::MarrowMint,
        Self::BoneBlossom,
    ];

    /// Stable lookup key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::CryptCookies => "cryptcookies",
            Self::SkeleSkittlez => "skeleskittlez",
            Self::HellhoundHaze => "hellhoundhaze",
            Self::Rotjaw => "rotjaw",
            Self::MarrowMint => "marrowmint",
            Self::BoneBlossom => "boneblossom",
        }
    }

    /// Get the display name of this strain.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::CryptCookies => "Crypt Cookies",
            Self::SkeleSkittlez => "Skele Skittlez",
            Self::HellhoundHaze => "Hellhound Haze",
            Self::Rotjaw => "Rotjaw",
            Self::MarrowMint => "Marrow Mint",
            Self::BoneBlossom => "Bone Blossom",
        }
    }

    /// Short flavour text for the selection screen.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CryptCookies => "Balanced, classic strain.",
            Self::SkeleSkittlez => "Potent, nutrient-hungry.",
            Self::HellhoundHaze => "Resilient, easy to grow.",
            Self::Rotjaw => "Horrible: drains fast!",
            Self::MarrowMint => "Best grower: slow drain.",
            Self::BoneBlossom => "Unpredictable, mid stats.",
        }
    }

    /// Drain multipliers contributed by the strain.
    #[must_use]
    pub fn drain(self) -> DrainProfile {
        match self {
            Self::CryptCookies => DrainProfile::new(0.6, 0.5),
            Self::SkeleSkittlez => DrainProfile::new(0.5, 0.7),
            Self::HellhoundHaze => DrainProfile::new(0.4, 0.4),
            Self::Rotjaw => DrainProfile::new(0.9, 0.9),
            Self::MarrowMint => DrainProfile::new(0.3, 0.3),
            Self::BoneBlossom => DrainProfile::new(0.7, 0.6),
        }
    }
}

impl FromStr for SeedKind {
    type Err = GrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|seed| seed.key() == key)
            .ok_or_else(|| GrowError::UnknownSeed(s.to_string()))
    }
}

impl std::fmt::Display for SeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Draw `count` distinct seed kinds, uniformly without replacement.
#[must_use]
pub fn seed_options(count: usize, rng: &mut dyn GrowRng) -> Vec<SeedKind> {
    let mut keys = SeedKind::ALL;
    shuffle(&mut keys, rng);
    keys.into_iter().take(count).collect()
}

// ===== Soils =====

/// Growing medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilKind {
    /// Crushed bone substrate.
    Ossuary,
    /// Graveyard loam.
    Graveblend,
    /// Moss grown over marrow.
    Marrowmoss,
}

impl SoilKind {
    /// Every soil kind.
    pub const ALL: [Self; 3] = [Self::Ossuary, Self::Graveblend, Self::Marrowmoss];

    /// Stable lookup key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Ossuary => "ossuary",
            Self::Graveblend => "graveblend",
            Self::Marrowmoss => "marrowmoss",
        }
    }

    /// Drain multipliers contributed by the soil.
    #[must_use]
    pub fn drain(self) -> DrainProfile {
        match self {
            Self::Ossuary => DrainProfile::new(0.5, 0.6),
            Self::Graveblend => DrainProfile::new(0.6, 0.4),
            Self::Marrowmoss => DrainProfile::new(0.5, 0.5),
        }
    }
}

impl FromStr for SoilKind {
    type Err = GrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|soil| soil.key() == key)
            .ok_or_else(|| GrowError::UnknownSoil(s.to_string()))
    }
}

// ===== Nutrient mixes =====

/// Nutrient mix applied by scheduled feedings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientMix {
    /// Standard, reliable feed.
    Basic,
    /// Bigger yields, less potency.
    Growth,
    /// More potent, less yield.
    Potent,
    /// Slight boost to both.
    Balanced,
    /// Big yields, weaker buds.
    Fungal,
    /// Super potent, stunts growth.
    BoneBroth,
    /// High yield.
    Phantom,
    /// Drains everything.
    RotJuice,
    /// Sometimes amazing.
    Cosmic,
    /// Huge yields if you survive.
    DoomDust,
}

impl NutrientMix {
    /// Every nutrient mix.
    pub const ALL: [Self; 10] = [
        Self::Basic,
        Self::Growth,
        Self::Potent,
        Self::Balanced,
        Self::Fungal,
        Self::BoneBroth,
        Self::Phantom,
        Self::RotJuice,
        Self::Cosmic,
        Self::DoomDust,
    ];

    /// Stable lookup key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Growth => "growth",
            Self::Potent => "potent",
            Self::Balanced => "balanced",
            Self::Fungal => "fungal",
            Self::BoneBroth => "bonebroth",
            Self::Phantom => "phantom",
            Self::RotJuice => "rotjuice",
            Self::Cosmic => "cosmic",
            Self::DoomDust => "doomdust",
        }
    }

    /// Get the display name of this mix.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Basic => "Basic Mix",
            Self::Growth => "Growth Boost",
            Self::Potent => "Potency Plus",
            Self::Balanced => "Balanced Blend",
            Self::Fungal => "Fungal Fizz",
            Self::BoneBroth => "Bone Broth",
            Self::Phantom => "Phantom Dew",
            Self::RotJuice => "Rot Juice",
            Self::Cosmic => "Cosmic Compost",
            Self::DoomDust => "Doom Dust",
        }
    }

    /// Multiplier applied to the potency boost per feeding.
    #[must_use]
    pub fn potency(self) -> f64 {
        self.factors().0
    }

    /// Multiplier applied to the plant weight per feeding.
    #[must_use]
    pub fn yield_factor(self) -> f64 {
        self.factors().1
    }

    fn factors(self) -> (f64, f64) {
        match self {
            Self::Basic => (1.0, 1.0),
            Self::Growth => (0.9, 1.2),
            Self::Potent => (1.2, 0.9),
            Self::Balanced => (1.1, 1.1),
            Self::Fungal => (0.8, 1.3),
            Self::BoneBroth => (1.3, 0.8),
            Self::Phantom => (1.0, 1.3),
            Self::RotJuice => (0.7, 0.7),
            Self::Cosmic => (1.4, 1.0),
            Self::DoomDust => (0.6, 1.4),
        }
    }
}

impl FromStr for NutrientMix {
    type Err = GrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mix| mix.key() == key)
            .ok_or_else(|| GrowError::UnknownMix(s.to_string()))
    }
}

// ===== Threats =====

/// A pest or raider entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threat {
    /// Display name, used in resolution messages.
    pub name: &'static str,
    /// Inclusive damage range in percent.
    pub damage: (u32, u32),
    /// Probability the defense succeeds.
    pub success_rate: f64,
    /// Announcement logged when the threat appears.
    pub message: &'static str,
}

impl Threat {
    const fn new(name: &'static str, damage: (u32, u32), success_rate: f64, message: &'static str) -> Self {
        Self {
            name,
            damage,
            success_rate,
            message,
        }
    }
}

/// Pests. A failed defense reduces potency.
pub const PESTS: [Threat; 8] = [
    Threat::new("Space Slugs", (4, 12), 0.5, "Space slugs are oozing over your plants!"),
    Threat::new("Brain Leeches", (5, 15), 0.4, "Brain leeches are draining your plant's will to live!"),
    Threat::new("Crypt Mites", (3, 10), 0.6, "Crypt mites are gnawing at your roots!"),
    Threat::new("Phantom Gnats", (2, 8), 0.6, "Phantom gnats are haunting your soil!"),
    Threat::new("Mutant Aphids", (6, 18), 0.35, "Mutant aphids are swarming your crop!"),
    Threat::new("Eyeball Spiders", (5, 15), 0.3, "Eyeball spiders are staring at your leaves!"),
    Threat::new("Mini Martians", (4, 14), 0.45, "Mini martians are abducting your nutrients!"),
    Threat::new("Fungal Gremlins", (3, 12), 0.5, "Fungal gremlins are causing chaos in your soil!"),
];

/// Raiders. A failed defense reduces yield.
pub const RAIDERS: [Threat; 7] = [
    Threat::new("Crypt Bandits", (10, 20), 0.3, "Crypt bandits are sneaking into your garden!"),
    Threat::new("Mutant Chickens", (8, 18), 0.35, "Mutant chickens are pecking at your stash!"),
    Threat::new("Alien Harvesters", (15, 25), 0.2, "Alien harvesters are beaming up your buds!"),
    Threat::new("Spectral Thieves", (12, 22), 0.25, "Spectral thieves are phasing through your defenses!"),
    Threat::new(
        "Corporate Thieves",
        (20, 30),
        0.25,
        "Corporate security forces are attempting to seize your crop!",
    ),
    Threat::new("Mutant Horde", (25, 35), 0.15, "A horde of mutants is descending on your grow site!"),
    Threat::new("Zombie Gardeners", (10, 20), 0.3, "Zombie gardeners are pruning your plants... badly!"),
];

// ===== Acts of god =====

/// Attribute an act of god hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActTarget {
    /// Water level.
    Water,
    /// Light level.
    Light,
    /// Nutrient level.
    Nutrients,
    /// Plant health.
    Health,
    /// Plant stress.
    Stress,
}

/// One-shot disaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActOfGod {
    /// What it hits.
    pub target: ActTarget,
    /// Log message.
    pub message: &'static str,
}

const fn act(target: ActTarget, message: &'static str) -> ActOfGod {
    ActOfGod { target, message }
}

/// All acts of god.
pub const ACTS_OF_GOD: [ActOfGod; 11] = [
    act(ActTarget::Water, "Your mom's thirsty! There was a drought."),
    act(ActTarget::Water, "A pipe burst and flooded the street. Water supply is cut!"),
    act(ActTarget::Water, "A rain of frogs absorbs all your water!"),
    act(ActTarget::Light, "A solar eclipse darkens the sky!"),
    act(ActTarget::Light, "A dust storm blocks out the sun!"),
    act(ActTarget::Light, "Cosmic rays mutate your crop!"),
    act(ActTarget::Nutrients, "Hungry raccoons raided your compost pile!"),
    act(ActTarget::Nutrients, "Toxic runoff ruined your fertilizer batch!"),
    act(ActTarget::Nutrients, "A wormhole sucked up your nutrients!"),
    act(ActTarget::Health, "A time traveler swapped your plant with a weaker version!"),
    act(ActTarget::Stress, "A poltergeist rearranged your garden!"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{FastRng, ScriptedRng};

    #[test]
    fn test_seed_keys_round_trip() {
        for seed in SeedKind::ALL {
            assert_eq!(seed.key().parse::<SeedKind>(), Ok(seed));
        }
        assert_eq!(" RotJaw ".parse::<SeedKind>(), Ok(SeedKind::Rotjaw));
        assert_eq!(
            "kale".parse::<SeedKind>(),
            Err(GrowError::UnknownSeed("kale".to_string()))
        );
    }

    #[test]
    fn test_serde_keys_match_lookup_keys() {
        for seed in SeedKind::ALL {
            let json = serde_json::to_string(&seed).expect("serialize seed");
            assert_eq!(json, format!("\"{}\"", seed.key()));
        }
        for mix in NutrientMix::ALL {
            let json = serde_json::to_string(&mix).expect("serialize mix");
            assert_eq!(json, format!("\"{}\"", mix.key()));
        }
    }

    #[test]
    fn test_mix_factors() {
        assert!((NutrientMix::Cosmic.potency() - 1.4).abs() < f64::EPSILON);
        assert!((NutrientMix::DoomDust.yield_factor() - 1.4).abs() < f64::EPSILON);
        assert!((NutrientMix::DoomDust.potency() - 0.6).abs() < f64::EPSILON);
        assert_eq!("bonebroth".parse::<NutrientMix>(), Ok(NutrientMix::BoneBroth));
        assert!("soup".parse::<NutrientMix>().is_err());
    }

    #[test]
    fn test_threat_tables_are_sane() {
        for threat in PESTS.iter().chain(RAIDERS.iter()) {
            assert!(threat.damage.0 <= threat.damage.1, "{}", threat.name);
            assert!(threat.success_rate > 0.0 && threat.success_rate < 1.0);
        }
        assert_eq!(ACTS_OF_GOD.len(), 11);
    }

    #[test]
    fn test_seed_options_are_distinct() {
        let mut rng = FastRng::with_seed(42);
        for _ in 0..50 {
            let options = seed_options(3, &mut rng);
            assert_eq!(options.len(), 3);
            assert_ne!(options[0], options[1]);
            assert_ne!(options[1], options[2]);
            assert_ne!(options[0], options[2]);
        }
    }

    #[test]
    fn test_seed_options_follow_shuffle() {
        // Every swap picks index 0, rotating the catalog
        let mut rng = ScriptedRng::constant(0.0);
        let options = seed_options(3, &mut rng);
        assert_eq!(
            options,
            vec![SeedKind::SkeleSkittlez, SeedKind::HellhoundHaze, SeedKind::Rotjaw]
        );
    }
}
