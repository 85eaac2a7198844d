use crate::core::config::CreateDefaults;
use crate::core::model::{AspectRatio, BrandColors, CharacterTraits, Language};
use std::ops::RangeInclusive;

/// Slides per carousel accepted by the form and by config defaults.
pub const SLIDE_COUNT_RANGE: RangeInclusive<u32> = 3..=10;

pub fn clamp_slide_count(count: u32) -> u32 {
    count.clamp(*SLIDE_COUNT_RANGE.start(), *SLIDE_COUNT_RANGE.end())
}

pub const VISUAL_STYLE_CATEGORIES: [(&str, &[&str]); 6] = [
    (
        "Professional",
        &["Minimalist Clean", "Tech Startup", "Corporate Blue", "Modern SaaS", "Swiss International", "Editorial"],
    ),
    (
        "Creative & Artistic",
        &["Hand Drawn Sketch", "Watercolor", "Pop Art", "Collage", "Doodle Style", "Oil Painting", "Pastel Dream"],
    ),
    (
        "3D & Textured",
        &["3D Claymorphism", "Glassmorphism", "3D Isometric", "Paper Cutout", "Fabric Texture", "Plastic Sheen", "Matte 3D"],
    ),
    (
        "Dark & Vibrant",
        &["Cyberpunk Neon", "Dark Mode Gradient", "Holographic", "Vaporwave", "Neon Noir", "Glowwave", "High Contrast Dark"],
    ),
    (
        "Retro & Vintage",
        &["Vintage 90s", "Retro 80s", "Bauhaus", "Grunge", "Lo-Fi Aesthetic", "Film Grain", "Noir"],
    ),
    (
        "Nature & Soft",
        &["Organic Green", "Earthy Tones", "Botanical", "Soft Gradient", "Warm Beige"],
    ),
];

pub fn all_visual_styles() -> Vec<&'static str> {
    VISUAL_STYLE_CATEGORIES
        .iter()
        .flat_map(|(_, styles)| styles.iter().copied())
        .collect()
}

pub const TONES_EN: [&str; 9] = [
    "Professional",
    "Casual",
    "Humorous",
    "Inspirational",
    "Educational",
    "Controversial",
    "Empathetic",
    "Urgent",
    "Witty",
];

pub const TONES_AR: [&str; 7] = [
    "Professional (رسمي)",
    "Friendly (ودود)",
    "Inspirational (ملهم)",
    "Sarcastic (ساخر)",
    "Educational (تعليمي)",
    "Urgent (عاجل)",
    "Serious (جدي)",
];

pub fn tones_for(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => &TONES_EN,
        Language::Ar => &TONES_AR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Msa,
    Egyptian,
    Saudi,
    Levantine,
    Maghrebi,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Msa,
        Dialect::Egyptian,
        Dialect::Saudi,
        Dialect::Levantine,
        Dialect::Maghrebi,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Dialect::Msa => "msa",
            Dialect::Egyptian => "egyptian",
            Dialect::Saudi => "saudi",
            Dialect::Levantine => "levantine",
            Dialect::Maghrebi => "maghrebi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dialect::Msa => "Modern Standard (الفصحى)",
            Dialect::Egyptian => "Egyptian (المصرية)",
            Dialect::Saudi => "Saudi/Gulf (السعودية/الخليجية)",
            Dialect::Levantine => "Levantine (الشامية)",
            Dialect::Maghrebi => "Maghrebi (المغربية/الجزائرية)",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }
}

pub fn dialects_for(language: Language) -> &'static [Dialect] {
    match language {
        Language::En => &[],
        Language::Ar => &Dialect::ALL,
    }
}

/// Inputs of the creation view.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateForm {
    pub main_theme: String,
    pub topic: String,
    pub target_audience: String,
    pub visual_style: String,
    pub slide_count: u32,
    pub aspect_ratio: AspectRatio,
    pub language: Language,
    pub tone: String,
    pub dialect: Option<Dialect>,
    pub brand_colors: BrandColors,
    pub use_character: bool,
    pub character_traits: CharacterTraits,
}

impl CreateForm {
    pub fn from_defaults(defaults: &CreateDefaults) -> Self {
        let mut form = Self {
            main_theme: String::new(),
            topic: String::new(),
            target_audience: String::new(),
            visual_style: defaults.visual_style.clone(),
            slide_count: clamp_slide_count(defaults.slide_count),
            aspect_ratio: defaults.aspect_ratio,
            language: Language::En,
            tone: TONES_EN[0].to_string(),
            dialect: None,
            brand_colors: BrandColors::default(),
            use_character: false,
            character_traits: CharacterTraits::default(),
        };
        form.set_language(defaults.language);
        form
    }

    /// Switching language re-derives the tone default and clears the
    /// dialect; an unset dialect is prompted as Modern Standard Arabic.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.tone = tones_for(language)[0].to_string();
        self.dialect = None;
    }

    pub fn tone_options(&self) -> &'static [&'static str] {
        tones_for(self.language)
    }

    pub fn dialect_options(&self) -> &'static [Dialect] {
        dialects_for(self.language)
    }
}

impl Default for CreateForm {
    fn default() -> Self {
        Self::from_defaults(&CreateDefaults::default())
    }
}
