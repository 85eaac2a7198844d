use crate::core::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Closed vocabularies ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Ar)
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "1:1")]
    Square1x1,
    #[serde(rename = "16:9")]
    Wide16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Portrait4x5,
        AspectRatio::Square1x1,
        AspectRatio::Wide16x9,
    ];

    /// CSS pixel size of a rendered slide, also the PDF page size in points.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait4x5 => (340, 425),
            AspectRatio::Square1x1 => (340, 340),
            AspectRatio::Wide16x9 => (560, 315),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Square1x1 => "1:1",
            AspectRatio::Wide16x9 => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
    Xl,
}

impl FontSize {
    pub const ALL: [FontSize; 4] = [FontSize::Small, FontSize::Medium, FontSize::Large, FontSize::Xl];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
    Display,
}

impl FontFamily {
    pub const ALL: [FontFamily; 4] = [
        FontFamily::Sans,
        FontFamily::Serif,
        FontFamily::Mono,
        FontFamily::Display,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub const ALL: [TextAlign; 4] = [
        TextAlign::Left,
        TextAlign::Center,
        TextAlign::Right,
        TextAlign::Justify,
    ];

    /// Leading-edge alignment for a reading direction.
    pub fn start_for(language: Language) -> Self {
        if language.is_rtl() {
            TextAlign::Right
        } else {
            TextAlign::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextEffect {
    None,
    #[default]
    Shadow,
    Neon,
    Outline,
    BgHighlight,
    Glitch,
    Retro,
}

impl TextEffect {
    pub const ALL: [TextEffect; 7] = [
        TextEffect::None,
        TextEffect::Shadow,
        TextEffect::Neon,
        TextEffect::Outline,
        TextEffect::BgHighlight,
        TextEffect::Glitch,
        TextEffect::Retro,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Decoration {
    #[default]
    None,
    Circle,
    Square,
    AccentLine,
    CornerShape,
    Grid,
    Blob,
    Frame,
}

impl Decoration {
    pub const ALL: [Decoration; 8] = [
        Decoration::None,
        Decoration::Circle,
        Decoration::Square,
        Decoration::AccentLine,
        Decoration::CornerShape,
        Decoration::Grid,
        Decoration::Blob,
        Decoration::Frame,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CharacterScale {
    Small,
    #[default]
    Medium,
    Large,
}

impl CharacterScale {
    pub const ALL: [CharacterScale; 3] =
        [CharacterScale::Small, CharacterScale::Medium, CharacterScale::Large];

    pub fn word(self) -> &'static str {
        match self {
            CharacterScale::Small => "small",
            CharacterScale::Medium => "medium",
            CharacterScale::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CharacterPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl CharacterPosition {
    pub const ALL: [CharacterPosition; 9] = [
        CharacterPosition::TopLeft,
        CharacterPosition::TopCenter,
        CharacterPosition::TopRight,
        CharacterPosition::CenterLeft,
        CharacterPosition::Center,
        CharacterPosition::CenterRight,
        CharacterPosition::BottomLeft,
        CharacterPosition::BottomCenter,
        CharacterPosition::BottomRight,
    ];

    /// Textual zone used when describing placement to the image model.
    pub fn zone(self) -> &'static str {
        match self {
            CharacterPosition::TopLeft => "top left corner",
            CharacterPosition::TopCenter => "top center",
            CharacterPosition::TopRight => "top right corner",
            CharacterPosition::CenterLeft => "middle left",
            CharacterPosition::Center => "center",
            CharacterPosition::CenterRight => "middle right",
            CharacterPosition::BottomLeft => "bottom left corner",
            CharacterPosition::BottomCenter => "bottom center",
            CharacterPosition::BottomRight => "bottom right corner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Happy,
    Serious,
    Surprised,
    Focused,
    Excited,
    Confused,
}

impl Expression {
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Serious,
        Expression::Surprised,
        Expression::Focused,
        Expression::Excited,
        Expression::Confused,
    ];

    pub fn word(self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Serious => "serious",
            Expression::Surprised => "surprised",
            Expression::Focused => "focused",
            Expression::Excited => "excited",
            Expression::Confused => "confused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CharacterStyle {
    #[serde(rename = "3d-render")]
    #[default]
    Render3d,
    FlatVector,
    HandDrawn,
    Anime,
    Realistic,
    PixelArt,
    Clay,
    Cyberpunk,
    Vaporwave,
    Noir,
    Ghibli,
    PaperCutout,
    Steampunk,
    Watercolor,
    Sketch,
    Disney,
}

impl CharacterStyle {
    pub const ALL: [CharacterStyle; 16] = [
        CharacterStyle::Render3d,
        CharacterStyle::FlatVector,
        CharacterStyle::HandDrawn,
        CharacterStyle::Anime,
        CharacterStyle::Realistic,
        CharacterStyle::PixelArt,
        CharacterStyle::Clay,
        CharacterStyle::Cyberpunk,
        CharacterStyle::Vaporwave,
        CharacterStyle::Noir,
        CharacterStyle::Ghibli,
        CharacterStyle::PaperCutout,
        CharacterStyle::Steampunk,
        CharacterStyle::Watercolor,
        CharacterStyle::Sketch,
        CharacterStyle::Disney,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CharacterStyle::Render3d => "3d-render",
            CharacterStyle::FlatVector => "flat-vector",
            CharacterStyle::HandDrawn => "hand-drawn",
            CharacterStyle::Anime => "anime",
            CharacterStyle::Realistic => "realistic",
            CharacterStyle::PixelArt => "pixel-art",
            CharacterStyle::Clay => "clay",
            CharacterStyle::Cyberpunk => "cyberpunk",
            CharacterStyle::Vaporwave => "vaporwave",
            CharacterStyle::Noir => "noir",
            CharacterStyle::Ghibli => "ghibli",
            CharacterStyle::PaperCutout => "paper-cutout",
            CharacterStyle::Steampunk => "steampunk",
            CharacterStyle::Watercolor => "watercolor",
            CharacterStyle::Sketch => "sketch",
            CharacterStyle::Disney => "disney",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Neutral,
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Neutral => "neutral",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AgeGroup {
    Child,
    YoungAdult,
    #[default]
    Adult,
    Elderly,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::YoungAdult => "young-adult",
            AgeGroup::Adult => "adult",
            AgeGroup::Elderly => "elderly",
        }
    }
}

// --- Value objects ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTraits {
    pub style: CharacterStyle,
    pub gender: Gender,
    pub age: AgeGroup,
    pub color_accent: String,
}

impl Default for CharacterTraits {
    fn default() -> Self {
        Self {
            style: CharacterStyle::default(),
            gender: Gender::default(),
            age: AgeGroup::default(),
            color_accent: "Blue".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    pub text: String,
    pub accent: String,
}

pub const FALLBACK_TEXT_COLOR: &str = "#ffffff";
pub const FALLBACK_ACCENT_COLOR: &str = "#3b82f6";

impl Default for BrandColors {
    fn default() -> Self {
        Self {
            text: FALLBACK_TEXT_COLOR.to_string(),
            accent: FALLBACK_ACCENT_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDesign {
    pub text_color: String,
    pub accent_color: String,
    pub overlay_opacity: u8,
    pub font_size: FontSize,
    pub font: FontFamily,
    pub text_align: TextAlign,
    pub x_position: u8,
    pub y_position: u8,
    pub text_effect: TextEffect,
    pub decoration: Decoration,
}

impl SlideDesign {
    /// Design every freshly generated slide starts from.
    pub fn initial(language: Language, brand: Option<&BrandColors>) -> Self {
        Self {
            text_color: brand
                .map(|b| b.text.clone())
                .unwrap_or_else(|| FALLBACK_TEXT_COLOR.to_string()),
            accent_color: brand
                .map(|b| b.accent.clone())
                .unwrap_or_else(|| FALLBACK_ACCENT_COLOR.to_string()),
            overlay_opacity: 10,
            font_size: FontSize::Medium,
            font: FontFamily::Sans,
            text_align: TextAlign::start_for(language),
            x_position: 50,
            y_position: 10,
            text_effect: TextEffect::Shadow,
            decoration: Decoration::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSettings {
    pub scale: CharacterScale,
    pub position: CharacterPosition,
    pub opacity: u8,
    pub rotation: i16,
    pub expression: Expression,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            scale: CharacterScale::Medium,
            position: CharacterPosition::Center,
            opacity: 100,
            rotation: 0,
            expression: Expression::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub slide_number: u32,
    pub headline: String,
    pub sub_headline: String,
    pub visual_description: String,
    pub layout_hint: String,
    pub include_character: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_custom_prompt: Option<String>,
    #[serde(default)]
    pub character_settings: CharacterSettings,
    pub design: SlideDesign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselMetadata {
    pub topic: String,
    pub visual_style: String,
    pub target_audience: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_traits: Option<CharacterTraits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_colors: Option<BrandColors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carousel {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub carousel_metadata: CarouselMetadata,
    pub slides: Vec<Slide>,
}

impl Carousel {
    pub fn language(&self) -> Language {
        self.carousel_metadata.language
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.carousel_metadata.aspect_ratio
    }

    pub fn slide(&self, slide_number: u32) -> Option<&Slide> {
        self.slides.iter().find(|s| s.slide_number == slide_number)
    }

    pub fn slide_index(&self, slide_number: u32) -> Option<usize> {
        self.slides.iter().position(|s| s.slide_number == slide_number)
    }

    /// Slide numbers must be unique and dense starting at 1.
    pub fn validate(&self) -> Result<(), StudioError> {
        let mut numbers: Vec<u32> = self.slides.iter().map(|s| s.slide_number).collect();
        numbers.sort_unstable();
        let dense = numbers
            .iter()
            .enumerate()
            .all(|(i, n)| *n as usize == i + 1);
        if dense {
            Ok(())
        } else {
            Err(StudioError::InvalidNumbering { found: numbers })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_carousel;

    fn carousel(numbers: &[u32]) -> Carousel {
        let mut carousel = sample_carousel("c1", numbers.len() as u32);
        for (slide, n) in carousel.slides.iter_mut().zip(numbers) {
            slide.slide_number = *n;
        }
        carousel
    }

    #[test]
    fn test_validate_numbering() {
        assert!(carousel(&[1, 2, 3]).validate().is_ok());
        assert!(carousel(&[2, 1]).validate().is_ok());
        assert_eq!(
            carousel(&[1, 1, 2]).validate(),
            Err(StudioError::InvalidNumbering { found: vec![1, 1, 2] })
        );
        assert!(carousel(&[0, 1]).validate().is_err());
        assert!(carousel(&[1, 3]).validate().is_err());
    }

    #[test]
    fn test_initial_design_follows_direction() {
        assert_eq!(SlideDesign::initial(Language::Ar, None).text_align, TextAlign::Right);
        assert_eq!(SlideDesign::initial(Language::En, None).text_align, TextAlign::Left);

        let brand = BrandColors { text: "#000000".to_string(), accent: "#ff0000".to_string() };
        let design = SlideDesign::initial(Language::En, Some(&brand));
        assert_eq!(design.text_color, "#000000");
        assert_eq!(design.accent_color, "#ff0000");
        assert_eq!(design.text_effect, TextEffect::Shadow);
        assert_eq!((design.x_position, design.y_position), (50, 10));
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(carousel(&[1])).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["carousel_metadata"]["aspect_ratio"], "4:5");
        let design = &json["slides"][0]["design"];
        assert_eq!(design["textColor"], "#ffffff");
        assert_eq!(design["textEffect"], "shadow");
        assert_eq!(json["slides"][0]["character_settings"]["position"], "center");

        let effect: TextEffect = serde_json::from_str("\"bg-highlight\"").unwrap();
        assert_eq!(effect, TextEffect::BgHighlight);
        let deco: Decoration = serde_json::from_str("\"accent-line\"").unwrap();
        assert_eq!(deco, Decoration::AccentLine);
        let style: CharacterStyle = serde_json::from_str("\"3d-render\"").unwrap();
        assert_eq!(style, CharacterStyle::Render3d);
        let pos: CharacterPosition = serde_json::from_str("\"bottom-right\"").unwrap();
        assert_eq!(pos.zone(), "bottom right corner");
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(AspectRatio::Portrait4x5.dimensions(), (340, 425));
        assert_eq!(AspectRatio::Square1x1.dimensions(), (340, 340));
        assert_eq!(AspectRatio::Wide16x9.dimensions(), (560, 315));
    }
}
