//! Single-slide edits and the design preset tables.
//!
//! Every edit produces a new [`Carousel`]; the input value is never mutated,
//! and slides other than the addressed one are carried over unchanged.

use crate::core::error::StudioError;
use crate::core::model::{
    Carousel, CharacterPosition, CharacterScale, Decoration, Expression, FontFamily, FontSize,
    Language, Slide, SlideDesign, TextAlign, TextEffect,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DesignEdit {
    TextColor(String),
    AccentColor(String),
    OverlayOpacity(u8),
    FontSize(FontSize),
    Font(FontFamily),
    TextAlign(TextAlign),
    XPosition(u8),
    YPosition(u8),
    TextEffect(TextEffect),
    Decoration(Decoration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CharacterEdit {
    Scale(CharacterScale),
    Position(CharacterPosition),
    Opacity(u8),
    Rotation(i16),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlideEdit {
    Headline(String),
    SubHeadline(String),
    VisualDescription(String),
    LayoutHint(String),
    IncludeCharacter(bool),
    CharacterPrompt(Option<String>),
    Design(DesignEdit),
    Character(CharacterEdit),
    Layout(LayoutPreset),
    Style(StylePreset),
    Palette(usize),
}

pub fn apply_design_edit(design: &SlideDesign, edit: &DesignEdit) -> SlideDesign {
    let mut next = design.clone();
    match edit {
        DesignEdit::TextColor(c) => next.text_color = c.clone(),
        DesignEdit::AccentColor(c) => next.accent_color = c.clone(),
        DesignEdit::OverlayOpacity(v) => next.overlay_opacity = (*v).min(100),
        DesignEdit::FontSize(v) => next.font_size = *v,
        DesignEdit::Font(v) => next.font = *v,
        DesignEdit::TextAlign(v) => next.text_align = *v,
        DesignEdit::XPosition(v) => next.x_position = (*v).min(100),
        DesignEdit::YPosition(v) => next.y_position = (*v).min(100),
        DesignEdit::TextEffect(v) => next.text_effect = *v,
        DesignEdit::Decoration(v) => next.decoration = *v,
    }
    next
}

fn apply_to_slide(slide: &Slide, edit: &SlideEdit, language: Language) -> Slide {
    let mut next = slide.clone();
    match edit {
        SlideEdit::Headline(t) => next.headline = t.clone(),
        SlideEdit::SubHeadline(t) => next.sub_headline = t.clone(),
        SlideEdit::VisualDescription(t) => next.visual_description = t.clone(),
        SlideEdit::LayoutHint(t) => next.layout_hint = t.clone(),
        SlideEdit::IncludeCharacter(v) => next.include_character = *v,
        SlideEdit::CharacterPrompt(p) => {
            next.character_custom_prompt = p.clone().filter(|s| !s.trim().is_empty())
        }
        SlideEdit::Design(d) => next.design = apply_design_edit(&slide.design, d),
        SlideEdit::Character(c) => {
            let s = &mut next.character_settings;
            match c {
                CharacterEdit::Scale(v) => s.scale = *v,
                CharacterEdit::Position(v) => s.position = *v,
                CharacterEdit::Opacity(v) => s.opacity = (*v).min(100),
                CharacterEdit::Rotation(v) => s.rotation = (*v).clamp(-180, 180),
                CharacterEdit::Expression(v) => s.expression = *v,
            }
        }
        SlideEdit::Layout(p) => next.design = p.apply(&slide.design, language),
        SlideEdit::Style(p) => next.design = p.apply(&slide.design, language),
        SlideEdit::Palette(i) => {
            if let Some(palette) = PALETTES.get(*i) {
                next.design = palette.apply(&slide.design);
            }
        }
    }
    next
}

/// Applies `edit` to the slide numbered `slide_number` and returns the new carousel.
pub fn apply_edit(
    carousel: &Carousel,
    slide_number: u32,
    edit: &SlideEdit,
) -> Result<Carousel, StudioError> {
    let language = carousel.language();
    if carousel.slide(slide_number).is_none() {
        return Err(StudioError::SlideNotFound(slide_number));
    }
    let slides = carousel
        .slides
        .iter()
        .map(|s| {
            if s.slide_number == slide_number {
                apply_to_slide(s, edit, language)
            } else {
                s.clone()
            }
        })
        .collect();
    Ok(Carousel {
        slides,
        ..carousel.clone()
    })
}

// --- Presets ---

pub type DesignTransform = fn(&SlideDesign, Language) -> SlideDesign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPreset {
    Standard,
    Focus,
    Quote,
    Caption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StylePreset {
    Cyber,
    Luxury,
    Bold,
    Minimal,
}

pub static LAYOUT_PRESETS: [(LayoutPreset, &str, DesignTransform); 4] = [
    LayoutPreset::Standard.entry(),
    LayoutPreset::Focus.entry(),
    LayoutPreset::Quote.entry(),
    LayoutPreset::Caption.entry(),
];

pub static STYLE_PRESETS: [(StylePreset, &str, DesignTransform); 4] = [
    StylePreset::Cyber.entry(),
    StylePreset::Luxury.entry(),
    StylePreset::Bold.entry(),
    StylePreset::Minimal.entry(),
];

impl LayoutPreset {
    const fn entry(self) -> (LayoutPreset, &'static str, DesignTransform) {
        match self {
            LayoutPreset::Standard => (self, "Standard", layout_standard as DesignTransform),
            LayoutPreset::Focus => (self, "Title focus", layout_focus as DesignTransform),
            LayoutPreset::Quote => (self, "Quote", layout_quote as DesignTransform),
            LayoutPreset::Caption => (self, "Bottom caption", layout_caption as DesignTransform),
        }
    }

    pub fn label(self) -> &'static str {
        self.entry().1
    }

    pub fn apply(self, design: &SlideDesign, language: Language) -> SlideDesign {
        (self.entry().2)(design, language)
    }
}

impl StylePreset {
    const fn entry(self) -> (StylePreset, &'static str, DesignTransform) {
        match self {
            StylePreset::Cyber => (self, "Cyber", style_cyber as DesignTransform),
            StylePreset::Luxury => (self, "Luxury", style_luxury as DesignTransform),
            StylePreset::Bold => (self, "Bold", style_bold as DesignTransform),
            StylePreset::Minimal => (self, "Minimal", style_minimal as DesignTransform),
        }
    }

    pub fn label(self) -> &'static str {
        self.entry().1
    }

    pub fn apply(self, design: &SlideDesign, language: Language) -> SlideDesign {
        (self.entry().2)(design, language)
    }
}

fn layout_standard(d: &SlideDesign, language: Language) -> SlideDesign {
    SlideDesign {
        text_align: TextAlign::start_for(language),
        x_position: 50,
        y_position: 10,
        font_size: FontSize::Medium,
        decoration: Decoration::None,
        ..d.clone()
    }
}

fn layout_focus(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_align: TextAlign::Center,
        x_position: 50,
        y_position: 40,
        font_size: FontSize::Xl,
        ..d.clone()
    }
}

fn layout_quote(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_align: TextAlign::Center,
        x_position: 50,
        y_position: 50,
        font_size: FontSize::Large,
        decoration: Decoration::AccentLine,
        ..d.clone()
    }
}

fn layout_caption(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_align: TextAlign::Center,
        x_position: 50,
        y_position: 80,
        font_size: FontSize::Small,
        decoration: Decoration::None,
        ..d.clone()
    }
}

fn style_cyber(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_color: "#00ffcc".to_string(),
        accent_color: "#00ffcc".to_string(),
        text_effect: TextEffect::Neon,
        decoration: Decoration::Grid,
        overlay_opacity: 80,
        ..d.clone()
    }
}

fn style_luxury(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_color: "#ffd700".to_string(),
        accent_color: "#ffd700".to_string(),
        text_effect: TextEffect::Shadow,
        decoration: Decoration::Frame,
        overlay_opacity: 60,
        font: FontFamily::Serif,
        ..d.clone()
    }
}

fn style_bold(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_color: "#ffffff".to_string(),
        accent_color: "#ef4444".to_string(),
        text_effect: TextEffect::BgHighlight,
        decoration: Decoration::Circle,
        overlay_opacity: 20,
        font: FontFamily::Display,
        ..d.clone()
    }
}

fn style_minimal(d: &SlideDesign, _: Language) -> SlideDesign {
    SlideDesign {
        text_color: "#ffffff".to_string(),
        accent_color: "#94a3b8".to_string(),
        text_effect: TextEffect::None,
        decoration: Decoration::None,
        overlay_opacity: 10,
        font: FontFamily::Sans,
        ..d.clone()
    }
}

// --- Palettes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
}

impl Palette {
    pub fn apply(&self, design: &SlideDesign) -> SlideDesign {
        SlideDesign {
            text_color: self.text.to_string(),
            accent_color: self.accent.to_string(),
            ..design.clone()
        }
    }
}

pub const PALETTES: [Palette; 8] = [
    Palette { name: "Default", text: "#ffffff", accent: "#3b82f6" },
    Palette { name: "Ocean", text: "#e0f2fe", accent: "#0284c7" },
    Palette { name: "Sunset", text: "#fff7ed", accent: "#f97316" },
    Palette { name: "Forest", text: "#f0fdf4", accent: "#16a34a" },
    Palette { name: "Berry", text: "#fdf2f8", accent: "#db2777" },
    Palette { name: "Monochrome", text: "#ffffff", accent: "#94a3b8" },
    // For light backgrounds.
    Palette { name: "Dark", text: "#0f172a", accent: "#64748b" },
    Palette { name: "Gold", text: "#ffffff", accent: "#fbbf24" },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_carousel;

    fn varied_designs() -> Vec<SlideDesign> {
        let base = SlideDesign::initial(Language::En, None);
        vec![
            base.clone(),
            SlideDesign {
                font_size: FontSize::Xl,
                decoration: Decoration::Blob,
                text_effect: TextEffect::Glitch,
                x_position: 0,
                y_position: 100,
                ..base.clone()
            },
            (STYLE_PRESETS[0].2)(&base, Language::Ar),
        ]
    }

    fn all_transforms() -> Vec<(&'static str, DesignTransform)> {
        LAYOUT_PRESETS
            .iter()
            .map(|(_, label, t)| (*label, *t))
            .chain(STYLE_PRESETS.iter().map(|(_, label, t)| (*label, *t)))
            .collect()
    }

    #[test]
    fn test_presets_are_idempotent() {
        for language in [Language::En, Language::Ar] {
            for design in varied_designs() {
                for (label, transform) in all_transforms() {
                    let once = transform(&design, language);
                    let twice = transform(&once, language);
                    assert_eq!(once, twice, "preset {} is not idempotent", label);
                }
            }
        }
    }

    #[test]
    fn test_preset_tables_match_variants() {
        let base = SlideDesign::initial(Language::En, None);
        for (preset, label, transform) in LAYOUT_PRESETS.iter() {
            assert_eq!(preset.label(), *label);
            assert_eq!(preset.apply(&base, Language::En), transform(&base, Language::En));
        }
        for (preset, label, transform) in STYLE_PRESETS.iter() {
            assert_eq!(preset.label(), *label);
            assert_eq!(preset.apply(&base, Language::Ar), transform(&base, Language::Ar));
        }
        assert_eq!(LayoutPreset::Focus.label(), "Title focus");
        assert_eq!(LayoutPreset::Focus.apply(&base, Language::En).font_size, FontSize::Xl);
        assert_eq!(StylePreset::Minimal.apply(&base, Language::En).accent_color, "#94a3b8");
    }

    #[test]
    fn test_layout_standard_follows_direction() {
        let design = SlideDesign {
            text_align: TextAlign::Center,
            ..SlideDesign::initial(Language::En, None)
        };
        assert_eq!(LayoutPreset::Standard.apply(&design, Language::Ar).text_align, TextAlign::Right);
        assert_eq!(LayoutPreset::Standard.apply(&design, Language::En).text_align, TextAlign::Left);
    }

    #[test]
    fn test_preset_values() {
        let base = SlideDesign::initial(Language::En, None);

        let quote = LayoutPreset::Quote.apply(&base, Language::En);
        assert_eq!(quote.decoration, Decoration::AccentLine);
        assert_eq!((quote.x_position, quote.y_position), (50, 50));
        assert_eq!(quote.font_size, FontSize::Large);

        let caption = LayoutPreset::Caption.apply(&base, Language::En);
        assert_eq!(caption.y_position, 80);
        assert_eq!(caption.font_size, FontSize::Small);

        let luxury = StylePreset::Luxury.apply(&base, Language::En);
        assert_eq!(luxury.font, FontFamily::Serif);
        assert_eq!(luxury.decoration, Decoration::Frame);
        assert_eq!(luxury.text_color, "#ffd700");

        let bold = StylePreset::Bold.apply(&base, Language::En);
        assert_eq!(bold.text_effect, TextEffect::BgHighlight);
        assert_eq!(bold.accent_color, "#ef4444");
        assert_eq!(StylePreset::Bold.label(), "Bold");
    }

    #[test]
    fn test_edit_leaves_other_slides_identical() {
        let carousel = sample_carousel("c", 5);
        let edits = vec![
            SlideEdit::Headline("New".to_string()),
            SlideEdit::Design(DesignEdit::TextColor("#123456".to_string())),
            SlideEdit::Design(DesignEdit::OverlayOpacity(55)),
            SlideEdit::Character(CharacterEdit::Rotation(45)),
            SlideEdit::Layout(LayoutPreset::Focus),
            SlideEdit::Style(StylePreset::Cyber),
            SlideEdit::Palette(3),
        ];
        for edit in edits {
            let next = apply_edit(&carousel, 3, &edit).unwrap();
            for (before, after) in carousel.slides.iter().zip(&next.slides) {
                if before.slide_number != 3 {
                    assert_eq!(before, after, "slide {} changed by {:?}", before.slide_number, edit);
                }
            }
            assert_ne!(next.slides[2], carousel.slides[2], "{:?} had no effect", edit);
            assert_eq!(next.carousel_metadata, carousel.carousel_metadata);
        }
    }

    #[test]
    fn test_edit_ranges_are_clamped() {
        let carousel = sample_carousel("c", 1);
        let next = apply_edit(&carousel, 1, &SlideEdit::Design(DesignEdit::XPosition(250))).unwrap();
        assert_eq!(next.slides[0].design.x_position, 100);
        let next = apply_edit(&next, 1, &SlideEdit::Character(CharacterEdit::Rotation(-400))).unwrap();
        assert_eq!(next.slides[0].character_settings.rotation, -180);
        let next = apply_edit(&next, 1, &SlideEdit::Character(CharacterEdit::Opacity(120))).unwrap();
        assert_eq!(next.slides[0].character_settings.opacity, 100);
    }

    #[test]
    fn test_unknown_slide_is_rejected() {
        let carousel = sample_carousel("c", 2);
        let err = apply_edit(&carousel, 9, &SlideEdit::Headline("x".to_string())).unwrap_err();
        assert_eq!(err, StudioError::SlideNotFound(9));
    }

    #[test]
    fn test_palette_sets_both_colors() {
        let base = SlideDesign::initial(Language::En, None);
        let dark = PALETTES[6].apply(&base);
        assert_eq!(dark.text_color, "#0f172a");
        assert_eq!(dark.accent_color, "#64748b");
        assert_eq!(PALETTES.len(), 8);
    }

    #[test]
    fn test_blank_character_prompt_is_cleared() {
        let carousel = sample_carousel("c", 1);
        let next = apply_edit(&carousel, 1, &SlideEdit::CharacterPrompt(Some("  ".to_string()))).unwrap();
        assert_eq!(next.slides[0].character_custom_prompt, None);
    }
}
