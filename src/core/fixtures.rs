use crate::core::model::{
    AspectRatio, Carousel, CarouselMetadata, CharacterSettings, Language, Slide, SlideDesign,
};

pub fn sample_slide(slide_number: u32, language: Language) -> Slide {
    Slide {
        slide_number,
        headline: format!("Headline {}", slide_number),
        sub_headline: format!("Supporting line for slide {}", slide_number),
        visual_description: "A tidy desk with a laptop and a plant".to_string(),
        layout_hint: "hook".to_string(),
        include_character: false,
        character_custom_prompt: None,
        character_settings: CharacterSettings::default(),
        design: SlideDesign::initial(language, None),
    }
}

pub fn sample_carousel(id: &str, slide_count: u32) -> Carousel {
    Carousel {
        id: id.to_string(),
        created_at: 1_700_000_000_000,
        carousel_metadata: CarouselMetadata {
            topic: "Remote work habits".to_string(),
            visual_style: "Minimalist Clean".to_string(),
            target_audience: "Team leads".to_string(),
            language: Language::En,
            tone: "Professional".to_string(),
            aspect_ratio: AspectRatio::Portrait4x5,
            dialect: None,
            main_theme: None,
            character_description: None,
            character_traits: None,
            brand_colors: None,
        },
        slides: (1..=slide_count)
            .map(|n| sample_slide(n, Language::En))
            .collect(),
    }
}
