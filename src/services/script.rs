use crate::core::error::StudioError;
use crate::core::form::{clamp_slide_count, CreateForm, Dialect};
use crate::core::model::{
    AspectRatio, BrandColors, Carousel, CarouselMetadata, CharacterSettings, CharacterTraits,
    Language, Slide, SlideDesign,
};
use crate::services::llm::{LlmClient, TextRequest};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const FALLBACK_TOPIC: &str = "Growth Hacking Strategies";
pub const FALLBACK_AUDIENCE: &str = "Startup Founders";
pub const DEFAULT_DIALECT: &str = "Modern Standard Arabic";

/// Everything the content generator is asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    pub topic: String,
    pub visual_style: String,
    pub target_audience: String,
    pub slide_count: u32,
    pub language: Language,
    pub tone: String,
    pub dialect: Option<Dialect>,
    pub use_character: bool,
    pub aspect_ratio: AspectRatio,
    pub character_traits: Option<CharacterTraits>,
    pub brand_colors: Option<BrandColors>,
}

impl ScriptRequest {
    pub fn from_form(form: &CreateForm) -> Result<Self, StudioError> {
        if form.topic.trim().is_empty() || form.target_audience.trim().is_empty() {
            return Err(StudioError::MissingBrief);
        }
        Ok(Self {
            topic: form.topic.trim().to_string(),
            visual_style: form.visual_style.clone(),
            target_audience: form.target_audience.trim().to_string(),
            slide_count: clamp_slide_count(form.slide_count),
            language: form.language,
            tone: form.tone.clone(),
            dialect: form.dialect,
            use_character: form.use_character,
            aspect_ratio: form.aspect_ratio,
            character_traits: Some(form.character_traits.clone()),
            brand_colors: Some(form.brand_colors.clone()),
        })
    }

    fn language_instruction(&self) -> String {
        match self.language {
            Language::Ar => format!(
                "Language: Arabic (Dialect/Style: {}). IMPORTANT: Ensure headlines are catchy, short, \
                 and strictly in Arabic script. Use culturally relevant metaphors.",
                self.dialect.map_or(DEFAULT_DIALECT, |d| d.label())
            ),
            Language::En => format!("Language: English. Tone: {}.", self.tone),
        }
    }

    fn character_instruction(&self) -> String {
        match (&self.character_traits, self.use_character) {
            (Some(traits), true) => {
                let brief = format!(
                    "A {} {} character, style {}, main color {}",
                    traits.age.as_str(),
                    traits.gender.as_str(),
                    traits.style.as_str(),
                    traits.color_accent
                );
                format!(
                    "CRITICAL TASK: You must create a \"Visual DNA\" for the character based on this brief: \"{}\".\n\
                     In the 'character_description' field, write a VERY detailed, comma-separated physical description that includes:\n\
                     - Exact hair color and style\n\
                     - Specific clothing items and colors\n\
                     - Accessories (glasses, hats, items)\n\
                     - Eye color and distinctive features\n\
                     - Skin tone/Material (if robot/3d)\n\
                     Example: \"Cute 3D rendered boy, messy orange hair, wearing a large blue hoodie, oversized round glasses, white sneakers, soft lighting, pixar style.\"\n\
                     This description will be used to generate CONSISTENT images.",
                    brief
                )
            }
            _ => "Leave 'character_description' empty. Set 'include_character' to false.".to_string(),
        }
    }

    pub fn system_instruction(&self) -> String {
        format!(
            "Role: You are a Senior Social Media Strategist and Visual Director.\n\
             Objective: Generate a viral {count}-slide carousel.\n\n\
             {language}\n\
             Target Audience: {audience}\n\
             Tone: {tone}\n\
             Visual Style: {style}\n\
             Aspect Ratio: {ratio}\n\n\
             {character}\n\n\
             Structure:\n\
             - Slide 1: Hook (High contrast, big text).\n\
             - Middle: Value/Educational.\n\
             - End: CTA.\n\n\
             Visual Prompting:\n\
             - In 'visual_description', describe the scene layout. Keep it compatible with the character interacting with it.",
            count = self.slide_count,
            language = self.language_instruction(),
            audience = self.target_audience,
            tone = self.tone,
            style = self.visual_style,
            ratio = self.aspect_ratio,
            character = self.character_instruction(),
        )
    }

    pub fn user_prompt(&self) -> String {
        format!("Topic: {}. Slides: {}.", self.topic, self.slide_count)
    }
}

/// Response schema handed to the model; mirrors [`ScriptPayload`].
pub fn carousel_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "carousel_metadata": {
                "type": "OBJECT",
                "properties": {
                    "topic": { "type": "STRING" },
                    "visual_style": { "type": "STRING" },
                    "target_audience": { "type": "STRING" },
                    "language": { "type": "STRING", "enum": ["en", "ar"] },
                    "tone": { "type": "STRING" },
                    "dialect": { "type": "STRING" },
                    "character_description": { "type": "STRING" }
                },
                "required": ["topic", "visual_style", "target_audience", "character_description"]
            },
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "slide_number": { "type": "INTEGER" },
                        "headline": { "type": "STRING" },
                        "sub_headline": { "type": "STRING" },
                        "visual_description": { "type": "STRING" },
                        "layout_hint": { "type": "STRING" },
                        "include_character": { "type": "BOOLEAN" }
                    },
                    "required": [
                        "slide_number", "headline", "sub_headline",
                        "visual_description", "layout_hint", "include_character"
                    ]
                }
            }
        },
        "required": ["carousel_metadata", "slides"]
    })
}

#[derive(Debug, Deserialize)]
struct ScriptPayload {
    carousel_metadata: MetadataPayload,
    slides: Vec<SlidePayload>,
}

#[derive(Debug, Deserialize)]
struct MetadataPayload {
    topic: String,
    visual_style: String,
    target_audience: String,
    #[serde(default)]
    character_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlidePayload {
    slide_number: u32,
    headline: String,
    sub_headline: String,
    visual_description: String,
    layout_hint: String,
    include_character: bool,
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}

/// Parses the model's script and turns it into an editable carousel.
///
/// Metadata the generator may not echo faithfully is back-filled from the
/// request, and every slide receives the default design and character settings.
pub fn parse_script(response: &str, request: &ScriptRequest) -> Result<Carousel> {
    let clean_json = strip_code_blocks(response);
    let payload: ScriptPayload = serde_json::from_str(&clean_json)
        .with_context(|| format!("Failed to parse carousel JSON: {}", clean_json))?;

    if payload.slides.is_empty() {
        anyhow::bail!("Generated script contains no slides");
    }

    let mut slides: Vec<SlidePayload> = payload.slides;
    slides.sort_by_key(|s| s.slide_number);
    let numbering_ok = slides
        .iter()
        .enumerate()
        .all(|(i, s)| s.slide_number as usize == i + 1);
    if !numbering_ok {
        warn!("Generated slide numbers are not dense, renumbering by position");
    }

    let design = SlideDesign::initial(request.language, request.brand_colors.as_ref());
    let slides: Vec<Slide> = slides
        .into_iter()
        .enumerate()
        .map(|(i, s)| Slide {
            slide_number: i as u32 + 1,
            headline: s.headline,
            sub_headline: s.sub_headline,
            visual_description: s.visual_description,
            layout_hint: s.layout_hint,
            include_character: s.include_character && request.use_character,
            character_custom_prompt: None,
            character_settings: CharacterSettings::default(),
            design: design.clone(),
        })
        .collect();

    let character_description = if request.use_character {
        payload
            .carousel_metadata
            .character_description
            .filter(|d| !d.trim().is_empty())
    } else {
        None
    };

    let carousel = Carousel {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now().timestamp_millis(),
        carousel_metadata: CarouselMetadata {
            topic: payload.carousel_metadata.topic,
            visual_style: payload.carousel_metadata.visual_style,
            target_audience: payload.carousel_metadata.target_audience,
            language: request.language,
            tone: request.tone.clone(),
            aspect_ratio: request.aspect_ratio,
            dialect: request.dialect.map(|d| d.id().to_string()),
            main_theme: None,
            character_description,
            character_traits: request.character_traits.clone(),
            brand_colors: request.brand_colors.clone(),
        },
        slides,
    };
    carousel.validate()?;
    Ok(carousel)
}

pub async fn generate_script(llm: &dyn LlmClient, request: &ScriptRequest) -> Result<Carousel> {
    let system = request.system_instruction();
    let user = request.user_prompt();
    let schema = carousel_schema();
    info!(
        "Generating {}-slide script for '{}' ({})",
        request.slide_count,
        request.topic,
        request.language.tag()
    );

    let response = llm
        .generate_text(&TextRequest {
            system: Some(&system),
            user: &user,
            json: true,
            schema: Some(&schema),
        })
        .await
        .context("Script generation failed")?;

    let carousel = parse_script(&response, request)?;
    debug!("Script {} has {} slides", carousel.id, carousel.slides.len());
    Ok(carousel)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Idea {
    pub topic: String,
    pub audience: String,
}

impl Idea {
    pub fn fallback() -> Self {
        Self {
            topic: FALLBACK_TOPIC.to_string(),
            audience: FALLBACK_AUDIENCE.to_string(),
        }
    }
}

pub fn idea_prompt(theme: &str, language: Language) -> String {
    let lang = match language {
        Language::Ar => "in Arabic",
        Language::En => "in English",
    };
    format!(
        "Generate a viral, trending social media topic and a specific target audience based on the theme: \"{}\". \
         Return strictly JSON: {{ \"topic\": \"...\", \"audience\": \"...\" }} {}.",
        theme, lang
    )
}

/// Best-effort: any failure yields [`Idea::fallback`].
pub async fn generate_ideas(
    llm: &dyn LlmClient,
    theme: &str,
    language: Language,
) -> Result<Idea, StudioError> {
    if theme.trim().is_empty() {
        return Err(StudioError::EmptyTheme);
    }
    let prompt = idea_prompt(theme.trim(), language);
    let result = llm
        .generate_text(&TextRequest {
            system: None,
            user: &prompt,
            json: true,
            schema: None,
        })
        .await
        .and_then(|text| {
            let idea: Idea = serde_json::from_str(&strip_code_blocks(&text))?;
            Ok(idea)
        });

    match result {
        Ok(idea) if !idea.topic.trim().is_empty() && !idea.audience.trim().is_empty() => Ok(idea),
        Ok(_) => {
            warn!("Idea generation returned blank fields, using fallback");
            Ok(Idea::fallback())
        }
        Err(e) => {
            error!("Error generating ideas: {:#}", e);
            Ok(Idea::fallback())
        }
    }
}
