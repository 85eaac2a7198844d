use crate::core::error::StudioError;
use crate::core::model::{AspectRatio, Carousel, CarouselMetadata, Slide};
use crate::services::llm::LlmClient;
use anyhow::Result;
use futures_util::future::{AbortHandle, Abortable, Aborted};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_ACTION: &str = "Standing confidently";

pub fn aspect_phrase(aspect_ratio: AspectRatio) -> &'static str {
    match aspect_ratio {
        AspectRatio::Portrait4x5 => "Vertical Aspect Ratio 4:5",
        AspectRatio::Square1x1 => "Square Aspect Ratio 1:1",
        AspectRatio::Wide16x9 => "Wide Aspect Ratio 16:9",
    }
}

fn character_block(slide: &Slide, dna: &str) -> String {
    let settings = &slide.character_settings;
    let action = slide
        .character_custom_prompt
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ACTION);

    let mut modifiers = String::new();
    if settings.opacity < 100 {
        modifiers.push_str(&format!(
            "(Appearance: semi-transparent/holographic at {}% opacity). ",
            settings.opacity
        ));
    }
    if settings.rotation != 0 {
        modifiers.push_str(&format!("(Orientation: tilted {} degrees). ", settings.rotation));
    }

    format!(
        "MAIN SUBJECT (Maintain Consistency): {}.\n\
         ACTION: {}. Expression: {}.\n\
         PLACEMENT: The subject is at {} scale, located in the {}. {}",
        dna,
        action,
        settings.expression.word(),
        settings.scale.word(),
        settings.position.zone(),
        modifiers
    )
    .trim_end()
    .to_string()
}

/// Assembles the image prompt for one slide.
///
/// The character block is only added when the slide opts in and a global
/// character description exists.
pub fn build_image_prompt(
    slide: &Slide,
    metadata: &CarouselMetadata,
    character_description: Option<&str>,
) -> String {
    let dna = character_description
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let character = match dna {
        Some(dna) if slide.include_character => format!("{}\n", character_block(slide, dna)),
        _ => String::new(),
    };

    format!(
        "Create a social media background image ({}).\n\
         Visual Style: {}.\n\
         Background Scene: {}.\n\
         {}\
         Constraint: NO TEXT in the image. High quality, aesthetic, clean background.",
        aspect_phrase(metadata.aspect_ratio),
        metadata.visual_style,
        slide.visual_description,
        character
    )
}

/// A single slide's image request, captured against the carousel it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub carousel_id: String,
    pub slide_number: u32,
    pub aspect_ratio: AspectRatio,
    pub prompt: String,
}

impl ImageRequest {
    pub fn for_slide(
        carousel: &Carousel,
        slide_number: u32,
        character_description: Option<&str>,
    ) -> Result<Self, StudioError> {
        let slide = carousel
            .slide(slide_number)
            .ok_or(StudioError::SlideNotFound(slide_number))?;
        let description = character_description
            .filter(|d| !d.trim().is_empty())
            .or(carousel.carousel_metadata.character_description.as_deref());
        Ok(Self {
            carousel_id: carousel.id.clone(),
            slide_number,
            aspect_ratio: carousel.aspect_ratio(),
            prompt: build_image_prompt(slide, &carousel.carousel_metadata, description),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Ready(String),
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    pub carousel_id: String,
    pub slide_number: u32,
    pub status: ImageStatus,
}

pub async fn generate_slide_image(llm: &dyn LlmClient, request: &ImageRequest) -> Result<String> {
    debug!("Image prompt for slide {}: {}", request.slide_number, request.prompt);
    let image = llm.generate_image(&request.prompt, request.aspect_ratio).await?;
    image.verify()?;
    Ok(image.to_data_uri())
}

/// In-flight image jobs keyed by slide number.
///
/// Jobs are plain futures polled by whoever awaits them; the registry only
/// holds abort handles. A newer job for the same slide replaces the handle
/// of the older one, which keeps running and may still land its result.
#[derive(Debug, Default)]
pub struct ImageJobs {
    handles: Mutex<HashMap<u32, (u64, AbortHandle)>>,
    next_ticket: Mutex<u64>,
}

impl ImageJobs {
    pub fn new() -> Self {
        Self::default()
    }

    fn ticket(&self) -> u64 {
        let mut next = self.next_ticket.lock().unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        *next
    }

    /// Registers an abortable job. Nothing runs until the future is polled.
    pub fn track<'a>(
        &'a self,
        llm: &'a dyn LlmClient,
        request: ImageRequest,
    ) -> impl Future<Output = ImageOutcome> + 'a {
        let (handle, registration) = AbortHandle::new_pair();
        let ticket = self.ticket();
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request.slide_number, (ticket, handle));

        async move {
            let result = Abortable::new(generate_slide_image(llm, &request), registration).await;
            self.release(request.slide_number, ticket);
            let status = match result {
                Ok(Ok(data_uri)) => {
                    info!("Slide {} image ready", request.slide_number);
                    ImageStatus::Ready(data_uri)
                }
                Ok(Err(e)) => {
                    warn!("Slide {} image failed: {:#}", request.slide_number, e);
                    ImageStatus::Failed(format!("{:#}", e))
                }
                Err(Aborted) => {
                    debug!("Slide {} image cancelled", request.slide_number);
                    ImageStatus::Cancelled
                }
            };
            ImageOutcome {
                carousel_id: request.carousel_id,
                slide_number: request.slide_number,
                status,
            }
        }
    }

    fn release(&self, slide_number: u32, ticket: u64) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.get(&slide_number).is_some_and(|(t, _)| *t == ticket) {
            handles.remove(&slide_number);
        }
    }

    pub fn in_flight(&self) -> Vec<u32> {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slides: Vec<u32> = handles.keys().copied().collect();
        slides.sort_unstable();
        slides
    }

    /// Returns false when no job is registered for the slide.
    pub fn cancel(&self, slide_number: u32) -> bool {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        match handles.get(&slide_number) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in handles.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_carousel;
    use crate::core::model::{CharacterPosition, CharacterScale, Expression};
    use crate::services::llm::{InlineImage, TextRequest};
    use async_trait::async_trait;
    use futures_util::future::join_all;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct MockLlmClient {
        fail_marker: Option<String>,
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn generate_text(&self, _request: &TextRequest<'_>) -> Result<String> {
            Err(anyhow::anyhow!("not used"))
        }

        async fn generate_image(&self, prompt: &str, _aspect: AspectRatio) -> Result<InlineImage> {
            *self.calls.lock().unwrap() += 1;
            if let Some(marker) = &self.fail_marker {
                if prompt.contains(marker.as_str()) {
                    return Err(anyhow::anyhow!("quota exceeded"));
                }
            }
            Ok(InlineImage { mime_type: "image/png".to_string(), data: "AAAA".to_string() })
        }
    }

    fn carousel_with_character() -> Carousel {
        let mut carousel = sample_carousel("c1", 3);
        carousel.carousel_metadata.character_description =
            Some("Cute robot, teal body, round eyes".to_string());
        for (i, slide) in carousel.slides.iter_mut().enumerate() {
            slide.visual_description = format!("scene-{}", i + 1);
        }
        carousel.slides[0].include_character = true;
        carousel
    }

    #[test]
    fn test_prompt_without_character() {
        let carousel = carousel_with_character();
        let prompt = build_image_prompt(&carousel.slides[1], &carousel.carousel_metadata, None);
        assert!(prompt.contains("(Vertical Aspect Ratio 4:5)"));
        assert!(prompt.contains("Background Scene: scene-2."));
        assert!(prompt.contains("NO TEXT in the image"));
        assert!(!prompt.contains("MAIN SUBJECT"));
    }

    #[test]
    fn test_prompt_with_character_placement() {
        let mut carousel = carousel_with_character();
        {
            let settings = &mut carousel.slides[0].character_settings;
            settings.position = CharacterPosition::BottomRight;
            settings.scale = CharacterScale::Large;
            settings.opacity = 60;
            settings.rotation = -15;
            settings.expression = Expression::Happy;
        }
        let request = ImageRequest::for_slide(&carousel, 1, None).unwrap();
        let prompt = request.prompt;
        assert!(prompt.contains("MAIN SUBJECT (Maintain Consistency): Cute robot, teal body, round eyes."));
        assert!(prompt.contains("ACTION: Standing confidently. Expression: happy."));
        assert!(prompt.contains("located in the bottom right corner"));
        assert!(prompt.contains("at large scale"));
        assert!(prompt.contains("semi-transparent/holographic at 60% opacity"));
        assert!(prompt.contains("tilted -15 degrees"));
    }

    #[test]
    fn test_prompt_defaults_omit_caveats() {
        let mut carousel = carousel_with_character();
        carousel.slides[0].character_custom_prompt = Some("Pointing at a chart".to_string());
        let request = ImageRequest::for_slide(&carousel, 1, Some("Session DNA")).unwrap();
        assert!(request.prompt.contains("MAIN SUBJECT (Maintain Consistency): Session DNA."));
        assert!(request.prompt.contains("ACTION: Pointing at a chart."));
        assert!(!request.prompt.contains("opacity"));
        assert!(!request.prompt.contains("tilted"));
        assert_eq!(request.carousel_id, "c1");
    }

    #[test]
    fn test_unknown_slide_is_rejected() {
        let carousel = carousel_with_character();
        assert_eq!(
            ImageRequest::for_slide(&carousel, 9, None),
            Err(StudioError::SlideNotFound(9))
        );
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_one_slide() {
        let llm = MockLlmClient { fail_marker: Some("scene-2".to_string()), ..Default::default() };
        let carousel = carousel_with_character();
        let jobs = ImageJobs::new();
        let futures: Vec<_> = (1..=3)
            .map(|n| jobs.track(&llm, ImageRequest::for_slide(&carousel, n, None).unwrap()))
            .collect();
        assert_eq!(jobs.in_flight(), vec![1, 2, 3]);

        let outcomes = join_all(futures).await;
        assert_eq!(outcomes[0].status, ImageStatus::Ready("data:image/png;base64,AAAA".to_string()));
        assert!(matches!(outcomes[1].status, ImageStatus::Failed(_)));
        assert!(matches!(outcomes[2].status, ImageStatus::Ready(_)));
        assert_eq!(*llm.calls.lock().unwrap(), 3);
        assert!(jobs.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_one_slide() {
        let llm = MockLlmClient::default();
        let carousel = carousel_with_character();
        let jobs = ImageJobs::new();
        let first = jobs.track(&llm, ImageRequest::for_slide(&carousel, 1, None).unwrap());
        let second = jobs.track(&llm, ImageRequest::for_slide(&carousel, 2, None).unwrap());

        assert!(jobs.cancel(2));
        assert!(!jobs.cancel(7));
        let (first, second) = futures_util::join!(first, second);
        assert!(matches!(first.status, ImageStatus::Ready(_)));
        assert_eq!(second.status, ImageStatus::Cancelled);
        assert_eq!(*llm.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_replaces_handle() {
        let llm = MockLlmClient::default();
        let carousel = carousel_with_character();
        let jobs = ImageJobs::new();
        let older = jobs.track(&llm, ImageRequest::for_slide(&carousel, 1, None).unwrap());
        let newer = jobs.track(&llm, ImageRequest::for_slide(&carousel, 1, None).unwrap());
        let older = older.await;
        assert!(matches!(older.status, ImageStatus::Ready(_)));
        assert_eq!(jobs.in_flight(), vec![1]);
        newer.await;
        assert!(jobs.in_flight().is_empty());
    }
}
