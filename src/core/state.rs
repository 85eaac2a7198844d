use crate::core::config::CreateDefaults;
use crate::core::error::StudioError;
use crate::core::form::{CreateForm, Dialect};
use crate::core::images::{ImageCache, SlideFlags};
use crate::core::io::Storage;
use crate::core::library::Library;
use crate::core::model::{Carousel, Language};
use crate::services::editor::{apply_edit, SlideEdit};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Create,
    Editor,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    GeneratingIdeas,
    GeneratingScript,
    GeneratingImages,
    Complete,
    Error,
}

#[derive(Debug, Clone)]
pub enum Action {
    ShowView(View),
    SetLanguage(Language),
    SetForm(CreateForm),
    IdeasRequested,
    IdeasReady { topic: String, audience: String },
    ScriptRequested,
    ScriptReady(Carousel),
    ScriptFailed(String),
    ImageRequested(u32),
    ImageReady { carousel_id: String, slide_number: u32, data_uri: String },
    ImageFailed { carousel_id: String, slide_number: u32 },
    ImageCancelled { carousel_id: String, slide_number: u32 },
    BatchStarted,
    BatchFinished,
    SelectSlide(usize),
    EditSlide { slide_number: u32, edit: SlideEdit },
    EditSelected(SlideEdit),
    SetCharacterDescription(String),
    OpenCarousel { carousel: Carousel, images: BTreeMap<u32, String> },
    SaveToLibrary,
    LoadFromLibrary(String),
    DeleteFromLibrary(String),
}

/// What a reducer step touched outside the in-memory state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub library_changed: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub status: GenerationStatus,
    pub last_error: Option<String>,
    pub form: CreateForm,
    pub current: Option<Carousel>,
    /// Session copy of the character DNA; written to metadata on save.
    pub character_description: String,
    pub images: ImageCache,
    pub flags: SlideFlags,
    pub selected_slide: usize,
    pub library: Library,
}

impl AppState {
    pub fn new(defaults: &CreateDefaults, library: Library) -> Self {
        Self {
            view: View::Create,
            status: GenerationStatus::Idle,
            last_error: None,
            form: CreateForm::from_defaults(defaults),
            current: None,
            character_description: String::new(),
            images: ImageCache::default(),
            flags: SlideFlags::default(),
            selected_slide: 0,
            library,
        }
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id.as_str())
    }

    pub fn active_slide_number(&self) -> Option<u32> {
        self.current
            .as_ref()
            .and_then(|c| c.slides.get(self.selected_slide))
            .map(|s| s.slide_number)
    }

    pub fn image_for(&self, slide_number: u32) -> Option<&str> {
        self.current_id()
            .and_then(|id| self.images.get(id, slide_number))
    }

    fn is_current(&self, carousel_id: &str) -> bool {
        self.current_id() == Some(carousel_id)
    }

    fn open(&mut self, carousel: Carousel) {
        self.form.set_language(carousel.language());
        self.form.aspect_ratio = carousel.aspect_ratio();
        self.form.dialect = carousel
            .carousel_metadata
            .dialect
            .as_deref()
            .and_then(Dialect::from_id);
        if let Some(colors) = &carousel.carousel_metadata.brand_colors {
            self.form.brand_colors = colors.clone();
        }
        self.character_description = carousel
            .carousel_metadata
            .character_description
            .clone()
            .unwrap_or_default();
        self.current = Some(carousel);
        self.flags.clear();
        self.selected_slide = 0;
        self.view = View::Editor;
    }

    pub fn reduce(&mut self, action: Action) -> Result<Transition, StudioError> {
        let mut transition = Transition::default();
        match action {
            Action::ShowView(view) => self.view = view,
            Action::SetLanguage(language) => {
                self.form.set_language(language);
                if let Some(current) = self.current.as_mut() {
                    current.carousel_metadata.language = language;
                }
            }
            Action::SetForm(form) => self.form = form,
            Action::IdeasRequested => self.status = GenerationStatus::GeneratingIdeas,
            Action::IdeasReady { topic, audience } => {
                self.form.topic = topic;
                self.form.target_audience = audience;
                self.status = GenerationStatus::Idle;
            }
            Action::ScriptRequested => {
                self.status = GenerationStatus::GeneratingScript;
                self.last_error = None;
            }
            Action::ScriptReady(carousel) => {
                self.open(carousel);
                self.status = GenerationStatus::Complete;
            }
            Action::ScriptFailed(message) => {
                self.status = GenerationStatus::Error;
                self.last_error = Some(message);
            }
            Action::ImageRequested(slide_number) => self.flags.start(slide_number),
            Action::ImageReady { carousel_id, slide_number, data_uri } => {
                // Late arrivals still land under the carousel they were issued for.
                self.images.insert(&carousel_id, slide_number, data_uri);
                if self.is_current(&carousel_id) {
                    self.flags.succeed(slide_number);
                }
            }
            Action::ImageFailed { carousel_id, slide_number } => {
                if self.is_current(&carousel_id) {
                    self.flags.fail(slide_number);
                }
            }
            Action::ImageCancelled { carousel_id, slide_number } => {
                if self.is_current(&carousel_id) {
                    self.flags.succeed(slide_number);
                }
            }
            Action::BatchStarted => self.status = GenerationStatus::GeneratingImages,
            Action::BatchFinished => self.status = GenerationStatus::Complete,
            Action::SelectSlide(index) => {
                let count = self.current.as_ref().map_or(0, |c| c.slides.len());
                if index < count {
                    self.selected_slide = index;
                }
            }
            Action::EditSlide { slide_number, edit } => {
                let current = self.current.as_ref().ok_or(StudioError::NoActiveCarousel)?;
                let next = apply_edit(current, slide_number, &edit)?;
                self.current = Some(next);
            }
            Action::EditSelected(edit) => {
                let slide_number = self
                    .active_slide_number()
                    .ok_or(StudioError::NoActiveCarousel)?;
                return self.reduce(Action::EditSlide { slide_number, edit });
            }
            Action::SetCharacterDescription(text) => self.character_description = text,
            Action::OpenCarousel { carousel, images } => {
                self.images.replace_carousel(&carousel.id, images);
                self.open(carousel);
                self.status = GenerationStatus::Complete;
            }
            Action::SaveToLibrary => {
                let current = self.current.as_ref().ok_or(StudioError::NoActiveCarousel)?;
                let mut snapshot = current.clone();
                if !self.character_description.trim().is_empty() {
                    snapshot.carousel_metadata.character_description =
                        Some(self.character_description.clone());
                }
                info!("Saving carousel {} to library", snapshot.id);
                self.library.save(snapshot);
                transition.library_changed = true;
            }
            Action::LoadFromLibrary(id) => {
                let carousel = self
                    .library
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| StudioError::NotInLibrary(id.clone()))?;
                self.open(carousel);
            }
            Action::DeleteFromLibrary(id) => {
                if !self.library.remove(&id) {
                    return Err(StudioError::NotInLibrary(id));
                }
                transition.library_changed = true;
                self.images.remove_carousel(&id);
                if self.is_current(&id) {
                    debug!("Deleted carousel {} was open, closing editor", id);
                    self.current = None;
                    self.character_description.clear();
                    self.flags.clear();
                    self.selected_slide = 0;
                    self.view = View::Create;
                }
            }
        }
        Ok(transition)
    }
}

/// Owns the application state; every mutation goes through [`Store::dispatch`],
/// which persists the library whenever a transition reports it changed.
pub struct Store {
    state: AppState,
    storage: Arc<dyn Storage>,
    library_slot: String,
}

impl Store {
    pub async fn open(storage: Arc<dyn Storage>, library_slot: &str, defaults: &CreateDefaults) -> Self {
        let library = Library::load(storage.as_ref(), library_slot).await;
        Self {
            state: AppState::new(defaults, library),
            storage,
            library_slot: library_slot.to_string(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn dispatch(&mut self, action: Action) -> Result<(), StudioError> {
        let transition = self.state.reduce(action)?;
        if transition.library_changed {
            if let Err(e) = self
                .state
                .library
                .persist(self.storage.as_ref(), &self.library_slot)
                .await
            {
                error!("Failed to persist library: {:#}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_carousel;
    use crate::core::form::TONES_AR;
    use crate::core::io::NativeStorage;
    use crate::core::library::LIBRARY_SLOT;
    use crate::core::model::{AspectRatio, BrandColors};
    use crate::services::editor::DesignEdit;
    use anyhow::Result;

    fn state() -> AppState {
        AppState::new(&CreateDefaults::default(), Library::default())
    }

    #[test]
    fn test_language_toggle_without_carousel() {
        let mut state = state();
        state.reduce(Action::SetLanguage(Language::Ar)).unwrap();
        assert_eq!(state.form.tone, TONES_AR[0]);
        assert!(!state.form.dialect_options().is_empty());
        assert!(state.current.is_none());
    }

    #[test]
    fn test_language_toggle_updates_open_carousel() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 2))).unwrap();
        state.reduce(Action::SetLanguage(Language::Ar)).unwrap();
        assert_eq!(state.current.as_ref().unwrap().language(), Language::Ar);
    }

    #[test]
    fn test_script_failure_leaves_prior_state() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 2))).unwrap();
        let before = state.current.clone();

        state.reduce(Action::ScriptRequested).unwrap();
        state.reduce(Action::ScriptFailed("boom".to_string())).unwrap();
        assert_eq!(state.status, GenerationStatus::Error);
        assert_eq!(state.current, before);
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_image_failure_is_scoped_to_one_slide() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 5))).unwrap();
        for n in [1, 2, 4, 5] {
            state
                .reduce(Action::ImageReady {
                    carousel_id: "a".to_string(),
                    slide_number: n,
                    data_uri: format!("data:image/png;base64,{}", n),
                })
                .unwrap();
        }
        let cache_before = state.images.clone();

        state.reduce(Action::ImageRequested(3)).unwrap();
        assert!(state.flags.is_loading(3));
        state
            .reduce(Action::ImageFailed { carousel_id: "a".to_string(), slide_number: 3 })
            .unwrap();

        assert!(state.flags.is_error(3));
        assert!(!state.flags.is_loading(3));
        assert_eq!(state.images, cache_before);
    }

    #[test]
    fn test_late_image_for_other_carousel_is_cached_without_flags() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 2))).unwrap();
        state
            .reduce(Action::ImageReady {
                carousel_id: "old".to_string(),
                slide_number: 1,
                data_uri: "data:image/png;base64,x".to_string(),
            })
            .unwrap();
        assert_eq!(state.images.get("old", 1), Some("data:image/png;base64,x"));
        assert_eq!(state.image_for(1), None);
    }

    #[test]
    fn test_edit_selected_slide() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 3))).unwrap();
        state.reduce(Action::SelectSlide(1)).unwrap();
        state
            .reduce(Action::EditSelected(SlideEdit::Design(DesignEdit::YPosition(70))))
            .unwrap();
        let current = state.current.as_ref().unwrap();
        assert_eq!(current.slides[1].design.y_position, 70);
        assert_eq!(current.slides[0].design.y_position, 10);

        // Out-of-range selection is ignored.
        state.reduce(Action::SelectSlide(10)).unwrap();
        assert_eq!(state.selected_slide, 1);
    }

    #[test]
    fn test_edit_without_carousel_fails() {
        let mut state = state();
        let err = state
            .reduce(Action::EditSlide { slide_number: 1, edit: SlideEdit::Headline("x".to_string()) })
            .unwrap_err();
        assert_eq!(err, StudioError::NoActiveCarousel);
    }

    #[test]
    fn test_load_from_library_restores_session() {
        let mut entry = sample_carousel("ar-square", 3);
        entry.carousel_metadata.language = Language::Ar;
        entry.carousel_metadata.aspect_ratio = AspectRatio::Square1x1;
        entry.carousel_metadata.dialect = Some("levantine".to_string());
        entry.carousel_metadata.character_description = Some("Owl in a green cloak".to_string());
        let colors = BrandColors { text: "#0f172a".to_string(), accent: "#db2777".to_string() };
        entry.carousel_metadata.brand_colors = Some(colors.clone());

        let mut state = AppState::new(&CreateDefaults::default(), Library::new(vec![entry]));
        state.reduce(Action::ScriptReady(sample_carousel("draft", 4))).unwrap();
        state.reduce(Action::SelectSlide(3)).unwrap();
        assert_eq!(state.form.language, Language::En);
        assert_eq!(state.form.aspect_ratio, AspectRatio::Portrait4x5);
        assert_ne!(state.form.brand_colors, colors);

        let t = state.reduce(Action::LoadFromLibrary("ar-square".to_string())).unwrap();
        assert!(!t.library_changed);
        assert_eq!(state.current_id(), Some("ar-square"));
        assert_eq!(state.form.language, Language::Ar);
        assert_eq!(state.form.tone, TONES_AR[0]);
        assert_eq!(state.form.dialect, Some(Dialect::Levantine));
        assert_eq!(state.form.aspect_ratio, AspectRatio::Square1x1);
        assert_eq!(state.form.brand_colors, colors);
        assert_eq!(state.character_description, "Owl in a green cloak");
        assert_eq!(state.selected_slide, 0);
        assert_eq!(state.view, View::Editor);

        let err = state.reduce(Action::LoadFromLibrary("missing".to_string())).unwrap_err();
        assert_eq!(err, StudioError::NotInLibrary("missing".to_string()));
    }

    #[test]
    fn test_delete_drops_cached_images() {
        let mut state = state();
        state.library.save(sample_carousel("b", 2));
        state.reduce(Action::ScriptReady(sample_carousel("a", 2))).unwrap();
        for id in ["a", "b"] {
            state
                .reduce(Action::ImageReady {
                    carousel_id: id.to_string(),
                    slide_number: 1,
                    data_uri: "data:image/png;base64,AAAA".to_string(),
                })
                .unwrap();
        }

        state.reduce(Action::DeleteFromLibrary("b".to_string())).unwrap();
        assert_eq!(state.images.count("b"), 0);
        assert_eq!(state.images.count("a"), 1);
        assert!(state.image_for(1).is_some());
    }

    #[test]
    fn test_delete_open_carousel_returns_to_create() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 2))).unwrap();
        state.reduce(Action::SaveToLibrary).unwrap();
        state.library.save(sample_carousel("b", 1));

        let t = state.reduce(Action::DeleteFromLibrary("b".to_string())).unwrap();
        assert!(t.library_changed);
        assert_eq!(state.current_id(), Some("a"));
        assert_eq!(state.view, View::Editor);

        state.reduce(Action::DeleteFromLibrary("a".to_string())).unwrap();
        assert!(state.current.is_none());
        assert_eq!(state.view, View::Create);
    }

    #[test]
    fn test_save_writes_character_description() {
        let mut state = state();
        state.reduce(Action::ScriptReady(sample_carousel("a", 1))).unwrap();
        state
            .reduce(Action::SetCharacterDescription("Robot with a red scarf".to_string()))
            .unwrap();
        state.reduce(Action::SaveToLibrary).unwrap();
        state.reduce(Action::SaveToLibrary).unwrap();
        assert_eq!(state.library.len(), 1);
        assert_eq!(
            state.library.entries()[0].carousel_metadata.character_description.as_deref(),
            Some("Robot with a red scarf")
        );
    }

    #[tokio::test]
    async fn test_store_persists_library_changes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let slot = dir.path().join(LIBRARY_SLOT);
        let slot = slot.to_str().unwrap().to_string();
        let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());

        let mut store = Store::open(storage.clone(), &slot, &CreateDefaults::default()).await;
        store.dispatch(Action::ScriptReady(sample_carousel("a", 2))).await?;
        store.dispatch(Action::SaveToLibrary).await?;

        let reopened = Store::open(storage, &slot, &CreateDefaults::default()).await;
        assert_eq!(reopened.state().library.len(), 1);
        assert_eq!(reopened.state().library.entries()[0].id, "a");

        store.dispatch(Action::LoadFromLibrary("a".to_string())).await?;
        assert_eq!(store.state().view, View::Editor);
        Ok(())
    }
}
