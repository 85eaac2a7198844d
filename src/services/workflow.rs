use crate::core::config::Config;
use crate::core::error::StudioError;
use crate::core::io::Storage;
use crate::core::library::LIBRARY_SLOT;
use crate::core::model::{Carousel, Language};
use crate::core::state::{Action, AppState, Store};
use crate::services::export::{self, Rasterizer};
use crate::services::imagery::{ImageJobs, ImageOutcome, ImageRequest, ImageStatus};
use crate::services::llm::LlmClient;
use crate::services::script::{self, Idea, ScriptRequest};
use anyhow::{Context, Result};
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Which slides of a batch landed, failed or were cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<u32>,
    pub failed: Vec<u32>,
    pub cancelled: Vec<u32>,
}

impl BatchReport {
    fn record(&mut self, outcome: &ImageOutcome) {
        let bucket = match outcome.status {
            ImageStatus::Ready(_) => &mut self.succeeded,
            ImageStatus::Failed(_) => &mut self.failed,
            ImageStatus::Cancelled => &mut self.cancelled,
        };
        bucket.push(outcome.slide_number);
        bucket.sort_unstable();
    }
}

/// One editing session: generation backends, the state store and exports.
pub struct Studio {
    config: Config,
    llm: Box<dyn LlmClient>,
    store: Store,
    jobs: ImageJobs,
    rasterizer: Option<Rasterizer>,
}

pub fn library_slot(config: &Config) -> String {
    Path::new(&config.data_folder)
        .join(LIBRARY_SLOT)
        .to_string_lossy()
        .into_owned()
}

impl Studio {
    pub async fn new(config: Config, llm: Box<dyn LlmClient>, storage: Arc<dyn Storage>) -> Self {
        let store = Store::open(storage, &library_slot(&config), &config.defaults).await;
        Self {
            config,
            llm,
            store,
            jobs: ImageJobs::new(),
            rasterizer: None,
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn dispatch(&mut self, action: Action) -> Result<(), StudioError> {
        self.store.dispatch(action).await
    }

    fn current(&self) -> Result<&Carousel, StudioError> {
        self.state().current.as_ref().ok_or(StudioError::NoActiveCarousel)
    }

    pub async fn change_language(&mut self, language: Language) -> Result<()> {
        self.store.dispatch(Action::SetLanguage(language)).await?;
        Ok(())
    }

    /// Fills topic and audience from the main theme. Generation failures fall
    /// back to a fixed pair; only an empty theme is an error.
    pub async fn generate_ideas(&mut self) -> Result<Idea> {
        let form = &self.state().form;
        let (theme, language) = (form.main_theme.clone(), form.language);
        if theme.trim().is_empty() {
            return Err(StudioError::EmptyTheme.into());
        }
        self.store.dispatch(Action::IdeasRequested).await?;
        let idea = script::generate_ideas(self.llm.as_ref(), &theme, language).await?;
        self.store
            .dispatch(Action::IdeasReady {
                topic: idea.topic.clone(),
                audience: idea.audience.clone(),
            })
            .await?;
        Ok(idea)
    }

    /// On failure the previous carousel stays open and status becomes Error.
    pub async fn generate_script(&mut self) -> Result<()> {
        let request = ScriptRequest::from_form(&self.state().form)?;
        self.store.dispatch(Action::ScriptRequested).await?;
        match script::generate_script(self.llm.as_ref(), &request).await {
            Ok(carousel) => {
                info!("Carousel {} ready with {} slides", carousel.id, carousel.slides.len());
                self.store.dispatch(Action::ScriptReady(carousel)).await?;
                Ok(())
            }
            Err(e) => {
                self.store
                    .dispatch(Action::ScriptFailed(format!("{:#}", e)))
                    .await?;
                Err(e)
            }
        }
    }

    fn image_request(&self, slide_number: u32) -> Result<ImageRequest, StudioError> {
        let state = self.state();
        let carousel = self.current()?;
        ImageRequest::for_slide(carousel, slide_number, Some(state.character_description.as_str()))
    }

    async fn apply_outcome(store: &mut Store, outcome: &ImageOutcome) -> Result<(), StudioError> {
        let carousel_id = outcome.carousel_id.clone();
        let slide_number = outcome.slide_number;
        let action = match &outcome.status {
            ImageStatus::Ready(data_uri) => Action::ImageReady {
                carousel_id,
                slide_number,
                data_uri: data_uri.clone(),
            },
            ImageStatus::Failed(_) => Action::ImageFailed {
                carousel_id,
                slide_number,
            },
            ImageStatus::Cancelled => Action::ImageCancelled {
                carousel_id,
                slide_number,
            },
        };
        store.dispatch(action).await
    }

    /// Generates (or retries) one slide's image. Ctrl-C aborts the request.
    pub async fn generate_image(&mut self, slide_number: u32) -> Result<ImageStatus> {
        let request = self.image_request(slide_number)?;
        self.store.dispatch(Action::ImageRequested(slide_number)).await?;
        let outcome = {
            let job = self.jobs.track(self.llm.as_ref(), request);
            tokio::pin!(job);
            tokio::select! {
                outcome = &mut job => outcome,
                Ok(()) = tokio::signal::ctrl_c() => {
                    self.jobs.cancel(slide_number);
                    job.await
                }
            }
        };
        Self::apply_outcome(&mut self.store, &outcome).await?;
        Ok(outcome.status)
    }

    /// Requests every slide concurrently and applies each result as it
    /// settles. One slide failing never stops the others; Ctrl-C cancels
    /// whatever is still pending.
    pub async fn generate_all_images(&mut self) -> Result<BatchReport> {
        let requests: Vec<ImageRequest> = {
            let carousel = self.current()?;
            carousel
                .slides
                .iter()
                .map(|s| self.image_request(s.slide_number))
                .collect::<Result<_, _>>()?
        };

        let llm: &dyn LlmClient = self.llm.as_ref();
        let jobs = &self.jobs;
        let store = &mut self.store;
        for request in &requests {
            store.dispatch(Action::ImageRequested(request.slide_number)).await?;
        }
        store.dispatch(Action::BatchStarted).await?;

        let pb = ProgressBar::new(requests.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images ({eta})")?
                .progress_chars("#>-"),
        );

        let mut pending: FuturesUnordered<_> = requests
            .into_iter()
            .map(|request| jobs.track(llm, request))
            .collect();

        let mut report = BatchReport::default();
        let mut interrupted = false;
        loop {
            let next = tokio::select! {
                next = pending.next() => next,
                Ok(()) = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    warn!("Interrupted, cancelling pending image requests");
                    jobs.cancel_all();
                    continue;
                }
            };
            let Some(outcome) = next else {
                break;
            };
            report.record(&outcome);
            Self::apply_outcome(store, &outcome).await?;
            pb.inc(1);
        }
        store.dispatch(Action::BatchFinished).await?;
        pb.finish_with_message("Images complete");

        if !report.failed.is_empty() {
            warn!("Image generation failed for slides {:?}", report.failed);
        }
        Ok(report)
    }

    /// Aborts an in-flight image request. Navigation never does this implicitly.
    pub fn cancel_image(&self, slide_number: u32) -> bool {
        self.jobs.cancel(slide_number)
    }

    pub fn cancel_all_images(&self) {
        self.jobs.cancel_all();
    }

    pub async fn save_to_library(&mut self) -> Result<()> {
        self.store.dispatch(Action::SaveToLibrary).await?;
        Ok(())
    }

    pub async fn load_from_library(&mut self, id: &str) -> Result<()> {
        self.store.dispatch(Action::LoadFromLibrary(id.to_string())).await?;
        Ok(())
    }

    /// Deletes only after `confirm` accepts the entry. Returns whether it was removed.
    pub async fn delete_from_library<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Carousel) -> bool,
    {
        let entry = self
            .state()
            .library
            .get(id)
            .ok_or_else(|| StudioError::NotInLibrary(id.to_string()))?;
        if !confirm(entry) {
            return Ok(false);
        }
        self.store
            .dispatch(Action::DeleteFromLibrary(id.to_string()))
            .await?;
        Ok(true)
    }

    fn current_images(&self) -> Result<BTreeMap<u32, String>, StudioError> {
        let carousel = self.current()?;
        Ok(self
            .state()
            .images
            .carousel(&carousel.id)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn export_json(&self) -> Result<String> {
        let carousel = self.current()?;
        let images = self.current_images()?;
        export::write_json(
            self.store.storage().as_ref(),
            &self.config.output_folder,
            carousel,
            &images,
        )
        .await
    }

    pub async fn import_json(&mut self, path: &str) -> Result<()> {
        let (carousel, images) = export::read_json(self.store.storage().as_ref(), path)
            .await
            .with_context(|| format!("Failed to import {}", path))?;
        info!("Imported carousel {} with {} image(s)", carousel.id, images.len());
        self.store
            .dispatch(Action::OpenCarousel { carousel, images })
            .await?;
        Ok(())
    }

    /// Exports the selected slide.
    pub async fn export_slide_png(&mut self) -> Result<String> {
        let slide_number = self
            .state()
            .active_slide_number()
            .ok_or(StudioError::NoActiveCarousel)?;
        let images = self.current_images()?;
        let render = &self.config.render;
        let rasterizer: &Rasterizer = self.rasterizer.get_or_insert_with(|| Rasterizer::new(render));
        let carousel = self
            .store
            .state()
            .current
            .as_ref()
            .ok_or(StudioError::NoActiveCarousel)?;
        export::write_slide_png(
            self.store.storage().as_ref(),
            &self.config.output_folder,
            rasterizer,
            carousel,
            slide_number,
            images.get(&slide_number).map(String::as_str),
        )
        .await
    }

    pub async fn export_pdf(&mut self) -> Result<String> {
        let images = self.current_images()?;
        let render = &self.config.render;
        let rasterizer: &Rasterizer = self.rasterizer.get_or_insert_with(|| Rasterizer::new(render));
        let carousel = self
            .store
            .state()
            .current
            .as_ref()
            .ok_or(StudioError::NoActiveCarousel)?;
        export::write_pdf(
            self.store.storage().as_ref(),
            &self.config.output_folder,
            rasterizer,
            carousel,
            Some(&images),
        )
        .await
    }
}
