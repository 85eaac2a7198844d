//! Terminal front end. Every view reads the studio state, asks one question
//! and turns the answer into a studio call; failures are printed and the
//! loop keeps going.

mod editor;

use crate::core::form::{dialects_for, Dialect, SLIDE_COUNT_RANGE, VISUAL_STYLE_CATEGORIES};
use crate::core::model::{AgeGroup, AspectRatio, CharacterStyle, Gender, Language};
use crate::core::state::{Action, View};
use crate::services::script::DEFAULT_DIALECT;
use crate::services::workflow::Studio;
use anyhow::Result;
use chrono::{Local, TimeZone};
use inquire::error::InquireError;
use inquire::{Confirm, CustomType, Select, Text};
use log::error;
use serde::Serialize;

/// Serde wire name of a closed vocabulary value, e.g. `bg-highlight`.
pub(crate) fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// `Ok(None)` when the user backs out with Esc.
pub(crate) fn answer<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Picks one of `options`, labelled by their wire names.
pub(crate) fn pick<T: Serialize + Copy + PartialEq>(message: &str, options: &[T], current: T) -> Result<Option<T>> {
    let labels: Vec<String> = options.iter().map(wire_name).collect();
    let cursor = options.iter().position(|o| *o == current).unwrap_or(0);
    let chosen = answer(Select::new(message, labels).with_starting_cursor(cursor).raw_prompt())?;
    Ok(chosen.map(|c| options[c.index]))
}

pub(crate) fn report<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            error!("{:#}", e);
            println!("Error: {:#}", e);
            None
        }
    }
}

pub async fn run(studio: &mut Studio) -> Result<()> {
    loop {
        let keep_going = match studio.state().view {
            View::Create => create_view(studio).await?,
            View::Editor => editor::editor_view(studio).await?,
            View::Library => library_view(studio).await?,
        };
        if !keep_going {
            return Ok(());
        }
    }
}

fn create_menu(studio: &Studio) -> Vec<String> {
    let form = &studio.state().form;
    let mut menu = vec![
        format!("Language: {}", form.language.tag()),
        format!("Main theme: {}", form.main_theme),
        "Generate ideas from theme".to_string(),
        format!("Topic: {}", form.topic),
        format!("Target audience: {}", form.target_audience),
        format!("Visual style: {}", form.visual_style),
        format!("Slides: {}", form.slide_count),
        format!("Aspect ratio: {}", form.aspect_ratio),
        format!("Tone: {}", form.tone),
    ];
    if !form.dialect_options().is_empty() {
        menu.push(format!(
            "Dialect: {}",
            form.dialect.map_or(DEFAULT_DIALECT, |d| d.label())
        ));
    }
    menu.push(format!(
        "Brand colors: text {} / accent {}",
        form.brand_colors.text, form.brand_colors.accent
    ));
    menu.push(format!(
        "Character: {}",
        if form.use_character { "on" } else { "off" }
    ));
    if form.use_character {
        menu.push(format!(
            "Character traits: {} {} {}, {}",
            wire_name(&form.character_traits.age),
            wire_name(&form.character_traits.gender),
            wire_name(&form.character_traits.style),
            form.character_traits.color_accent
        ));
    }
    menu.push("Generate carousel".to_string());
    if studio.state().current.is_some() {
        menu.push("Back to editor".to_string());
    }
    menu.push("Import carousel.json".to_string());
    menu.push("Library".to_string());
    menu.push("Quit".to_string());
    menu
}

async fn create_view(studio: &mut Studio) -> Result<bool> {
    if let Some(err) = &studio.state().last_error {
        println!("Last generation failed: {}", err);
    }
    let menu = create_menu(studio);
    let Some(choice) = answer(Select::new("Create", menu).with_page_size(20).prompt())? else {
        return Ok(true);
    };
    let key = choice.split(':').next().unwrap_or("").to_string();
    let mut form = studio.state().form.clone();

    match key.as_str() {
        "Language" => {
            let next = match form.language {
                Language::En => Language::Ar,
                Language::Ar => Language::En,
            };
            report(studio.change_language(next).await);
            return Ok(true);
        }
        "Main theme" => {
            if let Some(theme) = answer(Text::new("Main theme").with_initial_value(&form.main_theme).prompt())? {
                form.main_theme = theme;
            }
        }
        "Generate ideas from theme" => {
            if let Some(idea) = report(studio.generate_ideas().await) {
                println!("Topic: {}\nAudience: {}", idea.topic, idea.audience);
            }
            return Ok(true);
        }
        "Topic" => {
            if let Some(topic) = answer(Text::new("Topic").with_initial_value(&form.topic).prompt())? {
                form.topic = topic;
            }
        }
        "Target audience" => {
            if let Some(audience) = answer(
                Text::new("Target audience")
                    .with_initial_value(&form.target_audience)
                    .prompt(),
            )? {
                form.target_audience = audience;
            }
        }
        "Visual style" => {
            let categories: Vec<&str> = VISUAL_STYLE_CATEGORIES.iter().map(|(c, _)| *c).collect();
            if let Some(category) = answer(Select::new("Category", categories).prompt())? {
                let styles = VISUAL_STYLE_CATEGORIES
                    .iter()
                    .find(|(c, _)| *c == category)
                    .map(|(_, s)| s.to_vec())
                    .unwrap_or_default();
                if let Some(style) = answer(Select::new("Visual style", styles).prompt())? {
                    form.visual_style = style.to_string();
                }
            }
        }
        "Slides" => {
            if let Some(count) = answer(
                CustomType::<u32>::new(&format!(
                    "Number of slides ({}-{})",
                    SLIDE_COUNT_RANGE.start(),
                    SLIDE_COUNT_RANGE.end()
                ))
                .with_default(form.slide_count)
                .with_validator(|n: &u32| {
                    Ok(if SLIDE_COUNT_RANGE.contains(n) {
                        inquire::validator::Validation::Valid
                    } else {
                        inquire::validator::Validation::Invalid("Out of range".into())
                    })
                })
                    .prompt(),
            )? {
                form.slide_count = count;
            }
        }
        "Aspect ratio" => {
            if let Some(ratio) = pick("Aspect ratio", &AspectRatio::ALL, form.aspect_ratio)? {
                form.aspect_ratio = ratio;
            }
        }
        "Tone" => {
            if let Some(tone) = answer(Select::new("Tone", form.tone_options().to_vec()).prompt())? {
                form.tone = tone.to_string();
            }
        }
        "Dialect" => {
            let labels: Vec<&str> = dialects_for(form.language).iter().map(|d| d.label()).collect();
            if let Some(label) = answer(Select::new("Dialect", labels).prompt())? {
                form.dialect = Dialect::ALL.into_iter().find(|d| d.label() == label);
            }
        }
        "Brand colors" => {
            if let Some(text) = answer(Text::new("Text color").with_initial_value(&form.brand_colors.text).prompt())? {
                form.brand_colors.text = text;
            }
            if let Some(accent) = answer(
                Text::new("Accent color")
                    .with_initial_value(&form.brand_colors.accent)
                    .prompt(),
            )? {
                form.brand_colors.accent = accent;
            }
        }
        "Character" => form.use_character = !form.use_character,
        "Character traits" => {
            let traits = &mut form.character_traits;
            if let Some(style) = pick("Style", &CharacterStyle::ALL, traits.style)? {
                traits.style = style;
            }
            if let Some(gender) = pick("Gender", &[Gender::Neutral, Gender::Male, Gender::Female], traits.gender)? {
                traits.gender = gender;
            }
            let ages = [AgeGroup::Child, AgeGroup::YoungAdult, AgeGroup::Adult, AgeGroup::Elderly];
            if let Some(age) = pick("Age", &ages, traits.age)? {
                traits.age = age;
            }
            if let Some(color) = answer(Text::new("Main color").with_initial_value(&traits.color_accent).prompt())? {
                traits.color_accent = color;
            }
        }
        "Generate carousel" => {
            println!("Generating script...");
            report(studio.generate_script().await);
            return Ok(true);
        }
        "Back to editor" => {
            studio.dispatch(Action::ShowView(View::Editor)).await?;
            return Ok(true);
        }
        "Import carousel.json" => {
            if let Some(path) = answer(Text::new("Path to carousel.json").prompt())? {
                report(studio.import_json(path.trim()).await);
            }
            return Ok(true);
        }
        "Library" => {
            studio.dispatch(Action::ShowView(View::Library)).await?;
            return Ok(true);
        }
        _ => return Ok(false),
    }

    studio.dispatch(Action::SetForm(form)).await?;
    Ok(true)
}

async fn library_view(studio: &mut Studio) -> Result<bool> {
    let entries: Vec<(String, String)> = studio
        .state()
        .library
        .entries()
        .iter()
        .map(|c| {
            let date = Local
                .timestamp_millis_opt(c.created_at)
                .single()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            (
                c.id.clone(),
                format!(
                    "{} | {} slides | {} | {}",
                    c.carousel_metadata.topic,
                    c.slides.len(),
                    c.language().tag(),
                    date
                ),
            )
        })
        .collect();

    if entries.is_empty() {
        println!("Library is empty.");
        studio.dispatch(Action::ShowView(View::Create)).await?;
        return Ok(true);
    }

    let labels: Vec<String> = entries.iter().map(|(_, l)| l.clone()).collect();
    let Some(chosen) = answer(Select::new("Library", labels).raw_prompt())? else {
        studio.dispatch(Action::ShowView(View::Create)).await?;
        return Ok(true);
    };
    let id = entries[chosen.index].0.clone();

    let Some(action) = answer(Select::new("Carousel", vec!["Open", "Delete", "Back"]).prompt())? else {
        return Ok(true);
    };
    match action {
        "Open" => {
            report(studio.load_from_library(&id).await);
        }
        "Delete" => {
            let removed = studio
                .delete_from_library(&id, |c| {
                    Confirm::new(&format!("Delete \"{}\"?", c.carousel_metadata.topic))
                        .with_default(false)
                        .prompt()
                        .unwrap_or(false)
                })
                .await;
            if let Some(true) = report(removed) {
                println!("Deleted.");
            }
        }
        _ => {}
    }
    Ok(true)
}
