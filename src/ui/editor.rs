use super::{answer, pick, report, wire_name};
use crate::core::model::{
    CharacterPosition, CharacterScale, Decoration, Expression, FontFamily, FontSize, Slide,
    TextAlign, TextEffect,
};
use crate::core::state::{Action, View};
use crate::services::editor::{
    CharacterEdit, DesignEdit, SlideEdit, LAYOUT_PRESETS, PALETTES, STYLE_PRESETS,
};
use crate::services::imagery::ImageStatus;
use crate::services::render::{render_slide_svg, RenderMode, SlideStatus};
use crate::services::workflow::Studio;
use anyhow::Result;
use inquire::{CustomType, Select, Text};
use std::path::Path;

fn slide_line(studio: &Studio, slide: &Slide, selected: bool) -> String {
    let state = studio.state();
    let status = if state.image_for(slide.slide_number).is_some() {
        "image"
    } else if state.flags.is_loading(slide.slide_number) {
        "generating"
    } else if state.flags.is_error(slide.slide_number) {
        "failed"
    } else {
        "no image"
    };
    format!(
        "{} #{} [{}] {}",
        if selected { ">" } else { " " },
        slide.slide_number,
        status,
        slide.headline
    )
}

fn print_overview(studio: &Studio) {
    let state = studio.state();
    let Some(carousel) = &state.current else {
        return;
    };
    println!(
        "\n{} ({}, {}, {} slides)",
        carousel.carousel_metadata.topic,
        carousel.language().tag(),
        carousel.aspect_ratio(),
        carousel.slides.len()
    );
    for (i, slide) in carousel.slides.iter().enumerate() {
        println!("{}", slide_line(studio, slide, i == state.selected_slide));
    }
}

async fn edit(studio: &mut Studio, edit: SlideEdit) {
    if let Err(e) = studio.dispatch(Action::EditSelected(edit)).await {
        println!("Error: {}", e);
    }
}

fn ask_percent(message: &str, current: u8, min: u8, max: u8) -> Result<Option<u8>> {
    answer(
        CustomType::<u8>::new(&format!("{} ({}-{})", message, min, max))
            .with_default(current)
            .with_validator(move |v: &u8| {
                Ok(if (min..=max).contains(v) {
                    inquire::validator::Validation::Valid
                } else {
                    inquire::validator::Validation::Invalid("Out of range".into())
                })
            })
            .prompt(),
    )
}

pub(super) async fn editor_view(studio: &mut Studio) -> Result<bool> {
    let Some(slide) = studio
        .state()
        .current
        .as_ref()
        .and_then(|c| c.slides.get(studio.state().selected_slide))
        .cloned()
    else {
        studio.dispatch(Action::ShowView(View::Create)).await?;
        return Ok(true);
    };
    print_overview(studio);

    let menu = vec![
        "Select slide",
        "Layout",
        "Text",
        "Style",
        "Character",
        "Generate image",
        "Generate all images",
        "Preview slide (SVG)",
        "Save to library",
        "Export JSON",
        "Export slide PNG",
        "Export PDF",
        "Switch language",
        "New carousel",
        "Library",
        "Quit",
    ];
    let Some(choice) = answer(Select::new(&format!("Slide #{}", slide.slide_number), menu).with_page_size(16).prompt())? else {
        return Ok(true);
    };

    match choice {
        "Select slide" => select_slide(studio).await?,
        "Layout" => layout_tab(studio, &slide).await?,
        "Text" => text_tab(studio, &slide).await?,
        "Style" => style_tab(studio, &slide).await?,
        "Character" => character_tab(studio, &slide).await?,
        "Generate image" => {
            println!("Generating image for slide {} (Ctrl-C to cancel)...", slide.slide_number);
            match report(studio.generate_image(slide.slide_number).await) {
                Some(ImageStatus::Ready(_)) => println!("Image ready."),
                Some(ImageStatus::Failed(e)) => println!("Image generation failed: {}", e),
                Some(ImageStatus::Cancelled) => println!("Cancelled."),
                None => {}
            }
        }
        "Generate all images" => {
            println!("Generating all images (Ctrl-C to cancel)...");
            if let Some(batch) = report(studio.generate_all_images().await) {
                println!(
                    "{} ready, {} failed, {} cancelled{}",
                    batch.succeeded.len(),
                    batch.failed.len(),
                    batch.cancelled.len(),
                    if batch.failed.is_empty() { "" } else { " (retry them individually)" }
                );
            }
        }
        "Preview slide (SVG)" => preview(studio, &slide).await,
        "Save to library" => {
            if report(studio.save_to_library().await).is_some() {
                println!("Saved!");
            }
        }
        "Export JSON" => {
            if let Some(path) = report(studio.export_json().await) {
                println!("Wrote {}", path);
            }
        }
        "Export slide PNG" => {
            if let Some(path) = report(studio.export_slide_png().await) {
                println!("Wrote {}", path);
            }
        }
        "Export PDF" => {
            if let Some(path) = report(studio.export_pdf().await) {
                println!("Wrote {}", path);
            }
        }
        "Switch language" => {
            let next = match studio.state().form.language {
                crate::core::model::Language::En => crate::core::model::Language::Ar,
                crate::core::model::Language::Ar => crate::core::model::Language::En,
            };
            report(studio.change_language(next).await);
        }
        "New carousel" => studio.dispatch(Action::ShowView(View::Create)).await?,
        "Library" => studio.dispatch(Action::ShowView(View::Library)).await?,
        _ => return Ok(false),
    }
    Ok(true)
}

async fn select_slide(studio: &mut Studio) -> Result<()> {
    let lines: Vec<String> = match &studio.state().current {
        Some(c) => c.slides.iter().map(|s| slide_line(studio, s, false)).collect(),
        None => return Ok(()),
    };
    let cursor = studio.state().selected_slide;
    if let Some(chosen) = answer(Select::new("Slide", lines).with_starting_cursor(cursor).raw_prompt())? {
        studio.dispatch(Action::SelectSlide(chosen.index)).await?;
    }
    Ok(())
}

async fn layout_tab(studio: &mut Studio, slide: &Slide) -> Result<()> {
    let mut options: Vec<String> = LAYOUT_PRESETS.iter().map(|(_, label, _)| format!("Preset: {}", label)).collect();
    options.push(format!("Horizontal position: {}%", slide.design.x_position));
    options.push(format!("Vertical position: {}%", slide.design.y_position));
    options.push(format!("Alignment: {}", wire_name(&slide.design.text_align)));
    let Some(chosen) = answer(Select::new("Layout", options).raw_prompt())? else {
        return Ok(());
    };

    let presets = LAYOUT_PRESETS.len();
    match chosen.index {
        i if i < presets => edit(studio, SlideEdit::Layout(LAYOUT_PRESETS[i].0)).await,
        i if i == presets => {
            if let Some(x) = ask_percent("Horizontal position", slide.design.x_position, 0, 100)? {
                edit(studio, SlideEdit::Design(DesignEdit::XPosition(x))).await;
            }
        }
        i if i == presets + 1 => {
            if let Some(y) = ask_percent("Vertical position", slide.design.y_position, 0, 100)? {
                edit(studio, SlideEdit::Design(DesignEdit::YPosition(y))).await;
            }
        }
        _ => {
            if let Some(align) = pick("Alignment", &TextAlign::ALL, slide.design.text_align)? {
                edit(studio, SlideEdit::Design(DesignEdit::TextAlign(align))).await;
            }
        }
    }
    Ok(())
}

async fn text_tab(studio: &mut Studio, slide: &Slide) -> Result<()> {
    let options = vec![
        "Headline",
        "Sub-headline",
        "Visual prompt",
        "Font size",
        "Font",
        "Text effect",
    ];
    let Some(choice) = answer(Select::new("Text", options).prompt())? else {
        return Ok(());
    };
    match choice {
        "Headline" => {
            if let Some(v) = answer(Text::new("Headline").with_initial_value(&slide.headline).prompt())? {
                edit(studio, SlideEdit::Headline(v)).await;
            }
        }
        "Sub-headline" => {
            if let Some(v) = answer(Text::new("Sub-headline").with_initial_value(&slide.sub_headline).prompt())? {
                edit(studio, SlideEdit::SubHeadline(v)).await;
            }
        }
        "Visual prompt" => {
            if let Some(v) = answer(
                Text::new("Visual description")
                    .with_initial_value(&slide.visual_description)
                    .prompt(),
            )? {
                edit(studio, SlideEdit::VisualDescription(v)).await;
            }
        }
        "Font size" => {
            if let Some(size) = pick("Font size", &FontSize::ALL, slide.design.font_size)? {
                edit(studio, SlideEdit::Design(DesignEdit::FontSize(size))).await;
            }
        }
        "Font" => {
            if let Some(font) = pick("Font", &FontFamily::ALL, slide.design.font)? {
                edit(studio, SlideEdit::Design(DesignEdit::Font(font))).await;
            }
        }
        _ => {
            if let Some(effect) = pick("Text effect", &TextEffect::ALL, slide.design.text_effect)? {
                edit(studio, SlideEdit::Design(DesignEdit::TextEffect(effect))).await;
            }
        }
    }
    Ok(())
}

async fn style_tab(studio: &mut Studio, slide: &Slide) -> Result<()> {
    let mut options: Vec<String> = STYLE_PRESETS.iter().map(|(_, label, _)| format!("Theme: {}", label)).collect();
    options.extend(PALETTES.iter().map(|p| format!("Palette: {} ({} / {})", p.name, p.text, p.accent)));
    options.push(format!("Text color: {}", slide.design.text_color));
    options.push(format!("Accent color: {}", slide.design.accent_color));
    options.push(format!("Overlay: {}%", slide.design.overlay_opacity));
    options.push(format!("Decoration: {}", wire_name(&slide.design.decoration)));
    let Some(chosen) = answer(Select::new("Style", options).with_page_size(20).raw_prompt())? else {
        return Ok(());
    };

    let themes = STYLE_PRESETS.len();
    let palettes = themes + PALETTES.len();
    match chosen.index {
        i if i < themes => edit(studio, SlideEdit::Style(STYLE_PRESETS[i].0)).await,
        i if i < palettes => edit(studio, SlideEdit::Palette(i - themes)).await,
        i if i == palettes => {
            if let Some(c) = answer(Text::new("Text color").with_initial_value(&slide.design.text_color).prompt())? {
                edit(studio, SlideEdit::Design(DesignEdit::TextColor(c))).await;
            }
        }
        i if i == palettes + 1 => {
            if let Some(c) = answer(Text::new("Accent color").with_initial_value(&slide.design.accent_color).prompt())? {
                edit(studio, SlideEdit::Design(DesignEdit::AccentColor(c))).await;
            }
        }
        i if i == palettes + 2 => {
            if let Some(o) = ask_percent("Overlay opacity", slide.design.overlay_opacity, 0, 90)? {
                edit(studio, SlideEdit::Design(DesignEdit::OverlayOpacity(o))).await;
            }
        }
        _ => {
            if let Some(d) = pick("Decoration", &Decoration::ALL, slide.design.decoration)? {
                edit(studio, SlideEdit::Design(DesignEdit::Decoration(d))).await;
            }
        }
    }
    Ok(())
}

async fn character_tab(studio: &mut Studio, slide: &Slide) -> Result<()> {
    let settings = &slide.character_settings;
    let options = vec![
        format!("Include character: {}", if slide.include_character { "yes" } else { "no" }),
        format!("Action: {}", slide.character_custom_prompt.as_deref().unwrap_or("(default)")),
        format!("Scale: {}", settings.scale.word()),
        format!("Position: {}", settings.position.zone()),
        format!("Expression: {}", settings.expression.word()),
        format!("Opacity: {}%", settings.opacity),
        format!("Rotation: {}", settings.rotation),
        "Character DNA (all slides)".to_string(),
    ];
    let Some(chosen) = answer(Select::new("Character", options).raw_prompt())? else {
        return Ok(());
    };
    match chosen.index {
        0 => edit(studio, SlideEdit::IncludeCharacter(!slide.include_character)).await,
        1 => {
            let current = slide.character_custom_prompt.clone().unwrap_or_default();
            if let Some(v) = answer(Text::new("Action (empty for default)").with_initial_value(&current).prompt())? {
                edit(studio, SlideEdit::CharacterPrompt(Some(v))).await;
            }
        }
        2 => {
            if let Some(s) = pick("Scale", &CharacterScale::ALL, settings.scale)? {
                edit(studio, SlideEdit::Character(CharacterEdit::Scale(s))).await;
            }
        }
        3 => {
            if let Some(p) = pick("Position", &CharacterPosition::ALL, settings.position)? {
                edit(studio, SlideEdit::Character(CharacterEdit::Position(p))).await;
            }
        }
        4 => {
            if let Some(e) = pick("Expression", &Expression::ALL, settings.expression)? {
                edit(studio, SlideEdit::Character(CharacterEdit::Expression(e))).await;
            }
        }
        5 => {
            if let Some(o) = ask_percent("Opacity", settings.opacity, 10, 100)? {
                edit(studio, SlideEdit::Character(CharacterEdit::Opacity(o))).await;
            }
        }
        6 => {
            if let Some(r) = answer(
                CustomType::<i16>::new("Rotation (-180-180)")
                    .with_default(settings.rotation)
                    .prompt(),
            )? {
                edit(studio, SlideEdit::Character(CharacterEdit::Rotation(r))).await;
            }
        }
        _ => {
            let current = studio.state().character_description.clone();
            if let Some(v) = answer(Text::new("Character description").with_initial_value(&current).prompt())? {
                studio.dispatch(Action::SetCharacterDescription(v)).await?;
            }
        }
    }
    Ok(())
}

/// Writes the interactive rendering of a slide next to the exports.
async fn preview(studio: &Studio, slide: &Slide) {
    let state = studio.state();
    let Some(carousel) = &state.current else {
        return;
    };
    let svg = render_slide_svg(
        slide,
        carousel.language(),
        carousel.aspect_ratio(),
        SlideStatus {
            image: state.image_for(slide.slide_number),
            loading: state.flags.is_loading(slide.slide_number),
            failed: state.flags.is_error(slide.slide_number),
        },
        RenderMode::Interactive,
    );
    let path = Path::new(&studio.config().output_folder)
        .join(format!("preview-slide-{}.svg", slide.slide_number));
    match tokio::fs::write(&path, svg).await {
        Ok(()) => println!("Preview written to {}", path.display()),
        Err(e) => println!("Error: {}", e),
    }
}
