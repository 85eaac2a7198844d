use crate::core::model::{
    AspectRatio, Decoration, FontFamily, FontSize, Language, Slide, TextAlign, TextEffect,
};

/// Interactive output carries the slide badge and image status affordances;
/// export output never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Interactive,
    Export,
}

/// Image state of one slide as seen by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideStatus<'a> {
    pub image: Option<&'a str>,
    pub loading: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Empty,
    Generating,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Backdrop {
    Image(String),
    Placeholder(Placeholder),
}

/// Physical text anchor after resolving alignment against reading direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Anchor point on the x axis.
    pub x: f32,
    pub baseline: f32,
    /// Estimated advance, used for highlight boxes.
    pub width: f32,
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub font_px: f32,
    pub line_px: f32,
    pub weight: u16,
    pub opacity: f32,
    pub accent_glow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub label: String,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideLayout {
    pub width: f32,
    pub height: f32,
    pub backdrop: Backdrop,
    pub overlay_alpha: f32,
    pub decoration: Decoration,
    pub text_color: String,
    pub accent_color: String,
    pub effect: TextEffect,
    pub font_family: &'static str,
    pub letter_spacing: f32,
    pub anchor: Anchor,
    pub block: Rect,
    pub headline: TextBlock,
    pub sub_headline: TextBlock,
    pub badge: Option<Badge>,
    pub retry_button: bool,
}

const BLOCK_WIDTH_RATIO: f32 = 0.85;
const BLOCK_GAP: f32 = 8.0;
const BADGE_INSET: f32 = 16.0;
const BADGE_HEIGHT: f32 = 20.0;

/// Headline and sub-headline pixel sizes.
pub fn font_px(size: FontSize) -> (f32, f32) {
    match size {
        FontSize::Small => (20.0, 12.0),
        FontSize::Medium => (24.0, 14.0),
        FontSize::Large => (30.0, 16.0),
        FontSize::Xl => (36.0, 18.0),
    }
}

fn family(font: FontFamily, language: Language) -> (&'static str, f32) {
    if language.is_rtl() {
        return ("sans-serif", 0.0);
    }
    match font {
        FontFamily::Sans => ("sans-serif", 0.0),
        FontFamily::Serif => ("serif", 0.0),
        FontFamily::Mono => ("monospace", 0.0),
        FontFamily::Display => ("system-ui, sans-serif", -0.05),
    }
}

fn advance_ratio(font_family: &str) -> f32 {
    match font_family {
        "monospace" => 0.6,
        "serif" => 0.5,
        _ => 0.55,
    }
}

fn anchor_for(align: TextAlign, language: Language) -> Anchor {
    match align {
        TextAlign::Left => Anchor::Start,
        TextAlign::Center => Anchor::Middle,
        TextAlign::Right => Anchor::End,
        TextAlign::Justify if language.is_rtl() => Anchor::End,
        TextAlign::Justify => Anchor::Start,
    }
}

/// Greedy word wrap on estimated advances; explicit newlines are kept.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

struct TextStyle {
    font_px: f32,
    line_px: f32,
    weight: u16,
    opacity: f32,
    accent_glow: bool,
}

fn lay_out_lines(text: &str, style: TextStyle, block: Rect, anchor: Anchor, advance: f32, top: f32) -> TextBlock {
    let char_px = style.font_px * advance;
    let max_chars = (block.width / char_px).floor() as usize;
    let x = match anchor {
        Anchor::Start => block.x,
        Anchor::Middle => block.x + block.width / 2.0,
        Anchor::End => block.x + block.width,
    };
    let lines = wrap_text(text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let line_top = top + i as f32 * style.line_px;
            let width = (text.chars().count() as f32 * char_px).min(block.width);
            TextLine {
                baseline: line_top + (style.line_px - style.font_px) / 2.0 + style.font_px * 0.8,
                top: line_top,
                x,
                width,
                text,
            }
        })
        .collect();
    TextBlock {
        lines,
        font_px: style.font_px,
        line_px: style.line_px,
        weight: style.weight,
        opacity: style.opacity,
        accent_glow: style.accent_glow,
    }
}

impl TextBlock {
    fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_px
    }
}

/// Maps a slide and its design to absolute geometry. Pure: the same inputs
/// always give the same layout.
pub fn layout_slide(
    slide: &Slide,
    language: Language,
    aspect_ratio: AspectRatio,
    status: SlideStatus<'_>,
    mode: RenderMode,
) -> SlideLayout {
    let design = &slide.design;
    let (w, h) = aspect_ratio.dimensions();
    let (width, height) = (w as f32, h as f32);

    let backdrop = match (status.image, mode) {
        (Some(uri), _) => Backdrop::Image(uri.to_string()),
        (None, RenderMode::Export) => Backdrop::Placeholder(Placeholder::Empty),
        (None, RenderMode::Interactive) if status.loading => Backdrop::Placeholder(Placeholder::Generating),
        (None, RenderMode::Interactive) if status.failed => Backdrop::Placeholder(Placeholder::Failed),
        (None, RenderMode::Interactive) => Backdrop::Placeholder(Placeholder::Empty),
    };

    let block_width = width * BLOCK_WIDTH_RATIO;
    let center_x = width * f32::from(design.x_position) / 100.0;
    let top = height * f32::from(design.y_position) / 100.0;
    let (font_family, letter_spacing) = family(design.font, language);
    let advance = advance_ratio(font_family);
    let anchor = anchor_for(design.text_align, language);
    let line_height = if language.is_rtl() { 1.625 } else { 1.5 };
    let (head_px, sub_px) = font_px(design.font_size);
    let frame = Rect {
        x: center_x - block_width / 2.0,
        y: top,
        width: block_width,
        height: 0.0,
    };

    let headline = lay_out_lines(
        &slide.headline,
        TextStyle {
            font_px: head_px,
            line_px: head_px * line_height,
            weight: 700,
            opacity: 1.0,
            accent_glow: design.text_effect == TextEffect::Neon,
        },
        frame,
        anchor,
        advance,
        top,
    );
    let sub_top = if headline.lines.is_empty() {
        top
    } else {
        top + headline.height() + BLOCK_GAP
    };
    let sub_headline = lay_out_lines(
        &slide.sub_headline,
        TextStyle {
            font_px: sub_px,
            line_px: sub_px * line_height,
            weight: 500,
            opacity: 0.9,
            accent_glow: false,
        },
        frame,
        anchor,
        advance,
        sub_top,
    );
    let block = Rect {
        height: sub_top + sub_headline.height() - top,
        ..frame
    };

    let failed = status.failed && status.image.is_none();
    let badge = match mode {
        RenderMode::Export => None,
        RenderMode::Interactive => {
            let label = format!("#{}", slide.slide_number);
            let badge_width = 16.0 + label.chars().count() as f32 * 6.0 + if failed { 12.0 } else { 0.0 };
            let x = if language.is_rtl() {
                width - BADGE_INSET - badge_width
            } else {
                BADGE_INSET
            };
            Some(Badge {
                x,
                y: BADGE_INSET,
                width: badge_width,
                label,
                failed,
            })
        }
    };

    SlideLayout {
        width,
        height,
        retry_button: backdrop == Backdrop::Placeholder(Placeholder::Failed),
        backdrop,
        overlay_alpha: f32::from(design.overlay_opacity.min(100)) / 100.0,
        decoration: design.decoration,
        text_color: design.text_color.clone(),
        accent_color: design.accent_color.clone(),
        effect: design.text_effect,
        font_family,
        letter_spacing,
        anchor,
        block,
        headline,
        sub_headline,
        badge,
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn defs(layout: &SlideLayout) -> String {
    let accent = escape_xml(&layout.accent_color);
    let mut defs = String::from(
        "<defs>\
         <radialGradient id=\"placeholder\" cx=\"50%\" cy=\"50%\" r=\"70%\">\
         <stop offset=\"0\" stop-color=\"#0f172a\"/><stop offset=\"1\" stop-color=\"#020617\"/>\
         </radialGradient>",
    );
    match layout.effect {
        TextEffect::Shadow => defs.push_str(
            "<filter id=\"fx-text\" x=\"-20%\" y=\"-20%\" width=\"140%\" height=\"160%\">\
             <feDropShadow dx=\"0\" dy=\"2\" stdDeviation=\"1\" flood-color=\"#000000\" flood-opacity=\"0.8\"/>\
             </filter>",
        ),
        TextEffect::Retro => defs.push_str(
            "<filter id=\"fx-text\" x=\"-20%\" y=\"-20%\" width=\"140%\" height=\"160%\">\
             <feDropShadow dx=\"2\" dy=\"2\" stdDeviation=\"0\" flood-color=\"#000000\" flood-opacity=\"1\"/>\
             </filter>",
        ),
        TextEffect::Neon => {
            defs.push_str(
                "<filter id=\"fx-text\" x=\"-30%\" y=\"-50%\" width=\"160%\" height=\"200%\">\
                 <feGaussianBlur in=\"SourceAlpha\" stdDeviation=\"5\" result=\"blur\"/>\
                 <feFlood flood-color=\"#ffffff\" flood-opacity=\"0.8\"/>\
                 <feComposite in2=\"blur\" operator=\"in\" result=\"glow\"/>\
                 <feMerge><feMergeNode in=\"glow\"/><feMergeNode in=\"SourceGraphic\"/></feMerge>\
                 </filter>",
            );
            defs.push_str(&format!(
                "<filter id=\"fx-headline\" x=\"-30%\" y=\"-50%\" width=\"160%\" height=\"200%\">\
                 <feGaussianBlur in=\"SourceAlpha\" stdDeviation=\"10\" result=\"wide\"/>\
                 <feFlood flood-color=\"{accent}\"/>\
                 <feComposite in2=\"wide\" operator=\"in\" result=\"accentGlow\"/>\
                 <feGaussianBlur in=\"SourceAlpha\" stdDeviation=\"5\" result=\"narrow\"/>\
                 <feFlood flood-color=\"#ffffff\" flood-opacity=\"0.8\"/>\
                 <feComposite in2=\"narrow\" operator=\"in\" result=\"whiteGlow\"/>\
                 <feMerge><feMergeNode in=\"accentGlow\"/><feMergeNode in=\"whiteGlow\"/><feMergeNode in=\"SourceGraphic\"/></feMerge>\
                 </filter>"
            ));
        }
        TextEffect::None | TextEffect::Outline | TextEffect::BgHighlight | TextEffect::Glitch => {}
    }
    match layout.decoration {
        Decoration::CornerShape => defs.push_str(&format!(
            "<linearGradient id=\"corner\" x1=\"1\" y1=\"0\" x2=\"0\" y2=\"1\">\
             <stop offset=\"0\" stop-color=\"{accent}\"/><stop offset=\"1\" stop-color=\"{accent}\" stop-opacity=\"0\"/>\
             </linearGradient>"
        )),
        Decoration::Blob => defs.push_str(&format!(
            "<filter id=\"blob\" filterUnits=\"userSpaceOnUse\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\">\
             <feGaussianBlur stdDeviation=\"64\"/></filter>",
            -layout.width,
            -layout.height,
            layout.width * 3.0,
            layout.height * 3.0
        )),
        Decoration::None
        | Decoration::Circle
        | Decoration::Square
        | Decoration::AccentLine
        | Decoration::Grid
        | Decoration::Frame => {}
    }
    defs.push_str("</defs>");
    defs
}

fn backdrop(layout: &SlideLayout) -> String {
    let (w, h) = (layout.width, layout.height);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let mut out = format!("<rect width=\"{w}\" height=\"{h}\" fill=\"#020617\"/>");
    match &layout.backdrop {
        Backdrop::Image(uri) => out.push_str(&format!(
            "<image x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\"/>",
            escape_xml(uri)
        )),
        Backdrop::Placeholder(kind) => {
            out.push_str(&format!("<rect width=\"{w}\" height=\"{h}\" fill=\"url(#placeholder)\"/>"));
            match kind {
                Placeholder::Empty => out.push_str(&format!(
                    "<g opacity=\"0.3\" fill=\"none\" stroke=\"#475569\" stroke-width=\"2\">\
                     <rect x=\"{}\" y=\"{}\" width=\"40\" height=\"40\" rx=\"6\"/>\
                     <path d=\"M {} {} l 10 -12 l 8 8 l 6 -6 l 10 10\"/></g>\
                     <text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\" font-weight=\"500\" fill=\"#475569\">No Image</text>",
                    cx - 20.0,
                    cy - 34.0,
                    cx - 16.0,
                    cy - 2.0,
                    cy + 26.0
                )),
                Placeholder::Generating => out.push_str(&format!(
                    "<circle cx=\"{cx}\" cy=\"{}\" r=\"14\" fill=\"none\" stroke=\"#3b82f6\" stroke-width=\"4\" stroke-dasharray=\"66 22\"/>\
                     <text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\" font-weight=\"500\" fill=\"#64748b\">Generating...</text>",
                    cy - 16.0,
                    cy + 18.0
                )),
                Placeholder::Failed => {
                    out.push_str(&format!(
                        "<g opacity=\"0.8\"><circle cx=\"{cx}\" cy=\"{}\" r=\"18\" fill=\"none\" stroke=\"#ef4444\" stroke-width=\"2\"/>\
                         <path d=\"M {cx} {} v 12 M {cx} {} v 1\" stroke=\"#ef4444\" stroke-width=\"2\" stroke-linecap=\"round\"/></g>\
                         <text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\" font-weight=\"500\" fill=\"#f87171\">Image generation failed.</text>",
                        cy - 30.0,
                        cy - 38.0,
                        cy - 22.0,
                        cy + 8.0
                    ));
                    if layout.retry_button {
                        out.push_str(&format!(
                            "<rect x=\"{}\" y=\"{}\" width=\"64\" height=\"24\" rx=\"12\" fill=\"#7f1d1d\" fill-opacity=\"0.5\" stroke=\"#991b1b\"/>\
                             <text x=\"{cx}\" y=\"{}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"10\" fill=\"#fecaca\">Retry</text>",
                            cx - 32.0,
                            cy + 20.0,
                            cy + 35.5
                        ));
                    }
                }
            }
        }
    }
    out.push_str(&format!(
        "<rect width=\"{w}\" height=\"{h}\" fill=\"#0f172a\" fill-opacity=\"{}\"/>",
        layout.overlay_alpha
    ));
    out
}

fn decoration(layout: &SlideLayout) -> String {
    let (w, h) = (layout.width, layout.height);
    let accent = escape_xml(&layout.accent_color);
    match layout.decoration {
        Decoration::None => String::new(),
        Decoration::Circle => format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"94\" fill=\"none\" stroke=\"{accent}\" stroke-width=\"4\" opacity=\"0.5\"/>",
            w / 2.0,
            h / 2.0
        ),
        Decoration::Square => format!(
            "<rect x=\"17\" y=\"17\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{accent}\" stroke-width=\"2\" opacity=\"0.5\"/>",
            w - 34.0,
            h - 34.0
        ),
        Decoration::AccentLine => format!(
            "<rect x=\"{}\" y=\"{}\" width=\"96\" height=\"4\" fill=\"{accent}\"/>",
            w / 2.0 - 48.0,
            h / 2.0 - 2.0
        ),
        Decoration::CornerShape => format!(
            "<path d=\"M {} 0 L {w} 0 L {w} 96 A 96 96 0 0 1 {} 0 Z\" fill=\"url(#corner)\" opacity=\"0.5\"/>",
            w - 96.0,
            w - 96.0
        ),
        Decoration::Grid => {
            let mut grid = String::from(
                "<g stroke=\"#ffffff\" stroke-opacity=\"0.05\" stroke-width=\"1\">",
            );
            let mut x = 0.5;
            while x < w {
                grid.push_str(&format!("<line x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{h}\"/>"));
                x += 20.0;
            }
            let mut y = 0.5;
            while y < h {
                grid.push_str(&format!("<line x1=\"0\" y1=\"{y}\" x2=\"{w}\" y2=\"{y}\"/>"));
                y += 20.0;
            }
            grid.push_str("</g>");
            grid
        }
        Decoration::Blob => format!(
            "<circle cx=\"{}\" cy=\"88\" r=\"128\" fill=\"{accent}\" opacity=\"0.3\" filter=\"url(#blob)\"/>",
            w - 88.0
        ),
        Decoration::Frame => format!(
            "<rect x=\"12.5\" y=\"12.5\" width=\"{}\" height=\"{}\" rx=\"8\" fill=\"none\" stroke=\"{accent}\" stroke-width=\"1\" opacity=\"0.5\"/>",
            w - 25.0,
            h - 25.0
        ),
    }
}

fn text_element(layout: &SlideLayout, block: &TextBlock, line: &TextLine, fill: &str, filter: Option<&str>, dx: f32) -> String {
    let mut attrs = format!(
        "x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{}\"",
        line.x + dx,
        line.baseline,
        layout.font_family,
        block.font_px,
        block.weight,
        escape_xml(fill),
        layout.anchor.svg()
    );
    if layout.letter_spacing != 0.0 {
        attrs.push_str(&format!(" letter-spacing=\"{}\"", layout.letter_spacing * block.font_px));
    }
    if block.opacity < 1.0 {
        attrs.push_str(&format!(" opacity=\"{}\"", block.opacity));
    }
    if let Some(id) = filter {
        attrs.push_str(&format!(" filter=\"url(#{id})\""));
    }
    if layout.effect == TextEffect::Outline {
        attrs.push_str(" stroke=\"#000000\" stroke-width=\"2\" paint-order=\"stroke\" stroke-linejoin=\"round\"");
    }
    format!("<text {attrs}>{}</text>", escape_xml(&line.text))
}

fn text_block(layout: &SlideLayout, block: &TextBlock) -> String {
    let filter = match layout.effect {
        TextEffect::Neon if block.accent_glow => Some("fx-headline"),
        TextEffect::Shadow | TextEffect::Retro | TextEffect::Neon => Some("fx-text"),
        TextEffect::None | TextEffect::Outline | TextEffect::BgHighlight | TextEffect::Glitch => None,
    };
    let mut out = String::new();
    for line in &block.lines {
        if layout.effect == TextEffect::BgHighlight {
            let left = match layout.anchor {
                Anchor::Start => line.x,
                Anchor::Middle => line.x - line.width / 2.0,
                Anchor::End => line.x - line.width,
            };
            out.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\" fill=\"#000000\" fill-opacity=\"0.6\"/>",
                left - 8.0,
                line.top,
                line.width + 16.0,
                block.line_px
            ));
        }
        if layout.effect == TextEffect::Glitch {
            out.push_str(&text_element(layout, block, line, &layout.accent_color, None, -2.0));
        }
        out.push_str(&text_element(layout, block, line, &layout.text_color, filter, 0.0));
    }
    out
}

fn badge(badge: &Badge) -> String {
    let mut out = format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{BADGE_HEIGHT}\" rx=\"4\" fill=\"#0f172a\" fill-opacity=\"0.8\" stroke=\"#334155\"/>\
         <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"10\" font-weight=\"700\" fill=\"#94a3b8\">{}</text>",
        badge.x,
        badge.y,
        badge.width,
        badge.x + 8.0,
        badge.y + 14.0,
        escape_xml(&badge.label)
    );
    if badge.failed {
        out.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"4\" fill=\"none\" stroke=\"#ef4444\" stroke-width=\"1.5\"/>",
            badge.x + badge.width - 12.0,
            badge.y + BADGE_HEIGHT / 2.0
        ));
    }
    out
}

/// Serializes a layout to a standalone SVG document.
pub fn to_svg(layout: &SlideLayout) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = layout.width,
        h = layout.height
    );
    svg.push_str(&defs(layout));
    svg.push_str(&backdrop(layout));
    svg.push_str(&decoration(layout));
    svg.push_str(&text_block(layout, &layout.headline));
    svg.push_str(&text_block(layout, &layout.sub_headline));
    if let Some(b) = &layout.badge {
        svg.push_str(&badge(b));
    }
    svg.push_str("</svg>");
    svg
}

pub fn render_slide_svg(
    slide: &Slide,
    language: Language,
    aspect_ratio: AspectRatio,
    status: SlideStatus<'_>,
    mode: RenderMode,
) -> String {
    to_svg(&layout_slide(slide, language, aspect_ratio, status, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_slide;

    fn export(slide: &Slide, language: Language) -> SlideLayout {
        layout_slide(slide, language, AspectRatio::Portrait4x5, SlideStatus::default(), RenderMode::Export)
    }

    #[test]
    fn test_block_geometry() {
        let slide = sample_slide(1, Language::En);
        let layout = export(&slide, Language::En);
        assert_eq!((layout.width, layout.height), (340.0, 425.0));
        assert!((layout.block.width - 289.0).abs() < 0.01);
        assert!((layout.block.x - (170.0 - 144.5)).abs() < 0.01);
        assert!((layout.block.y - 42.5).abs() < 0.01);
        assert_eq!(layout.headline.font_px, 24.0);
        assert_eq!(layout.sub_headline.font_px, 14.0);
        assert_eq!(layout.headline.line_px, 36.0);
        assert_eq!(layout.anchor, Anchor::Start);
        assert!((layout.overlay_alpha - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rtl_layout() {
        let mut slide = sample_slide(2, Language::Ar);
        slide.design.font = FontFamily::Serif;
        let layout = layout_slide(
            &slide,
            Language::Ar,
            AspectRatio::Square1x1,
            SlideStatus::default(),
            RenderMode::Interactive,
        );
        assert_eq!(layout.anchor, Anchor::End);
        assert_eq!(layout.font_family, "sans-serif");
        assert_eq!(layout.headline.line_px, 24.0 * 1.625);
        let badge = layout.badge.unwrap();
        assert_eq!(badge.x + badge.width, 340.0 - 16.0);
    }

    #[test]
    fn test_export_omits_affordances() {
        let slide = sample_slide(3, Language::En);
        let status = SlideStatus { image: None, loading: false, failed: true };
        let interactive = layout_slide(&slide, Language::En, AspectRatio::Portrait4x5, status, RenderMode::Interactive);
        let exported = layout_slide(&slide, Language::En, AspectRatio::Portrait4x5, status, RenderMode::Export);

        assert_eq!(interactive.backdrop, Backdrop::Placeholder(Placeholder::Failed));
        assert!(interactive.retry_button);
        assert!(interactive.badge.as_ref().is_some_and(|b| b.failed && b.label == "#3"));
        let svg = to_svg(&interactive);
        assert!(svg.contains("Retry"));
        assert!(svg.contains("Image generation failed."));

        assert_eq!(exported.backdrop, Backdrop::Placeholder(Placeholder::Empty));
        assert!(exported.badge.is_none());
        let svg = to_svg(&exported);
        assert!(svg.contains("No Image"));
        assert!(!svg.contains("Retry"));
        assert!(!svg.contains("#3<"));
    }

    #[test]
    fn test_image_backdrop_and_escaping() {
        let mut slide = sample_slide(1, Language::En);
        slide.headline = "Fish & <Chips>".to_string();
        let status = SlideStatus { image: Some("data:image/png;base64,AAAA"), ..Default::default() };
        let svg = render_slide_svg(&slide, Language::En, AspectRatio::Wide16x9, status, RenderMode::Export);
        assert!(svg.contains("xlink:href=\"data:image/png;base64,AAAA\""));
        assert!(svg.contains("Fish &amp; &lt;Chips&gt;"));
        assert!(svg.contains("viewBox=\"0 0 560 315\""));
    }

    #[test]
    fn test_every_effect_and_decoration_renders() {
        let mut slide = sample_slide(1, Language::En);
        for effect in TextEffect::ALL {
            for deco in Decoration::ALL {
                slide.design.text_effect = effect;
                slide.design.decoration = deco;
                let svg = render_slide_svg(&slide, Language::En, AspectRatio::Portrait4x5, SlideStatus::default(), RenderMode::Export);
                assert!(svg.starts_with("<svg") && svg.ends_with("</svg>"));
            }
        }
        slide.design.text_effect = TextEffect::Neon;
        let svg = render_slide_svg(&slide, Language::En, AspectRatio::Portrait4x5, SlideStatus::default(), RenderMode::Export);
        assert!(svg.contains("url(#fx-headline)"));
        assert!(svg.contains("url(#fx-text)"));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 4).is_empty());
    }

    #[test]
    fn test_layout_is_pure() {
        let slide = sample_slide(1, Language::En);
        assert_eq!(export(&slide, Language::En), export(&slide, Language::En));
    }
}
