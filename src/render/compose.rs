//! Lays the three language blocks over a dimmed background and encodes a JPEG.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, instrument};

use super::text::{TextMeasure, TextRenderer, blend_pixel, fit_text};
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH, JPEG_QUALITY};
use crate::error::LingoError;
use crate::media::{GeneratedImage, JPEG_MIME};
use crate::translation::{Language, Translation};

const CONTENT_WIDTH: f32 = 860.0;
const SLOT_HEIGHT: f32 = 190.0;
const SLOT_GAP: f32 = 28.0;
/// Block sits slightly above true center
const BLOCK_LIFT: f32 = 15.0;
const TEXT_INSET: f32 = 120.0;

const OVERLAY_ALPHA: f32 = 0.42;
const PANEL_GREY: u8 = 150;
const PANEL_ALPHA: f32 = 0.24;
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

const TITLE_SIZE: f32 = 48.0;
const TITLE_WEIGHT: u16 = 700;
const TITLE_OFFSET: f32 = -54.0;

const WORD_MAX_SIZE: f32 = 78.0;
const WORD_MIN_SIZE: f32 = 54.0;
const WORD_WEIGHT: u16 = 800;
const WORD_OFFSET: f32 = 4.0;

const PHRASE_MAX_SIZE: f32 = 50.0;
const PHRASE_MIN_SIZE: f32 = 32.0;
const PHRASE_WEIGHT: u16 = 500;
const PHRASE_OFFSET: f32 = 64.0;

const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Axis-aligned rectangle in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// A line of text with its resolved size and vertical center.
#[derive(Clone, Debug, PartialEq)]
pub struct TextPlacement {
    /// Text as drawn
    pub text: String,
    /// Font size after fitting
    pub size: f32,
    /// Font weight
    pub weight: u16,
    /// Vertical center of the line
    pub center_y: f32,
}

/// Geometry and text for one language block.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotLayout {
    /// Language shown in the slot
    pub language: Language,
    /// Backing panel
    pub panel: Rect,
    /// Heading line
    pub title: TextPlacement,
    /// Translated word, lowercased
    pub word: TextPlacement,
    /// Example phrase
    pub phrase: TextPlacement,
}

/// Computes where each language block and its text goes.
pub fn layout_slots<M: TextMeasure + ?Sized>(
    translation: &Translation,
    measure: &M,
) -> Vec<SlotLayout> {
    let slots = Language::ORDER.len() as f32;
    let canvas_width = CANVAS_WIDTH as f32;
    let canvas_height = CANVAS_HEIGHT as f32;
    let total_height = SLOT_HEIGHT * slots + SLOT_GAP * (slots - 1.0);
    let start_y = (canvas_height - total_height) / 2.0 - BLOCK_LIFT;
    let content_x = (canvas_width - CONTENT_WIDTH) / 2.0;
    let max_text_width = CONTENT_WIDTH - TEXT_INSET;

    translation
        .entries()
        .enumerate()
        .map(|(index, (language, entry))| {
            let y = start_y + index as f32 * (SLOT_HEIGHT + SLOT_GAP);
            let center_y = y + SLOT_HEIGHT / 2.0;
            let word = entry.word.to_lowercase();
            let word_size = fit_text(
                measure,
                &word,
                max_text_width,
                WORD_MAX_SIZE,
                WORD_MIN_SIZE,
                WORD_WEIGHT,
            );
            let phrase_size = fit_text(
                measure,
                &entry.phrase,
                max_text_width,
                PHRASE_MAX_SIZE,
                PHRASE_MIN_SIZE,
                PHRASE_WEIGHT,
            );
            SlotLayout {
                language,
                panel: Rect {
                    x: content_x,
                    y,
                    width: CONTENT_WIDTH,
                    height: SLOT_HEIGHT,
                },
                title: TextPlacement {
                    text: language.title().to_string(),
                    size: TITLE_SIZE,
                    weight: TITLE_WEIGHT,
                    center_y: center_y + TITLE_OFFSET,
                },
                word: TextPlacement {
                    text: word,
                    size: word_size,
                    weight: WORD_WEIGHT,
                    center_y: center_y + WORD_OFFSET,
                },
                phrase: TextPlacement {
                    text: entry.phrase.clone(),
                    size: phrase_size,
                    weight: PHRASE_WEIGHT,
                    center_y: center_y + PHRASE_OFFSET,
                },
            }
        })
        .collect()
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>, alpha: f32) {
    let left = rect.x.max(0.0).round() as u32;
    let top = rect.y.max(0.0).round() as u32;
    let right = ((rect.x + rect.width).round().max(0.0) as u32).min(canvas.width());
    let bottom = ((rect.y + rect.height).round().max(0.0) as u32).min(canvas.height());
    for y in top..bottom {
        for x in left..right {
            blend_pixel(canvas.get_pixel_mut(x, y), color, alpha);
        }
    }
}

/// Decodes image bytes, guessing the format from the content.
pub(crate) fn decode_image(bytes: &[u8]) -> Result<DynamicImage, LingoError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| LingoError::ImageLoad(format!("failed to guess image format: {err}")))?;
    reader
        .decode()
        .map_err(|err| LingoError::ImageLoad(format!("failed to decode image: {err}")))
}

/// Encodes the canvas as JPEG and checks the result really is one.
fn encode_jpeg(canvas: RgbaImage) -> Result<GeneratedImage, LingoError> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|err| LingoError::Encoding(err.to_string()))?;
    if !output.starts_with(&JPEG_SIGNATURE) {
        return Err(LingoError::Encoding(
            "encoder output is missing the JPEG signature".to_string(),
        ));
    }
    Ok(GeneratedImage::new(output, JPEG_MIME))
}

/// Composes translation cards.
///
/// Holds only shared read-only state; every call renders on its own canvas.
#[derive(Clone)]
pub struct Compositor {
    renderer: Arc<dyn TextRenderer>,
    http: reqwest::Client,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor").finish_non_exhaustive()
    }
}

impl Compositor {
    /// Creates a compositor drawing with `renderer`.
    pub fn new(renderer: Arc<dyn TextRenderer>, http: reqwest::Client) -> Self {
        Self { renderer, http }
    }

    /// Loads the background, draws the card and encodes it as JPEG.
    #[instrument(level = "debug", skip(self, translation), fields(word = %translation.english.word))]
    pub async fn compose(
        &self,
        translation: &Translation,
        background_url: &str,
    ) -> Result<GeneratedImage, LingoError> {
        let background = self.load_background(background_url).await?;
        let canvas = self.render(translation, &background);
        encode_jpeg(canvas)
    }

    /// Fetches a background from a `data:` or `http(s)` URL and decodes it.
    pub async fn load_background(&self, url: &str) -> Result<DynamicImage, LingoError> {
        let bytes = if url.starts_with("data:") {
            GeneratedImage::from_data_url(url)
                .map_err(|err| LingoError::ImageLoad(err.to_string()))?
                .bytes
        } else if url.starts_with("http://") || url.starts_with("https://") {
            debug!("Fetching background {}", url);
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|err| LingoError::ImageLoad(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(LingoError::ImageLoad(format!(
                    "background request returned {status}"
                )));
            }
            response
                .bytes()
                .await
                .map_err(|err| LingoError::ImageLoad(err.to_string()))?
                .to_vec()
        } else {
            return Err(LingoError::ImageLoad(format!(
                "unsupported background URL: {url}"
            )));
        };
        decode_image(&bytes)
    }

    /// Draws the card onto a fresh canvas.
    pub fn render(&self, translation: &Translation, background: &DynamicImage) -> RgbaImage {
        let mut canvas = image::imageops::resize(
            &background.to_rgba8(),
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            FilterType::Triangle,
        );

        let full = Rect {
            x: 0.0,
            y: 0.0,
            width: CANVAS_WIDTH as f32,
            height: CANVAS_HEIGHT as f32,
        };
        fill_rect(&mut canvas, full, Rgba([0, 0, 0, 255]), OVERLAY_ALPHA);

        let center_x = CANVAS_WIDTH as f32 / 2.0;
        let panel_color = Rgba([PANEL_GREY, PANEL_GREY, PANEL_GREY, 255]);
        for slot in layout_slots(translation, self.renderer.as_ref()) {
            fill_rect(&mut canvas, slot.panel, panel_color, PANEL_ALPHA);
            for line in [&slot.title, &slot.word, &slot.phrase] {
                self.renderer.draw_centered(
                    &mut canvas,
                    &line.text,
                    line.size,
                    line.weight,
                    center_x,
                    line.center_y,
                    TEXT_COLOR,
                );
            }
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::testing::BoxRenderer;
    use crate::translation::catalog;

    fn solid_background(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 64, image::Rgb(color)))
    }

    fn png_data_url(image: &DynamicImage) -> String {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        GeneratedImage::new(bytes, "image/png").to_data_url()
    }

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(BoxRenderer::default()), reqwest::Client::new())
    }

    #[test]
    fn slots_are_equal_and_centered() {
        let translation = catalog().remove(0);
        let slots = layout_slots(&translation, &BoxRenderer::default());
        assert_eq!(slots.len(), 3);
        let languages: Vec<Language> = slots.iter().map(|slot| slot.language).collect();
        assert_eq!(languages, Language::ORDER.to_vec());

        for pair in slots.windows(2) {
            assert_eq!(pair[0].panel.height, pair[1].panel.height);
            assert_eq!(pair[1].panel.y - (pair[0].panel.y + pair[0].panel.height), SLOT_GAP);
        }
        let top = slots[0].panel.y;
        let bottom = slots[2].panel.y + slots[2].panel.height;
        assert_eq!(top + BLOCK_LIFT, CANVAS_HEIGHT as f32 - bottom - BLOCK_LIFT);
        assert_eq!(slots[0].panel.x, 110.0);
    }

    #[test]
    fn words_are_lowercased_and_fitted() {
        let translation = catalog().remove(0);
        let slots = layout_slots(&translation, &BoxRenderer::default());
        assert_eq!(slots[0].title.text, "ENGLISH");
        assert_eq!(slots[0].word.text, "sunrise");
        assert_eq!(slots[2].word.text, "sortida del sol");
        assert_eq!(slots[0].word.size, WORD_MAX_SIZE);
        // 40 chars at 0.5 ratio needs size <= 37, floor is 32
        assert_eq!(slots[2].phrase.text, "Em desperto abans de la sortida del sol.");
        assert_eq!(slots[2].phrase.size, 36.0);
    }

    #[test]
    fn render_dims_background_and_draws_panels() {
        let translation = catalog().remove(2);
        let canvas = compositor().render(&translation, &solid_background([200, 200, 200]));
        assert_eq!(canvas.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));

        // corner: only the overlay
        let corner = canvas.get_pixel(2, 2);
        assert_eq!(corner.0[0], 116);

        // inside a panel but away from text: overlay then grey panel
        let slots = layout_slots(&translation, &BoxRenderer::default());
        let panel = slots[1].panel;
        let inside = canvas.get_pixel((panel.x + 4.0) as u32, (panel.y + 4.0) as u32);
        assert!(inside.0[0] > corner.0[0]);
        assert_ne!(inside.0[0], 255);

        // title box is drawn in white
        let title = canvas.get_pixel(CANVAS_WIDTH / 2, slots[1].title.center_y as u32);
        assert_eq!(title.0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn compose_from_data_url_yields_jpeg() {
        let translation = catalog().remove(3);
        let url = png_data_url(&solid_background([10, 120, 200]));
        let image = compositor()
            .compose(&translation, &url)
            .await
            .expect("compose");
        assert_eq!(image.mime, JPEG_MIME);
        assert!(image.bytes.starts_with(&JPEG_SIGNATURE));
        let decoded = decode_image(&image.bytes).expect("decode output");
        assert_eq!(decoded.width(), CANVAS_WIDTH);
        assert_eq!(decoded.height(), CANVAS_HEIGHT);
    }

    #[tokio::test]
    async fn compose_is_repeatable() {
        let translation = catalog().remove(4);
        let url = png_data_url(&solid_background([90, 30, 30]));
        let compositor = compositor();
        let first = compositor.compose(&translation, &url).await.expect("first");
        let second = compositor.compose(&translation, &url).await.expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_compositions_do_not_interfere() {
        let compositor = compositor();
        let first = (catalog().remove(1), png_data_url(&solid_background([240, 20, 20])));
        let second = (catalog().remove(6), png_data_url(&solid_background([20, 20, 240])));

        let alone_first = compositor.compose(&first.0, &first.1).await.expect("first alone");
        let alone_second = compositor
            .compose(&second.0, &second.1)
            .await
            .expect("second alone");
        assert_ne!(alone_first, alone_second);

        let spawn = |(translation, url): (Translation, String)| {
            let compositor = compositor.clone();
            tokio::spawn(async move { compositor.compose(&translation, &url).await })
        };
        let (together_first, together_second) =
            tokio::join!(spawn(first.clone()), spawn(second.clone()));

        assert_eq!(
            together_first.expect("first task").expect("first compose"),
            alone_first
        );
        assert_eq!(
            together_second.expect("second task").expect("second compose"),
            alone_second
        );
    }

    #[tokio::test]
    async fn bad_backgrounds_fail_with_image_load() {
        let translation = catalog().remove(0);
        let compositor = compositor();
        for url in [
            "ftp://example.org/bg.jpg",
            "data:image/png;base64,bm90IGFuIGltYWdl",
            "data:image/png;base64,!!!",
        ] {
            let err = compositor
                .compose(&translation, url)
                .await
                .expect_err("bad background");
            assert!(matches!(err, LingoError::ImageLoad(_)), "{url}: {err}");
        }
    }
}
