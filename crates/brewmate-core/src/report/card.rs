use image::{Rgb, RgbImage};

use super::draw::{draw_text, fill_circle, fill_rect, fit_text, rgb, stroke_rect, text_width};
use super::{DailyReport, ReportRenderer};
use crate::error::Result;
use crate::record::{TastingRecord, MAX_RATING};
use crate::storage::{Theme, MIN_REPORT_WIDTH};

const BASE_HEIGHT: u32 = 600;
const CARD_PITCH: i64 = 200;
const CARD_HEIGHT: i64 = 170;
const FIRST_CARD_Y: i64 = 170;
const MARGIN: i64 = 30;
const HEADER_HEIGHT: i64 = 80;

const CANVAS: u32 = 0xf5f5dc;
const CARD_FILL: u32 = 0xfffaf0;
const CARD_BORDER: u32 = 0xdeb887;
const INK: u32 = 0x2f4f4f;
const TIME_INK: u32 = 0x8b4513;
const RATING_FILL: u32 = 0xff8c00;
const RATING_TRACK: u32 = 0xeee8d5;
const PHOTO_MARK: u32 = 0x4169e1;
const MILK_MARK: u32 = 0xffffff;

/// Beige page with a themed header band and one card per record.
///
/// Each card shows the brew time and tea name, a ten-step rating bar with
/// the numeric rating, the first line of the notes, one dot per pour, and
/// markers for milk and an attached photo.
#[derive(Debug, Clone)]
pub struct CardReportRenderer {
    width: u32,
    theme: Theme,
}

impl Default for CardReportRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            theme: Theme::default(),
        }
    }
}

impl CardReportRenderer {
    pub fn new(width: u32) -> Self {
        Self {
            width: width.max(MIN_REPORT_WIDTH),
            ..Self::default()
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn canvas_size(&self, records: usize) -> (u32, u32) {
        (self.width, BASE_HEIGHT + records as u32 * CARD_PITCH as u32)
    }

    fn header(&self, img: &mut RgbImage, report: &DailyReport) {
        let palette = self.theme.palette();
        let w = img.width() as i64;
        fill_rect(img, 0, 0, w, HEADER_HEIGHT, Rgb(palette.background));
        fill_rect(img, 0, HEADER_HEIGHT - 4, w, HEADER_HEIGHT, Rgb(palette.accent));

        let title = report.date.format("%Y-%m-%d").to_string();
        let scale = 8;
        let x = (w - text_width(&title, scale)) / 2;
        draw_text(img, x, 20, &title, scale, Rgb(palette.text));

        // count and average under the band
        let stats = format!("{}  {:.1}/{}", report.len(), report.average_rating(), MAX_RATING);
        draw_text(img, 50, 100, &stats, 5, rgb(INK));
        fill_rect(img, 50, 140, w - 50, 142, rgb(CARD_BORDER));
    }

    fn card(&self, img: &mut RgbImage, top: i64, record: &TastingRecord) {
        let w = img.width() as i64;
        let (left, right, bottom) = (MARGIN, w - MARGIN, top + CARD_HEIGHT);
        fill_rect(img, left, top, right, bottom, rgb(CARD_FILL));
        stroke_rect(img, left, top, right, bottom, 2, rgb(CARD_BORDER));

        let time = record.brewed_at_local().format("%H:%M").to_string();
        draw_text(img, left + 20, top + 15, &time, 5, rgb(TIME_INK));

        let name_left = left + 20 + text_width(&time, 5) + 30;
        let name = fit_text(&record.tea_name, right - 130 - name_left, 5);
        draw_text(img, name_left, top + 15, &name, 5, rgb(INK));

        // rating bar
        let bar_left = left + 20;
        let bar_right = right - 190;
        let bar_top = top + 60;
        let step = (bar_right - bar_left) / MAX_RATING as i64;
        for i in 0..MAX_RATING as i64 {
            let color = if i < record.rating as i64 {
                rgb(RATING_FILL)
            } else {
                rgb(RATING_TRACK)
            };
            let x0 = bar_left + i * step;
            fill_rect(img, x0, bar_top, x0 + step - 4, bar_top + 24, color);
        }
        let rating = format!("{}/{}", record.rating, MAX_RATING);
        draw_text(img, bar_right + 10, bar_top, &rating, 5, rgb(RATING_FILL));

        let first_line = record.notes.lines().next().unwrap_or_default();
        let notes = fit_text(first_line.trim(), bar_right - bar_left, 3);
        draw_text(img, bar_left, top + 92, &notes, 3, rgb(INK));

        // one dot per pour, as many as fit
        let dot_y = top + 120;
        let max_dots = ((bar_right - bar_left) / 24).max(1);
        for i in 0..(record.pour_count as i64).min(max_dots) {
            fill_circle(img, bar_left + 8 + i * 24, dot_y, 8, rgb(INK));
        }

        if record.add_milk {
            let cx = right - 150;
            fill_circle(img, cx, dot_y, 14, rgb(CARD_BORDER));
            fill_circle(img, cx, dot_y, 11, rgb(MILK_MARK));
        }

        if record.image_filename.is_some() {
            let (x0, y0) = (right - 110, top + 15);
            fill_rect(img, x0, y0, x0 + 90, y0 + 60, rgb(PHOTO_MARK));
            fill_circle(img, x0 + 45, y0 + 30, 18, rgb(CARD_FILL));
            fill_circle(img, x0 + 45, y0 + 30, 11, rgb(PHOTO_MARK));
        }
    }
}

impl ReportRenderer for CardReportRenderer {
    fn render(&self, report: &DailyReport) -> Result<RgbImage> {
        let (w, h) = self.canvas_size(report.len());
        let mut img = RgbImage::from_pixel(w, h, rgb(CANVAS));

        self.header(&mut img, report);
        for (i, record) in report.records.iter().enumerate() {
            self.card(&mut img, FIRST_CARD_Y + i as i64 * CARD_PITCH, record);
        }

        let bottom = h as i64;
        fill_rect(&mut img, 0, bottom - 8, w as i64, bottom, Rgb(self.theme.palette().accent));
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record(rating: u8, photo: bool) -> TastingRecord {
        TastingRecord {
            id: "1".into(),
            tea_name: "Assam".into(),
            pour_count: 3,
            add_milk: true,
            rating,
            notes: "n".into(),
            brewed_at: Utc::now(),
            image_filename: photo.then(|| "tea_image_1.png".to_string()),
            pour_intervals_seconds: vec![10, 20, 30],
        }
    }

    fn report(records: Vec<TastingRecord>) -> DailyReport {
        DailyReport {
            date: NaiveDate::from_ymd_opt(2026, 5, 5).unwrap(),
            records,
        }
    }

    #[test]
    fn height_grows_per_record() {
        let renderer = CardReportRenderer::default();
        let img = renderer.render(&report(vec![record(5, false), record(6, false)])).unwrap();
        assert_eq!(img.dimensions(), (800, 1000));
        assert_eq!(CardReportRenderer::new(10).canvas_size(0), (MIN_REPORT_WIDTH, 600));
    }

    #[test]
    fn header_uses_theme_background() {
        let img = CardReportRenderer::default()
            .with_theme(Theme::Modern)
            .render(&report(vec![record(5, false)]))
            .unwrap();
        assert_eq!(img.get_pixel(2, 2), &Rgb(Theme::Modern.palette().background));
        assert_eq!(img.get_pixel(2, 150), &rgb(CANVAS));
    }

    #[test]
    fn rating_bar_fills_rated_steps() {
        let img = CardReportRenderer::default()
            .render(&report(vec![record(3, false)]))
            .unwrap();
        let top = FIRST_CARD_Y;
        let bar_left = MARGIN + 20;
        let step = (800 - MARGIN - 190 - bar_left) / 10;
        let y = (top + 70) as u32;
        assert_eq!(img.get_pixel((bar_left + 2 * step + 1) as u32, y), &rgb(RATING_FILL));
        assert_eq!(img.get_pixel((bar_left + 3 * step + 1) as u32, y), &rgb(RATING_TRACK));
    }

    #[test]
    fn cards_show_tea_name() {
        let renderer = CardReportRenderer::default();
        let assam = renderer.render(&report(vec![record(5, false)])).unwrap();

        let mut keemun = record(5, false);
        keemun.tea_name = "Keemun".into();
        let keemun = renderer.render(&report(vec![keemun])).unwrap();

        assert_eq!(assam.dimensions(), keemun.dimensions());
        assert_ne!(assam, keemun);
    }

    #[test]
    fn photo_marker_only_with_image() {
        let x = (800 - MARGIN - 110 + 2) as u32;
        let y = (FIRST_CARD_Y + 17) as u32;

        let with = CardReportRenderer::default()
            .render(&report(vec![record(5, true)]))
            .unwrap();
        assert_eq!(with.get_pixel(x, y), &rgb(PHOTO_MARK));

        let without = CardReportRenderer::default()
            .render(&report(vec![record(5, false)]))
            .unwrap();
        assert_eq!(without.get_pixel(x, y), &rgb(CARD_FILL));
    }
}
